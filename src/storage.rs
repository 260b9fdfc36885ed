use crate::error::{BadgeError, Result};
use crate::types::{ProgressRecord, ProgressState};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Storage trait for onboarding progress, keyed by Mini App user id
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Current record; unknown users are registered as NOT_STARTED
    async fn get_progress(&self, user_id: &str) -> Result<ProgressRecord>;

    /// Unconditional overwrite (last write wins)
    async fn set_progress(&self, user_id: &str, state: ProgressState) -> Result<ProgressRecord>;

    /// Move to `state` unless the user is already at or past it. The flag is
    /// true only when the stored state changed.
    async fn advance(&self, user_id: &str, state: ProgressState) -> Result<(ProgressRecord, bool)>;

    async fn reset_progress(&self, user_id: &str) -> Result<ProgressRecord>;

    async fn len(&self) -> Result<usize>;
}

/// In-memory storage implementation; lives as long as the process
#[derive(Clone, Default)]
pub struct InMemoryProgressStore {
    records: Arc<Mutex<HashMap<String, ProgressRecord>>>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<MutexGuard<'_, HashMap<String, ProgressRecord>>> {
        self.records
            .lock()
            .map_err(|e| BadgeError::Storage(format!("progress map poisoned: {}", e)))
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn get_progress(&self, user_id: &str) -> Result<ProgressRecord> {
        let mut records = self.records()?;
        let record = records
            .entry(user_id.to_string())
            .or_insert_with(ProgressRecord::not_started)
            .clone();
        Ok(record)
    }

    async fn set_progress(&self, user_id: &str, state: ProgressState) -> Result<ProgressRecord> {
        let record = ProgressRecord::new(state);
        self.records()?.insert(user_id.to_string(), record.clone());
        debug!("Set progress for {} to {}", user_id, state);
        Ok(record)
    }

    async fn advance(&self, user_id: &str, state: ProgressState) -> Result<(ProgressRecord, bool)> {
        let mut records = self.records()?;
        if let Some(existing) = records.get(user_id) {
            if existing.state >= state {
                debug!("Progress for {} already at {}, not moving to {}", user_id, existing.state, state);
                return Ok((existing.clone(), false));
            }
        }
        let record = ProgressRecord::new(state);
        records.insert(user_id.to_string(), record.clone());
        debug!("Advanced progress for {} to {}", user_id, state);
        Ok((record, true))
    }

    async fn reset_progress(&self, user_id: &str) -> Result<ProgressRecord> {
        let record = ProgressRecord::not_started();
        self.records()?.insert(user_id.to_string(), record.clone());
        debug!("Reset progress for {}", user_id);
        Ok(record)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.records()?.len())
    }
}
