use crate::config::Config;
use crate::error::Result;
use crate::mint::{ContractMinter, Minter};
use crate::storage::{InMemoryProgressStore, ProgressStore};
use std::sync::Arc;

/// Shared handles every request handler sees
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProgressStore>,
    pub minter: Arc<dyn Minter>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ProgressStore>, minter: Arc<dyn Minter>) -> Self {
        Self {
            store,
            minter,
            config: Arc::new(config),
        }
    }

    /// In-memory progress plus a contract minter built from the chain settings
    pub fn from_config(config: Config) -> Result<Self> {
        let minter = ContractMinter::from_config(&config.chain)?;
        Ok(Self::new(
            config,
            Arc::new(InMemoryProgressStore::new()),
            Arc::new(minter),
        ))
    }
}
