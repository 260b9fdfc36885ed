use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a user is in the onboarding flow. Variants are declared in flow order,
/// so `Ord` compares how far along a user is.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressState {
    #[default]
    NotStarted,
    IntroCompleted,
    QuizPassed,
    NftMinted,
}

impl ProgressState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressState::NotStarted => "NOT_STARTED",
            ProgressState::IntroCompleted => "INTRO_COMPLETED",
            ProgressState::QuizPassed => "QUIZ_PASSED",
            ProgressState::NftMinted => "NFT_MINTED",
        }
    }
}

impl fmt::Display for ProgressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub state: ProgressState,
    #[serde(rename = "lastUpdated", with = "chrono::serde::ts_milliseconds")]
    pub last_updated: DateTime<Utc>,
}

impl ProgressRecord {
    pub fn new(state: ProgressState) -> Self {
        Self {
            state,
            last_updated: Utc::now(),
        }
    }

    pub fn not_started() -> Self {
        Self::new(ProgressState::NotStarted)
    }
}

/// Outcome of a backend mint, serialized as `{ok, txHash}` or `{ok, error}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintResult {
    Minted { tx_hash: String },
    Failed { error: String },
}

impl MintResult {
    pub fn failed(error: impl Into<String>) -> Self {
        MintResult::Failed { error: error.into() }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, MintResult::Minted { .. })
    }
}

impl Serialize for MintResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("MintResult", 2)?;
        match self {
            MintResult::Minted { tx_hash } => {
                s.serialize_field("ok", &true)?;
                s.serialize_field("txHash", tx_hash)?;
            }
            MintResult::Failed { error } => {
                s.serialize_field("ok", &false)?;
                s.serialize_field("error", error)?;
            }
        }
        s.end()
    }
}

/// Identity of the caller as seen through the Mini App request context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniAppUser {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer_address: Option<String>,
}
