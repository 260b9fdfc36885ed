use thiserror::Error;

#[derive(Error, Debug)]
pub enum BadgeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Unexpected RPC response: {0}")]
    RpcResponse(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Transaction {tx_hash} failed: {message}")]
    Receipt { tx_hash: String, message: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, BadgeError>;
