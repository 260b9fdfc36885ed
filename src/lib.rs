pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod logging;
pub mod metrics;
pub mod mint;
pub mod server;
pub mod state;
pub mod storage;
pub mod types;
