use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the logging system with both console and file output.
pub fn init_logging() {
    // Ensure logs directory exists
    let _ = fs::create_dir_all("logs");

    // Daily rotated JSON file next to the console output
    let file_appender = tracing_appender::rolling::daily("logs", "base_badge.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stdout);

    // Respect RUST_LOG if set; otherwise info for our crate and the HTTP layer
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("base_badge=info,tower_http=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    // Keep the guard alive for the whole process so buffered logs are flushed
    std::mem::forget(guard);
}
