//! Prometheus metrics for onboarding progress and badge mints.

use crate::types::ProgressState;
use std::net::SocketAddr;
use tracing::{info, warn};

pub const PROGRESS_TRANSITIONS: &str = "badge_progress_transitions_total";
pub const QUIZ_ATTEMPTS: &str = "badge_quiz_attempts_total";
pub const MINTS: &str = "badge_mints_total";
pub const MINT_DURATION: &str = "badge_mint_duration_seconds";

/// Install the Prometheus exporter with its own HTTP listener
pub fn init_metrics(port: u16) {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", addr),
        Err(e) => warn!("Prometheus exporter install failed (possibly already installed): {}", e),
    }
}

/// Where the mint was performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MintMode {
    /// Server signs and sends `mintTo`
    Backend,
    /// The user's wallet sent the transaction and reported its hash
    Client,
}

impl MintMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MintMode::Backend => "backend",
            MintMode::Client => "client",
        }
    }
}

pub struct BadgeMetrics;

impl BadgeMetrics {
    pub fn record_transition(state: ProgressState) {
        ::metrics::counter!(PROGRESS_TRANSITIONS, "state" => state.as_str()).increment(1);
    }

    pub fn record_quiz_attempt(correct: bool) {
        let result = if correct { "correct" } else { "incorrect" };
        ::metrics::counter!(QUIZ_ATTEMPTS, "result" => result).increment(1);
    }

    pub fn record_mint(mode: MintMode, ok: bool) {
        let result = if ok { "success" } else { "error" };
        ::metrics::counter!(MINTS, "mode" => mode.as_str(), "result" => result).increment(1);
    }

    pub fn record_mint_duration(duration_secs: f64) {
        ::metrics::histogram!(MINT_DURATION).record(duration_secs);
    }
}
