//! Structured logging emitting JSON lines on stdout.
//!
//! Events carry `ev` and `code` fields so request logs stay greppable
//! alongside the stable codes in [`crate::common::error::ErrorCode`].
//!
//! TODO: Sample the per-request `predict` events once traffic makes them noisy.

use tracing_subscriber::EnvFilter;

use crate::common::config::AppCfg;

/// Install the global JSON subscriber.
///
/// An unparsable filter falls back to `info`. Calling this twice is harmless:
/// the second install is ignored, which keeps tests free to call it.
pub fn init(cfg: &AppCfg) {
    let filter = EnvFilter::try_new(&cfg.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .json()
        .with_current_span(false)
        .with_target(true)
        .with_env_filter(filter)
        .try_init();
}
