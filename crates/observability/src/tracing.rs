//! Tracing/logging initialization.
//!
//! Rule evaluation and notification dispatch log through `tracing`; this
//! module wires the subscriber so those events actually land somewhere.

use tracing_subscriber::EnvFilter;

/// Initialize JSON logging for the process, filtered via `RUST_LOG`.
///
/// Defaults to `info` globally with `debug` for the recordflow crates so
/// rule-resolution traces show up without extra configuration. Safe to call
/// multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,recordflow=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_current_span(true)
        .try_init();
}

/// Plain compact output for local debugging of tests.
///
/// Keeps the same filter semantics as [`init`] but skips the JSON encoder,
/// which is unreadable in a terminal.
pub fn init_compact() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,recordflow=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_target(false)
        .try_init();
}
