//! Integration test harness.

mod scenarios;

/// Opt-in log output for debugging test runs (`RUST_LOG=sift=debug`).
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
