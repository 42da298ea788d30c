//! Integration tests for the legacy nn utilities
//!
//! Run with: cargo test --test integration

mod conversion_tests;
mod view_tests;
mod property_tests;

/// Common test initialization
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("legacy_nn_utils=debug")
        .try_init();
}
