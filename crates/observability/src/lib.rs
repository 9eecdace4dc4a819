//! Process-wide logging setup shared by hosts and integration tests.

/// Initialize tracing for the process.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber construction (filter + output format).
pub mod tracing;
