//! Tracing and logging setup shared by binaries.

pub mod tracing;

pub use tracing::LogFormat;

/// Initialize process-wide tracing in the given format.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init(format: LogFormat) {
    tracing::init(format);
}
