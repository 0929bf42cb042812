//! Tracing and logging setup shared by the binaries.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize process-wide logging.
///
/// `default_level` applies unless `RUST_LOG` is set. Safe to call more than
/// once; later calls are no-ops.
pub fn init(default_level: &str, json: bool) {
    let format = if json { LogFormat::Json } else { LogFormat::Pretty };
    tracing::init(default_level, format);
}
