//! Tracing subscriber setup for processes embedding the ledger core

use crate::error::{LedgerError, LedgerResult};
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_logging(level: &str) -> LedgerResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .try_init()
        .map_err(|e| LedgerError::config(format!("Failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_reports_error() {
        // Only one global subscriber may exist per process.
        let _ = init_logging("debug");
        assert!(init_logging("debug").is_err());
    }
}
