//stakechain-common/src/error.rs
//! Standardized error types for all Stakechain components

use std::sync::{MutexGuard, PoisonError};
use thiserror::Error;

/// Standard result type used throughout the ledger core
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Errors that abort a ledger operation.
///
/// Rejected transactions are never reported through this type; they surface
/// as unsuccessful results. `LedgerError` covers infrastructure failures:
/// storage, encoding, configuration and poisoned locks.
#[derive(Error, Debug)]
pub enum LedgerError {
    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] rocksdb::Error),

    // Storage backend errors outside rocksdb
    #[error("Storage error: {0}")]
    Storage(String),

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // State management errors
    #[error("State error: {0}")]
    State(String),

    // Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    IO(#[from] std::io::Error),

    // TOML errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // Concurrency errors
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Create a new serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new state error
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a new storage error for failures that do not originate in rocksdb
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

impl<T> From<PoisonError<MutexGuard<'_, T>>> for LedgerError {
    fn from(err: PoisonError<MutexGuard<'_, T>>) -> Self {
        LedgerError::LockPoisoned(err.to_string())
    }
}

/// Convenience macro for creating LedgerError instances
#[macro_export]
macro_rules! ledger_error {
    ($variant:ident, $($arg:tt)*) => {
        $crate::error::LedgerError::$variant(format!($($arg)*))
    };
}

/// Convenience macro for returning early with a LedgerError
#[macro_export]
macro_rules! ledger_bail {
    ($variant:ident, $($arg:tt)*) => {
        return Err($crate::ledger_error!($variant, $($arg)*))
    };
}
