//! # Stakechain Common
//!
//! Common utilities, traits, and standardized patterns for the Stakechain
//! ledger core. This crate is the single source of truth for functionality
//! shared by the state and transaction crates.
//!
//! ## Modules
//!
//! - **config**: Protocol constants and storage settings loaded from TOML
//! - **database**: The `KeyValueStore` contract with in-memory and RocksDB backends
//! - **error**: `LedgerError` and `LedgerResult`
//! - **logging**: Tracing subscriber setup
//! - **serialization**: Canonical record encoding and change-set hashing
//! - **types**: Address and amount types plus protocol constants
//! - **validation**: Input validation utilities
//!
//! ## Example Usage
//!
//! ```rust
//! use stakechain_common::prelude::*;
//!
//! let store = MemoryStore::new();
//! store.write_batch(vec![(b"k".to_vec(), 7u64.encode()?)])?;
//! let value = store.get(b"k")?.map(|bytes| u64::decode(&bytes)).transpose()?;
//! assert_eq!(value, Some(7));
//! # Ok::<(), LedgerError>(())
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod serialization;
pub mod types;
pub mod validation;

/// Re-export commonly used types and traits
pub mod prelude {
    pub use crate::config::{LedgerConfig, ProtocolConfig};
    pub use crate::database::{DatabaseConfig, KeyValueStore, MemoryStore, RocksStore, WriteOp};
    pub use crate::error::{LedgerError, LedgerResult};
    pub use crate::serialization::{HashCompute, LedgerSerialize};
    pub use crate::types::{Address, AddressExt, Amount, Hash, HashExt, Nonce};
    pub use crate::validation::ValidationUtils;
}

/// Stakechain Common crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
