//! # Stakechain State Management
//!
//! This crate provides the staged ledger state for the Stakechain core:
//! accounts and the delegate registry, each layered over a shared
//! [`KeyValueStore`].
//!
//! ## Architecture Overview
//!
//! ### [`AccountLedger`]
//! - Balance, locked stake and nonce per 20-byte address
//! - Accounts read as zero until first written
//!
//! ### [`DelegateRegistry`]
//! - One delegate per address, unique `[a-z_]{4,16}` names
//! - Vote weight per delegate and stake per (voter, delegate)
//!
//! ### [`StateDB`]
//! - Owns the backing store and opens fresh ledger views on it
//!
//! Both ledgers stage every write in memory. `commit()` flushes the overlay
//! as one atomic batch; `rollback()` throws it away. A view opened after a
//! rollback, or before a commit, sees only durable state.
//!
//! ## Example Usage
//!
//! ```no_run
//! use stakechain_state::StateDB;
//!
//! # fn example() -> stakechain_common::error::LedgerResult<()> {
//! let db = StateDB::in_memory();
//! let mut accounts = db.account_ledger();
//!
//! let alice = [1u8; 20];
//! accounts.set_balance(&alice, 1000)?;
//! accounts.commit()?;
//!
//! assert_eq!(db.account_ledger().get_account(&alice)?.balance, 1000);
//! # Ok(())
//! # }
//! ```

use stakechain_common::prelude::*;
use std::sync::Arc;

pub mod account;
pub mod delegate;
pub mod staged;

pub use account::{Account, AccountLedger};
pub use delegate::{Delegate, DelegateRegistry};
pub use staged::{Checkpoint, StagedStore};

/// Handle on a durable snapshot that hands out staged ledger views
#[derive(Clone)]
pub struct StateDB {
    store: Arc<dyn KeyValueStore>,
}

impl StateDB {
    /// Open a RocksDB-backed state at `config.path`
    pub fn open(config: &DatabaseConfig) -> LedgerResult<Self> {
        let store = RocksStore::open(config)?;
        Ok(Self::with_store(Arc::new(store)))
    }

    /// Ephemeral state held in memory
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// A fresh account view; sees only committed state
    pub fn account_ledger(&self) -> AccountLedger {
        AccountLedger::new(self.store.clone())
    }

    /// A fresh delegate view; sees only committed state
    pub fn delegate_registry(&self) -> DelegateRegistry {
        DelegateRegistry::new(self.store.clone())
    }
}

/// Persist the staged writes of both ledgers.
///
/// When both views sit on the same store their writes go out as one batch, so
/// either every change lands or none does. Ledgers on different stores are
/// committed one after the other. The overlays keep their pending writes if
/// the batch fails.
pub fn commit_all(accounts: &mut AccountLedger, delegates: &mut DelegateRegistry) -> LedgerResult<()> {
    let account_writes = accounts.staged_mut();
    let delegate_writes = delegates.staged_mut();

    if !account_writes.shares_store(delegate_writes) {
        accounts.commit()?;
        return delegates.commit();
    }

    let mut ops = account_writes.pending_ops();
    let account_count = ops.len();
    ops.extend(delegate_writes.pending_ops());
    if ops.is_empty() {
        return Ok(());
    }

    let count = ops.len();
    account_writes.store().write_batch(ops)?;
    account_writes.mark_committed();
    delegate_writes.mark_committed();

    tracing::debug!(
        "Committed {} account and {} delegate registry updates",
        account_count,
        count - account_count
    );
    Ok(())
}

/// Check that an account's locked balance equals the sum of its vote records
pub fn locked_matches_votes(
    accounts: &AccountLedger,
    delegates: &DelegateRegistry,
    address: &Address,
) -> LedgerResult<bool> {
    let locked = accounts.get_account(address)?.locked;
    let mut staked: u128 = 0;
    for (_, amount) in delegates.votes_of(address)? {
        staked += u128::from(amount);
    }
    Ok(staked == u128::from(locked))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rocksdb_state_roundtrip() {
        let temp_dir = tempdir().unwrap();
        let config = DatabaseConfig {
            path: temp_dir.path().join("state").display().to_string(),
            ..Default::default()
        };
        let alice = [1u8; 20];
        let bob = [2u8; 20];

        {
            let db = StateDB::open(&config).unwrap();
            let mut accounts = db.account_ledger();
            let mut delegates = db.delegate_registry();

            accounts.set_balance(&alice, 500).unwrap();
            accounts.set_locked(&bob, 40).unwrap();
            assert!(delegates.register(&alice, b"alice").unwrap());
            assert!(delegates.vote(&bob, &alice, 40).unwrap());

            accounts.commit().unwrap();
            delegates.commit().unwrap();
        }

        let db = StateDB::open(&config).unwrap();
        let accounts = db.account_ledger();
        let delegates = db.delegate_registry();
        assert_eq!(accounts.get_account(&alice).unwrap().balance, 500);
        assert_eq!(delegates.delegates().unwrap()[0].vote_weight, 40);
        assert!(locked_matches_votes(&accounts, &delegates, &bob).unwrap());
        assert!(locked_matches_votes(&accounts, &delegates, &alice).unwrap());
    }

    #[test]
    fn test_views_share_committed_state_only() {
        let db = StateDB::in_memory();
        let alice = [7u8; 20];

        let mut writer = db.account_ledger();
        writer.set_nonce(&alice, 9).unwrap();
        assert_eq!(db.account_ledger().get_account(&alice).unwrap().nonce, 0);

        writer.commit().unwrap();
        assert_eq!(db.account_ledger().get_account(&alice).unwrap().nonce, 9);
    }

    struct RejectingStore;

    impl KeyValueStore for RejectingStore {
        fn get(&self, _key: &[u8]) -> LedgerResult<Option<Vec<u8>>> {
            Ok(None)
        }

        fn write_batch(&self, _ops: Vec<WriteOp>) -> LedgerResult<()> {
            Err(LedgerError::database("disk full"))
        }

        fn scan_prefix(&self, _prefix: &[u8]) -> LedgerResult<Vec<(Vec<u8>, Vec<u8>)>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_commit_all_writes_both_ledgers() {
        let db = StateDB::in_memory();
        let mut accounts = db.account_ledger();
        let mut delegates = db.delegate_registry();
        let alice = [1u8; 20];

        accounts.set_balance(&alice, 10).unwrap();
        assert!(delegates.register(&alice, b"alice").unwrap());
        commit_all(&mut accounts, &mut delegates).unwrap();

        assert!(!accounts.has_pending());
        assert!(!delegates.has_pending());
        assert_eq!(db.account_ledger().get_account(&alice).unwrap().balance, 10);
        assert!(db
            .delegate_registry()
            .get_delegate_by_name(b"alice")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_commit_all_failure_keeps_pending() {
        let db = StateDB::with_store(Arc::new(RejectingStore));
        let mut accounts = db.account_ledger();
        let mut delegates = db.delegate_registry();
        let alice = [1u8; 20];

        accounts.set_balance(&alice, 10).unwrap();
        assert!(delegates.register(&alice, b"alice").unwrap());
        let err = commit_all(&mut accounts, &mut delegates).unwrap_err();

        assert!(matches!(err, LedgerError::Storage(_)));
        assert_eq!(accounts.get_account(&alice).unwrap().balance, 10);
        assert!(delegates.get_delegate_by_address(&alice).unwrap().is_some());
    }

    #[test]
    fn test_locked_mismatch_detected() {
        let db = StateDB::in_memory();
        let mut accounts = db.account_ledger();
        let delegates = db.delegate_registry();
        let voter = [4u8; 20];

        accounts.set_locked(&voter, 1).unwrap();
        assert!(!locked_matches_votes(&accounts, &delegates, &voter).unwrap());
    }
}
