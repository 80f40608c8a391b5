use crate::staged::{Checkpoint, StagedStore};
use serde::{Deserialize, Serialize};
use stakechain_common::prelude::*;
use std::sync::Arc;

const ACCOUNT_PREFIX: &[u8] = b"a/";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Account {
    pub balance: Amount,
    pub locked: Amount,
    pub nonce: Nonce,
}

impl Account {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerSerialize for Account {}

fn account_key(address: &Address) -> Vec<u8> {
    [ACCOUNT_PREFIX, address.as_slice()].concat()
}

/// Staged view of every account on one snapshot.
///
/// Accounts that were never written read as zero. Writes stay in the overlay
/// until [`AccountLedger::commit`].
pub struct AccountLedger {
    staged: StagedStore,
}

impl AccountLedger {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            staged: StagedStore::new(store),
        }
    }

    /// Current value of an account; absent accounts read as zero and are not persisted
    pub fn get_account(&self, address: &Address) -> LedgerResult<Account> {
        Ok(self
            .staged
            .get::<Account>(&account_key(address))?
            .unwrap_or_default())
    }

    pub fn put_account(&mut self, address: &Address, account: &Account) -> LedgerResult<()> {
        self.staged.put(account_key(address), account)
    }

    pub fn set_balance(&mut self, address: &Address, balance: Amount) -> LedgerResult<()> {
        let mut account = self.get_account(address)?;
        account.balance = balance;
        self.put_account(address, &account)
    }

    pub fn set_locked(&mut self, address: &Address, locked: Amount) -> LedgerResult<()> {
        let mut account = self.get_account(address)?;
        account.locked = locked;
        self.put_account(address, &account)
    }

    pub fn set_nonce(&mut self, address: &Address, nonce: Nonce) -> LedgerResult<()> {
        let mut account = self.get_account(address)?;
        account.nonce = nonce;
        self.put_account(address, &account)
    }

    pub fn commit(&mut self) -> LedgerResult<()> {
        let count = self.staged.pending_len();
        self.staged.commit()?;
        tracing::debug!("Committed {} account updates", count);
        Ok(())
    }

    pub fn rollback(&mut self) {
        self.staged.rollback();
    }

    /// Save the current staged writes
    pub fn checkpoint(&self) -> Checkpoint {
        self.staged.checkpoint()
    }

    /// Return the staged writes to an earlier checkpoint
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.staged.restore(checkpoint);
    }

    pub(crate) fn staged_mut(&mut self) -> &mut StagedStore {
        &mut self.staged
    }

    /// Digest of the staged account writes
    pub fn pending_digest(&self) -> Hash {
        self.staged.digest()
    }

    pub fn has_pending(&self) -> bool {
        self.staged.is_dirty()
    }
}
