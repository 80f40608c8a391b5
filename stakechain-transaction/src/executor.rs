//! Batch transaction execution against a staged ledger snapshot

use crate::types::{Transaction, TransactionResult, TransactionType};
use stakechain_common::prelude::*;
use stakechain_state::{commit_all, Account, AccountLedger, DelegateRegistry};
use std::sync::Mutex;
use tracing::{debug, error, info};

/// Applies transaction batches to an account ledger and delegate registry.
///
/// One executor serializes every batch it runs: `execute` holds an internal
/// lock for the whole call, so two batches never interleave on the same
/// backing store when callers share the executor.
pub struct TransactionExecutor {
    config: ProtocolConfig,
    lock: Mutex<()>,
}

impl TransactionExecutor {
    pub fn new(config: ProtocolConfig) -> Self {
        Self {
            config,
            lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Execute `transactions` in order, returning one result per transaction.
    ///
    /// Rejected transactions never abort the batch; they come back with
    /// `success == false`. With `commit` set, the staged writes of both
    /// ledgers are flushed afterwards in one batch when they share a store.
    /// Without it the overlays are put back to where they stood when the call
    /// started, so writes the caller staged beforehand survive.
    ///
    /// An `Err` means storage or encoding failed. The overlays are restored to
    /// their state at the start of the call before it is returned.
    pub fn execute(
        &self,
        transactions: &[Transaction],
        accounts: &mut AccountLedger,
        delegates: &mut DelegateRegistry,
        commit: bool,
    ) -> LedgerResult<Vec<TransactionResult>> {
        let _guard = self.lock.lock()?;
        let account_mark = accounts.checkpoint();
        let delegate_mark = delegates.checkpoint();

        let results = match self.apply_batch(transactions, accounts, delegates) {
            Ok(results) => results,
            Err(e) => {
                error!("Batch of {} transactions aborted: {}", transactions.len(), e);
                accounts.restore(account_mark);
                delegates.restore(delegate_mark);
                return Err(e);
            }
        };

        if commit {
            if let Err(e) = commit_all(accounts, delegates) {
                error!("Failed to commit batch: {}", e);
                accounts.restore(account_mark);
                delegates.restore(delegate_mark);
                return Err(e);
            }
            info!(
                "Committed batch: {}/{} transactions succeeded",
                results.iter().filter(|r| r.success).count(),
                results.len()
            );
        } else {
            accounts.restore(account_mark);
            delegates.restore(delegate_mark);
        }

        Ok(results)
    }

    /// Execute a single transaction
    pub fn execute_one(
        &self,
        transaction: &Transaction,
        accounts: &mut AccountLedger,
        delegates: &mut DelegateRegistry,
        commit: bool,
    ) -> LedgerResult<TransactionResult> {
        let mut results = self.execute(std::slice::from_ref(transaction), accounts, delegates, commit)?;
        results
            .pop()
            .ok_or_else(|| LedgerError::internal("Executor returned no result"))
    }

    fn apply_batch(
        &self,
        transactions: &[Transaction],
        accounts: &mut AccountLedger,
        delegates: &mut DelegateRegistry,
    ) -> LedgerResult<Vec<TransactionResult>> {
        let mut results = Vec::with_capacity(transactions.len());
        for (index, tx) in transactions.iter().enumerate() {
            let success = self.apply(tx, accounts, delegates)?;
            if !success {
                debug!(
                    "Transaction {} ({} from {} nonce {}) rejected",
                    index,
                    tx.tx_type,
                    tx.from.to_hex(),
                    tx.nonce
                );
            }
            results.push(TransactionResult {
                success,
                ..Default::default()
            });
        }
        Ok(results)
    }

    fn apply(
        &self,
        tx: &Transaction,
        accounts: &mut AccountLedger,
        delegates: &mut DelegateRegistry,
    ) -> LedgerResult<bool> {
        let mut from = accounts.get_account(&tx.from)?;

        // Stale nonce or unaffordable fee: nothing is charged.
        if tx.nonce <= from.nonce || tx.fee > from.balance {
            return Ok(false);
        }

        from.balance -= tx.fee;
        accounts.put_account(&tx.from, &from)?;

        match tx.tx_type {
            TransactionType::Transfer => self.apply_transfer(tx, from, accounts),
            TransactionType::Delegate => self.apply_delegate(tx, from, accounts, delegates),
            TransactionType::Vote => self.apply_vote(tx, from, accounts, delegates),
            TransactionType::Unvote => self.apply_unvote(tx, from, accounts, delegates),
            TransactionType::Unknown(_) => {
                debug!("Unsupported transaction type: {}", tx.tx_type);
                Ok(false)
            }
        }
    }

    fn apply_transfer(
        &self,
        tx: &Transaction,
        mut from: Account,
        accounts: &mut AccountLedger,
    ) -> LedgerResult<bool> {
        if tx.value > from.balance {
            return Ok(false);
        }

        if tx.from == tx.to {
            from.nonce = tx.nonce;
            accounts.put_account(&tx.from, &from)?;
            return Ok(true);
        }

        let mut to = accounts.get_account(&tx.to)?;
        let Some(credited) = to.balance.checked_add(tx.value) else {
            return Ok(false);
        };

        from.nonce = tx.nonce;
        from.balance -= tx.value;
        to.balance = credited;

        accounts.put_account(&tx.from, &from)?;
        accounts.put_account(&tx.to, &to)?;
        Ok(true)
    }

    fn apply_delegate(
        &self,
        tx: &Transaction,
        mut from: Account,
        accounts: &mut AccountLedger,
        delegates: &mut DelegateRegistry,
    ) -> LedgerResult<bool> {
        if tx.from != tx.to
            || tx.value != self.config.registration_fee
            || tx.value > from.balance
            || !ValidationUtils::is_valid_delegate_name(&tx.data)
        {
            return Ok(false);
        }

        if !delegates.register(&tx.to, &tx.data)? {
            return Ok(false);
        }

        from.nonce = tx.nonce;
        from.balance -= tx.value;
        accounts.put_account(&tx.from, &from)?;
        Ok(true)
    }

    fn apply_vote(
        &self,
        tx: &Transaction,
        mut from: Account,
        accounts: &mut AccountLedger,
        delegates: &mut DelegateRegistry,
    ) -> LedgerResult<bool> {
        if tx.value > from.balance {
            return Ok(false);
        }
        let Some(locked) = from.locked.checked_add(tx.value) else {
            return Ok(false);
        };

        if !delegates.vote(&tx.from, &tx.to, tx.value)? {
            return Ok(false);
        }

        from.nonce = tx.nonce;
        from.balance -= tx.value;
        from.locked = locked;
        accounts.put_account(&tx.from, &from)?;
        Ok(true)
    }

    fn apply_unvote(
        &self,
        tx: &Transaction,
        mut from: Account,
        accounts: &mut AccountLedger,
        delegates: &mut DelegateRegistry,
    ) -> LedgerResult<bool> {
        if tx.value > from.locked {
            return Ok(false);
        }
        let Some(balance) = from.balance.checked_add(tx.value) else {
            return Ok(false);
        };

        if !delegates.unvote(&tx.from, &tx.to, tx.value)? {
            return Ok(false);
        }

        from.nonce = tx.nonce;
        from.balance = balance;
        from.locked -= tx.value;
        accounts.put_account(&tx.from, &from)?;
        Ok(true)
    }
}
