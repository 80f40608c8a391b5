//! Delegate registrations and vote bookkeeping

use crate::staged::{Checkpoint, StagedStore};
use serde::{Deserialize, Serialize};
use stakechain_common::prelude::*;
use std::sync::Arc;

const DELEGATE_PREFIX: &[u8] = b"d/";
const NAME_PREFIX: &[u8] = b"n/";
const VOTE_PREFIX: &[u8] = b"v/";

/// A registered delegate
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Delegate {
    pub address: Address,
    pub name: Vec<u8>,
    /// Sum of every active vote cast for this delegate
    pub vote_weight: Amount,
}

impl Delegate {
    pub fn new(address: Address, name: Vec<u8>) -> Self {
        Self {
            address,
            name,
            vote_weight: 0,
        }
    }

    /// Name rendered as text; names are restricted to `[a-z_]`
    pub fn name_str(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }

    /// Hex form of the address, as used for peer ids
    pub fn to_peer_id(&self) -> String {
        hex::encode(self.address)
    }
}

impl LedgerSerialize for Delegate {}

fn delegate_key(address: &Address) -> Vec<u8> {
    [DELEGATE_PREFIX, address.as_slice()].concat()
}

fn name_key(name: &[u8]) -> Vec<u8> {
    [NAME_PREFIX, name].concat()
}

fn vote_key(voter: &Address, delegate: &Address) -> Vec<u8> {
    [VOTE_PREFIX, voter.as_slice(), delegate.as_slice()].concat()
}

/// Staged registry of delegates and the votes cast for them.
///
/// Every mutation either applies fully or reports `false` and leaves the
/// overlay untouched.
pub struct DelegateRegistry {
    staged: StagedStore,
}

impl DelegateRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            staged: StagedStore::new(store),
        }
    }

    /// Register `address` as a delegate named `name`.
    ///
    /// Returns `false` when the name is malformed, the address already owns a
    /// delegate, or another delegate holds the name.
    pub fn register(&mut self, address: &Address, name: &[u8]) -> LedgerResult<bool> {
        if let Err(e) = ValidationUtils::validate_delegate_name(name) {
            tracing::debug!("Rejected delegate registration: {}", e);
            return Ok(false);
        }
        if self.get_delegate_by_address(address)?.is_some() {
            return Ok(false);
        }
        if self.staged.get::<Address>(&name_key(name))?.is_some() {
            return Ok(false);
        }

        let delegate = Delegate::new(*address, name.to_vec());
        self.staged.put(delegate_key(address), &delegate)?;
        self.staged.put(name_key(name), address)?;

        tracing::debug!(
            "Registered delegate {} ({})",
            delegate.name_str(),
            delegate.to_peer_id()
        );
        Ok(true)
    }

    /// Add `amount` of `voter`'s stake to `delegate`
    pub fn vote(&mut self, voter: &Address, delegate: &Address, amount: Amount) -> LedgerResult<bool> {
        let Some(mut record) = self.get_delegate_by_address(delegate)? else {
            return Ok(false);
        };

        let staked = self.get_vote(voter, delegate)?;
        let (Some(weight), Some(staked)) = (
            record.vote_weight.checked_add(amount),
            staked.checked_add(amount),
        ) else {
            return Ok(false);
        };

        record.vote_weight = weight;
        self.staged.put(delegate_key(delegate), &record)?;
        self.staged.put(vote_key(voter, delegate), &staked)?;
        Ok(true)
    }

    /// Withdraw `amount` of `voter`'s stake from `delegate`
    pub fn unvote(&mut self, voter: &Address, delegate: &Address, amount: Amount) -> LedgerResult<bool> {
        let staked = self.get_vote(voter, delegate)?;
        if staked < amount {
            return Ok(false);
        }

        let Some(mut record) = self.get_delegate_by_address(delegate)? else {
            return Err(LedgerError::state(format!(
                "Vote record points at unknown delegate {}",
                hex::encode(delegate)
            )));
        };

        record.vote_weight = record.vote_weight.checked_sub(amount).ok_or_else(|| {
            LedgerError::state(format!(
                "Vote weight of {} below recorded stake",
                record.name_str()
            ))
        })?;

        self.staged.put(delegate_key(delegate), &record)?;
        self.staged.put(vote_key(voter, delegate), &(staked - amount))?;
        Ok(true)
    }

    pub fn get_delegate_by_address(&self, address: &Address) -> LedgerResult<Option<Delegate>> {
        self.staged.get(&delegate_key(address))
    }

    pub fn get_delegate_by_name(&self, name: &[u8]) -> LedgerResult<Option<Delegate>> {
        match self.staged.get::<Address>(&name_key(name))? {
            Some(address) => self.get_delegate_by_address(&address),
            None => Ok(None),
        }
    }

    /// Stake `voter` currently has on `delegate`
    pub fn get_vote(&self, voter: &Address, delegate: &Address) -> LedgerResult<Amount> {
        Ok(self
            .staged
            .get::<Amount>(&vote_key(voter, delegate))?
            .unwrap_or(0))
    }

    /// Non-zero votes cast by `voter`, ordered by delegate address
    pub fn votes_of(&self, voter: &Address) -> LedgerResult<Vec<(Address, Amount)>> {
        let prefix = [VOTE_PREFIX, voter.as_slice()].concat();
        let mut votes = Vec::new();

        for (key, amount) in self.staged.scan_prefix::<Amount>(&prefix)? {
            if amount == 0 {
                continue;
            }
            let delegate: Address = key[prefix.len()..]
                .try_into()
                .map_err(|_| LedgerError::state("Malformed vote key"))?;
            votes.push((delegate, amount));
        }

        Ok(votes)
    }

    /// All delegates, highest vote weight first, ties broken by address
    pub fn delegates(&self) -> LedgerResult<Vec<Delegate>> {
        let mut delegates: Vec<Delegate> = self
            .staged
            .scan_prefix::<Delegate>(DELEGATE_PREFIX)?
            .into_iter()
            .map(|(_, d)| d)
            .collect();

        delegates.sort_by(|a, b| {
            b.vote_weight
                .cmp(&a.vote_weight)
                .then_with(|| a.address.cmp(&b.address))
        });
        Ok(delegates)
    }

    pub fn commit(&mut self) -> LedgerResult<()> {
        let count = self.staged.pending_len();
        self.staged.commit()?;
        tracing::debug!("Committed {} delegate registry updates", count);
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

    /// Digest of the staged registry writes
    pub fn pending_digest(&self) -> Hash {
        self.staged.digest()
    }

    pub fn has_pending(&self) -> bool {
        self.staged.is_dirty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: Address = [1u8; 20];
    const BOB: Address = [2u8; 20];
    const CAROL: Address = [3u8; 20];

    fn registry() -> DelegateRegistry {
        DelegateRegistry::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut reg = registry();
        assert!(reg.register(&ALICE, b"alice").unwrap());

        let by_addr = reg.get_delegate_by_address(&ALICE).unwrap().unwrap();
        assert_eq!(by_addr.name_str(), "alice");
        assert_eq!(by_addr.vote_weight, 0);
        assert_eq!(by_addr.to_peer_id(), "01".repeat(20));

        let by_name = reg.get_delegate_by_name(b"alice").unwrap().unwrap();
        assert_eq!(by_name, by_addr);
        assert!(reg.get_delegate_by_name(b"nobody").unwrap().is_none());
    }

    #[test]
    fn test_register_rejections_leave_state_unchanged() {
        let mut reg = registry();
        assert!(reg.register(&ALICE, b"alice").unwrap());
        let digest = reg.pending_digest();

        // Address already registered.
        assert!(!reg.register(&ALICE, b"other").unwrap());
        // Name already taken.
        assert!(!reg.register(&BOB, b"alice").unwrap());
        // Invalid names.
        assert!(!reg.register(&BOB, b"abc").unwrap());
        assert!(!reg.register(&BOB, b"Bobby").unwrap());

        assert_eq!(reg.pending_digest(), digest);
        assert!(reg.get_delegate_by_address(&BOB).unwrap().is_none());
    }

    #[test]
    fn test_vote_requires_existing_delegate() {
        let mut reg = registry();
        assert!(!reg.vote(&BOB, &ALICE, 10).unwrap());
        assert!(!reg.has_pending());

        reg.register(&ALICE, b"alice").unwrap();
        assert!(reg.vote(&BOB, &ALICE, 10).unwrap());
        assert!(reg.vote(&BOB, &ALICE, 5).unwrap());
        assert!(reg.vote(&CAROL, &ALICE, 1).unwrap());

        assert_eq!(reg.get_vote(&BOB, &ALICE).unwrap(), 15);
        assert_eq!(
            reg.get_delegate_by_address(&ALICE).unwrap().unwrap().vote_weight,
            16
        );
    }

    #[test]
    fn test_vote_overflow_rejected() {
        let mut reg = registry();
        reg.register(&ALICE, b"alice").unwrap();
        assert!(reg.vote(&BOB, &ALICE, u64::MAX).unwrap());
        assert!(!reg.vote(&CAROL, &ALICE, 1).unwrap());
        assert_eq!(reg.get_vote(&CAROL, &ALICE).unwrap(), 0);
    }

    #[test]
    fn test_unvote_bounded_by_stake() {
        let mut reg = registry();
        reg.register(&ALICE, b"alice").unwrap();
        reg.vote(&BOB, &ALICE, 10).unwrap();
        reg.vote(&CAROL, &ALICE, 10).unwrap();

        // Carol's stake cannot back Bob's withdrawal.
        assert!(!reg.unvote(&BOB, &ALICE, 11).unwrap());
        assert!(!reg.unvote(&BOB, &CAROL, 1).unwrap());

        assert!(reg.unvote(&BOB, &ALICE, 4).unwrap());
        assert_eq!(reg.get_vote(&BOB, &ALICE).unwrap(), 6);
        assert_eq!(
            reg.get_delegate_by_address(&ALICE).unwrap().unwrap().vote_weight,
            16
        );
    }

    #[test]
    fn test_votes_of_lists_nonzero_stakes() {
        let mut reg = registry();
        reg.register(&ALICE, b"alice").unwrap();
        reg.register(&BOB, b"bobby").unwrap();
        reg.vote(&CAROL, &BOB, 3).unwrap();
        reg.vote(&CAROL, &ALICE, 7).unwrap();
        reg.vote(&ALICE, &BOB, 9).unwrap();

        assert_eq!(reg.votes_of(&CAROL).unwrap(), vec![(ALICE, 7), (BOB, 3)]);

        reg.unvote(&CAROL, &ALICE, 7).unwrap();
        assert_eq!(reg.votes_of(&CAROL).unwrap(), vec![(BOB, 3)]);
    }

    #[test]
    fn test_delegates_ordered_by_weight() {
        let mut reg = registry();
        reg.register(&CAROL, b"carol").unwrap();
        reg.register(&ALICE, b"alice").unwrap();
        reg.register(&BOB, b"bobby").unwrap();
        reg.vote(&ALICE, &BOB, 50).unwrap();

        let names: Vec<String> = reg
            .delegates()
            .unwrap()
            .iter()
            .map(Delegate::name_str)
            .collect();
        assert_eq!(names, vec!["bobby", "alice", "carol"]);
    }

    #[test]
    fn test_rollback_and_commit_isolation() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut reg = DelegateRegistry::new(store.clone());

        reg.register(&ALICE, b"alice").unwrap();
        reg.rollback();
        assert!(reg.get_delegate_by_address(&ALICE).unwrap().is_none());

        reg.register(&ALICE, b"alice").unwrap();
        reg.vote(&BOB, &ALICE, 8).unwrap();
        assert!(DelegateRegistry::new(store.clone())
            .get_delegate_by_name(b"alice")
            .unwrap()
            .is_none());

        reg.commit().unwrap();
        let fresh = DelegateRegistry::new(store);
        assert_eq!(fresh.get_vote(&BOB, &ALICE).unwrap(), 8);
        assert_eq!(fresh.delegates().unwrap().len(), 1);
    }
}
