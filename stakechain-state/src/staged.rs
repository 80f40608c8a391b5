//! Copy-on-write overlay over a [`KeyValueStore`].
//!
//! Reads check the pending writes first and fall back to the store. Nothing
//! reaches the store until [`StagedStore::commit`], which hands every pending
//! write to the backend as a single atomic batch.

use stakechain_common::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct StagedStore {
    store: Arc<dyn KeyValueStore>,
    pending: BTreeMap<Vec<u8>, Vec<u8>>,
}

/// Saved copy of an overlay's pending writes
#[derive(Clone, Debug, Default)]
pub struct Checkpoint(BTreeMap<Vec<u8>, Vec<u8>>);

impl StagedStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            pending: BTreeMap::new(),
        }
    }

    /// Read and decode a record, preferring staged writes
    pub fn get<T: LedgerSerialize>(&self, key: &[u8]) -> LedgerResult<Option<T>> {
        match self.pending.get(key) {
            Some(bytes) => T::decode(bytes).map(Some),
            None => self
                .store
                .get(key)?
                .map(|bytes| T::decode(&bytes))
                .transpose(),
        }
    }

    /// Stage an encoded record
    pub fn put<T: LedgerSerialize>(&mut self, key: Vec<u8>, value: &T) -> LedgerResult<()> {
        let encoded = value.encode()?;
        self.pending.insert(key, encoded);
        Ok(())
    }

    /// Decode every record under `prefix`, merged with staged writes, in key order
    pub fn scan_prefix<T: LedgerSerialize>(&self, prefix: &[u8]) -> LedgerResult<Vec<(Vec<u8>, T)>> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.store.scan_prefix(prefix)?.into_iter().collect();

        merged.extend(
            self.pending
                .range(prefix.to_vec()..)
                .take_while(|(k, _)| k.starts_with(prefix))
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        merged
            .into_iter()
            .map(|(k, v)| T::decode(&v).map(|record| (k, record)))
            .collect()
    }

    /// Flush staged writes to the store
    pub fn commit(&mut self) -> LedgerResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let ops: Vec<WriteOp> = std::mem::take(&mut self.pending).into_iter().collect();
        let count = ops.len();
        self.store.write_batch(ops)?;
        tracing::trace!("Committed {} staged writes", count);
        Ok(())
    }

    /// Snapshot the pending writes so they can be put back with [`StagedStore::restore`]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.pending.clone())
    }

    /// Replace the pending writes with a previously taken checkpoint
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.pending = checkpoint.0;
    }

    /// Copy of the pending writes in key order, leaving the overlay untouched
    pub fn pending_ops(&self) -> Vec<WriteOp> {
        self.pending
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Forget pending writes after they were persisted by someone else
    pub fn mark_committed(&mut self) {
        self.pending.clear();
    }

    /// Whether both overlays write to the same backing store
    pub fn shares_store(&self, other: &StagedStore) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.store), Arc::as_ptr(&other.store))
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Drop every staged write
    pub fn rollback(&mut self) {
        if !self.pending.is_empty() {
            tracing::trace!("Discarding {} staged writes", self.pending.len());
        }
        self.pending.clear();
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// SHA-256 over the staged writes in key order
    pub fn digest(&self) -> Hash {
        HashCompute::hash_entries(
            self.pending
                .iter()
                .map(|(k, v)| (k.as_slice(), v.as_slice())),
        )
    }
}
