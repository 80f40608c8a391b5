// Standard record encoding for the ledger core
// Every node must produce byte-identical records, so all persisted types go
// through the same fixed bincode layout.

use crate::{
    error::{LedgerError, LedgerResult},
    types::{Address, Hash},
};
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};

/// Trait for types persisted in a ledger store
pub trait LedgerSerialize: Serialize + DeserializeOwned {
    /// Encode using the canonical bincode layout
    fn encode(&self) -> LedgerResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| {
            LedgerError::serialization(format!("Failed to encode record: {}", e))
        })
    }

    /// Decode from the canonical bincode layout
    fn decode(bytes: &[u8]) -> LedgerResult<Self> {
        bincode::deserialize(bytes).map_err(|e| {
            LedgerError::serialization(format!("Failed to decode record: {}", e))
        })
    }
}

impl LedgerSerialize for u64 {}
impl LedgerSerialize for Address {}

/// Hash computation utilities with standardized patterns
pub struct HashCompute;

impl HashCompute {
    /// Compute hash of raw bytes
    pub fn hash_bytes(data: &[u8]) -> Hash {
        Sha256::digest(data).into()
    }

    /// Hash an ordered sequence of key/value pairs.
    ///
    /// Each key and value is length-prefixed (u32 little endian) so distinct
    /// change sets can never serialize to the same byte stream.
    pub fn hash_entries<'a, I>(entries: I) -> Hash
    where
        I: IntoIterator<Item = (&'a [u8], &'a [u8])>,
    {
        let mut hasher = Sha256::new();
        for (key, value) in entries {
            hasher.update((key.len() as u32).to_le_bytes());
            hasher.update(key);
            hasher.update((value.len() as u32).to_le_bytes());
            hasher.update(value);
        }
        hasher.finalize().into()
    }
}
