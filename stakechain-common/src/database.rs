//! Database operation patterns and utilities

use crate::error::{LedgerError, LedgerResult};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// A single pending write: key and encoded value
pub type WriteOp = (Vec<u8>, Vec<u8>);

/// Durable key-value storage underneath the ledgers.
///
/// Implementations must apply a `write_batch` atomically: after it returns,
/// either every write is visible to new readers or none is.
pub trait KeyValueStore: Send + Sync {
    /// Read a single value
    fn get(&self, key: &[u8]) -> LedgerResult<Option<Vec<u8>>>;

    /// Apply every write in one atomic step
    fn write_batch(&self, ops: Vec<WriteOp>) -> LedgerResult<()>;

    /// All entries whose key starts with `prefix`, in ascending key order
    fn scan_prefix(&self, prefix: &[u8]) -> LedgerResult<Vec<WriteOp>>;
}

/// In-memory store, used for ephemeral snapshots and tests
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &[u8]) -> LedgerResult<Option<Vec<u8>>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| LedgerError::LockPoisoned(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn write_batch(&self, ops: Vec<WriteOp>) -> LedgerResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| LedgerError::LockPoisoned(e.to_string()))?;
        entries.extend(ops);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> LedgerResult<Vec<WriteOp>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| LedgerError::LockPoisoned(e.to_string()))?;
        Ok(entries
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// RocksDB-backed store
pub struct RocksStore {
    db: Arc<DB>,
}

impl RocksStore {
    /// Open (or create) a database with the given configuration
    pub fn open(config: &DatabaseConfig) -> LedgerResult<Self> {
        Self::open_path(&config.path, config)
    }

    /// Open a database at an explicit path, taking tuning from `config`
    pub fn open_path(path: impl AsRef<Path>, config: &DatabaseConfig) -> LedgerResult<Self> {
        let opts = DatabaseUtils::create_options(config);
        let db = DB::open(&opts, path.as_ref())
            .map_err(|e| LedgerError::database(format!("Failed to open database: {}", e)))?;

        tracing::info!("Opened ledger database at {}", path.as_ref().display());
        Ok(Self { db: Arc::new(db) })
    }
}

impl KeyValueStore for RocksStore {
    fn get(&self, key: &[u8]) -> LedgerResult<Option<Vec<u8>>> {
        self.db.get(key).map_err(LedgerError::from)
    }

    fn write_batch(&self, ops: Vec<WriteOp>) -> LedgerResult<()> {
        let mut batch = WriteBatch::default();
        for (key, value) in &ops {
            batch.put(key, value);
        }
        self.db.write(batch).map_err(LedgerError::from)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> LedgerResult<Vec<WriteOp>> {
        let mut out = Vec::new();
        let iter = self
            .db
            .iterator(IteratorMode::From(prefix, Direction::Forward));

        for item in iter {
            let (key, value) = item.map_err(LedgerError::from)?;
            if !key.starts_with(prefix) {
                break;
            }
            out.push((key.to_vec(), value.to_vec()));
        }

        Ok(out)
    }
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Directory holding the RocksDB files
    pub path: String,
    /// Open file handle limit passed to RocksDB
    pub max_open_files: i32,
    /// Memtable size in bytes
    pub write_buffer_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "./stakechain_data".to_string(),
            max_open_files: 1000,
            write_buffer_size: 67108864, // 64MB
        }
    }
}

/// Helpers for building RocksDB options
pub struct DatabaseUtils;

impl DatabaseUtils {
    /// Create database options from configuration
    pub fn create_options(config: &DatabaseConfig) -> Options {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_max_open_files(config.max_open_files);
        opts.set_use_fsync(false);
        opts.set_bytes_per_sync(8388608);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compaction_style(rocksdb::DBCompactionStyle::Level);
        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn exercise_store(store: &dyn KeyValueStore) {
        store
            .write_batch(vec![
                (b"a/1".to_vec(), b"one".to_vec()),
                (b"a/2".to_vec(), b"two".to_vec()),
                (b"b/1".to_vec(), b"other".to_vec()),
            ])
            .unwrap();

        assert_eq!(store.get(b"a/1").unwrap(), Some(b"one".to_vec()));
        assert_eq!(store.get(b"a/3").unwrap(), None);

        let scanned = store.scan_prefix(b"a/").unwrap();
        assert_eq!(
            scanned,
            vec![
                (b"a/1".to_vec(), b"one".to_vec()),
                (b"a/2".to_vec(), b"two".to_vec()),
            ]
        );

        store
            .write_batch(vec![(b"a/1".to_vec(), b"uno".to_vec())])
            .unwrap();
        assert_eq!(store.get(b"a/1").unwrap(), Some(b"uno".to_vec()));
    }

    #[test]
    fn test_memory_store_operations() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        exercise_store(&store);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_rocks_store_operations() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test_db");
        let store = RocksStore::open_path(&db_path, &DatabaseConfig::default()).unwrap();
        exercise_store(&store);
    }

    #[test]
    fn test_rocks_store_survives_reopen() {
        let temp_dir = tempdir().unwrap();
        let config = DatabaseConfig {
            path: temp_dir.path().join("reopen_db").display().to_string(),
            ..Default::default()
        };

        {
            let store = RocksStore::open(&config).unwrap();
            store
                .write_batch(vec![(b"k".to_vec(), b"v".to_vec())])
                .unwrap();
        }

        let store = RocksStore::open(&config).unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
    }
}
