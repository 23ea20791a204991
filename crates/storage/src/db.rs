//! sled database wrapper with typed keys and bincode values.

use linkchain_core::Hash;
use serde::{de::DeserializeOwned, Serialize};
use sled::Db;
use std::path::Path;
use thiserror::Error;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Corrupt chain: {0}")]
    CorruptChain(String),

    #[error("Store rejected block: {0}")]
    Rejected(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

const BLOCK_PREFIX: &[u8] = b"b/";
const HEIGHT_PREFIX: &[u8] = b"h/";
const HEAD_KEY: &[u8] = b"meta/head";
const HEIGHT_KEY: &[u8] = b"meta/height";

/// Every key the ledger writes.
///
/// Heights are encoded big-endian so sled's byte order is height order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// hash → block
    Block(Hash),
    /// height → block hash
    Height(u32),
    /// hash of the newest stored block
    Head,
    /// height of the newest stored block
    ChainHeight,
}

impl Key {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Key::Block(hash) => [BLOCK_PREFIX, &hash.as_bytes()[..]].concat(),
            Key::Height(height) => [HEIGHT_PREFIX, &height.to_be_bytes()[..]].concat(),
            Key::Head => HEAD_KEY.to_vec(),
            Key::ChainHeight => HEIGHT_KEY.to_vec(),
        }
    }
}

/// Inserts collected in memory and applied in one atomic sled batch.
#[derive(Default)]
pub struct WriteBatch {
    inner: sled::Batch,
    len: usize,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `value` under `key`.
    pub fn put<V: Serialize>(&mut self, key: Key, value: &V) -> Result<&mut Self> {
        self.inner.insert(key.to_bytes(), bincode::serialize(value)?);
        self.len += 1;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Handle to a sled database.
///
/// Cloning is cheap: clones share the same underlying database.
#[derive(Clone)]
pub struct Storage {
    db: Db,
}

impl Storage {
    /// Open a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open an in-memory database (for testing).
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Store a single value.
    pub fn put<V: Serialize>(&self, key: Key, value: &V) -> Result<()> {
        self.db.insert(key.to_bytes(), bincode::serialize(value)?)?;
        Ok(())
    }

    pub fn get<V: DeserializeOwned>(&self, key: Key) -> Result<Option<V>> {
        self.db
            .get(key.to_bytes())?
            .map(|bytes| bincode::deserialize(&bytes))
            .transpose()
            .map_err(StorageError::from)
    }

    /// Like [`Storage::get`], but a missing key is an error.
    pub fn get_or_err<V: DeserializeOwned>(&self, key: Key) -> Result<V> {
        self.get(key)?
            .ok_or_else(|| StorageError::NotFound(format!("{:?}", key)))
    }

    pub fn contains(&self, key: Key) -> Result<bool> {
        Ok(self.db.contains_key(key.to_bytes())?)
    }

    /// Apply every queued insert atomically: either all land or none do.
    pub fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db.apply_batch(batch.inner)?;
        Ok(())
    }

    /// Block hashes in height order, starting at `from`.
    pub fn hashes_from(&self, from: u32) -> impl Iterator<Item = Result<(u32, Hash)>> + '_ {
        self.db
            .range(Key::Height(from).to_bytes()..)
            .take_while(|entry| match entry {
                Ok((key, _)) => key.starts_with(HEIGHT_PREFIX),
                Err(_) => true,
            })
            .map(|entry| {
                let (key, value) = entry?;
                let height = key[HEIGHT_PREFIX.len()..]
                    .try_into()
                    .map(u32::from_be_bytes)
                    .map_err(|_| {
                        StorageError::CorruptChain(format!("malformed height key {:?}", key))
                    })?;
                Ok((height, bincode::deserialize(&value)?))
            })
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}
