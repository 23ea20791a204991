//! sled-backed block store.

use crate::db::{Key, Result, Storage, StorageError, WriteBatch};
use crate::store::BlockStore;
use linkchain_core::{Block, Hash};

/// Persists blocks to sled, indexed by hash and by height.
#[derive(Clone)]
pub struct ChainStore {
    storage: Storage,
}

impl ChainStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Append a block, which must sit directly on top of the stored head.
    ///
    /// The block, its height index entry and the new head are written in one
    /// batch and flushed before returning.
    pub fn append_block(&self, block: &Block) -> Result<()> {
        let expected = self.get_height()?.map_or(0, |height| height + 1);
        if block.height() != expected {
            return Err(StorageError::Rejected(format!(
                "expected block height {}, got {}",
                expected,
                block.height()
            )));
        }

        let hash = block.hash();
        let mut batch = WriteBatch::new();
        batch
            .put(Key::Block(hash), block)?
            .put(Key::Height(block.height()), &hash)?
            .put(Key::Head, &hash)?
            .put(Key::ChainHeight, &block.height())?;
        self.storage.write(batch)?;
        self.storage.flush()
    }

    pub fn get_block_by_hash(&self, hash: &Hash) -> Result<Option<Block>> {
        self.storage.get(Key::Block(*hash))
    }

    /// Resolve `height` through the height index, then load the block.
    pub fn get_block_by_height(&self, height: u32) -> Result<Option<Block>> {
        match self.storage.get::<Hash>(Key::Height(height))? {
            Some(hash) => self.get_block_by_hash(&hash),
            None => Ok(None),
        }
    }

    pub fn has_block(&self, hash: &Hash) -> Result<bool> {
        self.storage.contains(Key::Block(*hash))
    }

    /// Hash of the newest stored block.
    pub fn get_head(&self) -> Result<Option<Hash>> {
        self.storage.get(Key::Head)
    }

    /// Height of the newest stored block, `None` before genesis is stored.
    pub fn get_height(&self) -> Result<Option<u32>> {
        self.storage.get(Key::ChainHeight)
    }

    /// Whether a genesis block has been stored.
    pub fn is_initialized(&self) -> Result<bool> {
        Ok(self.get_head()?.is_some())
    }

    /// Blocks from `from_height` up to the stored head, in height order.
    ///
    /// A gap in the height index or a dangling hash means the database is corrupt.
    pub fn blocks_from(&self, from_height: u32) -> Result<Vec<Block>> {
        let mut blocks = Vec::new();
        let mut expected = from_height;
        for entry in self.storage.hashes_from(from_height) {
            let (height, hash) = entry?;
            if height != expected {
                return Err(StorageError::CorruptChain(format!(
                    "missing block at height {}",
                    expected
                )));
            }
            let block = self.get_block_by_hash(&hash)?.ok_or_else(|| {
                StorageError::CorruptChain(format!("height {} points at missing block {}", height, hash))
            })?;
            blocks.push(block);
            expected += 1;
        }
        Ok(blocks)
    }
}

impl BlockStore for ChainStore {
    fn put(&self, block: &Block) -> Result<()> {
        self.append_block(block)
    }

    fn blocks(&self) -> Result<Vec<Block>> {
        self.blocks_from(0)
    }
}
