//! The durability sink the chain writes committed blocks into.

use crate::db::Result;
use linkchain_core::Block;
use parking_lot::Mutex;

/// Where committed blocks go.
///
/// `put` is called once per block, in height order, before the block becomes
/// visible in memory. An error aborts that commit.
pub trait BlockStore: Send + Sync {
    /// Persist a committed block.
    fn put(&self, block: &Block) -> Result<()>;

    /// Every persisted block, ordered by height.
    fn blocks(&self) -> Result<Vec<Block>>;
}

/// Keeps blocks in memory. The default sink for tests and throwaway chains.
#[derive(Default)]
pub struct MemoryStore {
    blocks: Mutex<Vec<Block>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blocks.
    pub fn len(&self) -> usize {
        self.blocks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.lock().is_empty()
    }
}

impl BlockStore for MemoryStore {
    fn put(&self, block: &Block) -> Result<()> {
        self.blocks.lock().push(block.clone());
        Ok(())
    }

    fn blocks(&self) -> Result<Vec<Block>> {
        Ok(self.blocks.lock().clone())
    }
}

impl<S: BlockStore + ?Sized> BlockStore for std::sync::Arc<S> {
    fn put(&self, block: &Block) -> Result<()> {
        (**self).put(block)
    }

    fn blocks(&self) -> Result<Vec<Block>> {
        (**self).blocks()
    }
}
