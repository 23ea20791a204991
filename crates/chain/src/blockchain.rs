//! The canonical chain.
//!
//! Blocks are kept in height order, indexed by hash, and every transaction
//! they carry is indexed by its own hash. Each append is gated by a
//! [`Validator`] and persisted to a [`BlockStore`] before it becomes visible.

use crate::view::BlockSummary;
use linkchain_consensus::{BlockValidator, ChainView, ValidationError, Validator};
use linkchain_core::{Block, Hash, Header, Transaction};
use linkchain_storage::{BlockStore, MemoryStore, StorageError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("given height ({height}) too high (current {current})")]
    HeightTooHigh { height: u32, current: u32 },

    #[error("block not found: {0}")]
    BlockNotFound(Hash),

    #[error("transaction not found: {0}")]
    TransactionNotFound(Hash),

    #[error("block store is empty")]
    EmptyStore,

    #[error("stored block at height {height} is invalid: {source}")]
    CorruptStore {
        height: u32,
        #[source]
        source: ValidationError,
    },
}

pub type Result<T> = std::result::Result<T, BlockchainError>;

/// In-memory chain state. Never empty: index 0 is genesis.
struct ChainState {
    headers: Vec<Header>,
    blocks: Vec<Arc<Block>>,
    block_index: HashMap<Hash, usize>,
    /// tx hash → (block height, position in block)
    tx_index: HashMap<Hash, (usize, usize)>,
}

impl ChainState {
    fn new(genesis: Block) -> Self {
        let mut state = Self {
            headers: Vec::new(),
            blocks: Vec::new(),
            block_index: HashMap::new(),
            tx_index: HashMap::new(),
        };
        state.commit(genesis);
        state
    }

    fn commit(&mut self, block: Block) {
        let height = self.blocks.len();
        for (pos, tx) in block.transactions().iter().enumerate() {
            self.tx_index.insert(tx.hash(), (height, pos));
        }
        self.block_index.insert(block.hash(), height);
        self.headers.push(block.header().clone());
        self.blocks.push(Arc::new(block));
    }

    fn head(&self) -> Arc<Block> {
        Arc::clone(&self.blocks[self.blocks.len() - 1])
    }

    fn check_height(&self, height: u32) -> Result<usize> {
        let current = ChainView::height(self);
        if height > current {
            return Err(BlockchainError::HeightTooHigh { height, current });
        }
        Ok(height as usize)
    }
}

impl ChainView for ChainState {
    fn height(&self) -> u32 {
        (self.headers.len() - 1) as u32
    }

    fn header(&self, height: u32) -> Option<Header> {
        self.headers.get(height as usize).cloned()
    }
}

/// Append-only, validated, persisted chain of blocks.
///
/// Safe to share between threads behind an `Arc`: readers take a shared lock,
/// [`Blockchain::add_block`] takes the exclusive one for validate, persist and
/// commit.
pub struct Blockchain {
    state: RwLock<ChainState>,
    /// Always locked before `state`.
    validator: RwLock<Box<dyn Validator>>,
    store: Box<dyn BlockStore>,
}

impl Blockchain {
    /// Start a chain from `genesis`.
    ///
    /// Genesis is not validated, only persisted.
    pub fn new<S: BlockStore + 'static>(genesis: Block, store: S) -> Result<Self> {
        store.put(&genesis)?;
        info!(hash = %genesis.hash(), "genesis committed");
        Ok(Self::from_parts(ChainState::new(genesis), Box::new(store)))
    }

    /// Start a chain from `genesis` backed by a [`MemoryStore`].
    pub fn with_memory_store(genesis: Block) -> Result<Self> {
        Self::new(genesis, MemoryStore::new())
    }

    /// Rebuild a chain from the blocks already persisted in `store`.
    ///
    /// The first block is trusted as genesis. Every later block is re-checked
    /// with [`BlockValidator`]. Nothing is written back to the store.
    pub fn restore<S: BlockStore + 'static>(store: S) -> Result<Self> {
        let mut blocks = store.blocks()?.into_iter();
        let genesis = blocks.next().ok_or(BlockchainError::EmptyStore)?;

        let mut state = ChainState::new(genesis);
        for block in blocks {
            let height = block.height();
            BlockValidator
                .validate(&state, &block)
                .map_err(|source| BlockchainError::CorruptStore { height, source })?;
            state.commit(block);
        }

        info!(height = ChainView::height(&state), head = %state.head().hash(), "chain restored");
        Ok(Self::from_parts(state, Box::new(store)))
    }

    fn from_parts(state: ChainState, store: Box<dyn BlockStore>) -> Self {
        Self {
            state: RwLock::new(state),
            validator: RwLock::new(Box::new(BlockValidator::new())),
            store,
        }
    }

    /// Replace the acceptance policy.
    pub fn set_validator<V: Validator + 'static>(&self, validator: V) {
        *self.validator.write() = Box::new(validator);
    }

    /// Validate `block` against the current head and append it.
    ///
    /// The block is persisted before it is committed in memory. On any error
    /// the chain is left unchanged.
    pub fn add_block(&self, block: Block) -> Result<()> {
        let validator = self.validator.read();
        let mut state = self.state.write();

        if let Err(err) = validator.validate(&*state, &block) {
            warn!(height = block.height(), hash = %block.hash(), error = %err, "block rejected");
            return Err(err.into());
        }

        self.store.put(&block)?;

        let height = block.height();
        let hash = block.hash();
        let txs = block.tx_count();
        state.commit(block);
        info!(height, %hash, txs, "block committed");
        Ok(())
    }

    /// Block at `height`.
    pub fn get_block(&self, height: u32) -> Result<Arc<Block>> {
        let state = self.state.read();
        let index = state.check_height(height)?;
        Ok(Arc::clone(&state.blocks[index]))
    }

    /// Header at `height`.
    pub fn get_header(&self, height: u32) -> Result<Header> {
        let state = self.state.read();
        let index = state.check_height(height)?;
        Ok(state.headers[index].clone())
    }

    pub fn get_block_by_hash(&self, hash: &Hash) -> Result<Arc<Block>> {
        let state = self.state.read();
        state
            .block_index
            .get(hash)
            .map(|&index| Arc::clone(&state.blocks[index]))
            .ok_or(BlockchainError::BlockNotFound(*hash))
    }

    /// Any committed transaction, looked up by its hash.
    pub fn get_transaction_by_hash(&self, hash: &Hash) -> Result<Transaction> {
        let state = self.state.read();
        state
            .tx_index
            .get(hash)
            .and_then(|&(block, pos)| state.blocks[block].transactions().get(pos).cloned())
            .ok_or(BlockchainError::TransactionNotFound(*hash))
    }

    pub fn has_block(&self, height: u32) -> bool {
        ChainView::has_block(&*self.state.read(), height)
    }

    /// Height of the newest block. Genesis is height 0.
    pub fn height(&self) -> u32 {
        ChainView::height(&*self.state.read())
    }

    /// The newest block.
    pub fn head(&self) -> Arc<Block> {
        self.state.read().head()
    }

    /// JSON-ready projection of the block at `height`.
    pub fn summary(&self, height: u32) -> Result<BlockSummary> {
        let block = self.get_block(height)?;
        debug!(height, "building block summary");
        Ok(BlockSummary::from(block.as_ref()))
    }
}

impl ChainView for Blockchain {
    fn height(&self) -> u32 {
        Blockchain::height(self)
    }

    fn has_block(&self, height: u32) -> bool {
        Blockchain::has_block(self, height)
    }

    fn header(&self, height: u32) -> Option<Header> {
        self.get_header(height).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkchain_core::Keypair;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn setup_blockchain() -> (Blockchain, Keypair) {
        let keypair = Keypair::generate();
        let genesis = Block::genesis().signed(&keypair);
        let chain = Blockchain::with_memory_store(genesis).unwrap();
        (chain, keypair)
    }

    fn next_block(chain: &Blockchain, keypair: &Keypair, txs: Vec<Transaction>) -> Block {
        Block::build(chain.height() + 1, chain.head().hash(), txs).signed(keypair)
    }

    #[test]
    fn test_blockchain_init() {
        let keypair = Keypair::generate();
        let genesis = Block::genesis().signed(&keypair);
        let chain = Blockchain::with_memory_store(genesis.clone()).unwrap();

        assert_eq!(chain.height(), 0);
        assert!(chain.has_block(0));
        assert!(!chain.has_block(1));
        assert_eq!(chain.get_header(0).unwrap(), *genesis.header());
        assert_eq!(*chain.head(), genesis);
    }

    #[test]
    fn test_add_blocks() {
        let (chain, keypair) = setup_blockchain();

        for i in 1..=100 {
            let block = next_block(&chain, &keypair, vec![]);
            chain.add_block(block).unwrap();
            assert_eq!(chain.height(), i);
        }

        let header = chain.get_header(50).unwrap();
        assert_eq!(header.height, 50);
        assert_eq!(header.prev_block_hash, chain.get_header(49).unwrap().hash());
    }

    #[test]
    fn test_add_block_too_high() {
        let (chain, keypair) = setup_blockchain();

        chain.add_block(next_block(&chain, &keypair, vec![])).unwrap();
        let skipped = Block::build(3, chain.head().hash(), vec![]).signed(&keypair);

        assert!(matches!(
            chain.add_block(skipped),
            Err(BlockchainError::Validation(ValidationError::HeightGap { .. }))
        ));
        assert_eq!(chain.height(), 1);
    }

    #[test]
    fn test_add_block_with_broken_link() {
        let (chain, keypair) = setup_blockchain();
        let block = Block::build(1, Hash::ZERO, vec![]).signed(&keypair);

        assert!(matches!(
            chain.add_block(block),
            Err(BlockchainError::Validation(ValidationError::BrokenLink { .. }))
        ));
        assert_eq!(chain.height(), 0);
    }

    #[test]
    fn test_add_unsigned_block() {
        let (chain, _) = setup_blockchain();
        let block = Block::build(1, chain.head().hash(), vec![]);

        assert!(matches!(
            chain.add_block(block),
            Err(BlockchainError::Validation(ValidationError::MissingSignature))
        ));
        assert_eq!(chain.height(), 0);
    }

    #[test]
    fn test_get_header_too_high() {
        let (chain, _) = setup_blockchain();
        assert!(matches!(
            chain.get_header(1),
            Err(BlockchainError::HeightTooHigh { height: 1, current: 0 })
        ));
        assert!(matches!(
            chain.get_block(7),
            Err(BlockchainError::HeightTooHigh { height: 7, current: 0 })
        ));
    }

    #[test]
    fn test_indexes_use_default_hash_after_alternate_strategy() {
        use linkchain_core::{Sha256BlockHasher, Sha256TransactionHasher};

        let (chain, keypair) = setup_blockchain();
        let tx = Transaction::new(b"hello".to_vec()).signed(&keypair);
        let block = next_block(&chain, &keypair, vec![tx.clone()]);
        let header_hash = block.header().hash();

        // fill both memos with SHA-256 before the chain sees them
        let sha_block = block.hash_with(&Sha256BlockHasher);
        let sha_tx = block.transactions()[0].hash_with(&Sha256TransactionHasher);
        chain.add_block(block).unwrap();

        assert_eq!(chain.get_block_by_hash(&header_hash).unwrap().height(), 1);
        assert!(chain.get_block_by_hash(&sha_block).is_err());
        assert_eq!(chain.get_transaction_by_hash(&tx.hash()).unwrap(), tx);
        assert!(chain.get_transaction_by_hash(&sha_tx).is_err());

        let child = next_block(&chain, &keypair, vec![]);
        assert_eq!(child.header().prev_block_hash, header_hash);
        chain.add_block(child).unwrap();
    }

    #[test]
    fn test_lookups_by_hash() {
        let (chain, keypair) = setup_blockchain();
        let tx = Transaction::new(b"hello".to_vec()).signed(&keypair);
        let block = next_block(&chain, &keypair, vec![tx.clone()]);
        let block_hash = block.hash();
        chain.add_block(block).unwrap();

        assert_eq!(chain.get_block_by_hash(&block_hash).unwrap().height(), 1);
        assert_eq!(chain.get_transaction_by_hash(&tx.hash()).unwrap(), tx);

        let missing = Hash::from_bytes([9u8; 32]);
        assert!(matches!(
            chain.get_block_by_hash(&missing),
            Err(BlockchainError::BlockNotFound(_))
        ));
        assert!(matches!(
            chain.get_transaction_by_hash(&missing),
            Err(BlockchainError::TransactionNotFound(_))
        ));
    }

    #[test]
    fn test_custom_validator() {
        struct RejectAll;
        impl Validator for RejectAll {
            fn validate(&self, _: &dyn ChainView, _: &Block) -> linkchain_consensus::validator::Result<()> {
                Err(ValidationError::MissingSignature)
            }
        }

        let (chain, keypair) = setup_blockchain();
        chain.set_validator(RejectAll);

        assert!(chain.add_block(next_block(&chain, &keypair, vec![])).is_err());
        assert_eq!(chain.height(), 0);

        chain.set_validator(BlockValidator::new());
        chain.add_block(next_block(&chain, &keypair, vec![])).unwrap();
        assert_eq!(chain.height(), 1);
    }

    struct FlakyStore {
        inner: MemoryStore,
        fail: AtomicBool,
    }

    impl BlockStore for FlakyStore {
        fn put(&self, block: &Block) -> linkchain_storage::Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(StorageError::Rejected("disk full".into()));
            }
            self.inner.put(block)
        }

        fn blocks(&self) -> linkchain_storage::Result<Vec<Block>> {
            self.inner.blocks()
        }
    }

    #[test]
    fn test_store_failure_leaves_chain_unchanged() {
        let keypair = Keypair::generate();
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            fail: AtomicBool::new(false),
        });
        let chain = Blockchain::new(Block::genesis().signed(&keypair), Arc::clone(&store)).unwrap();

        store.fail.store(true, Ordering::SeqCst);
        let tx = Transaction::random(8).signed(&keypair);
        let block = next_block(&chain, &keypair, vec![tx.clone()]);
        let hash = block.hash();

        assert!(matches!(chain.add_block(block.clone()), Err(BlockchainError::Storage(_))));
        assert_eq!(chain.height(), 0);
        assert!(chain.get_block_by_hash(&hash).is_err());
        assert!(chain.get_transaction_by_hash(&tx.hash()).is_err());

        store.fail.store(false, Ordering::SeqCst);
        chain.add_block(block).unwrap();
        assert_eq!(chain.height(), 1);
        assert_eq!(store.inner.len(), 2);
    }

    #[test]
    fn test_restore_from_store() {
        let keypair = Keypair::generate();
        let store = Arc::new(MemoryStore::new());
        let chain = Blockchain::new(Block::genesis().signed(&keypair), Arc::clone(&store)).unwrap();
        for _ in 0..5 {
            chain.add_block(next_block(&chain, &keypair, vec![])).unwrap();
        }

        let restored = Blockchain::restore(Arc::clone(&store)).unwrap();
        assert_eq!(restored.height(), 5);
        assert_eq!(restored.head().hash(), chain.head().hash());
        // restoring does not write back
        assert_eq!(store.len(), 6);
    }

    #[test]
    fn test_restore_empty_store() {
        assert!(matches!(
            Blockchain::restore(MemoryStore::new()),
            Err(BlockchainError::EmptyStore)
        ));
    }

    #[test]
    fn test_restore_rejects_broken_chain() {
        let keypair = Keypair::generate();
        let store = MemoryStore::new();
        store.put(&Block::genesis().signed(&keypair)).unwrap();
        store
            .put(&Block::build(1, Hash::ZERO, vec![]).signed(&keypair))
            .unwrap();

        assert!(matches!(
            Blockchain::restore(store),
            Err(BlockchainError::CorruptStore { height: 1, .. })
        ));
    }

    #[test]
    fn test_summary() {
        let (chain, keypair) = setup_blockchain();
        let tx = Transaction::random(16).signed(&keypair);
        chain.add_block(next_block(&chain, &keypair, vec![tx.clone()])).unwrap();

        let summary = chain.summary(1).unwrap();
        assert_eq!(summary.header.height, 1);
        assert_eq!(summary.transactions, vec![tx.hash().to_hex()]);
        assert!(chain.summary(2).is_err());
    }
}
