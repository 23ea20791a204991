//! Chain orchestration for linkchain.
//!
//! This crate brings the pieces together:
//! - **Blockchain**: validated, persisted, hash-indexed chain of blocks
//! - **TxPool**: bounded, deduplicating pool of pending transactions
//! - **Producer**: turns pending transactions into signed blocks
//! - **View**: JSON projections for read-only queries
//!
//! # Example
//!
//! ```rust,no_run
//! use linkchain_chain::{Blockchain, BlockProducer, ProducerConfig, TransactionPool};
//! use linkchain_core::{Block, Keypair, Transaction};
//!
//! let keypair = Keypair::generate();
//! let genesis = Block::genesis().signed(&keypair);
//! let chain = Blockchain::with_memory_store(genesis).unwrap();
//!
//! let pool = TransactionPool::new(1000);
//! pool.add(Transaction::new(b"hello".to_vec()).signed(&keypair));
//!
//! let producer = BlockProducer::new(keypair, ProducerConfig::default());
//! let block = producer.produce(&chain, &pool).unwrap();
//! assert_eq!(chain.height(), block.height());
//! ```

pub mod blockchain;
pub mod config;
pub mod producer;
pub mod txpool;
pub mod view;

// Re-export commonly used types
pub use blockchain::{Blockchain, BlockchainError, Result};
pub use config::{ChainConfig, ConfigError, PoolConfig, ProducerConfig};
pub use producer::BlockProducer;
pub use txpool::{TransactionPool, TransactionSortedMap};
pub use view::{BlockSummary, HeaderView, TransactionView};
