//! Persistent storage layer for linkchain.
//!
//! The chain only needs a durability sink ([`BlockStore`]); this crate
//! provides two of them:
//! - [`MemoryStore`]: blocks kept in a vector, for tests and ephemeral chains
//! - [`ChainStore`]: blocks persisted to sled, indexed by hash and height
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              Blockchain (chain)             │
//! └──────────────────────┬──────────────────────┘
//!                        │ BlockStore::put
//! ┌──────────────────────▼──────────────────────┐
//! │  ┌─────────────┐   ┌─────────────────────┐  │
//! │  │ MemoryStore │   │ ChainStore          │  │
//! │  │  - Vec      │   │  - hash → block     │  │
//! │  │             │   │  - height → hash    │  │
//! │  │             │   │  - head / height    │  │
//! │  └─────────────┘   └──────────┬──────────┘  │
//! └───────────────────────────────┼─────────────┘
//!                   ┌─────────────▼─────────────┐
//!                   │ Storage (sled + bincode)  │
//!                   └───────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use linkchain_storage::{BlockStore, ChainStore, Storage};
//! use linkchain_core::{Block, Keypair};
//!
//! let storage = Storage::open("./ledger_data").unwrap();
//! let chain = ChainStore::new(storage);
//!
//! let genesis = Block::genesis().signed(&Keypair::generate());
//! chain.put(&genesis).unwrap();
//! ```

pub mod chain;
pub mod db;
pub mod store;

// Re-export commonly used types
pub use chain::ChainStore;
pub use db::{Key, Result, Storage, StorageError, WriteBatch};
pub use store::{BlockStore, MemoryStore};
