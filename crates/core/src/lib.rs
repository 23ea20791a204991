//! Core ledger primitives for linkchain.
//!
//! This crate provides the content-addressed data model used throughout the ledger:
//! - Fixed-length identifiers (hashes, addresses)
//! - Ed25519 keypairs and signatures
//! - Pluggable hashing strategies
//! - Transactions
//! - Blocks and block headers

pub mod address;
pub mod block;
pub mod crypto;
pub mod hash;
pub mod hasher;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use address::{Address, ADDRESS_LENGTH};
pub use block::{Block, BlockError, Header, HEADER_VERSION};
pub use crypto::{CryptoError, Keypair, PublicKey, Signature};
pub use hash::{hash, hash_concat, Hash, H256};
pub use hasher::{BlockHasher, Hasher, Sha256BlockHasher, Sha256TransactionHasher, TransactionHasher};
pub use transaction::{Transaction, TransactionError};
