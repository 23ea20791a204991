//! Hashing strategies, kept apart from the entities they hash.
//!
//! Each strategy owns both the canonical encoding and the digest, so either
//! can change without touching [`Transaction`] or [`Header`].

use crate::block::Header;
use crate::crypto::PublicKey;
use crate::hash::{hash, Hash};
use crate::transaction::Transaction;
use sha2::{Digest, Sha256};
use std::any::TypeId;
use std::sync::OnceLock;

/// Computes the content hash of a `T`.
pub trait Hasher<T: ?Sized> {
    fn hash(&self, item: &T) -> Hash;
}

/// Blake3 over the canonical header encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockHasher;

impl Hasher<Header> for BlockHasher {
    fn hash(&self, header: &Header) -> Hash {
        hash(&header.to_bytes())
    }
}

/// Blake3 over data, recipient, value, sender and nonce, in that order.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionHasher;

impl Hasher<Transaction> for TransactionHasher {
    fn hash(&self, tx: &Transaction) -> Hash {
        hash(&transaction_bytes(tx))
    }
}

/// SHA-256 over the same header encoding as [`BlockHasher`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256BlockHasher;

impl Hasher<Header> for Sha256BlockHasher {
    fn hash(&self, header: &Header) -> Hash {
        sha256(&header.to_bytes())
    }
}

/// SHA-256 over the same transaction encoding as [`TransactionHasher`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256TransactionHasher;

impl Hasher<Transaction> for Sha256TransactionHasher {
    fn hash(&self, tx: &Transaction) -> Hash {
        sha256(&transaction_bytes(tx))
    }
}

fn sha256(data: &[u8]) -> Hash {
    Hash(Sha256::digest(data).into())
}

/// Set-once hash memo that remembers which strategy filled it.
///
/// A lookup through any other strategy is computed fresh and never returns
/// the memoized value.
#[derive(Debug, Clone, Default)]
pub(crate) struct HashCache(OnceLock<(TypeId, Hash)>);

impl HashCache {
    pub(crate) fn get_or_compute<H: 'static>(&self, compute: impl FnOnce() -> Hash) -> Hash {
        let strategy = TypeId::of::<H>();
        match self.0.get() {
            Some((filled_by, hash)) if *filled_by == strategy => *hash,
            Some(_) => compute(),
            None => {
                let hash = compute();
                // a concurrent fill keeps the first value
                let _ = self.0.set((strategy, hash));
                hash
            }
        }
    }
}

/// Canonical transaction encoding. Excludes the signature.
fn transaction_bytes(tx: &Transaction) -> Vec<u8> {
    let data = tx.data();
    let mut buf = Vec::with_capacity(8 + data.len() + 33 + 8 + 33 + 8);
    buf.extend_from_slice(&(data.len() as u64).to_le_bytes());
    buf.extend_from_slice(data);
    put_key(&mut buf, tx.to());
    buf.extend_from_slice(&tx.value().to_le_bytes());
    put_key(&mut buf, tx.from());
    buf.extend_from_slice(&tx.nonce().to_le_bytes());
    buf
}

fn put_key(buf: &mut Vec<u8>, key: Option<&PublicKey>) {
    match key {
        Some(key) => {
            buf.push(1);
            buf.extend_from_slice(&key.as_bytes());
        }
        None => buf.push(0),
    }
}
