//! Transaction types and signing.

use crate::crypto::{Keypair, PublicKey, Signature};
use crate::hash::Hash;
use crate::hasher::{HashCache, Hasher, TransactionHasher};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during transaction operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("transaction has no signature")]
    MissingSignature,
    #[error("invalid transaction signature")]
    InvalidSignature,
}

/// A signed unit of ledger intent: an opaque payload plus an optional transfer.
///
/// Signable fields are private. They can only be set through the consuming
/// `with_*` builders, each of which drops any memoized hash, so a cached hash
/// always describes the fields it was computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Arbitrary payload.
    data: Vec<u8>,
    /// Signer, set by [`Transaction::sign`].
    from: Option<PublicKey>,
    /// Recipient of `value`, if any.
    to: Option<PublicKey>,
    /// Amount transferred to `to`.
    value: u64,
    /// Disambiguates otherwise identical transactions.
    nonce: i64,
    signature: Option<Signature>,
    #[serde(skip)]
    cached_hash: HashCache,
}

impl Transaction {
    /// Create an unsigned transaction carrying `data`, with a random nonce.
    pub fn new(data: Vec<u8>) -> Self {
        let nonce = rand::thread_rng().gen_range(0..1_000_000_000_000_000i64);
        Self {
            data,
            from: None,
            to: None,
            value: 0,
            nonce,
            signature: None,
            cached_hash: HashCache::default(),
        }
    }

    /// Create an unsigned value transfer to `to`.
    pub fn transfer(to: PublicKey, value: u64) -> Self {
        Self::new(Vec::new()).with_to(to).with_value(value)
    }

    /// Create an unsigned transaction with `size` random payload bytes.
    pub fn random(size: usize) -> Self {
        let mut data = vec![0u8; size];
        rand::thread_rng().fill(data.as_mut_slice());
        Self::new(data)
    }

    /// Set the recipient.
    pub fn with_to(mut self, to: PublicKey) -> Self {
        self.to = Some(to);
        self.invalidate();
        self
    }

    /// Set the transferred value.
    pub fn with_value(mut self, value: u64) -> Self {
        self.value = value;
        self.invalidate();
        self
    }

    /// Set the nonce.
    pub fn with_nonce(mut self, nonce: i64) -> Self {
        self.nonce = nonce;
        self.invalidate();
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn from(&self) -> Option<&PublicKey> {
        self.from.as_ref()
    }

    pub fn to(&self) -> Option<&PublicKey> {
        self.to.as_ref()
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn nonce(&self) -> i64 {
        self.nonce
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// Content hash under the default [`TransactionHasher`].
    pub fn hash(&self) -> Hash {
        self.hash_with(&TransactionHasher)
    }

    /// Content hash under `hasher`, computed on first call and memoized.
    ///
    /// Only the first strategy used is memoized. Any other strategy is
    /// recomputed on every call, so [`Transaction::hash`] always yields the
    /// default digest.
    pub fn hash_with<H: Hasher<Transaction> + 'static>(&self, hasher: &H) -> Hash {
        self.cached_hash.get_or_compute::<H>(|| hasher.hash(self))
    }

    /// Sign the transaction, recording the signer's public key as `from`.
    pub fn sign(&mut self, keypair: &Keypair) {
        self.from = Some(keypair.public_key);
        self.invalidate();
        let hash = self.hash();
        self.signature = Some(keypair.sign_hash(&hash));
    }

    /// Create a signed transaction.
    pub fn signed(mut self, keypair: &Keypair) -> Self {
        self.sign(keypair);
        self
    }

    /// Check the signature against `from` and the current field values.
    pub fn verify(&self) -> Result<(), TransactionError> {
        let signature = self
            .signature
            .as_ref()
            .ok_or(TransactionError::MissingSignature)?;
        let from = self.from.as_ref().ok_or(TransactionError::MissingSignature)?;

        // recompute: never trust the cache for authentication
        let hash = TransactionHasher.hash(self);
        from.verify(hash.as_bytes(), signature)
            .map_err(|_| TransactionError::InvalidSignature)
    }

    fn invalidate(&mut self) {
        self.cached_hash = HashCache::default();
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
            && self.from == other.from
            && self.to == other.to
            && self.value == other.value
            && self.nonce == other.nonce
            && self.signature == other.signature
    }
}

impl Eq for Transaction {}
