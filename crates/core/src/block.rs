//! Block and block header structures.

use crate::crypto::{Keypair, PublicKey, Signature};
use crate::hash::{hash_concat, Hash};
use crate::hasher::{BlockHasher, HashCache, Hasher};
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Header format version written by this crate.
pub const HEADER_VERSION: u32 = 1;

/// Errors that can occur while authenticating a block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("block has no signature")]
    MissingSignature,
    #[error("block has invalid signature")]
    InvalidSignature,
}

/// Per-block metadata. This is what gets hashed and signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub version: u32,
    /// Commitment to the block's transactions.
    pub data_hash: Hash,
    /// Hash of the parent header (zero for genesis).
    pub prev_block_hash: Hash,
    /// Unix timestamp in nanoseconds.
    pub timestamp: i64,
    /// Block height (0 for genesis).
    pub height: u32,
}

impl Header {
    pub fn new(
        version: u32,
        data_hash: Hash,
        prev_block_hash: Hash,
        timestamp: i64,
        height: u32,
    ) -> Self {
        Self {
            version,
            data_hash,
            prev_block_hash,
            timestamp,
            height,
        }
    }

    /// Canonical encoding: fixed-width little-endian fields in declaration order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(4 + 32 + 32 + 8 + 4);
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(self.data_hash.as_bytes());
        buf.extend_from_slice(self.prev_block_hash.as_bytes());
        buf.extend_from_slice(&self.timestamp.to_le_bytes());
        buf.extend_from_slice(&self.height.to_le_bytes());
        buf
    }

    /// Hash of this header under the default [`BlockHasher`].
    pub fn hash(&self) -> Hash {
        BlockHasher.hash(self)
    }

    /// Current Unix timestamp in nanoseconds.
    pub fn current_timestamp() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as i64)
            .unwrap_or_default()
    }
}

/// A header plus the ordered transactions it commits to, signed by its producer.
///
/// The block hash is the header hash: transactions are bound in through
/// `data_hash` only, so chain linkage can be checked from headers alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    header: Header,
    transactions: Vec<Transaction>,
    /// Public key of the signer.
    validator: Option<PublicKey>,
    /// Signature over the encoded header.
    signature: Option<Signature>,
    #[serde(skip)]
    cached_hash: HashCache,
}

impl Block {
    /// Create a new unsigned block.
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
            validator: None,
            signature: None,
            cached_hash: HashCache::default(),
        }
    }

    /// Create an unsigned block at `height` on top of `prev_block_hash`,
    /// committing to `transactions` and stamped with the current time.
    pub fn build(height: u32, prev_block_hash: Hash, transactions: Vec<Transaction>) -> Self {
        let header = Header::new(
            HEADER_VERSION,
            Self::data_hash(&transactions),
            prev_block_hash,
            Header::current_timestamp(),
            height,
        );
        Self::new(header, transactions)
    }

    /// Create an unsigned genesis block.
    pub fn genesis() -> Self {
        Self::build(0, Hash::ZERO, Vec::new())
    }

    /// Stand-in data commitment: blake3 over the concatenated transaction
    /// hashes, zero for an empty block.
    pub fn data_hash(transactions: &[Transaction]) -> Hash {
        if transactions.is_empty() {
            return Hash::ZERO;
        }
        let hashes: Vec<Hash> = transactions.iter().map(Transaction::hash).collect();
        let parts: Vec<&[u8]> = hashes.iter().map(|h| h.as_ref()).collect();
        hash_concat(&parts)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn validator(&self) -> Option<&PublicKey> {
        self.validator.as_ref()
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// Get the block height.
    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Get the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Block hash under the default [`BlockHasher`].
    pub fn hash(&self) -> Hash {
        self.hash_with(&BlockHasher)
    }

    /// Block hash under `hasher`, computed on first call and memoized.
    ///
    /// The memo belongs to the first strategy used; other strategies are
    /// recomputed.
    pub fn hash_with<H: Hasher<Header> + 'static>(&self, hasher: &H) -> Hash {
        self.cached_hash.get_or_compute::<H>(|| hasher.hash(&self.header))
    }

    /// Sign the encoded header and record the signer.
    pub fn sign(&mut self, keypair: &Keypair) {
        let signature = keypair.sign(&self.header.to_bytes());
        self.validator = Some(keypair.public_key);
        self.signature = Some(signature);
    }

    /// Create a signed block.
    pub fn signed(mut self, keypair: &Keypair) -> Self {
        self.sign(keypair);
        self
    }

    /// Attach a signature produced elsewhere (e.g. by a remote signer).
    pub fn with_signature(mut self, validator: PublicKey, signature: Signature) -> Self {
        self.validator = Some(validator);
        self.signature = Some(signature);
        self
    }

    /// Check the header signature against the recorded signer.
    pub fn verify(&self) -> Result<(), BlockError> {
        let signature = self.signature.as_ref().ok_or(BlockError::MissingSignature)?;
        let validator = self.validator.as_ref().ok_or(BlockError::MissingSignature)?;
        validator
            .verify(&self.header.to_bytes(), signature)
            .map_err(|_| BlockError::InvalidSignature)
    }

    /// Consume the block, returning its transactions.
    pub fn into_transactions(self) -> Vec<Transaction> {
        self.transactions
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header
            && self.transactions == other.transactions
            && self.validator == other.validator
            && self.signature == other.signature
    }
}

impl Eq for Block {}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_block(height: u32, prev: Hash) -> Block {
        let kp = Keypair::generate();
        let tx = Transaction::new(b"Hello World".to_vec()).signed(&kp);
        Block::build(height, prev, vec![tx])
    }

    #[test]
    fn test_genesis_block() {
        let genesis = Block::genesis();
        assert_eq!(genesis.height(), 0);
        assert_eq!(genesis.header().prev_block_hash, Hash::ZERO);
        assert_eq!(genesis.header().data_hash, Hash::ZERO);
        assert_eq!(genesis.header().version, HEADER_VERSION);
        assert!(genesis.transactions().is_empty());
    }

    #[test]
    fn test_block_hash_is_header_hash() {
        let block = random_block(1, Hash::ZERO);
        assert_eq!(block.hash(), block.header().hash());
        assert_eq!(block.hash(), block.hash());
    }

    #[test]
    fn test_alternate_strategy_does_not_replace_block_hash() {
        use crate::hasher::Sha256BlockHasher;

        let block = random_block(1, Hash::ZERO);
        let sha = block.hash_with(&Sha256BlockHasher);
        assert_eq!(sha, Sha256BlockHasher.hash(block.header()));
        assert_eq!(block.hash(), block.header().hash());
        assert_ne!(block.hash(), sha);
    }

    #[test]
    fn test_block_hash_ignores_body() {
        let block = random_block(1, Hash::ZERO);
        let same_header = Block::new(block.header().clone(), Vec::new());
        assert_eq!(block.hash(), same_header.hash());
    }

    #[test]
    fn test_sign_block() {
        let kp = Keypair::generate();
        let block = random_block(0, Hash::ZERO).signed(&kp);
        assert!(block.signature().is_some());
        assert_eq!(block.validator(), Some(&kp.public_key));
    }

    #[test]
    fn test_verify_block() {
        let kp = Keypair::generate();
        let mut block = random_block(0, Hash::ZERO);
        block.sign(&kp);
        assert!(block.verify().is_ok());

        block.header.height = 100;
        assert_eq!(block.verify(), Err(BlockError::InvalidSignature));
    }

    #[test]
    fn test_unsigned_block_fails_verification() {
        let block = random_block(0, Hash::ZERO);
        assert_eq!(block.verify(), Err(BlockError::MissingSignature));
    }

    #[test]
    fn test_foreign_signature_fails_verification() {
        let kp = Keypair::generate();
        let signed = random_block(1, Hash::ZERO).signed(&kp);
        let signature = *signed.signature().unwrap();

        let other = random_block(1, Hash::from_bytes([1u8; 32]))
            .with_signature(kp.public_key, signature);
        assert_eq!(other.verify(), Err(BlockError::InvalidSignature));

        let wrong_key = random_block(1, Hash::ZERO);
        let header = wrong_key.header().clone();
        let resigned = Block::new(header.clone(), Vec::new())
            .with_signature(Keypair::generate().public_key, kp.sign(&header.to_bytes()));
        assert_eq!(resigned.verify(), Err(BlockError::InvalidSignature));
    }

    #[test]
    fn test_data_hash_commits_to_transactions() {
        let kp = Keypair::generate();
        let tx1 = Transaction::new(b"a".to_vec()).signed(&kp);
        let tx2 = Transaction::new(b"b".to_vec()).signed(&kp);

        let forward = Block::data_hash(&[tx1.clone(), tx2.clone()]);
        let reversed = Block::data_hash(&[tx2, tx1]);
        assert_ne!(forward, reversed);
        assert!(!forward.is_zero());
        assert!(Block::data_hash(&[]).is_zero());
    }

    #[test]
    fn test_header_encoding_is_fixed_width() {
        let header = Header::new(1, Hash::ZERO, Hash::ZERO, 0, 0);
        assert_eq!(header.to_bytes().len(), 80);
    }
}
