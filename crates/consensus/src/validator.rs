//! Block acceptance rules.
//!
//! A [`Validator`] decides whether a candidate block may extend the chain.
//! It only reads the chain through [`ChainView`], so policies can be
//! swapped without touching the chain itself.

use linkchain_core::{Block, BlockError, Hash, Header};
use thiserror::Error;

/// Errors that can occur during validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("block height {got} is not above chain height {current}")]
    HeightTooLow { current: u32, got: u32 },

    #[error("block height gap (expected {expected}, got {got})")]
    HeightGap { expected: u32, got: u32 },

    #[error("chain already contains a block at height {0}")]
    BlockExists(u32),

    #[error("prev_block_hash {got} does not match parent hash {expected}")]
    BrokenLink { expected: Hash, got: Hash },

    #[error("block has no signature")]
    MissingSignature,

    #[error("block has invalid signature")]
    InvalidSignature,
}

impl From<BlockError> for ValidationError {
    fn from(err: BlockError) -> Self {
        match err {
            BlockError::MissingSignature => ValidationError::MissingSignature,
            BlockError::InvalidSignature => ValidationError::InvalidSignature,
        }
    }
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Read-only view of committed chain state.
pub trait ChainView {
    /// Height of the newest committed block.
    fn height(&self) -> u32;

    /// Whether a block is committed at `height`.
    fn has_block(&self, height: u32) -> bool {
        height <= self.height()
    }

    /// Header committed at `height`.
    fn header(&self, height: u32) -> Option<Header>;
}

/// Acceptance policy for blocks extending a chain.
pub trait Validator: Send + Sync {
    /// Accept or reject `block` as the next block of `chain`. Must not have side effects.
    fn validate(&self, chain: &dyn ChainView, block: &Block) -> Result<()>;
}

/// Default policy: strictly sequential heights, intact parent link, valid signature.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockValidator;

impl BlockValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check that `block` sits exactly one above the chain head.
    pub fn validate_height(chain: &dyn ChainView, block: &Block) -> Result<()> {
        let current = chain.height();
        let got = block.height();

        if got <= current {
            return Err(ValidationError::HeightTooLow { current, got });
        }
        if got != current + 1 {
            return Err(ValidationError::HeightGap {
                expected: current + 1,
                got,
            });
        }
        if chain.has_block(got) {
            return Err(ValidationError::BlockExists(got));
        }
        Ok(())
    }

    /// Check that `block` links to the header right below it.
    pub fn validate_link(chain: &dyn ChainView, block: &Block) -> Result<()> {
        let got = block.header().prev_block_hash;
        let expected = block
            .height()
            .checked_sub(1)
            .and_then(|parent| chain.header(parent))
            .map(|parent| parent.hash())
            .unwrap_or(Hash::ZERO);

        if got != expected {
            return Err(ValidationError::BrokenLink { expected, got });
        }
        Ok(())
    }
}

impl Validator for BlockValidator {
    fn validate(&self, chain: &dyn ChainView, block: &Block) -> Result<()> {
        Self::validate_height(chain, block)?;
        Self::validate_link(chain, block)?;
        block.verify()?;
        Ok(())
    }
}
