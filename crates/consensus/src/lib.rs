//! Block acceptance policy for linkchain.
//!
//! There is no consensus algorithm here (no proof-of-work, no stake, no fork
//! choice). This crate only answers one question: may this block become the
//! next block of the chain?
//!
//! # Example
//!
//! ```rust,no_run
//! use linkchain_consensus::{BlockValidator, ChainView, Validator};
//! use linkchain_core::{Block, Header, Keypair};
//!
//! struct Headers(Vec<Header>);
//!
//! impl ChainView for Headers {
//!     fn height(&self) -> u32 {
//!         self.0.len() as u32 - 1
//!     }
//!     fn header(&self, height: u32) -> Option<Header> {
//!         self.0.get(height as usize).cloned()
//!     }
//! }
//!
//! let keypair = Keypair::generate();
//! let genesis = Block::genesis().signed(&keypair);
//! let chain = Headers(vec![genesis.header().clone()]);
//!
//! let block = Block::build(1, genesis.hash(), vec![]).signed(&keypair);
//! BlockValidator.validate(&chain, &block).unwrap();
//! ```

pub mod validator;

// Re-export commonly used types
pub use validator::{BlockValidator, ChainView, ValidationError, Validator};
