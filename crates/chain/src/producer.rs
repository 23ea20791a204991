//! Block production: pending transactions in, signed blocks out.

use crate::blockchain::{Blockchain, Result};
use crate::config::ProducerConfig;
use crate::txpool::TransactionPool;
use linkchain_core::{Block, Header, Keypair, HEADER_VERSION};
use tracing::{debug, info};

/// Builds, signs and submits blocks on behalf of one signer.
pub struct BlockProducer {
    keypair: Keypair,
    config: ProducerConfig,
    version: u32,
}

impl BlockProducer {
    pub fn new(keypair: Keypair, config: ProducerConfig) -> Self {
        Self {
            keypair,
            config,
            version: HEADER_VERSION,
        }
    }

    /// Stamp produced headers with `version` instead of [`HEADER_VERSION`].
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn config(&self) -> &ProducerConfig {
        &self.config
    }

    /// Seal up to `max_block_size` pending transactions into the next block.
    ///
    /// The block extends the current head. If the chain rejects it, the
    /// transactions go back to the pool.
    pub fn produce(&self, chain: &Blockchain, pool: &TransactionPool) -> Result<Block> {
        let transactions = pool.take_pending(self.config.max_block_size);
        let head = chain.head();

        let header = Header::new(
            self.version,
            Block::data_hash(&transactions),
            head.hash(),
            Header::current_timestamp(),
            head.height() + 1,
        );
        let block = Block::new(header, transactions).signed(&self.keypair);
        debug!(height = block.height(), txs = block.tx_count(), "sealed block");

        match chain.add_block(block.clone()) {
            Ok(()) => {
                info!(
                    height = block.height(),
                    hash = %block.hash(),
                    pending = pool.pending_count(),
                    "produced block"
                );
                Ok(block)
            }
            Err(err) => {
                pool.requeue(block.into_transactions());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::BlockchainError;
    use linkchain_consensus::ValidationError;
    use linkchain_core::Transaction;

    fn setup() -> (Blockchain, TransactionPool, BlockProducer) {
        let keypair = Keypair::generate();
        let chain = Blockchain::with_memory_store(Block::genesis().signed(&keypair)).unwrap();
        let config = ProducerConfig {
            max_block_size: 3,
            ..ProducerConfig::default()
        };
        (chain, TransactionPool::new(100), BlockProducer::new(keypair, config))
    }

    #[test]
    fn test_produce_empty_block() {
        let (chain, pool, producer) = setup();
        let block = producer.produce(&chain, &pool).unwrap();

        assert_eq!(block.height(), 1);
        assert_eq!(block.tx_count(), 0);
        assert_eq!(chain.height(), 1);
        assert_eq!(block.validator(), Some(&producer.keypair().public_key));
    }

    #[test]
    fn test_produce_respects_block_size() {
        let (chain, pool, producer) = setup();
        let txs: Vec<Transaction> = (0..5)
            .map(|_| Transaction::random(32).signed(producer.keypair()))
            .collect();
        for tx in &txs {
            pool.add(tx.clone());
        }

        let first = producer.produce(&chain, &pool).unwrap();
        assert_eq!(first.tx_count(), producer.config().max_block_size);
        assert_eq!(first.transactions(), &txs[..3]);
        assert_eq!(pool.pending(), txs[3..].to_vec());

        let second = producer.produce(&chain, &pool).unwrap();
        assert_eq!(second.transactions(), &txs[3..]);
        assert_eq!(second.header().prev_block_hash, first.hash());
        assert_eq!(pool.pending_count(), 0);

        for tx in &txs {
            assert!(chain.get_transaction_by_hash(&tx.hash()).is_ok());
        }
    }

    #[test]
    fn test_rejected_block_requeues() {
        struct Closed;
        impl linkchain_consensus::Validator for Closed {
            fn validate(
                &self,
                _: &dyn linkchain_consensus::ChainView,
                _: &Block,
            ) -> linkchain_consensus::validator::Result<()> {
                Err(ValidationError::InvalidSignature)
            }
        }

        let (chain, pool, producer) = setup();
        chain.set_validator(Closed);
        let tx = Transaction::random(8).signed(producer.keypair());
        pool.add(tx.clone());

        assert!(matches!(
            producer.produce(&chain, &pool),
            Err(BlockchainError::Validation(ValidationError::InvalidSignature))
        ));
        assert_eq!(chain.height(), 0);
        assert_eq!(pool.pending(), vec![tx]);
    }

    #[test]
    fn test_custom_header_version() {
        let (chain, pool, producer) = setup();
        let producer = producer.with_version(7);
        let block = producer.produce(&chain, &pool).unwrap();
        assert_eq!(chain.get_header(1).unwrap().version, 7);
        assert_eq!(block.header().version, 7);
    }
}
