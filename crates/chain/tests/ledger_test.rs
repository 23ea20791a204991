use linkchain_chain::{BlockProducer, Blockchain, BlockchainError, ProducerConfig, TransactionPool};
use linkchain_consensus::ValidationError;
use linkchain_core::{Block, Hash, Keypair, Transaction};
use linkchain_storage::{BlockStore, ChainStore, Storage};
use std::sync::Arc;
use std::thread;

fn new_chain(keypair: &Keypair) -> Blockchain {
    Blockchain::with_memory_store(Block::genesis().signed(keypair)).unwrap()
}

#[test]
fn test_genesis() {
    let keypair = Keypair::generate();
    let genesis = Block::genesis().signed(&keypair);
    let chain = Blockchain::with_memory_store(genesis.clone()).unwrap();

    assert_eq!(chain.height(), 0);
    assert_eq!(chain.get_header(0).unwrap(), *genesis.header());
    assert_eq!(chain.get_block_by_hash(&genesis.hash()).unwrap().height(), 0);
    assert!(genesis.header().prev_block_hash.is_zero());
}

#[test]
fn test_broken_link_rejected() {
    let keypair = Keypair::generate();
    let chain = new_chain(&keypair);
    let good = Block::build(1, chain.head().hash(), vec![]).signed(&keypair);
    chain.add_block(good).unwrap();

    // height 2 pointing at genesis instead of block 1
    let genesis_hash = chain.get_header(0).unwrap().hash();
    let bad = Block::build(2, genesis_hash, vec![]).signed(&keypair);

    match chain.add_block(bad) {
        Err(BlockchainError::Validation(ValidationError::BrokenLink { expected, got })) => {
            assert_eq!(expected, chain.get_header(1).unwrap().hash());
            assert_eq!(got, genesis_hash);
        }
        other => panic!("expected broken link, got {:?}", other),
    }
    assert_eq!(chain.height(), 1);
}

#[test]
fn test_tampered_transaction_detected() {
    let keypair = Keypair::generate();
    let tx = Transaction::new(b"pay 10".to_vec()).signed(&keypair);
    assert!(tx.verify().is_ok());

    let tampered = tx.clone().with_value(1_000);
    assert!(tampered.verify().is_err());
    assert_ne!(tampered.hash(), tx.hash());
}

#[test]
fn test_producer_end_to_end() {
    let keypair = Keypair::generate();
    let chain = new_chain(&keypair);
    let pool = TransactionPool::new(100);
    let producer = BlockProducer::new(
        keypair,
        ProducerConfig {
            max_block_size: 10,
            ..ProducerConfig::default()
        },
    );

    let mut all = Vec::new();
    for round in 0..5 {
        for _ in 0..7 {
            let tx = Transaction::random(64).signed(producer.keypair());
            all.push(tx.clone());
            pool.add(tx);
        }
        let block = producer.produce(&chain, &pool).unwrap();
        assert_eq!(block.height(), round + 1);
    }

    assert_eq!(chain.height(), 5);
    assert_eq!(pool.pending_count(), 0);
    for tx in &all {
        assert_eq!(chain.get_transaction_by_hash(&tx.hash()).unwrap(), *tx);
        // still remembered for dedup
        assert!(!pool.add(tx.clone()));
    }
}

#[test]
fn test_concurrent_producers_and_readers() {
    let keypair = Keypair::generate();
    let chain = Arc::new(new_chain(&keypair));
    let keypair = Arc::new(keypair);

    let producers: Vec<_> = (0..4)
        .map(|_| {
            let chain = Arc::clone(&chain);
            let keypair = Arc::clone(&keypair);
            thread::spawn(move || {
                let mut accepted = 0;
                for _ in 0..50 {
                    let head = chain.head();
                    let block = Block::build(head.height() + 1, head.hash(), vec![]).signed(&keypair);
                    if chain.add_block(block).is_ok() {
                        accepted += 1;
                    }
                }
                accepted
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let chain = Arc::clone(&chain);
            thread::spawn(move || {
                for _ in 0..200 {
                    let height = chain.height();
                    let header = chain.get_header(height).unwrap();
                    assert_eq!(header.height, height);
                    assert!(chain.get_header(height + 1000).is_err());
                }
            })
        })
        .collect();

    let accepted: u32 = producers.into_iter().map(|h| h.join().unwrap()).sum();
    for reader in readers {
        reader.join().unwrap();
    }

    // every accepted block got its own height
    assert_eq!(chain.height(), accepted);
    for height in 1..=chain.height() {
        let header = chain.get_header(height).unwrap();
        assert_eq!(header.prev_block_hash, chain.get_header(height - 1).unwrap().hash());
    }
}

#[test]
fn test_restore_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let keypair = Keypair::generate();
    let pool = TransactionPool::new(100);

    // one handle per path: sled keeps its file lock until every clone is gone
    let storage = Storage::open(dir.path()).unwrap();

    let head = {
        let store = ChainStore::new(storage.clone());
        let chain = Blockchain::new(Block::genesis().signed(&keypair), store).unwrap();
        let producer = BlockProducer::new(keypair, ProducerConfig::default());
        for _ in 0..3 {
            pool.add(Transaction::random(32).signed(producer.keypair()));
            producer.produce(&chain, &pool).unwrap();
        }
        chain.head().hash()
    };

    let store = ChainStore::new(storage);
    assert_eq!(store.blocks().unwrap().len(), 4);

    let chain = Blockchain::restore(store).unwrap();
    assert_eq!(chain.height(), 3);
    assert_eq!(chain.head().hash(), head);
    assert_eq!(chain.get_block(2).unwrap().tx_count(), 1);
}

#[test]
fn test_restore_then_extend() {
    let keypair = Keypair::generate();
    let storage = Storage::open_temporary().unwrap();

    let chain = Blockchain::new(
        Block::genesis().signed(&keypair),
        ChainStore::new(storage.clone()),
    )
    .unwrap();
    chain
        .add_block(Block::build(1, chain.head().hash(), vec![]).signed(&keypair))
        .unwrap();
    drop(chain);

    let chain = Blockchain::restore(ChainStore::new(storage.clone())).unwrap();
    chain
        .add_block(Block::build(2, chain.head().hash(), vec![]).signed(&keypair))
        .unwrap();

    let store = ChainStore::new(storage);
    assert_eq!(store.get_height().unwrap(), Some(2));
    assert_eq!(store.get_head().unwrap(), Some(chain.head().hash()));
}

#[test]
fn test_summary_json() {
    let keypair = Keypair::generate();
    let chain = new_chain(&keypair);
    let tx = Transaction::new(b"payload".to_vec()).signed(&keypair);
    chain
        .add_block(Block::build(1, chain.head().hash(), vec![tx.clone()]).signed(&keypair))
        .unwrap();

    let json = serde_json::to_value(chain.summary(1).unwrap()).unwrap();
    assert_eq!(json["header"]["height"], 1);
    assert_eq!(json["tx_count"], 1);
    assert_eq!(json["transactions"][0], tx.hash().to_hex());
    assert_eq!(json["hash"], chain.head().hash().to_hex());
    assert_ne!(json["header"]["prev_block_hash"], Hash::ZERO.to_hex());
}
