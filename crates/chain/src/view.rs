//! Read-only JSON projections of chain data.
//!
//! Hashes, keys and signatures are rendered as lowercase hex. Block summaries
//! list transaction hashes but never transaction payloads.

use linkchain_core::{Block, Header, Transaction};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderView {
    pub version: u32,
    pub data_hash: String,
    pub prev_block_hash: String,
    /// Unix nanoseconds.
    pub timestamp: i64,
    pub height: u32,
}

impl From<&Header> for HeaderView {
    fn from(header: &Header) -> Self {
        Self {
            version: header.version,
            data_hash: header.data_hash.to_hex(),
            prev_block_hash: header.prev_block_hash.to_hex(),
            timestamp: header.timestamp,
            height: header.height,
        }
    }
}

/// Block metadata plus the hashes of its transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub hash: String,
    pub header: HeaderView,
    pub validator: Option<String>,
    pub signature: Option<String>,
    pub tx_count: usize,
    pub transactions: Vec<String>,
}

impl From<&Block> for BlockSummary {
    fn from(block: &Block) -> Self {
        Self {
            hash: block.hash().to_hex(),
            header: HeaderView::from(block.header()),
            validator: block.validator().map(|pk| pk.to_hex()),
            signature: block.signature().map(|sig| sig.to_hex()),
            tx_count: block.tx_count(),
            transactions: block
                .transactions()
                .iter()
                .map(|tx| tx.hash().to_hex())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionView {
    pub hash: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub value: u64,
    pub nonce: i64,
    pub data: String,
    pub signature: Option<String>,
}

impl From<&Transaction> for TransactionView {
    fn from(tx: &Transaction) -> Self {
        Self {
            hash: tx.hash().to_hex(),
            from: tx.from().map(|pk| pk.to_hex()),
            to: tx.to().map(|pk| pk.to_hex()),
            value: tx.value(),
            nonce: tx.nonce(),
            data: hex::encode(tx.data()),
            signature: tx.signature().map(|sig| sig.to_hex()),
        }
    }
}
