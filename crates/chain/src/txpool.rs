//! Transaction pool for transactions awaiting block inclusion.
//!
//! The pool keeps two views over the same transactions:
//! - `all`: every recently seen transaction, bounded, evicted oldest first.
//!   Used for deduplication.
//! - `pending`: transactions not yet harvested by the block producer.
//!
//! Every pending transaction is also in `all`. Each view has its own lock;
//! whenever both are needed, `all` is locked before `pending`.

use crate::config::PoolConfig;
use linkchain_core::{Hash, Transaction};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Hash-keyed transactions that remember their insertion order.
#[derive(Default)]
struct SortedMapInner {
    /// hash → (insertion sequence, transaction)
    lookup: HashMap<Hash, (u64, Transaction)>,
    /// insertion sequence → hash
    order: BTreeMap<u64, Hash>,
    next_seq: u64,
}

impl SortedMapInner {
    fn first(&self) -> Option<&Transaction> {
        let (_, hash) = self.order.first_key_value()?;
        self.lookup.get(hash).map(|(_, tx)| tx)
    }

    fn get(&self, hash: &Hash) -> Option<&Transaction> {
        self.lookup.get(hash).map(|(_, tx)| tx)
    }

    fn contains(&self, hash: &Hash) -> bool {
        self.lookup.contains_key(hash)
    }

    fn count(&self) -> usize {
        self.lookup.len()
    }

    /// Insert unless already present. Returns whether it was inserted.
    fn add(&mut self, tx: Transaction) -> bool {
        let seq = self.next_seq;
        self.insert_at(seq, tx)
    }

    fn seq_of(&self, hash: &Hash) -> Option<u64> {
        self.lookup.get(hash).map(|(seq, _)| *seq)
    }

    /// Insert at a caller-chosen sequence number so a transaction can return
    /// to the slot it was first inserted at.
    fn insert_at(&mut self, seq: u64, tx: Transaction) -> bool {
        let hash = tx.hash();
        if self.lookup.contains_key(&hash) || self.order.contains_key(&seq) {
            return false;
        }
        self.next_seq = self.next_seq.max(seq + 1);
        self.order.insert(seq, hash);
        self.lookup.insert(hash, (seq, tx));
        true
    }

    fn remove(&mut self, hash: &Hash) -> Option<Transaction> {
        let (seq, tx) = self.lookup.remove(hash)?;
        self.order.remove(&seq);
        Some(tx)
    }

    fn pop_first(&mut self) -> Option<Transaction> {
        let (_, hash) = self.order.pop_first()?;
        self.lookup.remove(&hash).map(|(_, tx)| tx)
    }

    fn clear(&mut self) {
        self.lookup.clear();
        self.order.clear();
    }

    fn transactions(&self) -> Vec<Transaction> {
        self.order
            .values()
            .filter_map(|hash| self.get(hash).cloned())
            .collect()
    }
}

/// A thread-safe, insertion-ordered map of transactions keyed by hash.
#[derive(Default)]
pub struct TransactionSortedMap {
    inner: RwLock<SortedMapInner>,
}

impl TransactionSortedMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The oldest transaction still present.
    pub fn first(&self) -> Option<Transaction> {
        self.inner.read().first().cloned()
    }

    pub fn get(&self, hash: &Hash) -> Option<Transaction> {
        self.inner.read().get(hash).cloned()
    }

    /// Insert unless a transaction with the same hash is present.
    pub fn add(&self, tx: Transaction) -> bool {
        self.inner.write().add(tx)
    }

    pub fn remove(&self, hash: &Hash) -> Option<Transaction> {
        self.inner.write().remove(hash)
    }

    pub fn count(&self) -> usize {
        self.inner.read().count()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.inner.read().contains(hash)
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Snapshot in insertion order.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.inner.read().transactions()
    }
}

/// Bounded, deduplicating staging area for not-yet-committed transactions.
pub struct TransactionPool {
    all: TransactionSortedMap,
    pending: TransactionSortedMap,
    /// When `all` is full the oldest transaction is pruned.
    max_length: usize,
}

impl TransactionPool {
    /// Create a pool remembering at most `max_length` transactions (minimum 1).
    pub fn new(max_length: usize) -> Self {
        Self {
            all: TransactionSortedMap::new(),
            pending: TransactionSortedMap::new(),
            max_length: max_length.max(1),
        }
    }

    pub fn from_config(config: &PoolConfig) -> Self {
        Self::new(config.max_length)
    }

    /// Offer a transaction to the pool.
    ///
    /// Already-seen transactions are ignored. Otherwise, if the pool is full,
    /// the oldest-inserted transaction is evicted first (from `pending` too).
    /// Returns whether the transaction was admitted.
    pub fn add(&self, tx: Transaction) -> bool {
        let hash = tx.hash();

        let mut all = self.all.inner.write();
        if all.contains(&hash) {
            debug!(%hash, "transaction already in pool");
            return false;
        }

        let mut pending = self.pending.inner.write();
        if all.count() >= self.max_length {
            if let Some(oldest) = all.pop_first() {
                let oldest = oldest.hash();
                pending.remove(&oldest);
                debug!(hash = %oldest, "evicted oldest transaction from pool");
            }
        }

        // pending shares all's sequence numbers
        let seq = all.next_seq;
        all.insert_at(seq, tx.clone());
        pending.insert_at(seq, tx);
        debug!(%hash, pending = pending.count(), "transaction added to pool");
        true
    }

    /// Whether the pool has seen this transaction recently.
    pub fn contains(&self, hash: &Hash) -> bool {
        self.all.contains(hash)
    }

    /// Look up a remembered transaction.
    pub fn get(&self, hash: &Hash) -> Option<Transaction> {
        self.all.get(hash)
    }

    /// Snapshot of staged transactions, oldest first.
    pub fn pending(&self) -> Vec<Transaction> {
        self.pending.transactions()
    }

    /// Empty `pending`. Dedup history in `all` is kept.
    pub fn clear_pending(&self) {
        self.pending.clear();
    }

    /// Remove and return up to `limit` pending transactions, oldest first.
    pub fn take_pending(&self, limit: usize) -> Vec<Transaction> {
        let mut pending = self.pending.inner.write();
        let mut taken = Vec::with_capacity(limit.min(pending.count()));
        while taken.len() < limit {
            match pending.pop_first() {
                Some(tx) => taken.push(tx),
                None => break,
            }
        }
        taken
    }

    /// Put harvested transactions back into `pending` at their original
    /// insertion position.
    ///
    /// Transactions evicted from `all` in the meantime are dropped.
    pub fn requeue(&self, txs: Vec<Transaction>) {
        let all = self.all.inner.read();
        let mut pending = self.pending.inner.write();
        let mut requeued = 0;
        for tx in txs {
            if let Some(seq) = all.seq_of(&tx.hash()) {
                if pending.insert_at(seq, tx) {
                    requeued += 1;
                }
            }
        }
        debug!(requeued, pending = pending.count(), "transactions requeued");
    }

    pub fn pending_count(&self) -> usize {
        self.pending.count()
    }

    /// Number of transactions remembered in `all`.
    pub fn count(&self) -> usize {
        self.all.count()
    }

    pub fn capacity(&self) -> usize {
        self.max_length
    }
}
