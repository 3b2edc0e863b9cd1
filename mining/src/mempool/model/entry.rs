use crate::feerate::AncestorFeerateKey;
use diadem_consensus_core::tx::{Transaction, TransactionId};
use std::sync::Arc;

/// Stable identifier of a mempool entry, an index into the pool's arena.
/// Selection state is keyed by these ids, never by references into the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub(crate) usize);

/// One pending transaction together with the cached per-entry values and the
/// aggregates over its in-mempool ancestor set (self included).
#[derive(Clone, Debug)]
pub struct MempoolEntry {
    pub(crate) tx: Arc<Transaction>,
    pub(crate) txid: TransactionId,
    pub(crate) vsize: u64,
    pub(crate) weight: u64,
    pub(crate) sigops_cost: u64,
    pub(crate) fee: u64,
    pub(crate) modified_fee: u64,
    pub(crate) has_witness: bool,

    pub(crate) ancestor_vsize: u64,
    pub(crate) ancestor_mod_fees: u64,
    pub(crate) ancestor_sigops: u64,
    pub(crate) ancestor_count: u64,

    pub(crate) parents: Vec<EntryId>,
    pub(crate) children: Vec<EntryId>,
}

impl MempoolEntry {
    pub(crate) fn new(tx: Arc<Transaction>, fee: u64, sigops_cost: u64) -> Self {
        let txid = tx.id();
        let vsize = tx.vsize();
        let weight = tx.weight();
        let has_witness = tx.has_witness();
        Self {
            tx,
            txid,
            vsize,
            weight,
            sigops_cost,
            fee,
            modified_fee: fee,
            has_witness,
            ancestor_vsize: vsize,
            ancestor_mod_fees: fee,
            ancestor_sigops: sigops_cost,
            ancestor_count: 1,
            parents: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn tx(&self) -> &Arc<Transaction> {
        &self.tx
    }

    pub fn txid(&self) -> TransactionId {
        self.txid
    }

    pub fn vsize(&self) -> u64 {
        self.vsize
    }

    pub fn weight(&self) -> u64 {
        self.weight
    }

    pub fn sigops_cost(&self) -> u64 {
        self.sigops_cost
    }

    pub fn fee(&self) -> u64 {
        self.fee
    }

    pub fn modified_fee(&self) -> u64 {
        self.modified_fee
    }

    pub fn has_witness(&self) -> bool {
        self.has_witness
    }

    pub fn ancestor_vsize(&self) -> u64 {
        self.ancestor_vsize
    }

    pub fn ancestor_mod_fees(&self) -> u64 {
        self.ancestor_mod_fees
    }

    pub fn ancestor_sigops(&self) -> u64 {
        self.ancestor_sigops
    }

    pub fn ancestor_count(&self) -> u64 {
        self.ancestor_count
    }

    pub(crate) fn feerate_key(&self) -> AncestorFeerateKey {
        AncestorFeerateKey { fees: self.ancestor_mod_fees, size: self.ancestor_vsize, txid: self.txid }
    }
}
