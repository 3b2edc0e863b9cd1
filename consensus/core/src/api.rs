use crate::block::{Block, BlockHeader};
use crate::errors::RuleError;
use crate::hashing::Hash;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainTip {
    pub hash: Hash,
    pub height: u64,
    pub time: u32,
    pub median_time_past: u64,
}

/// Read/submit interface over the active chain state.
pub trait ChainApi: Send + Sync {
    fn tip(&self) -> ChainTip;

    /// Network-adjusted wall clock, in seconds.
    fn adjusted_time(&self) -> u64;

    /// Difficulty target for a block extending the tip with the given header.
    fn next_work_required(&self, header: &BlockHeader) -> u32;

    fn is_witness_enabled(&self) -> bool;

    /// Consensus self-check of an assembled block, minus the proof-of-work
    /// and merkle re-checks.
    fn test_block_validity(&self, block: &Block) -> Result<(), RuleError>;

    /// Full processing of a new block, as if received from the network.
    fn process_new_block(&mut self, block: Block) -> Result<(), RuleError>;
}

/// The chain-state lock. Project-wide lock order: this lock is always
/// acquired before the mempool lock.
pub struct ChainStateLock {
    inner: RwLock<Box<dyn ChainApi>>,
}

impl ChainStateLock {
    pub fn new(chain: Box<dyn ChainApi>) -> Self {
        Self { inner: RwLock::new(chain) }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Box<dyn ChainApi>> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Box<dyn ChainApi>> {
        self.inner.write()
    }
}
