/// One whole coin, in satoshis.
pub const COIN: u64 = 100_000_000;

/// Factor by which non-witness serialized bytes count towards block weight.
pub const WITNESS_SCALE_FACTOR: u64 = 4;

/// Consensus ceiling on block weight.
pub const MAX_BLOCK_WEIGHT: u64 = 4_000_000;

/// Consensus ceiling on accumulated signature-operation cost per block.
pub const MAX_BLOCK_SIGOPS_COST: u64 = 80_000;

/// Weight units reserved up front for the coinbase transaction (and the
/// coinstake, when present) before any mempool package is considered.
pub const COINBASE_WEIGHT_RESERVED: u64 = 4_000;

/// Sigops cost reserved up front for the coinbase transaction.
pub const COINBASE_SIGOPS_RESERVED: u64 = 400;

/// First transaction version that carries the extended multi-asset output layout.
pub const TX_ELE_VERSION: u16 = 3;

/// Fixed coinbase output slot paying the elected masternode.
pub const MN_PMT_SLOT: usize = 1;

/// Fixed coinbase output slot paying the elected systemnode.
pub const SN_PMT_SLOT: usize = 2;

/// Block header version stamped on assembled templates.
pub const BLOCK_VERSION: u32 = 4;

/// Lock times below this threshold are interpreted as block heights,
/// at or above it as unix timestamps.
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;
