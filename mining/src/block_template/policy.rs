use crate::feerate::FeeRate;
use diadem_consensus_core::constants::{COINBASE_WEIGHT_RESERVED, MAX_BLOCK_SIGOPS_COST, MAX_BLOCK_WEIGHT};
use serde::{Deserialize, Serialize};

/// Default minimum package fee rate, in satoshis per 1000 virtual bytes.
pub const DEFAULT_BLOCK_MIN_TX_FEE: u64 = 1_000;

/// User-facing assembly knobs, before sanitization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOptions {
    pub block_max_weight: u64,
    pub block_min_tx_fee: u64,
    /// Log the fee rate of every accepted transaction.
    pub print_priority: bool,
}

impl Default for PolicyOptions {
    fn default() -> Self {
        Self { block_max_weight: MAX_BLOCK_WEIGHT, block_min_tx_fee: DEFAULT_BLOCK_MIN_TX_FEE, print_priority: false }
    }
}

/// Sanitized assembly limits consulted by the selector.
#[derive(Clone, Debug)]
pub struct Policy {
    pub(crate) max_block_weight: u64,
    pub(crate) max_block_sigops: u64,
    pub(crate) min_fee_rate: FeeRate,
    pub(crate) print_priority: bool,
}

impl Policy {
    pub fn new(options: &PolicyOptions) -> Self {
        // Keep the weight target between the coinbase reservation and the
        // consensus ceiling minus the same reservation
        let max_block_weight = options.block_max_weight.clamp(COINBASE_WEIGHT_RESERVED, MAX_BLOCK_WEIGHT - COINBASE_WEIGHT_RESERVED);
        Self {
            max_block_weight,
            max_block_sigops: MAX_BLOCK_SIGOPS_COST,
            min_fee_rate: FeeRate::from_sat_per_kvb(options.block_min_tx_fee),
            print_priority: options.print_priority,
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::new(&PolicyOptions::default())
    }
}
