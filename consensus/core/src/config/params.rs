use crate::constants::{COIN, MAX_BLOCK_SIGOPS_COST, MAX_BLOCK_WEIGHT};
use crate::hashing::Hash;
use crate::tx::AssetId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

/// Consensus parameters of a network instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Params {
    pub network: Network,
    /// Height from which proof-of-stake blocks are accepted.
    pub pos_start_height: u64,
    pub pow_allow_min_difficulty: bool,
    /// When set, transaction finality is evaluated against the median time
    /// past of the previous block rather than the block's own time.
    pub locktime_median_time_past: bool,
    /// Asset tag carried by subsidy outputs in the extended layout.
    pub subsidy_asset: AssetId,
    pub initial_subsidy: u64,
    pub subsidy_halving_interval: u64,
    pub max_block_weight: u64,
    pub max_block_sigops: u64,
}

impl Params {
    pub fn block_subsidy(&self, height: u64) -> u64 {
        let halvings = height / self.subsidy_halving_interval;
        if halvings >= 64 {
            return 0;
        }
        self.initial_subsidy >> halvings
    }

    /// Total amount available to the block creator at `height`.
    pub fn block_value(&self, height: u64, fees: u64) -> u64 {
        self.block_subsidy(height) + fees
    }
}

/// Asset tag of the native subsidy asset.
pub const SUBSIDY_ASSET: AssetId = Hash::from_u64_word(0x4d4444);

pub const MAINNET_PARAMS: Params = Params {
    network: Network::Mainnet,
    pos_start_height: 850_000,
    pow_allow_min_difficulty: false,
    locktime_median_time_past: true,
    subsidy_asset: SUBSIDY_ASSET,
    initial_subsidy: 50 * COIN,
    subsidy_halving_interval: 210_000,
    max_block_weight: MAX_BLOCK_WEIGHT,
    max_block_sigops: MAX_BLOCK_SIGOPS_COST,
};

pub const TESTNET_PARAMS: Params = Params {
    network: Network::Testnet,
    pos_start_height: 120,
    pow_allow_min_difficulty: true,
    locktime_median_time_past: true,
    subsidy_asset: SUBSIDY_ASSET,
    initial_subsidy: 50 * COIN,
    subsidy_halving_interval: 210_000,
    max_block_weight: MAX_BLOCK_WEIGHT,
    max_block_sigops: MAX_BLOCK_SIGOPS_COST,
};

pub const REGTEST_PARAMS: Params = Params {
    network: Network::Regtest,
    pos_start_height: 20,
    pow_allow_min_difficulty: true,
    locktime_median_time_past: true,
    subsidy_asset: SUBSIDY_ASSET,
    initial_subsidy: 50 * COIN,
    subsidy_halving_interval: 150,
    max_block_weight: MAX_BLOCK_WEIGHT,
    max_block_sigops: MAX_BLOCK_SIGOPS_COST,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsidy_halving() {
        assert_eq!(MAINNET_PARAMS.block_subsidy(100), 50 * COIN);
        assert_eq!(MAINNET_PARAMS.block_subsidy(210_000), 25 * COIN);
        assert_eq!(MAINNET_PARAMS.block_subsidy(64 * 210_000), 0);
    }

    #[test]
    fn test_block_value_includes_fees() {
        assert_eq!(MAINNET_PARAMS.block_value(100, 5_000), 50 * COIN + 5_000);
    }
}
