use diadem_consensus_core::api::ChainApi;
use diadem_consensus_core::block::{Block, StakePointer};
use diadem_consensus_core::config::params::Network;
use diadem_consensus_core::tx::Transaction;
use std::time::Duration;

/// Minimum tip age, in seconds, before a testnet stake search is attempted.
/// Slowing the chain down keeps a small testnet from burning through its
/// stake pointers.
const TESTNET_MIN_TIP_AGE: u64 = 30;

/// A successful kernel search: the signed coinstake transaction, the time at
/// which its kernel hash meets the target, and the stake pointer proving
/// ownership of the staked output.
pub struct CoinStake {
    pub tx: Transaction,
    pub new_time: u32,
    pub pointer: StakePointer,
}

/// Wallet capabilities the assembler and the staking loop rely on.
pub trait NodeWallet: Send + Sync {
    fn is_locked(&self) -> bool;

    fn has_stakeable_coins(&self) -> bool;

    /// Searches the wallet's stakeable outputs for a kernel satisfying
    /// `bits` around `time`. The first output of the returned transaction is
    /// the reward slot; the assembler fills in its value.
    fn create_coin_stake(&self, height: u64, bits: u32, time: u32) -> Option<CoinStake>;

    /// Signs a proof-of-stake block with the stake key.
    fn sign_block(&self, block: &mut Block) -> bool;
}

/// Adapter between the template builder and the wallet's kernel search.
pub(crate) struct StakeSearch<'a> {
    chain: &'a dyn ChainApi,
    wallet: &'a dyn NodeWallet,
    network: Network,
}

impl<'a> StakeSearch<'a> {
    pub(crate) fn new(chain: &'a dyn ChainApi, wallet: &'a dyn NodeWallet, network: Network) -> Self {
        Self { chain, wallet, network }
    }

    pub(crate) fn find(&self, height: u64, bits: u32, time: u32, tip_time: u32) -> Option<CoinStake> {
        if self.network == Network::Testnet && self.chain.adjusted_time().saturating_sub(tip_time as u64) < TESTNET_MIN_TIP_AGE {
            std::thread::sleep(Duration::from_secs(TESTNET_MIN_TIP_AGE));
        }
        self.wallet.create_coin_stake(height, bits, time)
    }
}
