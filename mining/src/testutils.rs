//! Deterministic transaction builders and mock collaborators shared by the
//! crate's tests.

use crate::payments::NodePayments;
use crate::stake::{CoinStake, NodeWallet};
use crate::staker::SyncMonitor;
use diadem_consensus_core::api::{ChainApi, ChainTip};
use diadem_consensus_core::block::{Block, BlockHeader, StakePointer};
use diadem_consensus_core::config::params::SUBSIDY_ASSET;
use diadem_consensus_core::constants::TX_ELE_VERSION;
use diadem_consensus_core::errors::RuleError;
use diadem_consensus_core::hashing::Hash;
use diadem_consensus_core::script::Script;
use diadem_consensus_core::tx::{OutPoint, Outputs, Transaction, TransactionId, TransactionInput};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

pub(crate) fn build_tx(seed: u64, parents: &[(TransactionId, u32)]) -> Transaction {
    build_tx_inner(seed, parents, 0, u32::MAX, None)
}

/// Builds a transaction padded (via its signature script) to an exact
/// virtual size, so tests can pin package feerates.
pub(crate) fn build_tx_with_vsize(seed: u64, parents: &[(TransactionId, u32)], vsize: u64) -> Transaction {
    build_tx_inner(seed, parents, 0, u32::MAX, Some(vsize))
}

pub(crate) fn build_tx_with_locktime(seed: u64, lock_time: u32) -> Transaction {
    build_tx_inner(seed, &[], lock_time, 0, None)
}

pub(crate) fn build_witness_tx(seed: u64) -> Transaction {
    let mut tx = build_tx_inner(seed, &[], 0, u32::MAX, None);
    tx.inputs[0].witness.push(vec![seed as u8; 72]);
    tx
}

fn build_tx_inner(seed: u64, parents: &[(TransactionId, u32)], lock_time: u32, sequence: u32, target_vsize: Option<u64>) -> Transaction {
    let inputs = if parents.is_empty() {
        vec![TransactionInput::new(OutPoint::new(Hash::from_u64_word(0xfeed_0000_0000 + seed), 0), Script::new(), sequence)]
    } else {
        parents.iter().map(|(txid, index)| TransactionInput::new(OutPoint::new(*txid, *index), Script::new(), sequence)).collect()
    };
    let mut outputs = Outputs::for_version(TX_ELE_VERSION);
    outputs.push(1_000 + seed, Script::p2pkh(&[(seed % 251) as u8; 20]), SUBSIDY_ASSET);
    let mut tx = Transaction::new(TX_ELE_VERSION, inputs, outputs, lock_time);
    if let Some(target) = target_vsize {
        let current = tx.vsize();
        assert!(target >= current, "target vsize {target} below minimum {current}");
        let pad = (target - current) as usize;
        if pad > 0 {
            tx.inputs[0].script_sig = Script::from_slice(&vec![0u8; pad]);
        }
        assert_eq!(tx.vsize(), target);
    }
    tx
}

pub(crate) struct MockChain {
    pub tip: ChainTip,
    pub now: u64,
    pub witness_enabled: bool,
    pub bits: u32,
    pub invalid: Option<RuleError>,
    pub reject: Option<RuleError>,
    pub processed: Arc<Mutex<Vec<Block>>>,
}

impl MockChain {
    pub fn new(tip_height: u64) -> Self {
        let tip_time = 1_700_000_000u64;
        Self {
            tip: ChainTip {
                hash: Hash::from_u64_word(0xb10c_0000 + tip_height),
                height: tip_height,
                time: tip_time as u32,
                median_time_past: tip_time - 600,
            },
            now: tip_time + 60,
            witness_enabled: true,
            bits: 0x1e0f_ffff,
            invalid: None,
            reject: None,
            processed: Arc::default(),
        }
    }
}

impl ChainApi for MockChain {
    fn tip(&self) -> ChainTip {
        self.tip
    }

    fn adjusted_time(&self) -> u64 {
        self.now
    }

    fn next_work_required(&self, _header: &BlockHeader) -> u32 {
        self.bits
    }

    fn is_witness_enabled(&self) -> bool {
        self.witness_enabled
    }

    fn test_block_validity(&self, _block: &Block) -> Result<(), RuleError> {
        match &self.invalid {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn process_new_block(&mut self, block: Block) -> Result<(), RuleError> {
        if let Some(err) = &self.reject {
            return Err(err.clone());
        }
        self.processed.lock().push(block);
        Ok(())
    }
}

pub(crate) struct MockWallet {
    pub locked: AtomicBool,
    pub stakeable: AtomicBool,
    pub stakes_remaining: AtomicU64,
    pub sign_ok: AtomicBool,
    pub stake_script: Script,
}

impl MockWallet {
    pub fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
            stakeable: AtomicBool::new(true),
            stakes_remaining: AtomicU64::new(0),
            sign_ok: AtomicBool::new(true),
            stake_script: Script::p2pkh(&[0xaa; 20]),
        }
    }

    pub fn with_stakes(stakes: u64) -> Self {
        let wallet = Self::new();
        wallet.stakes_remaining.store(stakes, Ordering::Relaxed);
        wallet
    }
}

impl NodeWallet for MockWallet {
    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    fn has_stakeable_coins(&self) -> bool {
        self.stakeable.load(Ordering::Relaxed)
    }

    fn create_coin_stake(&self, height: u64, _bits: u32, time: u32) -> Option<CoinStake> {
        if self.stakes_remaining.load(Ordering::Relaxed) == 0 {
            return None;
        }
        self.stakes_remaining.fetch_sub(1, Ordering::Relaxed);

        let mut outputs = Outputs::for_version(TX_ELE_VERSION);
        // Reward slot; the assembler fills in the value
        outputs.push(0, self.stake_script.clone(), SUBSIDY_ASSET);
        let tx = Transaction::new(
            TX_ELE_VERSION,
            vec![TransactionInput::new(OutPoint::new(Hash::from_u64_word(0x57a4e_0000 + height), 1), Script::new(), u32::MAX)],
            outputs,
            0,
        );
        let pointer = StakePointer { block_hash: Hash::from_u64_word(0x9070_0000 + height), tx_index: 1, out_index: 1 };
        Some(CoinStake { tx, new_time: time + 16, pointer })
    }

    fn sign_block(&self, block: &mut Block) -> bool {
        if self.sign_ok.load(Ordering::Relaxed) {
            block.signature = vec![0x30, 0x44, 0x02, 0x20, 0x7f];
            true
        } else {
            false
        }
    }
}

pub(crate) struct MockPayments {
    pub enabled: bool,
    pub superblocks: bool,
    pub budget_heights: Vec<u64>,
    pub mn_script: Option<Script>,
    pub sn_script: Option<Script>,
    pub node_reward: u64,
}

impl MockPayments {
    pub fn disabled() -> Self {
        Self { enabled: false, superblocks: false, budget_heights: Vec::new(), mn_script: None, sn_script: None, node_reward: 0 }
    }

    pub fn with_winners(node_reward: u64) -> Self {
        Self {
            enabled: true,
            superblocks: false,
            budget_heights: Vec::new(),
            mn_script: Some(Script::p2pkh(&[0xa1; 20])),
            sn_script: Some(Script::p2pkh(&[0xd2; 20])),
            node_reward,
        }
    }

    fn fill_slot(&self, coinbase: &mut Transaction, height: u64, script: &Script) {
        coinbase.outputs.push(self.node_reward, script.clone(), SUBSIDY_ASSET);
        if !(self.superblocks && self.is_budget_payment_block(height)) {
            if let Some(value) = coinbase.outputs.value_mut(0) {
                *value = value.saturating_sub(self.node_reward);
            }
        }
    }
}

impl NodePayments for MockPayments {
    fn payments_enabled(&self) -> bool {
        self.enabled
    }

    fn superblocks_enabled(&self) -> bool {
        self.superblocks
    }

    fn is_budget_payment_block(&self, height: u64) -> bool {
        self.budget_heights.contains(&height)
    }

    fn fill_masternode_payee(&self, coinbase: &mut Transaction, height: u64, _fees: u64) {
        if let Some(script) = self.mn_script.clone() {
            self.fill_slot(coinbase, height, &script);
        }
    }

    fn fill_systemnode_payee(&self, coinbase: &mut Transaction, height: u64, _fees: u64) {
        if let Some(script) = self.sn_script.clone() {
            self.fill_slot(coinbase, height, &script);
        }
    }
}

pub(crate) struct MockSync {
    pub synced: bool,
}

impl SyncMonitor for MockSync {
    fn is_blockchain_synced(&self) -> bool {
        self.synced
    }
}
