use crate::block_template::errors::{BuilderError, BuilderResult};
use crate::block_template::model::BlockTemplate;
use crate::block_template::policy::Policy;
use crate::block_template::selector::TemplateSelector;
use crate::mempool::Mempool;
use crate::payments::NodePayments;
use crate::snapshot::AssemblySnapshot;
use crate::stake::{NodeWallet, StakeSearch};
use diadem_consensus_core::api::{ChainApi, ChainTip};
use diadem_consensus_core::block::{Block, BlockHeader};
use diadem_consensus_core::config::params::{Network, Params};
use diadem_consensus_core::constants::{BLOCK_VERSION, MN_PMT_SLOT, SN_PMT_SLOT, WITNESS_SCALE_FACTOR};
use diadem_consensus_core::merkle;
use diadem_consensus_core::script::{Script, OP_0};
use diadem_consensus_core::tx::{Outputs, Transaction, TransactionInput};
use diadem_core::time::Stopwatch;
use diadem_core::{debug, info, warn};
use itertools::Itertools;

pub struct BlockTemplateBuilder {
    params: Params,
    policy: Policy,
}

impl BlockTemplateBuilder {
    pub fn new(params: Params, policy: Policy) -> Self {
        Self { params, policy }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Assembles a candidate block on top of the current tip: a weight-bounded
    /// fee-rate-maximizing package selection, the reward transaction(s) with
    /// the service-node payment slots, and — in proof-of-stake mode — the
    /// stake proof and block signature. The caller holds the chain-state and
    /// mempool locks for the whole call.
    pub(crate) fn build(
        &self,
        chain: &dyn ChainApi,
        mempool: &Mempool,
        wallet: &dyn NodeWallet,
        payments: &dyn NodePayments,
        reward_script: &Script,
        proof_of_stake: bool,
    ) -> BuilderResult<(BlockTemplate, AssemblySnapshot)> {
        let _sw = Stopwatch::<100>::with_threshold("create_new_block op");

        let tip = chain.tip();
        let height = tip.height + 1;
        let mut header = BlockHeader::new(BLOCK_VERSION, tip.hash);
        header.time = chain.adjusted_time() as u32;

        let lock_time_cutoff = if self.params.locktime_median_time_past { tip.median_time_past } else { header.time as u64 };
        let include_witness = chain.is_witness_enabled();

        let selection =
            TemplateSelector::new(mempool, &self.policy, height, lock_time_cutoff, include_witness).select_packages();
        let fees = selection.total_fees;
        let snapshot = AssemblySnapshot { num_txs: selection.tx_count, weight: selection.block_weight };

        let version = Transaction::version_for_height(self.params.network, height);
        let mut coinbase = Transaction::new(
            version,
            vec![TransactionInput::coinbase(Script::new().push_int(height as i64).push_opcode(OP_0))],
            Outputs::for_version(version),
            0,
        );
        let mut coinstake = None;

        if !proof_of_stake {
            coinbase.outputs.push(self.params.block_value(height, fees), reward_script.clone(), self.params.subsidy_asset);
        } else {
            if height < self.params.pos_start_height {
                return Err(BuilderError::StakeNotFound);
            }
            // The miner slot stays in place but carries nothing; it keeps the
            // node payment slots at their fixed indices.
            coinbase.outputs.push(0, Script::new(), self.params.subsidy_asset);

            header.bits = chain.next_work_required(&header);
            let stake = StakeSearch::new(chain, wallet, self.params.network)
                .find(height, header.bits, header.time, tip.time)
                .ok_or(BuilderError::StakeNotFound)?;

            header.time = stake.new_time;
            header.proof_of_stake = true;
            header.stake_pointer = Some(stake.pointer);

            let mut stake_tx = stake.tx;
            if let Some(input) = stake_tx.inputs.first_mut() {
                input.script_sig = std::mem::take(&mut input.script_sig).push_int(height as i64).push_opcode(OP_0);
            }
            coinstake = Some(stake_tx);
        }

        if payments.payments_enabled() || self.params.network == Network::Testnet {
            payments.fill_masternode_payee(&mut coinbase, height, fees);
            payments.fill_systemnode_payee(&mut coinbase, height, fees);
        }

        let budget_block = payments.superblocks_enabled() && payments.is_budget_payment_block(height);

        if let Some(stake_tx) = coinstake.as_mut() {
            let mut node_rewards = 0;
            if coinbase.outputs.len() > MN_PMT_SLOT {
                node_rewards += coinbase.outputs.value(MN_PMT_SLOT).unwrap_or(0);
            }
            if coinbase.outputs.len() > SN_PMT_SLOT {
                node_rewards += coinbase.outputs.value(SN_PMT_SLOT).unwrap_or(0);
            }

            // On budget payment blocks the stake keeps the full block value;
            // the budget system pays the nodes out of band.
            let block_value = self.params.block_value(height, fees);
            let reward = if budget_block { block_value } else { block_value.saturating_sub(node_rewards) };
            if let Some(value) = stake_tx.outputs.value_mut(0) {
                *value = reward;
            }

            if let Some(value) = coinbase.outputs.value_mut(0) {
                *value = 0;
            }
            if let Some(script) = coinbase.outputs.script_mut(0) {
                *script = Script::new();
            }
        }

        if !budget_block {
            if let Some(script) = coinbase.outputs.script(MN_PMT_SLOT) {
                header.payee = script.clone();
            }
            if let Some(script) = coinbase.outputs.script(SN_PMT_SLOT) {
                header.payee_sn = script.clone();
            }
        }

        let tx_fees = std::iter::once(-(fees as i64))
            .chain(coinstake.iter().map(|_| 0))
            .chain(selection.entries.iter().map(|entry| entry.fee as i64))
            .collect_vec();
        let mut tx_sigops = std::iter::once(0)
            .chain(coinstake.iter().map(|_| 0))
            .chain(selection.entries.iter().map(|entry| entry.sigops_cost))
            .collect_vec();
        let transactions = std::iter::once(coinbase)
            .chain(coinstake)
            .chain(selection.entries.iter().map(|entry| (*entry.tx).clone()))
            .collect_vec();

        let mut block = Block::new(header, transactions);
        let coinbase_commitment = if include_witness { add_coinbase_commitment(&mut block, &self.params) } else { Vec::new() };

        // Count coinbase sigops only once its output set is final
        if let Some(cb) = block.coinbase() {
            tx_sigops[0] = WITNESS_SCALE_FACTOR * cb.legacy_sigop_count();
        }

        if !proof_of_stake {
            update_time(&mut block.header, chain, &self.params, &tip);
            block.header.bits = chain.next_work_required(&block.header);
        }
        block.header.nonce = 0;
        block.header.merkle_root = merkle::block_merkle_root(&block);

        if proof_of_stake && !wallet.sign_block(&mut block) {
            warn!("create_new_block: failed to sign block at height {}", height);
            return Err(BuilderError::SignatureFailure);
        }

        chain.test_block_validity(&block).map_err(BuilderError::TemplateInvalid)?;

        info!(
            "create_new_block: block weight: {} txs: {} fees: {} sigops {}",
            selection.block_weight, selection.tx_count, fees, selection.block_sigops
        );
        debug!(
            "create_new_block packages: {} selected, {} descendants updated",
            selection.packages_selected, selection.descendants_updated
        );

        Ok((BlockTemplate { block, tx_fees, tx_sigops, coinbase_commitment, height }, snapshot))
    }
}

/// Advances the header time to `max(median time past + 1, network time)`.
/// Networks allowing min-difficulty blocks re-derive the target as well,
/// since it depends on the timestamp there. Returns the applied delta.
pub fn update_time(header: &mut BlockHeader, chain: &dyn ChainApi, params: &Params, tip: &ChainTip) -> i64 {
    let old_time = header.time as i64;
    let new_time = std::cmp::max(tip.median_time_past + 1, chain.adjusted_time());
    if old_time < new_time as i64 {
        header.time = new_time as u32;
    }
    if params.pow_allow_min_difficulty {
        header.bits = chain.next_work_required(header);
    }
    new_time as i64 - old_time
}

/// Commits to the block's witness data with an extra coinbase output and
/// returns the commitment script bytes. The witness merkle root zeroes the
/// coinbase slot, so appending the output does not invalidate the commitment.
pub(crate) fn add_coinbase_commitment(block: &mut Block, params: &Params) -> Vec<u8> {
    let commitment = merkle::witness_commitment(block);
    let script = merkle::witness_commitment_script(commitment);
    let bytes = script.as_slice().to_vec();
    if let Some(coinbase) = block.transactions.first_mut() {
        coinbase.outputs.push(0, script, params.subsidy_asset);
    }
    bytes
}

/// Strips the witness commitment from the coinbase and rebuilds it along with
/// the merkle root. Used by callers that mutate the coinbase after assembly.
pub fn regenerate_commitments(block: &mut Block, params: &Params) -> Vec<u8> {
    if let Some(coinbase) = block.transactions.first_mut() {
        if let Some(slot) = merkle::find_witness_commitment(coinbase) {
            coinbase.outputs.remove(slot);
        }
    }
    let bytes = add_coinbase_commitment(block, params);
    block.header.merkle_root = merkle::block_merkle_root(block);
    bytes
}
