use crate::block_template::builder::BlockTemplateBuilder;
use crate::block_template::model::BlockTemplate;
use crate::block_template::policy::{Policy, PolicyOptions};
use crate::errors::MiningManagerResult;
use crate::mempool::Mempool;
use crate::payments::NodePayments;
use crate::snapshot::{AssemblySnapshot, LastAssembly};
use crate::stake::NodeWallet;
use diadem_consensus_core::api::ChainStateLock;
use diadem_consensus_core::config::params::Params;
use diadem_consensus_core::script::Script;
use parking_lot::RwLock;

/// Owner of the mempool and the template builder. One instance lives for the
/// whole node; templates are assembled on demand and never reused across
/// heights.
pub struct MiningManager {
    block_template_builder: BlockTemplateBuilder,
    pub(crate) mempool: RwLock<Mempool>,
    last_assembly: LastAssembly,
}

impl MiningManager {
    pub fn new(params: Params, options: &PolicyOptions) -> Self {
        Self {
            block_template_builder: BlockTemplateBuilder::new(params, Policy::new(options)),
            mempool: RwLock::new(Mempool::new()),
            last_assembly: LastAssembly::default(),
        }
    }

    pub fn params(&self) -> &Params {
        self.block_template_builder.params()
    }

    pub fn mempool(&self) -> &RwLock<Mempool> {
        &self.mempool
    }

    /// Assembles a candidate block. Takes the chain-state lock and then the
    /// mempool lock — the project-wide lock order — and holds both until the
    /// template is complete, so the selector observes one consistent
    /// snapshot.
    pub fn create_new_block(
        &self,
        chain: &ChainStateLock,
        wallet: &dyn NodeWallet,
        payments: &dyn NodePayments,
        reward_script: &Script,
        proof_of_stake: bool,
    ) -> MiningManagerResult<BlockTemplate> {
        let chain = chain.read();
        let mempool = self.mempool.read();
        let (template, snapshot) =
            self.block_template_builder.build(chain.as_ref(), &mempool, wallet, payments, reward_script, proof_of_stake)?;
        self.last_assembly.store(snapshot);
        Ok(template)
    }

    /// Totals of the most recent build; readers accept staleness.
    pub fn last_assembly(&self) -> Option<AssemblySnapshot> {
        self.last_assembly.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{build_tx, MockChain, MockPayments, MockWallet};
    use diadem_consensus_core::config::params::MAINNET_PARAMS;

    #[test]
    fn test_create_new_block_updates_snapshot() {
        let manager = MiningManager::new(MAINNET_PARAMS, &PolicyOptions::default());
        let chain = ChainStateLock::new(Box::new(MockChain::new(99)));
        manager.mempool().write().insert(build_tx(1, &[]), 2_000, 1).unwrap();

        assert_eq!(manager.last_assembly(), None);
        let template = manager
            .create_new_block(&chain, &MockWallet::new(), &MockPayments::disabled(), &Script::p2pkh(&[9; 20]), false)
            .unwrap();
        assert_eq!(template.block.transactions.len(), 2);

        let snapshot = manager.last_assembly().unwrap();
        assert_eq!(snapshot.num_txs, 1);
        assert!(snapshot.weight > 4_000);
    }

    #[test]
    fn test_rebuild_from_unchanged_mempool_is_equal() {
        let manager = MiningManager::new(MAINNET_PARAMS, &PolicyOptions::default());
        let chain = ChainStateLock::new(Box::new(MockChain::new(99)));
        manager.mempool().write().insert(build_tx(1, &[]), 2_000, 1).unwrap();
        manager.mempool().write().insert(build_tx(2, &[]), 3_000, 1).unwrap();

        let wallet = MockWallet::new();
        let payments = MockPayments::disabled();
        let script = Script::p2pkh(&[9; 20]);
        let first = manager.create_new_block(&chain, &wallet, &payments, &script, false).unwrap();
        let second = manager.create_new_block(&chain, &wallet, &payments, &script, false).unwrap();
        assert_eq!(first, second);
    }
}
