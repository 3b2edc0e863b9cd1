use diadem_consensus_core::tx::Transaction;

/// Resolvers for the two service-node payment slots and the budget schedule,
/// backed by the node registry.
///
/// The `fill_*` hooks inspect the registry for the winner elected at `height`
/// and append an output paying it at the next payment slot, keeping
/// `MN_PMT_SLOT`/`SN_PMT_SLOT` alignment. Away from budget payment blocks they
/// also deduct the node reward from the miner slot when it carries value.
pub trait NodePayments: Send + Sync {
    /// Protocol flag gating node payments.
    fn payments_enabled(&self) -> bool;

    /// Protocol flag gating the budget payment schedule.
    fn superblocks_enabled(&self) -> bool;

    /// Whether the budget system, rather than the block creator, disburses
    /// node rewards at `height`.
    fn is_budget_payment_block(&self, height: u64) -> bool;

    fn fill_masternode_payee(&self, coinbase: &mut Transaction, height: u64, fees: u64);

    fn fill_systemnode_payee(&self, coinbase: &mut Transaction, height: u64, fees: u64);
}
