use diadem_consensus_core::block::Block;

/// An assembled candidate block, ready for external mining or stake signing.
///
/// The metadata vectors run parallel to `block.transactions`: slot 0 carries
/// the negated fee total (the coinbase collects what the others pay) and the
/// witness-scaled legacy sigop count of the coinbase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockTemplate {
    pub block: Block,
    pub tx_fees: Vec<i64>,
    pub tx_sigops: Vec<u64>,
    /// Serialized witness commitment script; empty when witness is disabled.
    pub coinbase_commitment: Vec<u8>,
    pub height: u64,
}
