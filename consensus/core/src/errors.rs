use crate::tx::TransactionId;
use thiserror::Error;

/// Consensus-rule violations surfaced by block validation and submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("block weight {0} exceeds maximum {1}")]
    ExcessiveBlockWeight(u64, u64),

    #[error("block sigops cost {0} exceeds maximum {1}")]
    ExcessiveSigopsCost(u64, u64),

    #[error("transaction {0} is not final")]
    NonFinalTransaction(TransactionId),

    #[error("block carries witness data but witness is not enabled")]
    UnexpectedWitness,

    #[error("merkle root mismatch")]
    BadMerkleRoot,

    #[error("invalid stake signature")]
    BadStakeSignature,

    #[error("block rejected: {0}")]
    Rejected(String),
}
