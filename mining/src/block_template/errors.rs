use diadem_consensus_core::errors::RuleError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuilderError {
    /// No kernel solution exists for the current candidate; the staking loop
    /// treats this as routine and retries.
    #[error("no stake proof found for the candidate template")]
    StakeNotFound,

    #[error("failed to sign the assembled proof-of-stake block")]
    SignatureFailure,

    /// The assembled template failed the consensus self-check: the selector
    /// and the consensus rules disagree, which is a programming error.
    #[error("assembled template failed the validity self-check: {0}")]
    TemplateInvalid(RuleError),
}

pub type BuilderResult<T> = Result<T, BuilderError>;
