use crate::block_template::errors::BuilderError;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum MiningManagerError {
    #[error(transparent)]
    BlockTemplateBuilder(#[from] BuilderError),
}

pub type MiningManagerResult<T> = Result<T, MiningManagerError>;
