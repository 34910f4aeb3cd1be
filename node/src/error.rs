use thiserror::Error;

use agora_chain::ChainError;
use agora_metadata::DraftError;
use agora_types::ChainId;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("connected to {actual}, configuration expects {expected}")]
    ChainMismatch { expected: ChainId, actual: ChainId },

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Failure of a chain read made on behalf of the loader or aggregator.
///
/// Callers keep whatever state they had before the failed read.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Transport-level failure; retry on the next block.
    #[error("transient query failure: {0}")]
    Transient(ChainError),

    /// The node answered but the answer is unusable (revert, bad encoding).
    #[error("chain query failed: {0}")]
    Chain(ChainError),
}

impl LoaderError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<ChainError> for LoaderError {
    fn from(e: ChainError) -> Self {
        if e.is_transient() {
            Self::Transient(e)
        } else {
            Self::Chain(e)
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("invalid proposal: {0}")]
    InvalidDraft(#[from] DraftError),

    #[error("proposal {0} is not open for voting")]
    VotingClosed(agora_types::U256),

    #[error("submission failed: {0}")]
    Chain(#[from] ChainError),
}
