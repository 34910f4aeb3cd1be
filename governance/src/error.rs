use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("ratio {0} exceeds the fixed-point base of 1000000")]
    InvalidRatio(u64),

    #[error("unknown vote option {0}")]
    UnknownVoteOption(u8),

    #[error("proposal id does not fit the packed index/start/end layout")]
    MalformedProposalId,

    #[error("{0}")]
    Other(String),
}
