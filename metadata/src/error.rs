use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata {0} not found on the gateway")]
    NotFound(String),

    #[error("gateway request failed: {0}")]
    RequestFailed(String),

    #[error("gateway unreachable: {0}")]
    Unreachable(String),

    #[error("invalid metadata document: {0}")]
    InvalidDocument(String),

    #[error("{0}")]
    Other(String),
}

/// A proposal draft that must not be submitted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("the proposal needs a title")]
    MissingTitle,

    #[error("the proposal needs a summary")]
    MissingSummary,

    #[error("resource {index} has no name")]
    EmptyResourceName { index: usize },

    #[error("resource {index} has an invalid URL: {url}")]
    InvalidResourceUrl { index: usize, url: String },
}
