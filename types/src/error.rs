//! Parse errors for the primitive types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid 32-byte hash: {0}")]
    InvalidHash(String),

    #[error("invalid content hash: {0}")]
    InvalidContentHash(String),

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),
}
