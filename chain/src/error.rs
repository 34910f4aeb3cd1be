use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    /// The request never produced a JSON-RPC response (connect, timeout, HTTP status).
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid rpc response: {0}")]
    InvalidResponse(String),

    #[error("abi decoding error: {0}")]
    Abi(String),

    #[error("{0}")]
    Other(String),
}

impl ChainError {
    /// Worth retrying on the next block: the chain itself did not reject the call.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<agora_types::TypesError> for ChainError {
    fn from(e: agora_types::TypesError) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}
