//! Block heights and JSON-RPC block tags.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypesError;

/// A block height on the governance chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockNumber(u64);

impl BlockNumber {
    pub const GENESIS: Self = Self(0);

    pub fn new(height: u64) -> Self {
        Self(height)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// `0x`-prefixed hex quantity as used by JSON-RPC.
    pub fn to_quantity(&self) -> String {
        format!("{:#x}", self.0)
    }

    /// Parse a JSON-RPC hex quantity such as `"0x1b4"`.
    pub fn from_quantity(s: &str) -> Result<Self, TypesError> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| TypesError::InvalidQuantity(s.to_string()))?;
        u64::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| TypesError::InvalidQuantity(s.to_string()))
    }
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for BlockNumber {
    fn from(height: u64) -> Self {
        Self(height)
    }
}

/// Block selector for reads and log queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlockTag {
    /// The chain head at the time the node serves the request.
    #[default]
    Latest,
    Number(BlockNumber),
}

impl BlockTag {
    /// JSON-RPC representation: `"latest"` or a hex quantity.
    pub fn to_rpc(&self) -> String {
        match self {
            Self::Latest => "latest".to_string(),
            Self::Number(n) => n.to_quantity(),
        }
    }
}

impl From<BlockNumber> for BlockTag {
    fn from(n: BlockNumber) -> Self {
        Self::Number(n)
    }
}
