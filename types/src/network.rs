//! EVM chain identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An EIP-155 chain id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(u64);

impl ChainId {
    pub const MAINNET: Self = Self(1);
    pub const SEPOLIA: Self = Self(11_155_111);
    pub const HOLESKY: Self = Self(17_000);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Human-readable name for well-known chains.
    pub fn name(&self) -> Option<&'static str> {
        match self.0 {
            1 => Some("mainnet"),
            11_155_111 => Some("sepolia"),
            17_000 => Some("holesky"),
            _ => None,
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "chain {}", self.0),
        }
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
