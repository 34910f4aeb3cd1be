//! Transaction hashes and content-addressed metadata identifiers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// A 32-byte transaction hash.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl FromStr for TxHash {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| TypesError::InvalidHash(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Identifier of an immutable off-chain metadata document.
///
/// Proposals store their metadata pointer on-chain as raw bytes holding a
/// UTF-8 URI, normally `ipfs://<cid>`. A bare CID is accepted as well.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(String);

impl ContentHash {
    pub const IPFS_SCHEME: &'static str = "ipfs://";

    /// Wrap a CID.
    pub fn new(cid: impl Into<String>) -> Result<Self, TypesError> {
        let cid = cid.into();
        let cid = cid.trim();
        if cid.is_empty() || !cid.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(TypesError::InvalidContentHash(cid.to_string()));
        }
        Ok(Self(cid.to_string()))
    }

    /// Decode the `metadata` bytes emitted by a proposal creation event.
    pub fn from_metadata_bytes(bytes: &[u8]) -> Result<Self, TypesError> {
        let uri = std::str::from_utf8(bytes)
            .map_err(|_| TypesError::InvalidContentHash(hex::encode(bytes)))?;
        Self::from_uri(uri)
    }

    /// Parse `ipfs://<cid>` (with an optional trailing path) or a bare CID.
    pub fn from_uri(uri: &str) -> Result<Self, TypesError> {
        let uri = uri.trim_matches(char::from(0)).trim();
        let rest = uri.strip_prefix(Self::IPFS_SCHEME).unwrap_or(uri);
        let cid = rest.split('/').next().unwrap_or_default();
        Self::new(cid)
    }

    pub fn cid(&self) -> &str {
        &self.0
    }

    /// Canonical `ipfs://` URI, the form written into proposal metadata.
    pub fn to_uri(&self) -> String {
        format!("{}{}", Self::IPFS_SCHEME, self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
