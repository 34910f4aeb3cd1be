//! Governance proposals: the merge of on-chain state and off-chain metadata.

use agora_types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::params::ProposalParameters;

/// Accumulated vote weights, re-read from the chain and never mutated here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "weights", rename_all = "snake_case")]
pub enum Tally {
    Majority {
        #[serde(with = "agora_types::amount::u256_dec")]
        yes: U256,
        #[serde(with = "agora_types::amount::u256_dec")]
        no: U256,
        #[serde(with = "agora_types::amount::u256_dec")]
        abstain: U256,
    },
    Veto {
        #[serde(with = "agora_types::amount::u256_dec")]
        weight: U256,
    },
}

impl Tally {
    /// Total weight cast, saturating at `U256::MAX`.
    pub fn total(&self) -> U256 {
        match self {
            Self::Majority { yes, no, abstain } => {
                yes.saturating_add(*no).saturating_add(*abstain)
            }
            Self::Veto { weight } => *weight,
        }
    }
}

/// A call the DAO executes when the proposal passes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub to: Address,
    #[serde(with = "agora_types::amount::u256_dec")]
    pub value: U256,
    /// ABI calldata, hex encoded in JSON.
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

/// A link attached to the proposal description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub url: String,
}

/// The off-chain half of a proposal, pinned to content-addressed storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

/// Whether the off-chain metadata is available.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum MetadataState {
    Loaded(ProposalMetadata),
    /// The creation event has not been resolved yet.
    Pending,
    /// Creation log or document missing or unparseable.
    Unavailable(String),
}

impl MetadataState {
    pub fn loaded(&self) -> Option<&ProposalMetadata> {
        match self {
            Self::Loaded(m) => Some(m),
            _ => None,
        }
    }
}

/// A governance proposal as shown to voters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    #[serde(with = "agora_types::amount::u256_dec")]
    pub id: U256,
    /// Inside the voting (or veto) window.
    pub active: bool,
    pub executed: bool,
    pub parameters: ProposalParameters,
    pub tally: Tally,
    /// Resolved from the creation event; absent when no log was found.
    pub creator: Option<Address>,
    pub actions: Vec<Action>,
    /// Bit `i` set means action `i` may revert without reverting the batch.
    #[serde(with = "agora_types::amount::u256_dec")]
    pub allow_failure_map: U256,
    pub metadata: MetadataState,
}

impl Proposal {
    pub fn title(&self) -> &str {
        self.metadata.loaded().map(|m| m.title.as_str()).unwrap_or("")
    }

    pub fn summary(&self) -> &str {
        self.metadata.loaded().map(|m| m.summary.as_str()).unwrap_or("")
    }

    pub fn description(&self) -> &str {
        self.metadata
            .loaded()
            .map(|m| m.description.as_str())
            .unwrap_or("")
    }

    pub fn resources(&self) -> &[Resource] {
        self.metadata
            .loaded()
            .map(|m| m.resources.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_actions(&self) -> bool {
        !self.actions.is_empty()
    }

    /// Whether action `index` is allowed to fail.
    pub fn may_fail(&self, index: u32) -> bool {
        index < 256 && (self.allow_failure_map >> index) & U256::ONE == U256::ONE
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        serializer.serialize_str(&format!("0x{encoded}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let digits = s.strip_prefix("0x").unwrap_or(&s);
        if digits.len() % 2 != 0 || !digits.is_ascii() {
            return Err(serde::de::Error::custom("malformed hex bytes"));
        }
        (0..digits.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).map_err(serde::de::Error::custom))
            .collect()
    }
}
