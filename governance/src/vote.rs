//! Vote, veto and approval records decoded from plugin events.

use agora_types::{Address, BlockNumber, TxHash, U256};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::error::GovernanceError;

/// Majority-voting option, encoded on chain as `uint8`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOption {
    None,
    Abstain,
    Yes,
    No,
}

impl VoteOption {
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Abstain => 1,
            Self::Yes => 2,
            Self::No => 3,
        }
    }
}

impl TryFrom<u8> for VoteOption {
    type Error = GovernanceError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Abstain),
            2 => Ok(Self::Yes),
            3 => Ok(Self::No),
            other => Err(GovernanceError::UnknownVoteOption(other)),
        }
    }
}

impl fmt::Display for VoteOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Abstain => "abstain",
            Self::Yes => "yes",
            Self::No => "no",
        };
        f.write_str(s)
    }
}

/// What a record expresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "option", rename_all = "snake_case")]
pub enum VoteKind {
    Vote(VoteOption),
    Veto,
    /// Emergency multisig approval; carries no weight.
    Approval,
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vote(option) => write!(f, "{option}"),
            Self::Veto => f.write_str("veto"),
            Self::Approval => f.write_str("approval"),
        }
    }
}

/// Where an event was emitted. `(tx_hash, log_index)` identifies it;
/// `(block_number, log_index)` orders it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId {
    pub block_number: BlockNumber,
    pub tx_hash: TxHash,
    pub log_index: u64,
}

impl EventId {
    pub fn key(&self) -> (TxHash, u64) {
        (self.tx_hash, self.log_index)
    }
}

impl Ord for EventId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.block_number
            .cmp(&other.block_number)
            .then(self.log_index.cmp(&other.log_index))
            .then_with(|| self.tx_hash.as_bytes().cmp(other.tx_hash.as_bytes()))
    }
}

impl PartialOrd for EventId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    #[serde(with = "agora_types::amount::u256_dec")]
    pub proposal_id: U256,
    pub voter: Address,
    pub kind: VoteKind,
    #[serde(with = "agora_types::amount::u256_dec")]
    pub voting_power: U256,
    pub event: EventId,
}
