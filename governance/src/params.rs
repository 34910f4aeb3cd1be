//! Proposal parameters fixed at creation time.
//!
//! Thresholds and ratios are fixed-point fractions with base 10^6 (one part
//! per million), the representation the plugins store as `uint32`.

use agora_types::{BlockNumber, Timestamp, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GovernanceError;

/// Fixed-point base for thresholds and ratios.
pub const RATIO_BASE: u32 = 1_000_000;

/// A fraction in `[0, RATIO_BASE]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Ratio(u32);

impl Ratio {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(RATIO_BASE);

    pub fn new(parts_per_million: u32) -> Result<Self, GovernanceError> {
        if parts_per_million > RATIO_BASE {
            return Err(GovernanceError::InvalidRatio(parts_per_million as u64));
        }
        Ok(Self(parts_per_million))
    }

    pub fn parts_per_million(&self) -> u32 {
        self.0
    }

    pub fn as_u256(&self) -> U256 {
        U256::from(self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<u32> for Ratio {
    type Error = GovernanceError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Ratio> for u32 {
    fn from(r: Ratio) -> Self {
        r.0
    }
}

impl fmt::Display for Ratio {
    /// Percent with up to four decimals: 500000 → `50%`, 123456 → `12.3456%`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 10_000;
        let frac = self.0 % 10_000;
        if frac == 0 {
            write!(f, "{whole}%")
        } else {
            let frac = format!("{frac:04}");
            write!(f, "{whole}.{}%", frac.trim_end_matches('0'))
        }
    }
}

/// Parameters of a majority (token) voting proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorityParameters {
    /// Share of yes among yes+no that must be exceeded.
    pub support_threshold: Ratio,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    /// Block at which voting power is measured.
    pub snapshot_block: BlockNumber,
    /// Absolute participation (yes+no+abstain) required.
    #[serde(with = "agora_types::amount::u256_dec")]
    pub min_voting_power: U256,
}

/// Parameters of an optimistic (veto) proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimisticParameters {
    /// Share of the snapshot supply whose veto defeats the proposal.
    pub min_veto_ratio: Ratio,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    /// Epoch (block) at which the past total supply is read.
    pub snapshot_epoch: BlockNumber,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProposalParameters {
    Majority(MajorityParameters),
    Optimistic(OptimisticParameters),
}

impl ProposalParameters {
    pub fn start_date(&self) -> Timestamp {
        match self {
            Self::Majority(p) => p.start_date,
            Self::Optimistic(p) => p.start_date,
        }
    }

    pub fn end_date(&self) -> Timestamp {
        match self {
            Self::Majority(p) => p.end_date,
            Self::Optimistic(p) => p.end_date,
        }
    }

    /// Block from which vote and veto logs are searched.
    pub fn snapshot_block(&self) -> BlockNumber {
        match self {
            Self::Majority(p) => p.snapshot_block,
            Self::Optimistic(p) => p.snapshot_epoch,
        }
    }
}
