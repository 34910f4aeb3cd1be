//! Proposal status resolution.
//!
//! Status is a pure function of the on-chain flags, the tally and the
//! proposal parameters (plus the snapshot supply for optimistic proposals).
//! Nothing here is cached; callers re-resolve on every read so a stale status
//! can never outlive the tally it was computed from.

use agora_types::{mul_div, mul_wide, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::params::{ProposalParameters, Ratio, RATIO_BASE};
use crate::proposal::{Proposal, Tally};

/// Why an accepted proposal is labelled the way it is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Acceptance {
    /// Passed and carries actions the DAO can execute.
    Executable,
    /// Passed with nothing to execute (signalling proposal).
    Passed,
}

/// Why a majority proposal was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rejection {
    /// Support did not exceed the threshold, or nobody voted yes/no.
    Defeated,
    /// Participation stayed below the minimum voting power.
    LowTurnout,
}

/// Lifecycle state of a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ProposalStatus {
    /// The tally (or the supply snapshot it depends on) has not loaded yet.
    Loading,
    Active,
    Executed,
    Accepted(Acceptance),
    Rejected(Rejection),
    Vetoed,
}

/// Display tone of a status badge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusVariant {
    Info,
    Primary,
    Success,
    Critical,
}

impl StatusVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Primary => "primary",
            Self::Success => "success",
            Self::Critical => "critical",
        }
    }
}

impl ProposalStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Loading => "(Loading)",
            Self::Active => "Active",
            Self::Executed => "Executed",
            Self::Accepted(Acceptance::Executable) => "Executable",
            Self::Accepted(Acceptance::Passed) => "Passed",
            Self::Rejected(Rejection::Defeated) => "Defeated",
            Self::Rejected(Rejection::LowTurnout) => "Low turnout",
            Self::Vetoed => "Vetoed",
        }
    }

    pub fn variant(&self) -> StatusVariant {
        match self {
            Self::Loading | Self::Active => StatusVariant::Info,
            Self::Executed => StatusVariant::Primary,
            Self::Accepted(_) => StatusVariant::Success,
            Self::Rejected(_) | Self::Vetoed => StatusVariant::Critical,
        }
    }

    /// No further on-chain change can alter this status.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Executed | Self::Rejected(_) | Self::Vetoed)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inputs of the majority-voting resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MajorityInput {
    pub active: bool,
    pub executed: bool,
    pub yes: U256,
    pub no: U256,
    pub abstain: U256,
    pub support_threshold: Ratio,
    pub min_voting_power: U256,
    pub has_actions: bool,
}

/// Inputs of the optimistic (veto) resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptimisticInput {
    pub active: bool,
    pub executed: bool,
    pub veto_tally: U256,
}

/// Resolve a majority-voting proposal.
///
/// `executed` is checked before `active`. Once the window has closed the
/// support ratio is `yes * 10^6 / (yes + no)`, multiplied before dividing,
/// and must strictly exceed the threshold.
pub fn resolve_majority(input: &MajorityInput) -> ProposalStatus {
    if input.executed {
        return ProposalStatus::Executed;
    }
    if input.active {
        return ProposalStatus::Active;
    }

    let yes_no = input.yes.checked_add(input.no);
    if yes_no == Some(U256::ZERO) {
        return ProposalStatus::Rejected(Rejection::Defeated);
    }

    // A total past 2^256 clears any minimum.
    let total = yes_no.and_then(|yes_no| yes_no.checked_add(input.abstain));
    if total.is_some_and(|total| total < input.min_voting_power) {
        return ProposalStatus::Rejected(Rejection::LowTurnout);
    }

    if support_exceeds(input.yes, input.no, input.support_threshold) {
        if input.has_actions {
            ProposalStatus::Accepted(Acceptance::Executable)
        } else {
            ProposalStatus::Accepted(Acceptance::Passed)
        }
    } else {
        ProposalStatus::Rejected(Rejection::Defeated)
    }
}

/// Whether `yes * 10^6 / (yes + no)`, rounded down, exceeds `threshold`.
///
/// Exact for any pair of 256-bit tallies, including sums that need 257 bits.
fn support_exceeds(yes: U256, no: U256, threshold: Ratio) -> bool {
    let base = U256::from(RATIO_BASE);
    let threshold = threshold.as_u256();
    match yes.checked_add(no) {
        // yes <= yes + no bounds the quotient by 10^6.
        Some(yes_no) => mul_div(yes, base, yes_no).is_some_and(|ratio| ratio > threshold),
        None => {
            // floor(yes * B / (yes + no)) > t  <=>  yes * (B - t - 1) >= (t + 1) * no
            let next = threshold + U256::ONE;
            let Some(margin) = base.checked_sub(next) else {
                return false;
            };
            mul_wide(yes, margin) >= mul_wide(next, no)
        }
    }
}

/// Minimum veto weight that defeats an optimistic proposal:
/// `effective_supply * min_veto_ratio / 10^6`.
pub fn min_veto_voting_power(effective_supply: U256, min_veto_ratio: Ratio) -> U256 {
    mul_div(effective_supply, min_veto_ratio.as_u256(), U256::from(RATIO_BASE))
        .unwrap_or(U256::MAX)
}

/// Resolve an optimistic proposal.
///
/// `active` is checked before `executed` here; a vetoed proposal is one whose
/// veto tally reached the minimum veto voting power after the window closed.
pub fn resolve_optimistic(
    input: &OptimisticInput,
    effective_supply: U256,
    min_veto_ratio: Ratio,
) -> ProposalStatus {
    if input.active {
        return ProposalStatus::Active;
    }
    if input.executed {
        return ProposalStatus::Executed;
    }
    if input.veto_tally >= min_veto_voting_power(effective_supply, min_veto_ratio) {
        ProposalStatus::Vetoed
    } else {
        ProposalStatus::Accepted(Acceptance::Executable)
    }
}

/// Resolve any proposal.
///
/// `None` (proposal not loaded) and optimistic proposals without a supply
/// snapshot resolve to [`ProposalStatus::Loading`].
pub fn resolve(proposal: Option<&Proposal>, snapshot_supply: Option<U256>) -> ProposalStatus {
    let Some(proposal) = proposal else {
        return ProposalStatus::Loading;
    };

    match (&proposal.parameters, &proposal.tally) {
        (ProposalParameters::Majority(params), Tally::Majority { yes, no, abstain }) => {
            resolve_majority(&MajorityInput {
                active: proposal.active,
                executed: proposal.executed,
                yes: *yes,
                no: *no,
                abstain: *abstain,
                support_threshold: params.support_threshold,
                min_voting_power: params.min_voting_power,
                has_actions: proposal.has_actions(),
            })
        }
        (ProposalParameters::Optimistic(params), Tally::Veto { weight: veto_tally }) => {
            let Some(supply) = snapshot_supply else {
                return ProposalStatus::Loading;
            };
            resolve_optimistic(
                &OptimisticInput {
                    active: proposal.active,
                    executed: proposal.executed,
                    veto_tally: *veto_tally,
                },
                supply,
                params.min_veto_ratio,
            )
        }
        _ => {
            tracing::warn!(id = %proposal.id, "tally and parameters disagree on the voting variant");
            ProposalStatus::Loading
        }
    }
}
