//! Proposal state for Aragon-style governance plugins.
//!
//! Two voting variants are supported:
//! - **Majority voting** (token voting): yes/no/abstain tallies, a support
//!   threshold and a minimum participation.
//! - **Optimistic voting**: proposals pass unless enough supply vetoes them
//!   before the veto window closes.
//!
//! Everything here is pure. Status is never stored: it is recomputed from the
//! on-chain flags, the tally and the parameters every time it is read.

pub mod display;
pub mod error;
pub mod params;
pub mod presenter;
pub mod proposal;
pub mod proposal_id;
pub mod status;
pub mod vote;

pub use display::{display_summary, display_title, CardState, FetchStatus};
pub use error::GovernanceError;
pub use params::{MajorityParameters, OptimisticParameters, ProposalParameters, Ratio, RATIO_BASE};
pub use presenter::{
    format_units, participation_percentage, ratio_to_percent, support_percentage, veto_percentage,
    vote_percentages, Percent, VotePercentages,
};
pub use proposal::{Action, MetadataState, Proposal, ProposalMetadata, Resource, Tally};
pub use proposal_id::ProposalIdParts;
pub use status::{
    min_veto_voting_power, resolve, resolve_majority, resolve_optimistic, Acceptance,
    MajorityInput, OptimisticInput, ProposalStatus, Rejection, StatusVariant,
};
pub use vote::{EventId, VoteKind, VoteOption, VoteRecord};
