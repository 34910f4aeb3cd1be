//! Fallback texts and loading states for proposal cards.

use crate::proposal::{MetadataState, Proposal};

pub const NO_TITLE: &str = "(No proposal title)";
pub const METADATA_UNAVAILABLE: &str = "(The metadata of the proposal is not available)";
pub const NO_SUMMARY: &str = "(No proposal summary)";

/// Progress of a single fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchStatus {
    Loading,
    Ready,
    Failed,
}

/// What a proposal card can show right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CardState {
    LoadingProposal,
    LoadingMetadata,
    MetadataMissing,
    Ready,
}

impl CardState {
    /// The proposal fetch gates everything; metadata only matters once the
    /// proposal itself is known.
    pub fn derive(proposal: FetchStatus, metadata: FetchStatus) -> Self {
        match (proposal, metadata) {
            (FetchStatus::Loading | FetchStatus::Failed, _) => Self::LoadingProposal,
            (FetchStatus::Ready, FetchStatus::Loading) => Self::LoadingMetadata,
            (FetchStatus::Ready, FetchStatus::Failed) => Self::MetadataMissing,
            (FetchStatus::Ready, FetchStatus::Ready) => Self::Ready,
        }
    }

    pub fn of(proposal: Option<&Proposal>) -> Self {
        let Some(proposal) = proposal else {
            return Self::LoadingProposal;
        };
        let metadata = match proposal.metadata {
            MetadataState::Pending => FetchStatus::Loading,
            MetadataState::Unavailable(_) => FetchStatus::Failed,
            MetadataState::Loaded(_) => FetchStatus::Ready,
        };
        Self::derive(FetchStatus::Ready, metadata)
    }
}

/// Title to display, never empty.
pub fn display_title(proposal: &Proposal) -> &str {
    match &proposal.metadata {
        MetadataState::Unavailable(_) => METADATA_UNAVAILABLE,
        _ if proposal.title().is_empty() => NO_TITLE,
        _ => proposal.title(),
    }
}

/// Summary to display, never empty.
pub fn display_summary(proposal: &Proposal) -> &str {
    if proposal.summary().is_empty() {
        NO_SUMMARY
    } else {
        proposal.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{MajorityParameters, ProposalParameters, Ratio};
    use crate::proposal::{ProposalMetadata, Tally};
    use agora_types::{BlockNumber, Timestamp, U256};

    fn proposal(metadata: MetadataState) -> Proposal {
        Proposal {
            id: U256::ONE,
            active: true,
            executed: false,
            parameters: ProposalParameters::Majority(MajorityParameters {
                support_threshold: Ratio::new(500_000).unwrap(),
                start_date: Timestamp::new(10),
                end_date: Timestamp::new(20),
                snapshot_block: BlockNumber::new(5),
                min_voting_power: U256::ZERO,
            }),
            tally: Tally::Majority {
                yes: U256::ZERO,
                no: U256::ZERO,
                abstain: U256::ZERO,
            },
            creator: None,
            actions: vec![],
            allow_failure_map: U256::ZERO,
            metadata,
        }
    }

    #[test]
    fn card_states() {
        assert_eq!(CardState::of(None), CardState::LoadingProposal);
        assert_eq!(
            CardState::of(Some(&proposal(MetadataState::Pending))),
            CardState::LoadingMetadata
        );
        assert_eq!(
            CardState::of(Some(&proposal(MetadataState::Unavailable("gone".into())))),
            CardState::MetadataMissing
        );
        assert_eq!(
            CardState::derive(FetchStatus::Failed, FetchStatus::Ready),
            CardState::LoadingProposal
        );
    }

    #[test]
    fn fallbacks() {
        let missing = proposal(MetadataState::Unavailable("no creation logs".into()));
        assert_eq!(display_title(&missing), METADATA_UNAVAILABLE);
        assert_eq!(display_summary(&missing), NO_SUMMARY);

        let untitled = proposal(MetadataState::Loaded(ProposalMetadata::default()));
        assert_eq!(display_title(&untitled), NO_TITLE);

        let titled = proposal(MetadataState::Loaded(ProposalMetadata {
            title: "Fund the grants round".into(),
            summary: "Moves 10k to the grants safe".into(),
            ..Default::default()
        }));
        assert_eq!(display_title(&titled), "Fund the grants round");
        assert_eq!(display_summary(&titled), "Moves 10k to the grants safe");
    }
}
