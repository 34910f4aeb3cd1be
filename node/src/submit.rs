//! Checked submission through a [`ProposalWriter`].
//!
//! Nothing reaches the writer unless the input passed validation first.

use agora_chain::ProposalWriter;
use agora_governance::{Proposal, VoteOption};
use agora_metadata::ProposalDraft;
use agora_types::{ContentHash, Timestamp, TxHash, U256};

use crate::error::SubmitError;

/// Submit `draft`, whose metadata was pinned at `metadata_uri`.
pub async fn submit_draft<W: ProposalWriter>(
    writer: &W,
    draft: &ProposalDraft,
    metadata_uri: &ContentHash,
    start_date: Timestamp,
    end_date: Timestamp,
) -> Result<TxHash, SubmitError> {
    draft.validate()?;
    let tx = writer
        .submit_proposal(metadata_uri, &draft.actions, U256::ZERO, start_date, end_date)
        .await?;
    tracing::info!(%tx, cid = %metadata_uri, "proposal submitted");
    Ok(tx)
}

/// Vote on `proposal` if it is still inside its voting window.
pub async fn submit_vote<W: ProposalWriter>(
    writer: &W,
    proposal: &Proposal,
    option: VoteOption,
    try_execute: bool,
) -> Result<TxHash, SubmitError> {
    if !proposal.active || proposal.executed {
        return Err(SubmitError::VotingClosed(proposal.id));
    }
    let tx = writer.submit_vote(proposal.id, option, try_execute).await?;
    tracing::info!(%tx, proposal_id = %proposal.id, %option, "vote submitted");
    Ok(tx)
}
