//! Nullable proposal writer: record submissions without signing anything.

use std::sync::Mutex;

use agora_chain::{ChainError, ProposalWriter};
use agora_governance::{Action, VoteOption};
use agora_types::{ContentHash, Timestamp, TxHash, U256};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    Vote {
        proposal_id: U256,
        option: VoteOption,
        try_execute: bool,
    },
    Proposal {
        metadata_uri: ContentHash,
        actions: Vec<Action>,
        allow_failure_map: U256,
        start_date: Timestamp,
        end_date: Timestamp,
    },
}

/// Records every submission and answers with sequential transaction hashes.
pub struct NullWriter {
    submitted: Mutex<Vec<Submission>>,
}

impl NullWriter {
    pub fn new() -> Self {
        Self {
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// Get all submissions (for assertions).
    pub fn submitted(&self) -> Vec<Submission> {
        self.submitted.lock().unwrap().clone()
    }

    fn record(&self, submission: Submission) -> TxHash {
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(submission);
        let mut hash = [0xeeu8; 32];
        hash[24..].copy_from_slice(&(submitted.len() as u64).to_be_bytes());
        TxHash::new(hash)
    }
}

impl Default for NullWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProposalWriter for NullWriter {
    async fn submit_vote(
        &self,
        proposal_id: U256,
        option: VoteOption,
        try_execute: bool,
    ) -> Result<TxHash, ChainError> {
        Ok(self.record(Submission::Vote {
            proposal_id,
            option,
            try_execute,
        }))
    }

    async fn submit_proposal(
        &self,
        metadata_uri: &ContentHash,
        actions: &[Action],
        allow_failure_map: U256,
        start_date: Timestamp,
        end_date: Timestamp,
    ) -> Result<TxHash, ChainError> {
        Ok(self.record(Submission::Proposal {
            metadata_uri: metadata_uri.clone(),
            actions: actions.to_vec(),
            allow_failure_map,
            start_date,
            end_date,
        }))
    }
}
