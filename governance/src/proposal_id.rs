//! Packed optimistic proposal ids.
//!
//! Optimistic plugins pack the creation index and the veto window into the
//! id: `index << 128 | start_date << 64 | end_date`.

use agora_types::{Timestamp, U256};
use std::fmt;

use crate::error::GovernanceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProposalIdParts {
    pub index: u64,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
}

impl ProposalIdParts {
    pub fn encode(&self) -> U256 {
        (U256::from(self.index) << 128u32)
            | (U256::from(self.start_date.as_secs()) << 64u32)
            | U256::from(self.end_date.as_secs())
    }

    /// Split a packed id. Fails when the index does not fit 64 bits.
    pub fn decode(id: U256) -> Result<Self, GovernanceError> {
        let low = U256::from(u64::MAX);
        let index = id >> 128u32;
        if index > low {
            return Err(GovernanceError::MalformedProposalId);
        }
        Ok(Self {
            index: index.as_u64(),
            start_date: Timestamp::new(((id >> 64u32) & low).as_u64()),
            end_date: Timestamp::new((id & low).as_u64()),
        })
    }

    /// Plain (majority) ids are small counters, so the window is zero.
    pub fn is_packed(id: U256) -> bool {
        id > U256::from(u64::MAX)
    }
}

impl fmt::Display for ProposalIdParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({}..{})", self.index, self.start_date, self.end_date)
    }
}
