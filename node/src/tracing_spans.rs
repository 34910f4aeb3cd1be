//! Pre-built [`tracing::Span`] constructors for Agora read operations.
//!
//! Using the same span names and fields everywhere keeps traces of one
//! proposal easy to filter.

use tracing::{info_span, Span};

use agora_types::{Address, BlockNumber, U256};

/// Span covering one proposal read (contract call, creation log, metadata).
pub fn load_span(plugin: Address, proposal_id: U256, head: BlockNumber) -> Span {
    info_span!("load", %plugin, %proposal_id, head = head.as_u64())
}

/// Span covering one incremental log query of an aggregator.
pub fn sync_span(event: &str, proposal_id: U256, from: BlockNumber) -> Span {
    info_span!("sync", %event, %proposal_id, from = from.as_u64())
}

/// Span covering the block poller task.
pub fn poll_span() -> Span {
    info_span!("poll")
}
