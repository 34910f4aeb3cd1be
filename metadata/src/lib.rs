//! Off-chain proposal metadata.
//!
//! Proposal texts live in immutable JSON documents on IPFS, referenced from
//! the creation event by content hash. This crate fetches them through an
//! HTTP gateway and validates drafts before they are pinned.

pub mod draft;
pub mod error;
pub mod gateway;

use std::future::Future;
use std::sync::Arc;

use agora_governance::ProposalMetadata;
use agora_types::ContentHash;

pub use draft::ProposalDraft;
pub use error::{DraftError, MetadataError};
pub use gateway::IpfsGateway;

/// Resolves a content hash to its metadata document.
pub trait MetadataFetcher: Send + Sync {
    fn fetch(
        &self,
        hash: &ContentHash,
    ) -> impl Future<Output = Result<ProposalMetadata, MetadataError>> + Send;
}

impl<T: MetadataFetcher + ?Sized> MetadataFetcher for Arc<T> {
    fn fetch(
        &self,
        hash: &ContentHash,
    ) -> impl Future<Output = Result<ProposalMetadata, MetadataError>> + Send {
        (**self).fetch(hash)
    }
}
