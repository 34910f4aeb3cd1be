//! Agora read engine: loads proposals and their tallies from the chain.
//!
//! The engine:
//! - Loads proposal snapshots (contract state, creation event, metadata)
//! - Caches reads by block height so stale responses never win
//! - Aggregates vote, veto and approval logs per proposal
//! - Polls the head block and refreshes what callers are watching
//! - Validates drafts and votes before anything reaches a writer

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod poller;
pub mod shutdown;
pub mod submit;
pub mod tracing_spans;

pub use aggregator::LogAggregator;
pub use cache::{CacheKey, QueryCache};
pub use config::AgoraConfig;
pub use error::{LoaderError, NodeError, SubmitError};
pub use loader::{LoadOutcome, PluginTarget, ProposalLoader, TokenInfo};
pub use logging::{init_logging, LogFormat};
pub use poller::BlockPoller;
pub use shutdown::ShutdownController;
pub use submit::{submit_draft, submit_vote};
