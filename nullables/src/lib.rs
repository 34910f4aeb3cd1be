//! Nullable infrastructure for deterministic testing.
//!
//! Every external capability of the workspace (contract reads, log queries,
//! block heads, metadata fetches, proposal writes) has a test-friendly
//! implementation here that:
//! - Returns deterministic values
//! - Can be controlled programmatically
//! - Never touches the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod chain;
pub mod metadata;
pub mod writer;

pub use chain::NullChain;
pub use metadata::NullMetadata;
pub use writer::{NullWriter, Submission};
