//! Fundamental types for Agora.
//!
//! This crate defines the primitive types shared across every other crate in the workspace:
//! EVM addresses, 256-bit amounts, block numbers, transaction and content hashes,
//! chain identifiers, and timestamps.

pub mod address;
pub mod amount;
pub mod block;
pub mod error;
pub mod hash;
pub mod network;
pub mod time;

pub use address::Address;
pub use amount::{mul_div, mul_wide, U256};
pub use block::{BlockNumber, BlockTag};
pub use error::TypesError;
pub use hash::{ContentHash, TxHash};
pub use network::ChainId;
pub use time::Timestamp;
