//! EVM access for Agora.
//!
//! The rest of the workspace talks to the chain only through the capability
//! traits declared here:
//! - [`ContractReader`]: `eth_call` against a contract at a block
//! - [`LogQuery`]: `eth_getLogs` with an address/topic filter
//! - [`BlockSource`]: the current head and the chain id
//! - [`ProposalWriter`]: proposal submission, implemented by signing wallets
//!   outside this workspace
//!
//! [`HttpProvider`] implements the read capabilities over JSON-RPC; the
//! `agora-nullables` crate provides in-memory versions for tests.

pub mod abi;
pub mod error;
pub mod events;
pub mod plugin;
pub mod provider;
pub mod token;

use std::future::Future;
use std::sync::Arc;

use agora_governance::{Action, VoteOption};
use agora_types::{Address, BlockNumber, BlockTag, ChainId, ContentHash, Timestamp, TxHash, U256};

pub use error::ChainError;
pub use events::{Approved, LogFilter, ProposalCreated, RawLog, TallyEvent, VetoCast, VoteCast};
pub use plugin::{PluginContract, PluginKind};
pub use provider::HttpProvider;
pub use token::TokenContract;

/// Read-only contract calls.
pub trait ContractReader: Send + Sync {
    /// Execute `calldata` against `to` at `block` and return the raw return data.
    fn call(
        &self,
        to: Address,
        calldata: Vec<u8>,
        block: BlockTag,
    ) -> impl Future<Output = Result<Vec<u8>, ChainError>> + Send;
}

/// Event log queries.
pub trait LogQuery: Send + Sync {
    fn get_logs(
        &self,
        filter: &LogFilter,
    ) -> impl Future<Output = Result<Vec<RawLog>, ChainError>> + Send;
}

pub trait BlockSource: Send + Sync {
    fn block_number(&self) -> impl Future<Output = Result<BlockNumber, ChainError>> + Send;

    fn chain_id(&self) -> impl Future<Output = Result<ChainId, ChainError>> + Send;
}

/// Write access to a plugin. Signing and broadcasting live with whoever
/// implements this; [`HttpProvider`] is read-only.
pub trait ProposalWriter: Send + Sync {
    fn submit_vote(
        &self,
        proposal_id: U256,
        option: VoteOption,
        try_execute: bool,
    ) -> impl Future<Output = Result<TxHash, ChainError>> + Send;

    fn submit_proposal(
        &self,
        metadata_uri: &ContentHash,
        actions: &[Action],
        allow_failure_map: U256,
        start_date: Timestamp,
        end_date: Timestamp,
    ) -> impl Future<Output = Result<TxHash, ChainError>> + Send;
}

// ── Shared handles ──────────────────────────────────────────────────────

impl<T: ContractReader + ?Sized> ContractReader for Arc<T> {
    fn call(
        &self,
        to: Address,
        calldata: Vec<u8>,
        block: BlockTag,
    ) -> impl Future<Output = Result<Vec<u8>, ChainError>> + Send {
        (**self).call(to, calldata, block)
    }
}

impl<T: LogQuery + ?Sized> LogQuery for Arc<T> {
    fn get_logs(
        &self,
        filter: &LogFilter,
    ) -> impl Future<Output = Result<Vec<RawLog>, ChainError>> + Send {
        (**self).get_logs(filter)
    }
}

impl<T: BlockSource + ?Sized> BlockSource for Arc<T> {
    fn block_number(&self) -> impl Future<Output = Result<BlockNumber, ChainError>> + Send {
        (**self).block_number()
    }

    fn chain_id(&self) -> impl Future<Output = Result<ChainId, ChainError>> + Send {
        (**self).chain_id()
    }
}
