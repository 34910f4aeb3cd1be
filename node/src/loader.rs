//! Proposal snapshot loader.
//!
//! Joins the on-chain half of a proposal (`getProposal` at the current head)
//! with its creation event and the metadata document the event points to.
//! Results go through the shared [`QueryCache`].

use std::sync::OnceLock;

use tracing::Instrument;

use agora_chain::abi::event_topic;
use agora_chain::{
    BlockSource, ChainError, ContractReader, LogFilter, LogQuery, PluginContract, PluginKind,
    ProposalCreated, RawLog, TokenContract,
};
use agora_governance::{
    resolve, resolve_optimistic, MetadataState, OptimisticInput, Proposal, ProposalParameters,
    ProposalStatus, Ratio, Tally,
};
use agora_metadata::{MetadataError, MetadataFetcher};
use agora_types::{Address, BlockNumber, BlockTag, ChainId, U256};

use crate::cache::{CacheKey, QueryCache};
use crate::error::{LoaderError, NodeError};
use crate::tracing_spans;

/// Result of loading one proposal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Found(Proposal),
    /// The plugin has no proposal with this id.
    NotFound,
    /// The creation event is visible but the contract read at our head is
    /// still empty (the node serving calls lags the one serving logs).
    Pending,
}

impl LoadOutcome {
    pub fn proposal(&self) -> Option<&Proposal> {
        match self {
            Self::Found(p) => Some(p),
            _ => None,
        }
    }

    pub fn into_proposal(self) -> Option<Proposal> {
        match self {
            Self::Found(p) => Some(p),
            _ => None,
        }
    }
}

/// The plugin a loader reads from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PluginTarget {
    pub chain_id: ChainId,
    pub address: Address,
    pub kind: PluginKind,
}

/// What the CLI shows next to token amounts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenInfo {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
}

/// A read plus whether it may be cached.
struct Read {
    outcome: LoadOutcome,
    cacheable: bool,
}

pub struct ProposalLoader<C, L, M> {
    chain: C,
    logs: L,
    metadata: M,
    target: PluginTarget,
    token: OnceLock<Address>,
    min_veto_ratio: Option<Ratio>,
    cache: QueryCache,
}

impl<C, L, M> ProposalLoader<C, L, M>
where
    C: ContractReader + BlockSource,
    L: LogQuery,
    M: MetadataFetcher,
{
    pub fn new(chain: C, logs: L, metadata: M, target: PluginTarget, cache: QueryCache) -> Self {
        Self {
            chain,
            logs,
            metadata,
            target,
            token: OnceLock::new(),
            min_veto_ratio: None,
            cache,
        }
    }

    /// Use `token` instead of asking the plugin for its voting token.
    pub fn with_token(self, token: Address) -> Self {
        let _ = self.token.set(token);
        self
    }

    /// Resolve optimistic proposals against `ratio` instead of their own
    /// minimum veto ratio.
    pub fn with_min_veto_ratio(mut self, ratio: Ratio) -> Self {
        self.min_veto_ratio = Some(ratio);
        self
    }

    pub fn target(&self) -> PluginTarget {
        self.target
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    fn key(&self, id: U256) -> CacheKey {
        CacheKey {
            chain_id: self.target.chain_id,
            plugin: self.target.address,
            proposal_id: id,
        }
    }

    fn plugin(&self) -> PluginContract<'_, C> {
        PluginContract::new(&self.chain, self.target.address, self.target.kind)
    }

    /// Fail unless the RPC endpoint serves the configured chain.
    pub async fn check_chain(&self) -> Result<(), NodeError> {
        let actual = self.chain.chain_id().await.map_err(LoaderError::from)?;
        if actual != self.target.chain_id {
            return Err(NodeError::ChainMismatch {
                expected: self.target.chain_id,
                actual,
            });
        }
        Ok(())
    }

    pub async fn head(&self) -> Result<BlockNumber, LoaderError> {
        Ok(self.chain.block_number().await?)
    }

    /// Load proposal `id` as of the current head.
    pub async fn load(&self, id: U256) -> Result<LoadOutcome, LoaderError> {
        let head = self.head().await?;
        self.load_at(id, head).await
    }

    /// Reload `id` after the chain moved to `head`. A cached read from an
    /// older block is dropped first.
    pub async fn refresh_on_block(
        &self,
        id: U256,
        head: BlockNumber,
    ) -> Result<LoadOutcome, LoaderError> {
        if self.cache.invalidate_before(&self.key(id), head) {
            tracing::debug!(proposal_id = %id, head = head.as_u64(), "cached read is behind the head");
        }
        self.load_at(id, head).await
    }

    async fn load_at(&self, id: U256, head: BlockNumber) -> Result<LoadOutcome, LoaderError> {
        let key = self.key(id);
        if let Some(hit) = self.cache.get(&key, head) {
            tracing::debug!(proposal_id = %id, head = head.as_u64(), "cache hit");
            return Ok(hit);
        }

        let span = tracing_spans::load_span(self.target.address, id, head);
        let read = self.read(id, head).instrument(span).await?;
        if !read.cacheable {
            return Ok(read.outcome);
        }
        Ok(self.cache.store(key, head, read.outcome))
    }

    async fn read(&self, id: U256, head: BlockNumber) -> Result<Read, LoaderError> {
        let plugin = self.plugin();
        let filter = LogFilter::for_proposal(
            self.target.address,
            ProposalCreated::SIGNATURE,
            id,
            BlockNumber::GENESIS,
        );
        tracing::debug!("reading proposal and creation event");
        let (onchain, created) = tokio::join!(
            plugin.proposal(id, BlockTag::Number(head)),
            self.logs.get_logs(&filter),
        );

        let onchain = onchain.map_err(|e| {
            tracing::warn!(error = %e, "proposal read failed");
            LoaderError::from(e)
        })?;
        let created = created.and_then(|logs| creation_event(&logs));

        let Some(mut proposal) = onchain else {
            return Ok(match created {
                Ok(Some(_)) => {
                    tracing::debug!("creation event seen before the proposal is readable");
                    Read {
                        outcome: LoadOutcome::Pending,
                        cacheable: false,
                    }
                }
                _ => Read {
                    outcome: LoadOutcome::NotFound,
                    cacheable: true,
                },
            });
        };

        let mut cacheable = true;
        proposal.metadata = match created {
            Ok(Some(event)) => {
                proposal.creator = Some(event.creator);
                let (state, settled) = self.resolve_metadata(&event).await;
                cacheable = settled;
                state
            }
            Ok(None) => {
                tracing::warn!("proposal metadata unavailable: no creation logs");
                MetadataState::Unavailable("no creation logs".into())
            }
            Err(e) => {
                tracing::warn!(error = %e, "proposal metadata unavailable: creation log query failed");
                cacheable = false;
                MetadataState::Unavailable(format!("creation log query failed: {e}"))
            }
        };
        Ok(Read {
            outcome: LoadOutcome::Found(proposal),
            cacheable,
        })
    }

    /// Metadata for `event`, and whether the answer is final. Gateway
    /// outages are not final; missing or malformed documents are.
    async fn resolve_metadata(&self, event: &ProposalCreated) -> (MetadataState, bool) {
        let hash = match event.content_hash() {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(error = %e, "proposal metadata unavailable: bad metadata pointer");
                return (MetadataState::Unavailable(e.to_string()), true);
            }
        };
        if let Some(metadata) = self.cache.metadata(&hash) {
            return (MetadataState::Loaded(metadata), true);
        }

        match self.metadata.fetch(&hash).await {
            Ok(metadata) => {
                self.cache.store_metadata(hash, metadata.clone());
                (MetadataState::Loaded(metadata), true)
            }
            Err(e) => {
                tracing::warn!(cid = %hash, error = %e, "proposal metadata unavailable");
                let settled = !matches!(
                    e,
                    MetadataError::Unreachable(_) | MetadataError::RequestFailed(_)
                );
                (MetadataState::Unavailable(e.to_string()), settled)
            }
        }
    }

    pub async fn proposal_count(&self) -> Result<U256, LoaderError> {
        Ok(self.plugin().proposal_count().await?)
    }

    /// Ids of the newest `limit` proposals, newest first.
    ///
    /// Token voting ids count up from zero. Optimistic ids pack the voting
    /// window, so they are taken from creation events instead.
    pub async fn proposal_ids(&self, limit: usize) -> Result<Vec<U256>, LoaderError> {
        match self.target.kind {
            PluginKind::TokenVoting => {
                let count = self.proposal_count().await?;
                let count = if count > U256::from(u64::MAX) {
                    u64::MAX
                } else {
                    count.as_u64()
                };
                Ok((0..count).rev().take(limit).map(U256::from).collect())
            }
            PluginKind::Optimistic => {
                let filter = LogFilter {
                    address: self.target.address,
                    topics: vec![Some(event_topic(ProposalCreated::SIGNATURE))],
                    from_block: BlockTag::Number(BlockNumber::GENESIS),
                    to_block: BlockTag::Latest,
                };
                let mut logs = self.logs.get_logs(&filter).await?;
                logs.sort_by_key(|log| std::cmp::Reverse(log.event_id()));
                let mut ids: Vec<U256> = Vec::new();
                for log in &logs {
                    match ProposalCreated::decode(log) {
                        Ok(created) if !ids.contains(&created.proposal_id) => {
                            ids.push(created.proposal_id)
                        }
                        Ok(_) => {}
                        Err(e) => tracing::warn!(error = %e, "skipping undecodable creation log"),
                    }
                    if ids.len() == limit {
                        break;
                    }
                }
                Ok(ids)
            }
        }
    }

    /// The plugin's voting token, asked once and remembered.
    pub async fn voting_token(&self) -> Result<Address, LoaderError> {
        if let Some(token) = self.token.get() {
            return Ok(*token);
        }
        let token = self.plugin().voting_token().await?;
        Ok(*self.token.get_or_init(|| token))
    }

    /// Symbol, decimals and current supply of the voting token.
    pub async fn token_info(&self) -> Result<TokenInfo, LoaderError> {
        let address = self.voting_token().await?;
        let token = TokenContract::new(&self.chain, address);
        let (symbol, decimals, total_supply) =
            tokio::join!(token.symbol(), token.decimals(), token.total_supply());
        Ok(TokenInfo {
            address,
            symbol: symbol?,
            decimals: decimals?,
            total_supply: total_supply?,
        })
    }

    /// Voting power `account` held at the proposal's snapshot block, or
    /// `None` while the token cannot answer for that block yet.
    pub async fn voting_power(
        &self,
        account: Address,
        proposal: &Proposal,
    ) -> Result<Option<U256>, LoaderError> {
        let token = self.voting_token().await?;
        let at = proposal.parameters.snapshot_block();
        match TokenContract::new(&self.chain, token).past_votes(account, at).await {
            Ok(votes) => Ok(Some(votes)),
            Err(ChainError::Rpc { code, message }) => {
                tracing::debug!(code, %message, block = at.as_u64(), "past votes not available");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Total supply of the voting token at the proposal's snapshot block.
    ///
    /// `None` while the token cannot answer for that block yet (it reverts
    /// for the current block and later).
    pub async fn snapshot_supply(&self, proposal: &Proposal) -> Result<Option<U256>, LoaderError> {
        let token = self.voting_token().await?;
        let at = proposal.parameters.snapshot_block();
        match TokenContract::new(&self.chain, token).past_total_supply(at).await {
            Ok(supply) => Ok(Some(supply)),
            Err(ChainError::Rpc { code, message }) => {
                tracing::debug!(code, %message, block = at.as_u64(), "snapshot supply not available");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Minimum veto ratio that applies to `proposal`.
    pub fn min_veto_ratio(&self, proposal: &Proposal) -> Option<Ratio> {
        match &proposal.parameters {
            ProposalParameters::Optimistic(p) => Some(self.min_veto_ratio.unwrap_or(p.min_veto_ratio)),
            ProposalParameters::Majority(_) => None,
        }
    }

    /// Current status of `proposal`, reading the snapshot supply if the
    /// variant needs it.
    pub async fn status(&self, proposal: &Proposal) -> Result<ProposalStatus, LoaderError> {
        let (Some(ratio), Tally::Veto { weight: veto_tally }) = (self.min_veto_ratio(proposal), &proposal.tally)
        else {
            return Ok(resolve(Some(proposal), None));
        };
        let Some(supply) = self.snapshot_supply(proposal).await? else {
            return Ok(ProposalStatus::Loading);
        };
        Ok(resolve_optimistic(
            &OptimisticInput {
                active: proposal.active,
                executed: proposal.executed,
                veto_tally: *veto_tally,
            },
            supply,
            ratio,
        ))
    }
}

/// The earliest decodable `ProposalCreated` among `logs`.
fn creation_event(logs: &[RawLog]) -> Result<Option<ProposalCreated>, ChainError> {
    let Some(first) = logs.iter().min_by_key(|log| log.event_id()) else {
        return Ok(None);
    };
    ProposalCreated::decode(first).map(Some)
}
