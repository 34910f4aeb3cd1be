//! Vote, veto and approval log aggregation.
//!
//! Records are keyed by the identity of the log that carried them, so
//! re-reading an overlapping block range is harmless and the held set only
//! grows. A failed query leaves it untouched.

use std::collections::HashMap;
use std::marker::PhantomData;

use tracing::Instrument;

use agora_chain::{LogQuery, TallyEvent};
use agora_governance::VoteRecord;
use agora_types::{Address, BlockNumber, TxHash, U256};

use crate::error::LoaderError;
use crate::tracing_spans;

pub struct LogAggregator<E> {
    plugin: Address,
    proposal_id: U256,
    from_block: BlockNumber,
    /// Highest block seen so far; the next query starts there again.
    synced_to: Option<BlockNumber>,
    records: HashMap<(TxHash, u64), VoteRecord>,
    _event: PhantomData<E>,
}

impl<E: TallyEvent> LogAggregator<E> {
    /// Aggregate `E` events of `proposal_id` emitted from `from_block` on,
    /// normally the proposal's snapshot block.
    pub fn new(plugin: Address, proposal_id: U256, from_block: BlockNumber) -> Self {
        Self {
            plugin,
            proposal_id,
            from_block,
            synced_to: None,
            records: HashMap::new(),
            _event: PhantomData,
        }
    }

    pub fn proposal_id(&self) -> U256 {
        self.proposal_id
    }

    /// Fetch new logs and merge them. Returns how many records were new.
    pub async fn sync<Q: LogQuery>(&mut self, query: &Q) -> Result<usize, LoaderError> {
        let from = self.synced_to.unwrap_or(self.from_block);
        let span = tracing_spans::sync_span(E::SIGNATURE, self.proposal_id, from);
        let filter = E::filter(self.plugin, self.proposal_id, from);

        let logs = query
            .get_logs(&filter)
            .instrument(span.clone())
            .await
            .map_err(|e| {
                tracing::warn!(parent: &span, error = %e, "log query failed, keeping previous records");
                LoaderError::from(e)
            })?;

        let _entered = span.enter();
        let mut inserted = 0;
        let mut highest = from;
        for log in &logs {
            let record = match E::decode_record(log) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(error = %e, tx = %log.tx_hash, "skipping undecodable log");
                    continue;
                }
            };
            if record.proposal_id != self.proposal_id {
                continue;
            }
            highest = highest.max(record.event.block_number);
            if self.records.insert(record.event.key(), record).is_none() {
                inserted += 1;
            }
        }
        self.synced_to = Some(highest);
        tracing::debug!(fetched = logs.len(), inserted, "logs merged");
        Ok(inserted)
    }

    /// Every record, in emission order.
    pub fn records(&self) -> Vec<&VoteRecord> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by_key(|r| r.event);
        records
    }

    /// One record per voter: the last one they emitted. Ordered by emission.
    pub fn latest_by_voter(&self) -> Vec<&VoteRecord> {
        let mut latest: HashMap<Address, &VoteRecord> = HashMap::new();
        for record in self.records.values() {
            latest
                .entry(record.voter)
                .and_modify(|held| {
                    if record.event > held.event {
                        *held = record;
                    }
                })
                .or_insert(record);
        }
        let mut records: Vec<_> = latest.into_values().collect();
        records.sort_by_key(|r| r.event);
        records
    }

    pub fn has_voted(&self, voter: &Address) -> bool {
        self.records.values().any(|r| r.voter == *voter)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
