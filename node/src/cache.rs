//! Block-stamped query cache.
//!
//! One explicit handle, cloned into whatever needs it; there is no global
//! cache. Proposal reads are keyed by `(chain, plugin, proposal id)` and
//! stamped with the block they were read at. A read is applied only when its
//! block is at least as new as the cached one, so a slow response for an old
//! head can never overwrite a newer one. Entries also expire after a TTL.
//!
//! Metadata documents are content addressed and never change, so they are
//! cached by hash without expiry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use agora_governance::ProposalMetadata;
use agora_types::{Address, BlockNumber, ChainId, ContentHash, U256};

use crate::loader::LoadOutcome;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub chain_id: ChainId,
    pub plugin: Address,
    pub proposal_id: U256,
}

struct Entry {
    block: BlockNumber,
    stored_at: Instant,
    outcome: LoadOutcome,
}

#[derive(Default)]
struct Inner {
    proposals: HashMap<CacheKey, Entry>,
    metadata: HashMap<ContentHash, ProposalMetadata>,
}

#[derive(Clone)]
pub struct QueryCache {
    ttl: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    // A panic while holding the lock leaves plain data behind; keep using it.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The cached outcome if it was read at `head` or later and has not expired.
    pub fn get(&self, key: &CacheKey, head: BlockNumber) -> Option<LoadOutcome> {
        let inner = self.lock();
        let entry = inner.proposals.get(key)?;
        if entry.block < head || entry.stored_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.outcome.clone())
    }

    /// Block the cached entry for `key` was read at.
    pub fn block_of(&self, key: &CacheKey) -> Option<BlockNumber> {
        self.lock().proposals.get(key).map(|e| e.block)
    }

    /// Store `outcome` read at `block` unless a newer read is already cached.
    /// Returns whichever outcome the cache holds afterwards.
    pub fn store(&self, key: CacheKey, block: BlockNumber, outcome: LoadOutcome) -> LoadOutcome {
        let mut inner = self.lock();
        match inner.proposals.get(&key) {
            Some(existing) if existing.block > block => {
                tracing::debug!(
                    proposal_id = %key.proposal_id,
                    cached = existing.block.as_u64(),
                    stale = block.as_u64(),
                    "discarding out-of-order read"
                );
                existing.outcome.clone()
            }
            _ => {
                inner.proposals.insert(
                    key,
                    Entry {
                        block,
                        stored_at: Instant::now(),
                        outcome: outcome.clone(),
                    },
                );
                outcome
            }
        }
    }

    /// Drop the entry for `key` if `head` is newer than the block it was read
    /// at. Returns whether anything was dropped.
    pub fn invalidate_before(&self, key: &CacheKey, head: BlockNumber) -> bool {
        let mut inner = self.lock();
        match inner.proposals.get(key) {
            Some(entry) if entry.block < head => {
                inner.proposals.remove(key);
                true
            }
            _ => false,
        }
    }

    pub fn metadata(&self, hash: &ContentHash) -> Option<ProposalMetadata> {
        self.lock().metadata.get(hash).cloned()
    }

    pub fn store_metadata(&self, hash: ContentHash, metadata: ProposalMetadata) {
        self.lock().metadata.insert(hash, metadata);
    }

    pub fn len(&self) -> usize {
        self.lock().proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.proposals.clear();
        inner.metadata.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: u64) -> CacheKey {
        CacheKey {
            chain_id: ChainId::SEPOLIA,
            plugin: Address::new([1; 20]),
            proposal_id: U256::from(id),
        }
    }

    #[test]
    fn newer_read_wins() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.store(key(1), BlockNumber::new(10), LoadOutcome::NotFound);
        let kept = cache.store(key(1), BlockNumber::new(9), LoadOutcome::Pending);
        assert_eq!(kept, LoadOutcome::NotFound);
        assert_eq!(cache.block_of(&key(1)), Some(BlockNumber::new(10)));

        let replaced = cache.store(key(1), BlockNumber::new(11), LoadOutcome::Pending);
        assert_eq!(replaced, LoadOutcome::Pending);
    }

    #[test]
    fn equal_block_replaces() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.store(key(1), BlockNumber::new(10), LoadOutcome::Pending);
        cache.store(key(1), BlockNumber::new(10), LoadOutcome::NotFound);
        assert_eq!(cache.get(&key(1), BlockNumber::new(10)), Some(LoadOutcome::NotFound));
    }

    #[test]
    fn stale_by_block_or_ttl() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.store(key(1), BlockNumber::new(10), LoadOutcome::NotFound);
        assert!(cache.get(&key(1), BlockNumber::new(10)).is_some());
        assert!(cache.get(&key(1), BlockNumber::new(11)).is_none());
        assert!(cache.get(&key(2), BlockNumber::new(10)).is_none());

        let expired = QueryCache::new(Duration::ZERO);
        expired.store(key(1), BlockNumber::new(10), LoadOutcome::NotFound);
        std::thread::sleep(Duration::from_millis(2));
        assert!(expired.get(&key(1), BlockNumber::new(10)).is_none());
    }

    #[test]
    fn invalidation_only_for_newer_heads() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.store(key(1), BlockNumber::new(10), LoadOutcome::NotFound);
        assert!(!cache.invalidate_before(&key(1), BlockNumber::new(10)));
        assert!(cache.invalidate_before(&key(1), BlockNumber::new(11)));
        assert!(cache.is_empty());
    }

    #[test]
    fn handles_share_state() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let other = cache.clone();
        other.store_metadata(ContentHash::new("QmA").unwrap(), ProposalMetadata::default());
        assert!(cache.metadata(&ContentHash::new("QmA").unwrap()).is_some());
        cache.clear();
        assert!(other.metadata(&ContentHash::new("QmA").unwrap()).is_none());
    }
}
