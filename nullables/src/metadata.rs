//! Nullable metadata gateway: documents served from memory.

use std::collections::HashMap;
use std::sync::Mutex;

use agora_governance::ProposalMetadata;
use agora_metadata::{MetadataError, MetadataFetcher};
use agora_types::ContentHash;

enum Entry {
    Document(ProposalMetadata),
    Broken(String),
}

/// An in-memory IPFS gateway. Unknown hashes are not found.
pub struct NullMetadata {
    documents: Mutex<HashMap<ContentHash, Entry>>,
    fetches: Mutex<Vec<ContentHash>>,
}

impl NullMetadata {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn insert(&self, hash: ContentHash, metadata: ProposalMetadata) {
        self.documents
            .lock()
            .unwrap()
            .insert(hash, Entry::Document(metadata));
    }

    /// Serve a document that fails to parse.
    pub fn insert_broken(&self, hash: ContentHash, reason: &str) {
        self.documents
            .lock()
            .unwrap()
            .insert(hash, Entry::Broken(reason.to_string()));
    }

    /// Every hash fetched so far, in order.
    pub fn fetched(&self) -> Vec<ContentHash> {
        self.fetches.lock().unwrap().clone()
    }
}

impl Default for NullMetadata {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataFetcher for NullMetadata {
    async fn fetch(&self, hash: &ContentHash) -> Result<ProposalMetadata, MetadataError> {
        self.fetches.lock().unwrap().push(hash.clone());
        match self.documents.lock().unwrap().get(hash) {
            Some(Entry::Document(m)) => Ok(m.clone()),
            Some(Entry::Broken(reason)) => Err(MetadataError::InvalidDocument(reason.clone())),
            None => Err(MetadataError::NotFound(hash.to_string())),
        }
    }
}
