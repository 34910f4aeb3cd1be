//! HTTP client for an IPFS gateway.

use std::time::Duration;

use agora_governance::ProposalMetadata;
use agora_types::ContentHash;

use crate::error::MetadataError;
use crate::MetadataFetcher;

/// Default timeout for gateway requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Documents larger than this are rejected without parsing.
pub const MAX_DOCUMENT_BYTES: usize = 1 << 20;

/// Fetches metadata with `GET {gateway}/ipfs/{cid}`.
pub struct IpfsGateway {
    http_client: reqwest::Client,
    base_url: String,
}

impl IpfsGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    pub fn document_url(&self, hash: &ContentHash) -> String {
        format!("{}/ipfs/{}", self.base_url.trim_end_matches('/'), hash.cid())
    }
}

/// Parse a metadata document; missing fields default to empty.
pub fn parse_document(bytes: &[u8]) -> Result<ProposalMetadata, MetadataError> {
    if bytes.len() > MAX_DOCUMENT_BYTES {
        return Err(MetadataError::InvalidDocument(format!(
            "document is {} bytes, limit is {MAX_DOCUMENT_BYTES}",
            bytes.len()
        )));
    }
    serde_json::from_slice(bytes).map_err(|e| MetadataError::InvalidDocument(e.to_string()))
}

impl MetadataFetcher for IpfsGateway {
    async fn fetch(&self, hash: &ContentHash) -> Result<ProposalMetadata, MetadataError> {
        let url = self.document_url(hash);
        tracing::debug!(%url, "fetching proposal metadata");

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                MetadataError::Unreachable(format!("request timed out: {e}"))
            } else if e.is_connect() {
                MetadataError::Unreachable(format!("connection failed: {e}"))
            } else {
                MetadataError::RequestFailed(e.to_string())
            }
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(MetadataError::NotFound(hash.to_string()));
        }
        if !response.status().is_success() {
            return Err(MetadataError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| MetadataError::RequestFailed(format!("failed to read body: {e}")))?;
        parse_document(&body)
    }
}
