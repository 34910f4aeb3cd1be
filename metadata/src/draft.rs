//! Proposal drafts: what an author fills in before the metadata is pinned.

use agora_governance::{Action, ProposalMetadata, Resource};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::DraftError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

fn is_web_url(s: &str) -> bool {
    match Url::parse(s.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

impl ProposalDraft {
    /// Check the draft, reporting the first problem found.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.title.trim().is_empty() {
            return Err(DraftError::MissingTitle);
        }
        if self.summary.trim().is_empty() {
            return Err(DraftError::MissingSummary);
        }
        for (index, resource) in self.resources.iter().enumerate() {
            if resource.name.trim().is_empty() {
                return Err(DraftError::EmptyResourceName { index });
            }
            if !is_web_url(&resource.url) {
                return Err(DraftError::InvalidResourceUrl {
                    index,
                    url: resource.url.clone(),
                });
            }
        }
        Ok(())
    }

    /// The document that gets pinned. Text is trimmed; actions stay on chain.
    pub fn to_metadata(&self) -> Result<ProposalMetadata, DraftError> {
        self.validate()?;
        Ok(ProposalMetadata {
            title: self.title.trim().to_string(),
            summary: self.summary.trim().to_string(),
            description: self.description.clone(),
            resources: self
                .resources
                .iter()
                .map(|r| Resource {
                    name: r.name.trim().to_string(),
                    url: r.url.trim().to_string(),
                })
                .collect(),
        })
    }

    /// Pretty JSON of [`Self::to_metadata`].
    pub fn to_pin_json(&self) -> Result<String, DraftError> {
        let metadata = self.to_metadata()?;
        // Serializing plain strings and vectors cannot fail.
        Ok(serde_json::to_string_pretty(&metadata).unwrap_or_default())
    }
}
