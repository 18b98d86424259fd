//! Content Items
//!
//! Posts shared by agents: tags plus a ground-truth privacy setting.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::agent::AgentId;
use crate::privacy::PrivacySetting;

/// Unique identifier for a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub u64);

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A shared post.
///
/// `Clone` is a deep copy, so each trial can reassign owners and rewrite
/// privacy settings without touching the source data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub id: ContentId,
    /// Assigned when the content is distributed
    #[serde(default = "unassigned_owner")]
    pub owner: AgentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Ordered tags; duplicates are allowed and each occurrence counts
    pub tags: Vec<String>,
    pub privacy: PrivacySetting,
}

fn unassigned_owner() -> AgentId {
    AgentId(0)
}

impl Content {
    pub fn new(id: ContentId, tags: Vec<String>, privacy: PrivacySetting) -> Self {
        Self {
            id,
            owner: unassigned_owner(),
            source: None,
            tags,
            privacy,
        }
    }

    pub fn with_owner(mut self, owner: AgentId) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Keeps at most `max_tags` tags. Zero keeps them all.
    pub fn truncate_tags(&mut self, max_tags: usize) {
        if max_tags > 0 && max_tags < self.tags.len() {
            self.tags.truncate(max_tags);
        }
    }

    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty()
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Content [id={}, owner={}, tags={:?}, privacy={}]",
            self.id, self.owner, self.tags, self.privacy
        )
    }
}
