//! Simulation errors.

use rebac_types::{AgentId, ContentId, PrivacyError, RelationType};
use thiserror::Error;

use crate::config::ConfigError;

/// Fatal errors while building or running a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("no agents available to receive content")]
    NoAgents,
    #[error("agent {0} is already registered")]
    DuplicateAgent(AgentId),
    #[error("agent {0} is not registered")]
    UnknownAgent(AgentId),
    #[error("content {content} is owned by unregistered agent {owner}")]
    UnknownOwner { content: ContentId, owner: AgentId },
    #[error("relation type {0} is not configured for this run")]
    UnsupportedRelationType(RelationType),
    #[error("newcomer agent {0} is not part of the network")]
    UnknownNewcomer(AgentId),
    #[error("content {content} has an unusable privacy setting: {source}")]
    InvalidPrivacy {
        content: ContentId,
        #[source]
        source: PrivacyError,
    },
    #[error("invalid dataset: {0}")]
    Dataset(#[from] serde_json::Error),
    #[error(transparent)]
    Privacy(#[from] PrivacyError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
