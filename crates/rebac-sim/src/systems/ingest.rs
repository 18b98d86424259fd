//! Ingestion: the owner takes the content and learns from it.

use rebac_types::{Content, SharingDecision};

use crate::config::RunMode;
use crate::environment::Environment;
use crate::error::SimError;

pub fn ingest(
    env: &mut Environment,
    content: &Content,
    decisions: &[SharingDecision],
    mode: &RunMode,
) -> Result<(), SimError> {
    let owner = env
        .agents
        .get_mut(&content.owner)
        .ok_or(SimError::UnknownOwner {
            content: content.id,
            owner: content.owner,
        })?;
    owner.learn_from_own(content, decisions, mode);
    Ok(())
}
