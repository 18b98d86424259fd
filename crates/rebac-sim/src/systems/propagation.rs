//! Visibility Propagation
//!
//! Related agents see the content and learn from it.

use rebac_types::{AgentId, Content, SharingDecision};
use tracing::debug;

use crate::config::RunMode;
use crate::environment::Environment;
use crate::error::SimError;

/// Shows `content` to the owner's neighbours and returns who saw it.
///
/// With several relation types a neighbour sees the content only when the
/// ground truth permits sharing across that relation's type. With a single
/// relation type every neighbour sees it.
pub fn propagate(
    env: &mut Environment,
    content: &Content,
    decisions: &[SharingDecision],
    mode: &RunMode,
) -> Result<Vec<AgentId>, SimError> {
    let multi_relational = env.schema.is_multi_relational();
    let viewers: Vec<AgentId> = env
        .relations_of(content.owner)
        .filter(|relation| {
            !multi_relational
                || content.privacy.get(relation.relation_type) == Some(SharingDecision::Permit)
        })
        .map(|relation| relation.destination)
        .collect();

    for viewer in &viewers {
        let agent = env
            .agents
            .get_mut(viewer)
            .ok_or(SimError::UnknownAgent(*viewer))?;
        agent.observe(content, decisions, mode);
    }

    debug!(
        "Content {} from agent {} visible to {} agents",
        content.id,
        content.owner,
        viewers.len()
    );
    Ok(viewers)
}
