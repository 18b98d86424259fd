//! Content Distribution
//!
//! Prepares content for a trial and hands it out to agents round-robin,
//! reshuffling the agent order at the start of every cycle.

use rand::seq::SliceRandom;
use rand::Rng;
use rebac_types::{AgentId, Content, RelationType, SharingDecision};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::config::RunMode;
use crate::environment::Environment;
use crate::error::SimError;

/// Tags removed from content unless configured otherwise.
pub const DEFAULT_FORBIDDEN_TAGS: &[&str] = &["people", "one", "two", "three", "four", "five"];

/// Drops forbidden tags, keeps at most `max_tags` (zero keeps all) and
/// skips content left without tags.
pub fn prepare_contents(
    contents: &[Content],
    max_tags: usize,
    forbidden_tags: &[String],
) -> Vec<Content> {
    contents
        .iter()
        .filter_map(|content| {
            let mut prepared = content.clone();
            prepared.tags.retain(|tag| !forbidden_tags.contains(tag));
            prepared.truncate_tags(max_tags);
            prepared.has_tags().then_some(prepared)
        })
        .collect()
}

/// An agent held out of distribution until it joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Newcomer {
    pub agent: AgentId,
    /// Contents distributed before the agent joins. None holds it out for the whole phase
    pub joins_after: Option<usize>,
}

impl Newcomer {
    pub fn held_out(agent: AgentId) -> Self {
        Self {
            agent,
            joins_after: None,
        }
    }

    pub fn joining_after(agent: AgentId, turn: usize) -> Self {
        Self {
            agent,
            joins_after: Some(turn),
        }
    }
}

/// Ground truth and tags of the distributed contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistributionSummary {
    pub distributed: usize,
    /// DENY and PERMIT counts per relation type
    pub decision_counts: BTreeMap<RelationType, [u64; SharingDecision::COUNT]>,
    pub distinct_tags: usize,
}

/// Assigns every content an owner, applies the owner's character in
/// training mode, and runs it through the environment.
pub fn distribute<R: Rng>(
    env: &mut Environment,
    contents: &[Content],
    mode: &RunMode,
    rng: &mut R,
    newcomer: Option<Newcomer>,
) -> Result<DistributionSummary, SimError> {
    let mut active = env.agent_ids();
    let mut pending = None;
    if let Some(newcomer) = newcomer {
        if !env.has_agent(newcomer.agent) {
            return Err(SimError::UnknownNewcomer(newcomer.agent));
        }
        if newcomer.joins_after != Some(0) {
            active.retain(|id| *id != newcomer.agent);
            pending = Some(newcomer);
        }
    }
    if active.is_empty() && !contents.is_empty() {
        return Err(SimError::NoAgents);
    }

    let mut summary = DistributionSummary::default();
    let mut tags = BTreeSet::new();
    let mut cursor = 0;

    for (turn, item) in contents.iter().enumerate() {
        if let Some(newcomer) = pending {
            if newcomer.joins_after == Some(turn) {
                debug!("Agent {} joins after {} contents", newcomer.agent, turn);
                active.push(newcomer.agent);
                cursor = 0;
                pending = None;
            }
        }
        if cursor == 0 {
            active.shuffle(rng);
        }
        let owner_id = active[cursor];
        cursor = (cursor + 1) % active.len();

        let mut content = item.clone().with_owner(owner_id);
        if !mode.prediction_active() {
            let owner = env.agent(owner_id).ok_or(SimError::UnknownAgent(owner_id))?;
            owner.apply_character(&mut content.privacy, rng);
        }

        for (rtype, decision) in content.privacy.rules() {
            summary.decision_counts.entry(rtype).or_default()[decision.index()] += 1;
        }
        tags.extend(content.tags.iter().cloned());
        summary.distributed += 1;

        env.add_content(content, mode)?;
    }

    summary.distinct_tags = tags.len();
    info!(
        "Distributed {} contents ({} distinct tags, prediction {})",
        summary.distributed,
        summary.distinct_tags,
        if mode.prediction_active() { "on" } else { "off" }
    );
    Ok(summary)
}
