//! Estimation
//!
//! Compares the owner's estimate of a content's decisions with the ground
//! truth and folds the result into the environment's statistics.

use rebac_types::{Content, SharingDecision};
use tracing::debug;

use crate::config::RunMode;
use crate::environment::{Environment, Estimate, EstimateSource};
use crate::error::SimError;
use crate::output::stats::RelationStats;

/// Owner's internal model with the undecidable band disabled.
pub fn estimate_internal(
    env: &mut Environment,
    content: &Content,
    decisions: &[SharingDecision],
) -> Result<Vec<Estimate>, SimError> {
    let owner = env
        .agents
        .get(&content.owner)
        .ok_or(SimError::UnknownAgent(content.owner))?;
    let estimated = owner.estimate(&content.tags, 0.0);

    let schema = env.schema.clone();
    let agent_stats = env
        .agent_stats
        .entry(content.owner)
        .or_insert_with(|| RelationStats::new(&schema));

    let mut estimates = Vec::with_capacity(schema.len());
    for (i, rtype) in schema.iter().enumerate() {
        let truth = decisions[i];
        let decision = estimated[i].decided().unwrap_or(SharingDecision::Deny);
        env.relation_stats.update(rtype, truth, decision);
        agent_stats.update(rtype, truth, decision);
        if decision != truth {
            env.mispredictions.record(content.id);
        }
        estimates.push(Estimate {
            relation_type: rtype,
            truth,
            decision,
            source: EstimateSource::Internal,
        });
    }
    Ok(estimates)
}

/// Owner's internal model, falling back to its external model wherever the
/// internal one is undecidable. Only normal owners are evaluated.
pub fn estimate_hybrid(
    env: &mut Environment,
    content: &Content,
    decisions: &[SharingDecision],
    mode: &RunMode,
) -> Result<Option<Vec<Estimate>>, SimError> {
    let schema = env.schema.clone();
    let owner = env
        .agents
        .get_mut(&content.owner)
        .ok_or(SimError::UnknownAgent(content.owner))?;
    if !owner.character().is_predictable() {
        return Ok(None);
    }

    let internal = owner.estimate(&content.tags, mode.undecidable_threshold());
    let mut estimates = Vec::with_capacity(schema.len());
    for (i, rtype) in schema.iter().enumerate() {
        let truth = decisions[i];
        let estimate = match internal[i].decided() {
            Some(decision) => {
                env.relation_stats.update(rtype, truth, decision);
                owner.record_internal(rtype, truth, decision);
                Estimate {
                    relation_type: rtype,
                    truth,
                    decision,
                    source: EstimateSource::Internal,
                }
            }
            None => {
                let decision = owner.estimate_external(&content.tags, i, mode);
                debug!(
                    "Content {} undecidable for {}; external model says {}",
                    content.id, rtype, decision
                );
                env.external_stats.update(rtype, truth, decision);
                owner.record_external(rtype, truth, decision);
                Estimate {
                    relation_type: rtype,
                    truth,
                    decision,
                    source: EstimateSource::External,
                }
            }
        };
        if !estimate.is_correct() {
            env.mispredictions.record(content.id);
        }
        estimates.push(estimate);
    }

    let agent_stats = env
        .agent_stats
        .entry(content.owner)
        .or_insert_with(|| RelationStats::new(&schema));
    for estimate in &estimates {
        agent_stats.update(estimate.relation_type, estimate.truth, estimate.decision);
    }
    Ok(Some(estimates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Agent;
    use crate::environment::Pipeline;
    use rebac_types::{
        AgentCharacter, AgentId, ContentId, PrivacySetting, Relation, RelationSchema, RelationType,
    };

    fn content(id: u64, owner: u32, tags: &[&str], decision: SharingDecision) -> Content {
        Content::new(
            ContentId(id),
            tags.iter().map(|t| t.to_string()).collect(),
            PrivacySetting::new().with_rule(RelationType::Friend, decision),
        )
        .with_owner(AgentId(owner))
    }

    fn pair() -> Environment {
        let mut env = Environment::new(RelationSchema::friends_only(), Pipeline::external());
        for id in [1, 2] {
            let agent = Agent::new(AgentId(id), format!("agent{}", id), env.schema());
            env.add_agent(agent).unwrap();
        }
        env.add_relation(Relation::new(AgentId(1), AgentId(2), RelationType::Friend))
            .unwrap();
        env.add_relation(Relation::new(AgentId(2), AgentId(1), RelationType::Friend))
            .unwrap();
        env
    }

    #[test]
    fn test_undecidable_falls_back_to_external() {
        let mut env = pair();
        let training = RunMode::new(0.2);
        // agent 1 has no history with "party"; agent 2 teaches it PERMIT
        env.add_content(content(1, 1, &["beach"], SharingDecision::Permit), &training)
            .unwrap();
        env.add_content(content(2, 1, &["office"], SharingDecision::Deny), &training)
            .unwrap();
        env.add_content(content(3, 2, &["party"], SharingDecision::Permit), &training)
            .unwrap();
        env.add_content(content(4, 2, &["work"], SharingDecision::Deny), &training)
            .unwrap();

        let outcome = env
            .add_content(
                content(5, 1, &["party"], SharingDecision::Permit),
                &training.predicting(),
            )
            .unwrap();
        let estimates = outcome.estimates.unwrap();
        assert_eq!(estimates[0].source, EstimateSource::External);
        assert_eq!(estimates[0].decision, SharingDecision::Permit);

        let external = env.external_stats().get(RelationType::Friend).unwrap();
        assert_eq!(external.total(), 1);
        assert_eq!(env.relation_stats().total(), 0);
        assert_eq!(env.agent(AgentId(1)).unwrap().external_stats().total(), 1);
        assert_eq!(env.agent_stats(AgentId(1)).unwrap().total(), 1);
    }

    #[test]
    fn test_decided_estimate_stays_internal() {
        let mut env = pair();
        let training = RunMode::new(0.1);
        env.add_content(content(1, 1, &["beach"], SharingDecision::Permit), &training)
            .unwrap();
        env.add_content(content(2, 1, &["office"], SharingDecision::Deny), &training)
            .unwrap();

        let outcome = env
            .add_content(
                content(3, 1, &["office"], SharingDecision::Permit),
                &training.predicting(),
            )
            .unwrap();
        let estimates = outcome.estimates.unwrap();
        assert_eq!(estimates[0].source, EstimateSource::Internal);
        assert_eq!(estimates[0].decision, SharingDecision::Deny);
        assert_eq!(env.mispredictions().count(ContentId(3)), 1);
        assert_eq!(env.agent(AgentId(1)).unwrap().internal_stats().total(), 1);
    }

    #[test]
    fn test_only_normal_owners_are_evaluated() {
        let mut env = pair();
        if let Some(agent) = env.agent_mut(AgentId(1)) {
            agent.set_character(AgentCharacter::Opposite);
        }
        let outcome = env
            .add_content(
                content(1, 1, &["beach"], SharingDecision::Permit),
                &RunMode::new(0.0).predicting(),
            )
            .unwrap();
        assert!(outcome.estimates.is_none());
        assert_eq!(outcome.visible_to, vec![AgentId(2)]);
        assert!(env.agent_stats(AgentId(1)).is_none());
    }
}
