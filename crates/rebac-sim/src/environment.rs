//! Simulation Environment
//!
//! Registry of agents, relations and contents, and the pipeline every new
//! content goes through: ingestion by its owner, optional propagation to
//! related agents, and estimation against the ground truth.

use rebac_types::{
    AgentId, Content, ContentId, Relation, RelationSchema, RelationType, SharingDecision,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::components::Agent;
use crate::config::RunMode;
use crate::error::SimError;
use crate::output::stats::{MispredictionLog, RelationStats};
use crate::systems::{estimation, ingest, propagation};

/// Whether content becomes visible to the owner's neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Propagation {
    None,
    /// Along relations whose type the ground truth permits
    ByRelation,
}

/// How the owner's decision is estimated in prediction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimation {
    /// Owner's internal model only, binary rule
    Internal,
    /// Internal model with external fallback on undecidable relation types
    Hybrid,
}

/// Stages run for every ingested content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub propagation: Propagation,
    pub estimation: Estimation,
}

impl Pipeline {
    /// Owners learn and predict alone.
    pub fn internal_only() -> Self {
        Self {
            propagation: Propagation::None,
            estimation: Estimation::Internal,
        }
    }

    /// Content spreads to neighbours, estimates fall back to the external model.
    pub fn external() -> Self {
        Self {
            propagation: Propagation::ByRelation,
            estimation: Estimation::Hybrid,
        }
    }
}

/// Which model produced an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    Internal,
    External,
}

/// One relation type's estimate for an ingested content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Estimate {
    pub relation_type: RelationType,
    pub truth: SharingDecision,
    pub decision: SharingDecision,
    pub source: EstimateSource,
}

impl Estimate {
    pub fn is_correct(&self) -> bool {
        self.truth == self.decision
    }
}

/// What happened to one content inside the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    pub content: ContentId,
    /// Agents the content became visible to
    pub visible_to: Vec<AgentId>,
    /// Present when the owner's decision was estimated
    pub estimates: Option<Vec<Estimate>>,
}

/// Agents, relations and contents of one trial, plus its statistics.
#[derive(Debug, Clone)]
pub struct Environment {
    pub(crate) schema: RelationSchema,
    pub(crate) pipeline: Pipeline,
    pub(crate) agents: BTreeMap<AgentId, Agent>,
    pub(crate) relations: BTreeMap<AgentId, BTreeMap<AgentId, Relation>>,
    pub(crate) contents: BTreeMap<ContentId, Content>,
    pub(crate) relation_stats: RelationStats,
    pub(crate) external_stats: RelationStats,
    pub(crate) agent_stats: BTreeMap<AgentId, RelationStats>,
    pub(crate) mispredictions: MispredictionLog,
}

impl Environment {
    pub fn new(schema: RelationSchema, pipeline: Pipeline) -> Self {
        Self {
            relation_stats: RelationStats::new(&schema),
            external_stats: RelationStats::new(&schema),
            schema,
            pipeline,
            agents: BTreeMap::new(),
            relations: BTreeMap::new(),
            contents: BTreeMap::new(),
            agent_stats: BTreeMap::new(),
            mispredictions: MispredictionLog::new(),
        }
    }

    pub fn schema(&self) -> &RelationSchema {
        &self.schema
    }

    pub fn pipeline(&self) -> Pipeline {
        self.pipeline
    }

    pub fn add_agent(&mut self, agent: Agent) -> Result<(), SimError> {
        if self.agents.contains_key(&agent.id()) {
            return Err(SimError::DuplicateAgent(agent.id()));
        }
        self.agents.insert(agent.id(), agent);
        Ok(())
    }

    /// Registers a directed relation. Both endpoints must exist.
    pub fn add_relation(&mut self, relation: Relation) -> Result<(), SimError> {
        if !self.schema.contains(relation.relation_type) {
            return Err(SimError::UnsupportedRelationType(relation.relation_type));
        }
        if !self.agents.contains_key(&relation.destination) {
            return Err(SimError::UnknownAgent(relation.destination));
        }
        let source = self
            .agents
            .get_mut(&relation.source)
            .ok_or(SimError::UnknownAgent(relation.source))?;
        source.add_relation(&relation);
        self.relations
            .entry(relation.source)
            .or_default()
            .insert(relation.destination, relation);
        Ok(())
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub(crate) fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    pub fn has_agent(&self, id: AgentId) -> bool {
        self.agents.contains_key(&id)
    }

    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.agents.keys().copied().collect()
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn relation(&self, source: AgentId, destination: AgentId) -> Option<&Relation> {
        self.relations.get(&source)?.get(&destination)
    }

    /// Outgoing relations of `agent`.
    pub fn relations_of(&self, agent: AgentId) -> impl Iterator<Item = &Relation> {
        self.relations.get(&agent).into_iter().flat_map(|edges| edges.values())
    }

    pub fn relation_count(&self) -> usize {
        self.relations.values().map(BTreeMap::len).sum()
    }

    pub fn content(&self, id: ContentId) -> Option<&Content> {
        self.contents.get(&id)
    }

    pub fn content_count(&self) -> usize {
        self.contents.len()
    }

    /// Internal-estimate statistics per relation type.
    pub fn relation_stats(&self) -> &RelationStats {
        &self.relation_stats
    }

    /// External-fallback statistics per relation type.
    pub fn external_stats(&self) -> &RelationStats {
        &self.external_stats
    }

    pub fn agent_stats(&self, id: AgentId) -> Option<&RelationStats> {
        self.agent_stats.get(&id)
    }

    pub fn mispredictions(&self) -> &MispredictionLog {
        &self.mispredictions
    }

    /// Runs one content through the pipeline and registers it.
    pub fn add_content(
        &mut self,
        content: Content,
        mode: &RunMode,
    ) -> Result<IngestOutcome, SimError> {
        let decisions = content
            .privacy
            .decision_vector(&self.schema)
            .map_err(|source| SimError::InvalidPrivacy {
                content: content.id,
                source,
            })?;

        ingest::ingest(self, &content, &decisions, mode)?;

        let visible_to = match self.pipeline.propagation {
            Propagation::None => Vec::new(),
            Propagation::ByRelation => propagation::propagate(self, &content, &decisions, mode)?,
        };

        let estimates = if mode.prediction_active() {
            match self.pipeline.estimation {
                Estimation::Internal => {
                    Some(estimation::estimate_internal(self, &content, &decisions)?)
                }
                Estimation::Hybrid => {
                    estimation::estimate_hybrid(self, &content, &decisions, mode)?
                }
            }
        } else {
            None
        };

        let outcome = IngestOutcome {
            content: content.id,
            visible_to,
            estimates,
        };
        self.contents.insert(content.id, content);
        Ok(outcome)
    }

    /// Every agent's internal tag model.
    pub fn render_tag_models(&self) -> String {
        let mut out = String::new();
        for agent in self.agents.values() {
            out.push_str(&format!("Agent {} ({})\n", agent.id(), agent.name()));
            out.push_str(&agent.render_tag_model());
            out.push('\n');
        }
        out
    }

    pub fn render_trusts(&self) -> String {
        self.agents.values().map(Agent::render_trusts).collect()
    }

    /// Internal and external confusion matrices with metrics.
    pub fn render_confusion(&self) -> String {
        format!(
            "Internal estimates\n{}\nExternal estimates\n{}",
            self.relation_stats, self.external_stats
        )
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Environment [agents={}, relations={}, contents={}, relation_types={}, predictions={}]",
            self.agents.len(),
            self.relation_count(),
            self.contents.len(),
            self.schema.len(),
            self.relation_stats.total() + self.external_stats.total()
        )
    }
}
