//! Agents
//!
//! An agent learns from the content it owns and the content it sees, keeps
//! trust toward the agents it is related to, and records how well its own
//! estimates matched.

use rand::Rng;
use rebac_types::{
    AgentCharacter, AgentId, Content, ContentId, Decision, PrivacySetting, Relation,
    RelationSchema, RelationType, SharingDecision,
};
use std::collections::BTreeMap;
use tracing::warn;

use super::tag_table::{SupportWeights, TagStatisticsModel, Weighting};
use super::trust::TrustTracker;
use crate::config::RunMode;
use crate::output::stats::RelationStats;
use crate::output::table::format_number;

/// A participant in the sharing network.
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    name: String,
    character: AgentCharacter,
    schema: RelationSchema,
    owned: Vec<ContentId>,
    visible: Vec<ContentId>,
    trusts: BTreeMap<AgentId, TrustTracker>,
    internal_model: TagStatisticsModel,
    external_model: TagStatisticsModel,
    internal_stats: RelationStats,
    external_stats: RelationStats,
}

impl Agent {
    pub fn new(id: AgentId, name: impl Into<String>, schema: &RelationSchema) -> Self {
        Self {
            id,
            name: name.into(),
            character: AgentCharacter::Normal,
            schema: schema.clone(),
            owned: Vec::new(),
            visible: Vec::new(),
            trusts: BTreeMap::new(),
            internal_model: TagStatisticsModel::for_schema(schema),
            external_model: TagStatisticsModel::for_schema(schema),
            internal_stats: RelationStats::new(schema),
            external_stats: RelationStats::new(schema),
        }
    }

    pub fn with_character(mut self, character: AgentCharacter) -> Self {
        self.character = character;
        self
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn character(&self) -> AgentCharacter {
        self.character
    }

    pub fn set_character(&mut self, character: AgentCharacter) {
        self.character = character;
    }

    /// Starts trust toward the peer of an outgoing relation at the prior.
    pub fn add_relation(&mut self, relation: &Relation) {
        debug_assert_eq!(relation.source, self.id);
        self.trusts
            .insert(relation.destination, TrustTracker::new(self.schema.len()));
    }

    pub fn owned_contents(&self) -> &[ContentId] {
        &self.owned
    }

    pub fn visible_contents(&self) -> &[ContentId] {
        &self.visible
    }

    pub fn internal_model(&self) -> &TagStatisticsModel {
        &self.internal_model
    }

    pub fn external_model(&self) -> &TagStatisticsModel {
        &self.external_model
    }

    pub fn trust_toward(&self, peer: AgentId) -> Option<&TrustTracker> {
        self.trusts.get(&peer)
    }

    pub fn trusts(&self) -> impl Iterator<Item = (AgentId, &TrustTracker)> {
        self.trusts.iter().map(|(peer, tracker)| (*peer, tracker))
    }

    pub fn internal_stats(&self) -> &RelationStats {
        &self.internal_stats
    }

    pub fn external_stats(&self) -> &RelationStats {
        &self.external_stats
    }

    /// Takes ownership of `content` and learns from its decisions when the mode allows.
    pub fn learn_from_own(
        &mut self,
        content: &Content,
        decisions: &[SharingDecision],
        mode: &RunMode,
    ) {
        self.owned.push(content.id);
        if !mode.learning_enabled() {
            return;
        }
        for tag in &content.tags {
            self.internal_model.update(tag, decisions);
        }
    }

    /// Sees another agent's content: feeds the external model and checks
    /// the internal model against the owner's decisions.
    pub fn observe(&mut self, content: &Content, decisions: &[SharingDecision], mode: &RunMode) {
        self.visible.push(content.id);

        let owner = content.owner;
        if !self.trusts.contains_key(&owner) {
            warn!(
                "Agent {} sees content of {} without a relation back; trust starts at the prior",
                self.id, owner
            );
        }
        let relation_count = self.schema.len();
        let tracker = self
            .trusts
            .entry(owner)
            .or_insert_with(|| TrustTracker::new(relation_count));

        if mode.learning_enabled() {
            let trust = tracker.value();
            let weights = if mode.trust_based_learning() {
                SupportWeights::Trust(&trust)
            } else {
                SupportWeights::Uniform
            };
            for tag in &content.tags {
                self.external_model.update_weighted(tag, decisions, weights);
            }
        }

        let predicted = self
            .internal_model
            .estimate(&content.tags, mode.undecidable_threshold());
        tracker.record_all(&predicted, decisions);
    }

    /// Internal estimate for every relation type.
    pub fn estimate(&self, tags: &[String], threshold: f64) -> Vec<Decision> {
        self.internal_model.estimate(tags, threshold)
    }

    /// External fallback estimate for one relation type.
    pub fn estimate_external(
        &self,
        tags: &[String],
        relation_index: usize,
        mode: &RunMode,
    ) -> SharingDecision {
        let weighting = if mode.trust_based_learning() {
            Weighting::TrustWeighted
        } else {
            Weighting::Uniform
        };
        self.external_model.estimate_external(tags, relation_index, weighting)
    }

    pub fn record_internal(
        &mut self,
        rtype: RelationType,
        truth: SharingDecision,
        predicted: SharingDecision,
    ) {
        self.internal_stats.update(rtype, truth, predicted);
    }

    pub fn record_external(
        &mut self,
        rtype: RelationType,
        truth: SharingDecision,
        predicted: SharingDecision,
    ) {
        self.external_stats.update(rtype, truth, predicted);
    }

    /// Rewrites a privacy setting the way this agent's character would specify it.
    pub fn apply_character<R: Rng>(&self, setting: &mut PrivacySetting, rng: &mut R) {
        for rtype in self.schema.iter() {
            let decision = match self.character {
                AgentCharacter::Normal => continue,
                AgentCharacter::Opposite => match setting.get(rtype) {
                    Some(decision) => decision.opposite(),
                    None => continue,
                },
                AgentCharacter::Random => {
                    if rng.gen_bool(0.5) {
                        SharingDecision::Permit
                    } else {
                        SharingDecision::Deny
                    }
                }
                AgentCharacter::AlwaysPermit => SharingDecision::Permit,
            };
            setting.set(rtype, decision);
        }
    }

    /// `agent -> peer: values`, one line per tracked peer.
    pub fn render_trusts(&self) -> String {
        let mut out = String::new();
        for (peer, tracker) in &self.trusts {
            let values: Vec<String> = tracker.value().into_iter().map(format_number).collect();
            out.push_str(&format!("{} -> {}: [{}]\n", self.id, peer, values.join(", ")));
        }
        out
    }

    pub fn render_tag_model(&self) -> String {
        self.internal_model.render(&self.schema)
    }
}
