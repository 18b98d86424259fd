//! Network Construction
//!
//! Builds a fresh environment from an in-memory dataset of agents,
//! relations and contents.

use rebac_types::{
    AgentCharacter, AgentId, Content, ContentId, PrivacyError, PrivacySetting, Relation,
    RelationSchema, RelationType, SharingDecision,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::components::Agent;
use crate::environment::{Environment, Pipeline};
use crate::error::SimError;

/// An agent as described by input data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub id: AgentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub character: AgentCharacter,
}

impl AgentSpec {
    pub fn new(id: AgentId) -> Self {
        Self {
            id,
            name: None,
            character: AgentCharacter::Normal,
        }
    }

    /// The given name, or one derived from the id.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("agent-{}", self.id))
    }
}

/// Privacy rules of a content record as written in input data, keyed by
/// relation type.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawRules {
    /// "permit" / "deny"
    Decisions(BTreeMap<RelationType, SharingDecision>),
    /// 0 / 1
    Encoded(BTreeMap<RelationType, i64>),
    /// Scores in `[0, 1]`
    Scores(BTreeMap<RelationType, f64>),
    /// "public" / "private"
    Labels(BTreeMap<RelationType, String>),
}

impl RawRules {
    fn into_setting(self) -> Result<PrivacySetting, PrivacyError> {
        match self {
            RawRules::Decisions(rules) => Ok(PrivacySetting::from_rules(rules)),
            RawRules::Encoded(rules) => {
                let schema = RelationSchema::new(rules.keys().copied());
                let encoded: Vec<i64> = rules.into_values().collect();
                let mut setting = PrivacySetting::new();
                setting.set_decisions(&schema, &encoded)?;
                Ok(setting)
            }
            RawRules::Scores(rules) => {
                let schema = RelationSchema::new(rules.keys().copied());
                let scores: Vec<f64> = rules.into_values().collect();
                PrivacySetting::from_numeric(&schema, &scores)
            }
            RawRules::Labels(rules) => {
                let schema = RelationSchema::new(rules.keys().copied());
                let labels: Vec<&str> = rules.values().map(String::as_str).collect();
                PrivacySetting::from_labels(&schema, &labels)
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawPrivacy {
    Wrapped {
        rebac: RawRules,
        #[serde(default)]
        exception_agents: Vec<AgentId>,
    },
    Bare(RawRules),
}

/// A content record before its privacy rules are decoded.
#[derive(Debug, Clone, Deserialize)]
struct RawContent {
    id: ContentId,
    #[serde(default)]
    owner: Option<AgentId>,
    #[serde(default)]
    source: Option<String>,
    tags: Vec<String>,
    privacy: RawPrivacy,
}

impl RawContent {
    fn into_content(self) -> Result<Content, PrivacyError> {
        let privacy = match self.privacy {
            RawPrivacy::Wrapped {
                rebac,
                exception_agents,
            } => rebac.into_setting()?.with_exception_agents(exception_agents),
            RawPrivacy::Bare(rules) => rules.into_setting()?,
        };
        let mut content = Content::new(self.id, self.tags, privacy);
        if let Some(owner) = self.owner {
            content = content.with_owner(owner);
        }
        if let Some(source) = self.source {
            content = content.with_source(source);
        }
        Ok(content)
    }
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    agents: Vec<AgentSpec>,
    #[serde(default)]
    relations: Vec<Relation>,
    #[serde(default)]
    contents: Vec<RawContent>,
}

/// Input data shared by every trial. Trials clone what they mutate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    pub agents: Vec<AgentSpec>,
    pub relations: Vec<Relation>,
    pub contents: Vec<Content>,
}

impl Dataset {
    /// Parses a dataset from JSON.
    ///
    /// Privacy rules may be given as decisions, 0/1 encodings, scores or
    /// "public"/"private" labels. A record with an unknown encoding is
    /// skipped. A record without a single usable label stops the load.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let raw: RawDataset = serde_json::from_str(json)?;
        let mut contents = Vec::with_capacity(raw.contents.len());
        let mut skipped = 0;
        for record in raw.contents {
            let id = record.id;
            match record.into_content() {
                Ok(content) => contents.push(content),
                Err(err @ PrivacyError::UnknownDecision { .. }) => {
                    warn!("Skipping content {}: {}", id, err);
                    skipped += 1;
                }
                Err(source) => return Err(SimError::InvalidPrivacy { content: id, source }),
            }
        }
        if skipped > 0 {
            warn!("Skipped {} content records with unknown privacy decisions", skipped);
        }
        Ok(Self {
            agents: raw.agents,
            relations: raw.relations,
            contents,
        })
    }
}

/// Registers every agent and relation of `dataset`.
///
/// With `bidirectional` every relation is mirrored, so trust exists in both
/// directions.
pub fn build_environment(
    dataset: &Dataset,
    schema: &RelationSchema,
    bidirectional: bool,
    pipeline: Pipeline,
) -> Result<Environment, SimError> {
    let mut env = Environment::new(schema.clone(), pipeline);

    for spec in &dataset.agents {
        let agent = Agent::new(spec.id, spec.display_name(), schema).with_character(spec.character);
        env.add_agent(agent)?;
    }

    for relation in &dataset.relations {
        env.add_relation(relation.clone())?;
        if bidirectional {
            env.add_relation(relation.reversed())?;
        }
    }

    info!(
        "Built network: {} agents, {} relations",
        env.agent_count(),
        env.relation_count()
    );
    Ok(env)
}
