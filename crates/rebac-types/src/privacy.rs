//! Privacy Settings
//!
//! Relation-based access control (ReBAC) rules attached to a content item.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::agent::AgentId;
use crate::decision::SharingDecision;
use crate::relation::{RelationSchema, RelationType};

/// Errors raised while building or reading privacy settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PrivacyError {
    #[error("unknown privacy decision {value} for relation type {relation_type}")]
    UnknownDecision {
        relation_type: RelationType,
        value: i64,
    },
    #[error("no usable privacy decision could be built from {0:?}")]
    NoUsableDecision(Vec<String>),
    #[error("privacy setting has no decision for relation type {0}")]
    MissingDecision(RelationType),
    #[error("expected {expected} decision values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("unknown relation type: {0}")]
    UnknownRelationType(String),
}

/// Ground-truth sharing rules of a content item, one decision per relation type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrivacySetting {
    rebac: BTreeMap<RelationType, SharingDecision>,
    /// Agents exempt from the ReBAC rules. Carried through copies; no rule consults it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    exception_agents: Vec<AgentId>,
}

impl PrivacySetting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: impl IntoIterator<Item = (RelationType, SharingDecision)>) -> Self {
        Self {
            rebac: rules.into_iter().collect(),
            exception_agents: Vec::new(),
        }
    }

    /// Same decision for every relation type in the schema.
    pub fn uniform(schema: &RelationSchema, decision: SharingDecision) -> Self {
        Self::from_rules(schema.iter().map(|rtype| (rtype, decision)))
    }

    pub fn with_rule(mut self, rtype: RelationType, decision: SharingDecision) -> Self {
        self.rebac.insert(rtype, decision);
        self
    }

    pub fn with_exception_agents(mut self, agents: Vec<AgentId>) -> Self {
        self.exception_agents = agents;
        self
    }

    pub fn set(&mut self, rtype: RelationType, decision: SharingDecision) {
        self.rebac.insert(rtype, decision);
    }

    pub fn get(&self, rtype: RelationType) -> Option<SharingDecision> {
        self.rebac.get(&rtype).copied()
    }

    pub fn rules(&self) -> impl Iterator<Item = (RelationType, SharingDecision)> + '_ {
        self.rebac.iter().map(|(rtype, decision)| (*rtype, *decision))
    }

    pub fn exception_agents(&self) -> &[AgentId] {
        &self.exception_agents
    }

    /// True when every relation type of the schema has a decision.
    pub fn is_complete(&self, schema: &RelationSchema) -> bool {
        schema.iter().all(|rtype| self.rebac.contains_key(&rtype))
    }

    /// Decisions in schema order.
    pub fn decision_vector(
        &self,
        schema: &RelationSchema,
    ) -> Result<Vec<SharingDecision>, PrivacyError> {
        schema
            .iter()
            .map(|rtype| self.get(rtype).ok_or(PrivacyError::MissingDecision(rtype)))
            .collect()
    }

    /// Replaces decisions from their numeric encoding, in schema order.
    ///
    /// The update is all-or-nothing: an unknown encoding rejects the whole
    /// vector and leaves the setting untouched.
    pub fn set_decisions(
        &mut self,
        schema: &RelationSchema,
        encoded: &[i64],
    ) -> Result<(), PrivacyError> {
        if encoded.len() != schema.len() {
            return Err(PrivacyError::LengthMismatch {
                expected: schema.len(),
                actual: encoded.len(),
            });
        }
        let mut decoded = Vec::with_capacity(encoded.len());
        for (rtype, &value) in schema.iter().zip(encoded) {
            match SharingDecision::from_index(value) {
                Some(decision) => decoded.push((rtype, decision)),
                None => {
                    tracing::warn!(
                        "Unknown privacy decision {} for relation type {}",
                        value,
                        rtype
                    );
                    return Err(PrivacyError::UnknownDecision {
                        relation_type: rtype,
                        value,
                    });
                }
            }
        }
        self.rebac.extend(decoded);
        Ok(())
    }

    /// Builds a setting from privacy scores in `[0, 1]`.
    ///
    /// Above 0.5 permits, below denies. Exactly 0.5 denies.
    pub fn from_numeric(schema: &RelationSchema, values: &[f64]) -> Result<Self, PrivacyError> {
        if values.len() != schema.len() {
            return Err(PrivacyError::LengthMismatch {
                expected: schema.len(),
                actual: values.len(),
            });
        }
        Ok(Self::from_rules(schema.iter().zip(values).map(|(rtype, &value)| {
            let decision = if value > 0.5 {
                SharingDecision::Permit
            } else {
                SharingDecision::Deny
            };
            (rtype, decision)
        })))
    }

    /// Builds a setting from "public"/"private" labels, in schema order.
    ///
    /// Unrecognized labels are skipped with a warning. Fails when no label is usable.
    pub fn from_labels(schema: &RelationSchema, labels: &[&str]) -> Result<Self, PrivacyError> {
        let mut setting = Self::new();
        for (rtype, label) in schema.iter().zip(labels) {
            match label.trim() {
                "public" => setting.set(rtype, SharingDecision::Permit),
                "private" => setting.set(rtype, SharingDecision::Deny),
                other => {
                    tracing::warn!("Could not read privacy label {:?} for {}", other, rtype);
                }
            }
        }
        if setting.rebac.is_empty() {
            return Err(PrivacyError::NoUsableDecision(
                labels.iter().map(|l| l.to_string()).collect(),
            ));
        }
        Ok(setting)
    }
}

impl fmt::Display for PrivacySetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .rebac
            .iter()
            .map(|(rtype, decision)| format!("{}:{}", rtype, decision))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_types() -> RelationSchema {
        RelationSchema::new([RelationType::Friend, RelationType::Family])
    }

    #[test]
    fn test_decision_vector_in_schema_order() {
        let setting = PrivacySetting::new()
            .with_rule(RelationType::Family, SharingDecision::Deny)
            .with_rule(RelationType::Friend, SharingDecision::Permit);
        let vector = setting.decision_vector(&two_types()).unwrap();
        assert_eq!(vector, vec![SharingDecision::Permit, SharingDecision::Deny]);
    }

    #[test]
    fn test_missing_decision_is_reported() {
        let setting =
            PrivacySetting::new().with_rule(RelationType::Friend, SharingDecision::Permit);
        assert!(!setting.is_complete(&two_types()));
        assert_eq!(
            setting.decision_vector(&two_types()),
            Err(PrivacyError::MissingDecision(RelationType::Family))
        );
    }

    #[test]
    fn test_set_decisions_rejects_unknown_encoding() {
        let schema = two_types();
        let mut setting = PrivacySetting::uniform(&schema, SharingDecision::Deny);

        let err = setting.set_decisions(&schema, &[1, -1]).unwrap_err();
        assert!(matches!(err, PrivacyError::UnknownDecision { value: -1, .. }));
        // Rejected record leaves the setting untouched
        assert_eq!(setting.get(RelationType::Friend), Some(SharingDecision::Deny));

        setting.set_decisions(&schema, &[1, 0]).unwrap();
        assert_eq!(setting.get(RelationType::Friend), Some(SharingDecision::Permit));
        assert_eq!(setting.get(RelationType::Family), Some(SharingDecision::Deny));
    }

    #[test]
    fn test_from_numeric_threshold() {
        let schema = RelationSchema::new([
            RelationType::Friend,
            RelationType::Colleague,
            RelationType::Family,
        ]);
        let setting = PrivacySetting::from_numeric(&schema, &[0.9, 0.5, 0.1]).unwrap();
        assert_eq!(setting.get(RelationType::Friend), Some(SharingDecision::Permit));
        assert_eq!(setting.get(RelationType::Colleague), Some(SharingDecision::Deny));
        assert_eq!(setting.get(RelationType::Family), Some(SharingDecision::Deny));

        assert!(PrivacySetting::from_numeric(&schema, &[0.9]).is_err());
    }

    #[test]
    fn test_from_labels() {
        let schema = two_types();
        let setting = PrivacySetting::from_labels(&schema, &["public", " private "]).unwrap();
        assert_eq!(setting.get(RelationType::Friend), Some(SharingDecision::Permit));
        assert_eq!(setting.get(RelationType::Family), Some(SharingDecision::Deny));

        let partial = PrivacySetting::from_labels(&schema, &["public", "secret"]).unwrap();
        assert!(!partial.is_complete(&schema));

        let err = PrivacySetting::from_labels(&schema, &["hidden", "secret"]).unwrap_err();
        assert!(matches!(err, PrivacyError::NoUsableDecision(_)));
    }

    #[test]
    fn test_serde_roundtrip_keeps_exceptions() {
        let setting = PrivacySetting::uniform(&two_types(), SharingDecision::Permit)
            .with_exception_agents(vec![AgentId(4)]);
        let json = serde_json::to_string(&setting).unwrap();
        let back: PrivacySetting = serde_json::from_str(&json).unwrap();
        assert_eq!(back, setting);
        assert_eq!(back.exception_agents(), &[AgentId(4)]);
    }
}
