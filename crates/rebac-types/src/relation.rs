//! Relation Types
//!
//! Directed relations between agents and the ordered set of relation types a run uses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::agent::AgentId;
use crate::privacy::PrivacyError;

/// Kind of social tie an access rule is conditioned on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Friend,
    Colleague,
    Family,
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationType::Friend => write!(f, "FRIEND"),
            RelationType::Colleague => write!(f, "COLLEAGUE"),
            RelationType::Family => write!(f, "FAMILY"),
        }
    }
}

impl FromStr for RelationType {
    type Err = PrivacyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "friend" => Ok(RelationType::Friend),
            "colleague" => Ok(RelationType::Colleague),
            "family" => Ok(RelationType::Family),
            _ => Err(PrivacyError::UnknownRelationType(s.to_string())),
        }
    }
}

/// The relation types configured for a run, in a fixed order.
///
/// Every per-relation vector in the simulation (decisions, effects, supports,
/// trust values) is indexed by a type's position in this schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationSchema {
    types: Vec<RelationType>,
}

impl RelationSchema {
    /// Creates a schema, dropping repeated types while keeping first occurrence order.
    pub fn new(types: impl IntoIterator<Item = RelationType>) -> Self {
        let mut unique = Vec::new();
        for rtype in types {
            if !unique.contains(&rtype) {
                unique.push(rtype);
            }
        }
        Self { types: unique }
    }

    /// Schema with the single FRIEND relation type.
    pub fn friends_only() -> Self {
        Self::new([RelationType::Friend])
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// True when access is conditioned on the relation type, not just on having a relation.
    pub fn is_multi_relational(&self) -> bool {
        self.types.len() > 1
    }

    pub fn index_of(&self, rtype: RelationType) -> Option<usize> {
        self.types.iter().position(|t| *t == rtype)
    }

    pub fn contains(&self, rtype: RelationType) -> bool {
        self.types.contains(&rtype)
    }

    pub fn types(&self) -> &[RelationType] {
        &self.types
    }

    pub fn iter(&self) -> impl Iterator<Item = RelationType> + '_ {
        self.types.iter().copied()
    }
}

impl Default for RelationSchema {
    fn default() -> Self {
        Self::friends_only()
    }
}

/// A directed edge from `source` to `destination`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub source: AgentId,
    pub destination: AgentId,
    pub relation_type: RelationType,
    /// Static trust carried from input data; decisions use learned trust instead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust: Option<f64>,
}

impl Relation {
    pub fn new(source: AgentId, destination: AgentId, relation_type: RelationType) -> Self {
        Self {
            source,
            destination,
            relation_type,
            trust: None,
        }
    }

    pub fn with_trust(mut self, trust: f64) -> Self {
        self.trust = Some(trust);
        self
    }

    /// The same relation pointing the other way.
    pub fn reversed(&self) -> Self {
        Self {
            source: self.destination,
            destination: self.source,
            relation_type: self.relation_type,
            trust: self.trust,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_deduplicates() {
        let schema = RelationSchema::new([
            RelationType::Friend,
            RelationType::Family,
            RelationType::Friend,
        ]);
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.index_of(RelationType::Family), Some(1));
        assert_eq!(schema.index_of(RelationType::Colleague), None);
        assert!(schema.is_multi_relational());
        assert!(!RelationSchema::friends_only().is_multi_relational());
    }

    #[test]
    fn test_relation_reversed() {
        let rel = Relation::new(AgentId(1), AgentId(2), RelationType::Colleague).with_trust(0.3);
        let back = rel.reversed();
        assert_eq!(back.source, AgentId(2));
        assert_eq!(back.destination, AgentId(1));
        assert_eq!(back.relation_type, RelationType::Colleague);
        assert_eq!(back.trust, Some(0.3));
    }

    #[test]
    fn test_relation_type_parse() {
        assert_eq!("Friend".parse::<RelationType>().unwrap(), RelationType::Friend);
        assert!("enemy".parse::<RelationType>().is_err());
    }
}
