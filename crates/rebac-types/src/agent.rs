//! Agent Identity Types
//!
//! Identifiers and behavioural characters for agents in the network.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for AgentId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// How an agent behaves when it specifies privacy settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentCharacter {
    /// Acts as the ground truth says
    #[default]
    Normal,
    /// Picks every decision at random
    Random,
    /// Inverts every decision
    Opposite,
    /// Permits everything
    AlwaysPermit,
}

impl AgentCharacter {
    /// Only normal agents are evaluated as predictable owners.
    pub fn is_predictable(self) -> bool {
        matches!(self, AgentCharacter::Normal)
    }
}

impl fmt::Display for AgentCharacter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentCharacter::Normal => write!(f, "normal"),
            AgentCharacter::Random => write!(f, "random"),
            AgentCharacter::Opposite => write!(f, "opposite"),
            AgentCharacter::AlwaysPermit => write!(f, "always_permit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_character_is_normal() {
        assert_eq!(AgentCharacter::default(), AgentCharacter::Normal);
        assert!(AgentCharacter::Normal.is_predictable());
        assert!(!AgentCharacter::Opposite.is_predictable());
    }

    #[test]
    fn test_character_serialization() {
        let json = serde_json::to_string(&AgentCharacter::AlwaysPermit).unwrap();
        assert_eq!(json, "\"always_permit\"");

        let id: AgentId = serde_json::from_str("7").unwrap();
        assert_eq!(id, AgentId(7));
    }
}
