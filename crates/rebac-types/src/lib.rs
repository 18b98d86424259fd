//! Shared data types for the ReBAC privacy simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is a dependency for all other crates in the workspace.

pub mod agent;
pub mod content;
pub mod decision;
pub mod privacy;
pub mod relation;

// Re-export agent types
pub use agent::{AgentCharacter, AgentId};

// Re-export content types
pub use content::{Content, ContentId};

// Re-export decision types
pub use decision::{Decision, SharingDecision};

// Re-export privacy types
pub use privacy::{PrivacyError, PrivacySetting};

// Re-export relation types
pub use relation::{Relation, RelationSchema, RelationType};
