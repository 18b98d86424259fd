//! Simulation Components
//!
//! Agents and the learning state they carry.

pub mod agent;
pub mod tag_table;
pub mod trust;

pub use agent::Agent;
pub use tag_table::{SupportWeights, TagStatisticsModel, Weighting};
pub use trust::{TrustTracker, TRUST_PRIOR};
