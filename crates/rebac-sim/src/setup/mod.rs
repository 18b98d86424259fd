//! Simulation Setup
//!
//! Building networks from datasets and distributing content to agents.

pub mod distribution;
pub mod network;

pub use distribution::{distribute, prepare_contents, DistributionSummary, Newcomer};
pub use network::{build_environment, AgentSpec, Dataset};
