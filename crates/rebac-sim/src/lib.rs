//! ReBAC Privacy Simulation Engine
//!
//! Agents learn tag statistics from the content they own and see, estimate
//! relation-based sharing decisions, and are scored against ground truth
//! over repeated seeded trials.

pub mod components;
pub mod config;
pub mod environment;
pub mod error;
pub mod experiment;
pub mod output;
pub mod setup;
pub mod systems;

pub use components::{Agent, SupportWeights, TagStatisticsModel, TrustTracker, Weighting};
pub use config::{ConfigError, ExperimentConfig, ExperimentKind, RunMode};
pub use environment::{Environment, Estimate, EstimateSource, IngestOutcome, Pipeline};
pub use error::SimError;
pub use experiment::{ExperimentRunner, GridPoint};
pub use output::{AggregatedStats, ConfusionStats, ExperimentReport, Metrics};
pub use setup::{build_environment, distribute, prepare_contents, Dataset};
