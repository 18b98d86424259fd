//! Output and Reporting
//!
//! Confusion statistics, result reports and table formatting.

pub mod report;
pub mod stats;
pub mod table;

pub use report::{ExperimentReport, MispredictedContent, ResultRow};
pub use stats::{AggregatedStats, ConfusionStats, Metrics, MispredictionLog, RelationStats};
