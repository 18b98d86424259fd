//! Prediction Statistics
//!
//! Confusion matrices, derived metrics, cross-trial aggregation and the
//! misprediction log.

use rebac_types::{ContentId, RelationSchema, RelationType, SharingDecision};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::table::format_metric;

/// Names of the derived metrics, in row order.
pub const METRIC_NAMES: [&str; 4] = [
    "Private Ratio",
    "Private Recall",
    "Public Recall",
    "Accuracy",
];

/// A 2×2 confusion matrix indexed `[truth][prediction]`, rows and columns ordered DENY, PERMIT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionStats {
    matrix: [[u64; SharingDecision::COUNT]; SharingDecision::COUNT],
}

impl ConfusionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_matrix(matrix: [[u64; SharingDecision::COUNT]; SharingDecision::COUNT]) -> Self {
        Self { matrix }
    }

    /// Counts one prediction against its ground truth.
    pub fn update(&mut self, truth: SharingDecision, predicted: SharingDecision) {
        self.matrix[truth.index()][predicted.index()] += 1;
    }

    /// Adds another matrix cell by cell.
    pub fn merge(&mut self, other: &ConfusionStats) {
        for (row, other_row) in self.matrix.iter_mut().zip(other.matrix.iter()) {
            for (cell, other_cell) in row.iter_mut().zip(other_row.iter()) {
                *cell += other_cell;
            }
        }
    }

    pub fn merged(mut self, other: &ConfusionStats) -> Self {
        self.merge(other);
        self
    }

    pub fn cell(&self, truth: SharingDecision, predicted: SharingDecision) -> u64 {
        self.matrix[truth.index()][predicted.index()]
    }

    pub fn matrix(&self) -> [[u64; SharingDecision::COUNT]; SharingDecision::COUNT] {
        self.matrix
    }

    /// Total number of predictions recorded.
    pub fn total(&self) -> u64 {
        self.matrix.iter().flatten().sum()
    }

    /// Correct DENY predictions over all actual DENY decisions.
    pub fn private_recall(&self) -> Option<f64> {
        let [[dd, dp], _] = self.matrix;
        ratio(dd, dd + dp)
    }

    /// Correct PERMIT predictions over all actual PERMIT decisions.
    pub fn public_recall(&self) -> Option<f64> {
        let [_, [pd, pp]] = self.matrix;
        ratio(pp, pp + pd)
    }

    pub fn accuracy(&self) -> Option<f64> {
        let [[dd, _], [_, pp]] = self.matrix;
        ratio(dd + pp, self.total())
    }

    /// Share of actual DENY decisions among all predictions.
    pub fn private_ratio(&self) -> Option<f64> {
        let [[dd, dp], _] = self.matrix;
        ratio(dd + dp, self.total())
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            private_ratio: self.private_ratio(),
            private_recall: self.private_recall(),
            public_recall: self.public_recall(),
            accuracy: self.accuracy(),
        }
    }
}

/// Undefined (None) when nothing was observed in the denominator.
fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}

impl fmt::Display for ConfusionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metrics = self.metrics();
        writeln!(f, "Confusion Matrix:")?;
        writeln!(f, "Predicted")?;
        writeln!(f, "{:?}", self.matrix[0])?;
        writeln!(f, "{:?}", self.matrix[1])?;
        writeln!(f, "Private Ratio: {}", format_metric(metrics.private_ratio))?;
        writeln!(f, "Private Recall: {}", format_metric(metrics.private_recall))?;
        writeln!(f, "Public Recall: {}", format_metric(metrics.public_recall))?;
        write!(f, "Accuracy: {}", format_metric(metrics.accuracy))
    }
}

/// Derived metrics of a confusion matrix. `None` marks an undefined ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub private_ratio: Option<f64>,
    pub private_recall: Option<f64>,
    pub public_recall: Option<f64>,
    pub accuracy: Option<f64>,
}

impl Metrics {
    /// Formatted cells in `METRIC_NAMES` order.
    pub fn as_row(&self) -> Vec<String> {
        [
            self.private_ratio,
            self.private_recall,
            self.public_recall,
            self.accuracy,
        ]
        .into_iter()
        .map(format_metric)
        .collect()
    }
}

/// One confusion matrix per relation type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationStats {
    stats: BTreeMap<RelationType, ConfusionStats>,
}

impl RelationStats {
    /// Empty matrices for every relation type of the schema.
    pub fn new(schema: &RelationSchema) -> Self {
        Self {
            stats: schema.iter().map(|rtype| (rtype, ConfusionStats::new())).collect(),
        }
    }

    pub fn update(
        &mut self,
        rtype: RelationType,
        truth: SharingDecision,
        predicted: SharingDecision,
    ) {
        self.stats.entry(rtype).or_default().update(truth, predicted);
    }

    pub fn merge(&mut self, other: &RelationStats) {
        for (rtype, stats) in &other.stats {
            self.stats.entry(*rtype).or_default().merge(stats);
        }
    }

    pub fn get(&self, rtype: RelationType) -> Option<&ConfusionStats> {
        self.stats.get(&rtype)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RelationType, &ConfusionStats)> {
        self.stats.iter().map(|(rtype, stats)| (*rtype, stats))
    }

    /// Predictions recorded across all relation types.
    pub fn total(&self) -> u64 {
        self.stats.values().map(ConfusionStats::total).sum()
    }
}

impl fmt::Display for RelationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (rtype, stats) in &self.stats {
            writeln!(f, "{}", rtype)?;
            writeln!(f, "{}", stats)?;
        }
        Ok(())
    }
}

/// Relation statistics merged over repeated trials.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedStats {
    relation_stats: RelationStats,
    trials: usize,
}

impl AggregatedStats {
    pub fn new(schema: &RelationSchema) -> Self {
        Self {
            relation_stats: RelationStats::new(schema),
            trials: 0,
        }
    }

    /// Folds in the statistics of one finished trial.
    pub fn add_trial(&mut self, stats: &RelationStats) {
        self.relation_stats.merge(stats);
        self.trials += 1;
    }

    /// Merges two aggregates built over the same trials (for instance
    /// internal and external estimates). The trial count is kept.
    pub fn combined(&self, other: &AggregatedStats) -> AggregatedStats {
        let mut relation_stats = self.relation_stats.clone();
        relation_stats.merge(&other.relation_stats);
        AggregatedStats {
            relation_stats,
            trials: self.trials.max(other.trials),
        }
    }

    pub fn trials(&self) -> usize {
        self.trials
    }

    pub fn relation_stats(&self) -> &RelationStats {
        &self.relation_stats
    }

    pub fn get(&self, rtype: RelationType) -> Option<&ConfusionStats> {
        self.relation_stats.get(rtype)
    }
}

/// How many times each content id was mispredicted (once per wrong relation type).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MispredictionLog {
    counts: BTreeMap<ContentId, u32>,
}

impl MispredictionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, content: ContentId) {
        *self.counts.entry(content).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: &MispredictionLog) {
        for (content, count) in &other.counts {
            *self.counts.entry(*content).or_insert(0) += count;
        }
    }

    pub fn count(&self, content: ContentId) -> u32 {
        self.counts.get(&content).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Content ids by descending miss count; ties by ascending id.
    pub fn ranked(&self) -> Vec<(ContentId, u32)> {
        let mut ranked: Vec<(ContentId, u32)> =
            self.counts.iter().map(|(id, count)| (*id, *count)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }
}
