//! Experiment Reports
//!
//! Result rows for every grid point and relation type, rendered as text
//! tables or serialized to JSON.

use rebac_types::{AgentId, ContentId, RelationType};
use serde::Serialize;
use uuid::Uuid;

use super::stats::{Metrics, METRIC_NAMES};
use super::table::{format_metric, format_number, format_table};
use crate::config::ExperimentKind;
use crate::experiment::GridPoint;

/// Mispredicted contents kept in a report.
pub const TOP_MISPREDICTIONS: usize = 10;

/// Metrics of one relation type at one grid point, merged over all trials.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    #[serde(flatten)]
    pub point: GridPoint,
    pub trials: usize,
    pub relation_type: RelationType,
    pub internal: Metrics,
    pub external: Metrics,
    pub combined: Metrics,
    /// Share of predictions made by the internal model
    pub internal_share: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newcomer: Option<Metrics>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MispredictedContent {
    pub content: ContentId,
    pub misses: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentReport {
    pub run_id: Uuid,
    pub kind: ExperimentKind,
    pub seed: u64,
    pub trials: usize,
    pub relation_types: Vec<RelationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newcomer: Option<AgentId>,
    pub rows: Vec<ResultRow>,
    pub top_mispredictions: Vec<MispredictedContent>,
}

impl ExperimentReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Internal, external and total result tables, then the newcomer's and
    /// the most mispredicted contents when present.
    pub fn render(&self) -> String {
        let mut out = format!(
            "Experiment {} (seed {}, {} trials per grid point)\n\n",
            self.kind, self.seed, self.trials
        );

        out.push_str("Internal Results\n");
        out.push_str(&self.render_metrics(|row| Some(row.internal), false));
        out.push_str("\nExternal Results\n");
        out.push_str(&self.render_metrics(|row| Some(row.external), false));
        out.push_str("\nTotal Results\n");
        out.push_str(&self.render_metrics(|row| Some(row.combined), true));

        if let Some(agent) = self.newcomer {
            out.push_str(&format!("\nNewcomer {} Results\n", agent));
            out.push_str(&self.render_metrics(|row| row.newcomer, false));
        }

        if !self.top_mispredictions.is_empty() {
            out.push_str("\nMost Mispredicted Contents\n");
            let mut rows = vec![vec!["Content".to_string(), "Misses".to_string()]];
            rows.extend(
                self.top_mispredictions
                    .iter()
                    .map(|m| vec![m.content.to_string(), m.misses.to_string()]),
            );
            out.push_str(&format_table(&rows));
        }
        out
    }

    fn render_metrics(
        &self,
        metrics: impl Fn(&ResultRow) -> Option<Metrics>,
        with_share: bool,
    ) -> String {
        let mut header: Vec<String> = ["Tags", "Training", "Test", "Threshold"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        if self.kind == ExperimentKind::Trust {
            header.push("Untrusted".to_string());
        }
        header.push("Relation Type".to_string());
        header.extend(METRIC_NAMES.iter().map(|name| name.to_string()));
        if with_share {
            header.push("Internal Share".to_string());
        }

        let mut rows = vec![header];
        for row in &self.rows {
            let Some(values) = metrics(row) else {
                continue;
            };
            let mut cells = vec![
                if row.point.max_tags == 0 {
                    "all".to_string()
                } else {
                    row.point.max_tags.to_string()
                },
                row.point.training.to_string(),
                row.point.test.to_string(),
                format_number(row.point.threshold),
            ];
            if self.kind == ExperimentKind::Trust {
                cells.push(row.point.untrusted.map(|n| n.to_string()).unwrap_or_default());
            }
            cells.push(row.relation_type.to_string());
            cells.extend(values.as_row());
            if with_share {
                cells.push(format_metric(row.internal_share));
            }
            rows.push(cells);
        }
        format_table(&rows)
    }
}
