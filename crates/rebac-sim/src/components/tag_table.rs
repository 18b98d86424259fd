//! Tag Statistics Model
//!
//! Per-tag support and effect sums, and the confidence-versus-average rule
//! that turns them into sharing estimates. The same model serves as an
//! agent's internal model and as its trust-weighted external model; only the
//! update weights and the estimation weighting differ.

use rebac_types::{Decision, RelationSchema, SharingDecision};
use std::collections::HashMap;

use crate::output::table::{format_number, format_table};

/// Weights applied to one update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SupportWeights<'a> {
    /// Every observation counts as one.
    Uniform,
    /// Each relation type's observation counts as the viewer's trust in the owner.
    Trust(&'a [f64]),
}

impl SupportWeights<'_> {
    fn weight(&self, index: usize) -> f64 {
        match self {
            SupportWeights::Uniform => 1.0,
            SupportWeights::Trust(weights) => weights.get(index).copied().unwrap_or(0.0),
        }
    }
}

/// Which support figure the confidence denominator uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Weighting {
    /// Scalar observation count per tag.
    #[default]
    Uniform,
    /// Per-relation trust-weighted support.
    TrustWeighted,
}

#[derive(Debug, Clone, PartialEq)]
struct TagEntry {
    support: f64,
    weighted_support: Vec<f64>,
    effect: Vec<f64>,
}

impl TagEntry {
    fn empty(relation_count: usize) -> Self {
        Self {
            support: 0.0,
            weighted_support: vec![0.0; relation_count],
            effect: vec![0.0; relation_count],
        }
    }

    fn support_for(&self, weighting: Weighting, index: usize) -> f64 {
        match weighting {
            Weighting::Uniform => self.support,
            Weighting::TrustWeighted => self.weighted_support[index],
        }
    }
}

/// Tag frequency statistics, tags kept in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct TagStatisticsModel {
    relation_count: usize,
    tags: Vec<String>,
    entries: Vec<TagEntry>,
    index: HashMap<String, usize>,
}

impl TagStatisticsModel {
    pub fn new(relation_count: usize) -> Self {
        Self {
            relation_count,
            tags: Vec::new(),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn for_schema(schema: &RelationSchema) -> Self {
        Self::new(schema.len())
    }

    pub fn relation_count(&self) -> usize {
        self.relation_count
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.index.contains_key(tag)
    }

    /// Number of observations of `tag`.
    pub fn support(&self, tag: &str) -> Option<f64> {
        self.entry(tag).map(|entry| entry.support)
    }

    /// Trust-weighted support of `tag`, per relation type.
    pub fn weighted_support(&self, tag: &str) -> Option<&[f64]> {
        self.entry(tag).map(|entry| entry.weighted_support.as_slice())
    }

    pub fn effect(&self, tag: &str) -> Option<&[f64]> {
        self.entry(tag).map(|entry| entry.effect.as_slice())
    }

    fn entry(&self, tag: &str) -> Option<&TagEntry> {
        self.index.get(tag).map(|&i| &self.entries[i])
    }

    /// Counts one uniform observation of `tag`.
    pub fn update(&mut self, tag: &str, decisions: &[SharingDecision]) {
        self.update_weighted(tag, decisions, SupportWeights::Uniform);
    }

    /// Counts one observation of `tag`, scaling support and effect by `weights`.
    pub fn update_weighted(
        &mut self,
        tag: &str,
        decisions: &[SharingDecision],
        weights: SupportWeights<'_>,
    ) {
        debug_assert_eq!(decisions.len(), self.relation_count);
        let position = match self.index.get(tag) {
            Some(&i) => i,
            None => {
                self.tags.push(tag.to_string());
                self.entries.push(TagEntry::empty(self.relation_count));
                self.index.insert(tag.to_string(), self.tags.len() - 1);
                self.tags.len() - 1
            }
        };

        let entry = &mut self.entries[position];
        entry.support += 1.0;
        for (i, decision) in decisions.iter().enumerate().take(self.relation_count) {
            let weight = weights.weight(i);
            entry.weighted_support[i] += weight;
            entry.effect[i] += decision.as_f64() * weight;
        }
    }

    /// Mean support over all known tags, per relation type.
    pub fn average_support(&self, weighting: Weighting) -> Vec<f64> {
        (0..self.relation_count)
            .map(|r| self.mean(|entry| entry.support_for(weighting, r)))
            .collect()
    }

    /// Mean effect over all known tags, per relation type.
    pub fn average_effect(&self) -> Vec<f64> {
        (0..self.relation_count)
            .map(|r| self.mean(|entry| entry.effect[r]))
            .collect()
    }

    fn mean(&self, value: impl Fn(&TagEntry) -> f64) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.entries.iter().map(value).sum::<f64>() / self.entries.len() as f64
    }

    /// The model-wide baseline `avgEffect / avgSupport`, None when there is no support.
    pub fn baseline(&self, weighting: Weighting) -> Vec<Option<f64>> {
        self.average_effect()
            .into_iter()
            .zip(self.average_support(weighting))
            .map(|(effect, support)| (support > 0.0).then(|| effect / support))
            .collect()
    }

    /// Confidence per relation type that `tags` should be shared.
    ///
    /// Unknown tags contribute the model-wide averages. None when the
    /// denominator is zero.
    pub fn confidence(&self, tags: &[String], weighting: Weighting) -> Vec<Option<f64>> {
        let average_effect = self.average_effect();
        let average_support = self.average_support(weighting);
        (0..self.relation_count)
            .map(|r| {
                let mut effect = 0.0;
                let mut support = 0.0;
                for tag in tags {
                    match self.entry(tag) {
                        Some(entry) => {
                            effect += entry.effect[r];
                            support += entry.support_for(weighting, r);
                        }
                        None => {
                            effect += average_effect[r];
                            support += average_support[r];
                        }
                    }
                }
                (support > 0.0).then(|| effect / support)
            })
            .collect()
    }

    /// Internal estimate for every relation type.
    ///
    /// A positive `threshold` enables the undecidable band around the
    /// baseline. Zero gives a binary decision. Anything undefined denies.
    pub fn estimate(&self, tags: &[String], threshold: f64) -> Vec<Decision> {
        let confidence = self.confidence(tags, Weighting::Uniform);
        let baseline = self.baseline(Weighting::Uniform);
        confidence
            .into_iter()
            .zip(baseline)
            .map(|(confidence, average)| match (confidence, average) {
                (Some(c), Some(a)) => {
                    if threshold > 0.0 && c >= a - threshold && c <= a + threshold {
                        Decision::Undecidable
                    } else if c > a {
                        Decision::Permit
                    } else {
                        Decision::Deny
                    }
                }
                _ => Decision::Deny,
            })
            .collect()
    }

    /// Binary estimate for one relation type. Never undecidable.
    pub fn estimate_external(
        &self,
        tags: &[String],
        relation_index: usize,
        weighting: Weighting,
    ) -> SharingDecision {
        if relation_index >= self.relation_count {
            return SharingDecision::Deny;
        }
        let confidence = self.confidence(tags, weighting)[relation_index];
        let average = self.baseline(weighting)[relation_index];
        match (confidence, average) {
            (Some(c), Some(a)) if c > a => SharingDecision::Permit,
            _ => SharingDecision::Deny,
        }
    }

    /// One row per tag (support, then effect per relation type) and a
    /// trailing `Average` row.
    pub fn render(&self, schema: &RelationSchema) -> String {
        let mut rows = Vec::with_capacity(self.tags.len() + 2);
        let mut header = vec!["Tag".to_string(), "Support".to_string()];
        header.extend(schema.iter().map(|rtype| rtype.to_string()));
        rows.push(header);

        for (tag, entry) in self.tags.iter().zip(&self.entries) {
            let mut row = vec![tag.clone(), format_number(entry.support)];
            row.extend(entry.effect.iter().map(|&e| format_number(e)));
            rows.push(row);
        }

        let average_support = self.mean(|entry| entry.support);
        let mut average = vec!["Average".to_string(), format_number(average_support)];
        average.extend(self.average_effect().into_iter().map(format_number));
        rows.push(average);

        format_table(&rows)
    }
}
