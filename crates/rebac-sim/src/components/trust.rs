//! Trust Tracking
//!
//! How often a viewer's own estimate agreed with an owner's actual decisions.

use rebac_types::{Decision, SharingDecision};
use serde::{Deserialize, Serialize};

/// Trust reported for a relation type with no observations.
pub const TRUST_PRIOR: f64 = 0.5;

/// Agreement and disagreement counts of one viewer toward one owner, per relation type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustTracker {
    agreements: Vec<u32>,
    disagreements: Vec<u32>,
}

impl TrustTracker {
    pub fn new(relation_count: usize) -> Self {
        Self {
            agreements: vec![0; relation_count],
            disagreements: vec![0; relation_count],
        }
    }

    /// Records one comparison. Undecidable predictions are not counted.
    pub fn record(&mut self, predicted: Decision, actual: SharingDecision, relation_index: usize) {
        let Some(predicted) = predicted.decided() else {
            return;
        };
        let counters = if predicted == actual {
            &mut self.agreements
        } else {
            &mut self.disagreements
        };
        if let Some(count) = counters.get_mut(relation_index) {
            *count += 1;
        }
    }

    /// Records one comparison per relation type.
    pub fn record_all(&mut self, predicted: &[Decision], actual: &[SharingDecision]) {
        for (i, (p, a)) in predicted.iter().zip(actual).enumerate() {
            self.record(*p, *a, i);
        }
    }

    /// Trust for one relation type: agreement ratio, or the prior with no observations.
    pub fn value_for(&self, relation_index: usize) -> f64 {
        let agreements = self.agreements(relation_index);
        let observations = agreements + self.disagreements(relation_index);
        if observations == 0 {
            TRUST_PRIOR
        } else {
            agreements as f64 / observations as f64
        }
    }

    pub fn value(&self) -> Vec<f64> {
        (0..self.agreements.len()).map(|i| self.value_for(i)).collect()
    }

    pub fn agreements(&self, relation_index: usize) -> u32 {
        self.agreements.get(relation_index).copied().unwrap_or(0)
    }

    pub fn disagreements(&self, relation_index: usize) -> u32 {
        self.disagreements.get(relation_index).copied().unwrap_or(0)
    }

    pub fn observations(&self, relation_index: usize) -> u32 {
        self.agreements(relation_index) + self.disagreements(relation_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_prior() {
        let tracker = TrustTracker::new(3);
        assert_eq!(tracker.value(), vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_agreement_then_disagreement() {
        let mut tracker = TrustTracker::new(1);
        tracker.record(Decision::Permit, SharingDecision::Permit, 0);
        assert_eq!(tracker.value_for(0), 1.0);

        tracker.record(Decision::Deny, SharingDecision::Permit, 0);
        assert_eq!(tracker.value_for(0), 0.5);
        assert_eq!(tracker.agreements(0), 1);
        assert_eq!(tracker.disagreements(0), 1);
    }

    #[test]
    fn test_undecidable_changes_nothing() {
        let mut tracker = TrustTracker::new(1);
        tracker.record(Decision::Deny, SharingDecision::Deny, 0);
        let before = tracker.clone();

        tracker.record(Decision::Undecidable, SharingDecision::Permit, 0);
        assert_eq!(tracker, before);
        assert_eq!(tracker.value_for(0), 1.0);
    }

    #[test]
    fn test_record_all_is_per_relation() {
        let mut tracker = TrustTracker::new(2);
        tracker.record_all(
            &[Decision::Permit, Decision::Permit],
            &[SharingDecision::Permit, SharingDecision::Deny],
        );
        assert_eq!(tracker.value(), vec![1.0, 0.0]);
        assert_eq!(tracker.observations(1), 1);
    }
}
