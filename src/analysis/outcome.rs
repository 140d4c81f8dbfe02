// src/analysis/outcome.rs
//
// Scores predictions against the pocket the ball actually landed in.
// Unknown pockets on either side make the score indeterminate; they are
// counted separately and never folded in as a distance of 0.

use crate::pocket_ring::{Pocket, PocketRing};
use crate::types::{ActualOutcome, SpinRecord};
use serde::{Deserialize, Serialize};

const CLOSE_WITHIN: u8 = 2;
const ACCEPTABLE_WITHIN: u8 = 5;
const DEFAULT_RANGE: u8 = 3;
const TARGET_WITHIN: u8 = 5;
const TARGET_ACCURACY: f64 = 0.8;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeConfig {
    pub close_within: u8,
    pub acceptable_within: u8,
    /// Range used by `is_within_range` when the caller has no preference.
    pub default_range: u8,
    /// Accuracy target: share of spins within `target_within` pockets.
    pub target_within: u8,
    pub target_accuracy: f64,
}

impl Default for OutcomeConfig {
    fn default() -> Self {
        Self {
            close_within: CLOSE_WITHIN,
            acceptable_within: ACCEPTABLE_WITHIN,
            default_range: DEFAULT_RANGE,
            target_within: TARGET_WITHIN,
            target_accuracy: TARGET_ACCURACY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeClass {
    Exact,
    Close,
    Acceptable,
    Miss,
}

impl OutcomeClass {
    pub fn icon(self) -> &'static str {
        match self {
            OutcomeClass::Exact | OutcomeClass::Close => "✓",
            OutcomeClass::Acceptable => "~",
            OutcomeClass::Miss => "✗",
        }
    }
}

/// Summary over a batch of finished spins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyReport {
    pub total_spins: usize,
    /// Spins with both a prediction and an observed pocket.
    pub evaluated: usize,
    pub indeterminate: usize,
    pub exact_matches: usize,
    /// `(k, fraction)` for k = 1..=5.
    pub within: Vec<(u8, f64)>,
    pub average_distance: Option<f64>,
    pub target_within: u8,
    pub target_accuracy: f64,
    pub meets_target: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OutcomeEvaluator {
    config: OutcomeConfig,
}

impl OutcomeEvaluator {
    pub fn new(config: OutcomeConfig) -> Self {
        Self { config }
    }

    /// Circular distance, or None when either side is unknown.
    pub fn distance(&self, predicted: Option<Pocket>, actual: &ActualOutcome) -> Option<u8> {
        match (predicted, actual.observed()) {
            (Some(p), Some(a)) => Some(PocketRing::circular_distance(p, a)),
            _ => None,
        }
    }

    pub fn classify(&self, distance: u8) -> OutcomeClass {
        if distance == 0 {
            OutcomeClass::Exact
        } else if distance <= self.config.close_within {
            OutcomeClass::Close
        } else if distance <= self.config.acceptable_within {
            OutcomeClass::Acceptable
        } else {
            OutcomeClass::Miss
        }
    }

    pub fn is_within_range(
        &self,
        predicted: Option<Pocket>,
        actual: &ActualOutcome,
        range: u8,
    ) -> bool {
        self.distance(predicted, actual)
            .map(|d| d <= range)
            .unwrap_or(false)
    }

    pub fn is_within_default_range(
        &self,
        predicted: Option<Pocket>,
        actual: &ActualOutcome,
    ) -> bool {
        self.is_within_range(predicted, actual, self.config.default_range)
    }

    /// Fraction of evaluable spins within `k` pockets. None if nothing is evaluable.
    pub fn accuracy_within(&self, records: &[SpinRecord], k: u8) -> Option<f64> {
        let distances: Vec<u8> = records.iter().filter_map(|r| r.distance).collect();
        if distances.is_empty() {
            return None;
        }
        let hits = distances.iter().filter(|&&d| d <= k).count();
        Some(hits as f64 / distances.len() as f64)
    }

    pub fn report(&self, records: &[SpinRecord]) -> AccuracyReport {
        let distances: Vec<u8> = records.iter().filter_map(|r| r.distance).collect();
        let evaluated = distances.len();
        let within: Vec<(u8, f64)> = (1..=5)
            .map(|k| (k, self.accuracy_within(records, k).unwrap_or(0.0)))
            .collect();
        let average_distance = if evaluated > 0 {
            Some(distances.iter().map(|&d| d as f64).sum::<f64>() / evaluated as f64)
        } else {
            None
        };
        let target_hit = self
            .accuracy_within(records, self.config.target_within)
            .unwrap_or(0.0);

        AccuracyReport {
            total_spins: records.len(),
            evaluated,
            indeterminate: records.len() - evaluated,
            exact_matches: distances.iter().filter(|&&d| d == 0).count(),
            within,
            average_distance,
            target_within: self.config.target_within,
            target_accuracy: self.config.target_accuracy,
            meets_target: evaluated > 0 && target_hit >= self.config.target_accuracy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pocket(label: u8) -> Pocket {
        Pocket::new(label).unwrap()
    }

    fn record(predicted: Option<u8>, actual: Option<u8>) -> SpinRecord {
        let evaluator = OutcomeEvaluator::default();
        let predicted = predicted.map(pocket);
        let actual = match actual {
            Some(a) => ActualOutcome::Observed(pocket(a)),
            None => ActualOutcome::Unknown,
        };
        SpinRecord::new(0, predicted, actual, &evaluator, 0.0, 5.0, 10)
    }

    #[test]
    fn test_classification_buckets() {
        let e = OutcomeEvaluator::default();
        assert_eq!(e.classify(0), OutcomeClass::Exact);
        assert_eq!(e.classify(1), OutcomeClass::Close);
        assert_eq!(e.classify(2), OutcomeClass::Close);
        assert_eq!(e.classify(3), OutcomeClass::Acceptable);
        assert_eq!(e.classify(5), OutcomeClass::Acceptable);
        assert_eq!(e.classify(6), OutcomeClass::Miss);
        assert_eq!(e.classify(19), OutcomeClass::Miss);
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let e = OutcomeEvaluator::new(OutcomeConfig {
            close_within: 1,
            acceptable_within: 3,
            ..OutcomeConfig::default()
        });
        assert_eq!(e.classify(2), OutcomeClass::Acceptable);
        assert_eq!(e.classify(4), OutcomeClass::Miss);
    }

    #[test]
    fn test_unknown_actual_is_indeterminate() {
        let e = OutcomeEvaluator::default();
        assert_eq!(e.distance(Some(pocket(17)), &ActualOutcome::Unknown), None);
        assert_eq!(e.distance(None, &ActualOutcome::Observed(pocket(17))), None);
        assert!(!e.is_within_range(Some(pocket(17)), &ActualOutcome::Unknown, 19));
        assert_eq!(
            e.distance(Some(pocket(17)), &ActualOutcome::Observed(pocket(20))),
            Some(2)
        );
    }

    #[test]
    fn test_within_default_range() {
        let e = OutcomeEvaluator::default();
        // 0 and 26 are three pockets apart
        assert!(e.is_within_default_range(Some(pocket(0)), &ActualOutcome::Observed(pocket(26))));
        assert!(!e.is_within_default_range(Some(pocket(0)), &ActualOutcome::Observed(pocket(30))));
    }

    #[test]
    fn test_unknown_never_contributes_to_accuracy() {
        let e = OutcomeEvaluator::default();
        let records = vec![
            record(Some(17), Some(17)),
            record(Some(17), Some(20)),
            record(Some(0), Some(37)),
            record(Some(17), None),
            record(None, Some(5)),
        ];
        assert_relative_eq!(e.accuracy_within(&records, 0).unwrap(), 1.0 / 3.0);
        assert_relative_eq!(e.accuracy_within(&records, 2).unwrap(), 2.0 / 3.0);
        assert!(e.accuracy_within(&records[3..], 5).is_none());
    }

    #[test]
    fn test_report_summary() {
        let e = OutcomeEvaluator::default();
        let records = vec![
            record(Some(17), Some(17)),
            record(Some(17), Some(20)),
            record(Some(0), Some(37)),
            record(Some(17), None),
        ];
        let report = e.report(&records);
        assert_eq!(report.total_spins, 4);
        assert_eq!(report.evaluated, 3);
        assert_eq!(report.indeterminate, 1);
        assert_eq!(report.exact_matches, 1);
        assert_relative_eq!(report.average_distance.unwrap(), 21.0 / 3.0);
        assert_eq!(report.within.len(), 5);
        assert!(!report.meets_target);

        let empty = e.report(&[]);
        assert_eq!(empty.average_distance, None);
        assert!(!empty.meets_target);
    }
}
