//! Community aggregator: many individual survey records to one weight set
//! plus distributional insights.
//!
//! The aggregate weights feed the exact same simulator and model selector as
//! a personal run: the "community" path is a different input, not a
//! different pipeline. Insights are recomputed from scratch whenever the
//! response set changes; nothing here is mutated in place.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::debug;
use uuid::Uuid;

use crate::weights::ObjectiveWeights;

/// Robustness points reserved before the legacy accuracy/fairness split.
const ROBUSTNESS_RESERVE: u32 = 15;

/// Target bucket count for preference drift over time.
const DRIFT_BUCKETS: usize = 6;

/// Fairness-lean difference (in points) between the first and last drift
/// bucket that counts as a trend rather than noise.
const TREND_THRESHOLD: f64 = 3.0;

/// Theoretical maximum population variance of a 0–100 bounded variable
/// (half the mass at each extreme).
const MAX_SCALAR_VARIANCE: f64 = 2500.0;

/// One community member's recorded survey submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyResponse {
    pub id: Uuid,
    /// Legacy single-axis lean: 0 = full fairness, 100 = full accuracy.
    pub accuracy_vs_fairness: f64,
    /// Scenario cluster the respondent aligned with, if any.
    #[serde(default)]
    pub scenario: Option<String>,
    /// Stated guiding principle, if any.
    #[serde(default)]
    pub principle: Option<String>,
    /// Per-response inferred weights, when the respondent completed the
    /// full question battery.
    #[serde(default)]
    pub weights: Option<ObjectiveWeights>,
    pub submitted_at: DateTime<Utc>,
}

/// Direction the community's lean is moving over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    IncreasingFairness,
    IncreasingEfficiency,
    Stable,
}

/// Mean lean of one time slice of responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftBucket {
    pub count: usize,
    /// Mean accuracy-vs-fairness scalar in this slice (0–100).
    pub mean_accuracy_lean: f64,
    /// Complement of the accuracy lean (0–100).
    pub mean_fairness_lean: f64,
}

/// Distribution summaries over a community's response set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityInsights {
    pub total_responses: usize,
    pub scenario_counts: BTreeMap<String, usize>,
    pub principle_counts: BTreeMap<String, usize>,
    /// `1 - largest_cluster / total`: 0 when unanimous, approaching 1 as the
    /// community fragments.
    pub polarization_index: f64,
    /// `max(0, 1 - variance / 2500)`: 1 when everyone agrees on the lean.
    pub stability_score: f64,
    /// Time-ordered slices of the community lean.
    pub preference_drift: Vec<DriftBucket>,
    pub trend_direction: TrendDirection,
}

/// Reduces a community's responses to aggregate weights plus insights.
///
/// When at least one response carries inferred weights those are averaged
/// component-wise and renormalized. Otherwise the legacy scalar is averaged,
/// a fixed robustness reserve is held back, and the remaining 85 points are
/// split proportionally between accuracy and fairness.
pub fn aggregate_community(responses: &[SurveyResponse]) -> (ObjectiveWeights, CommunityInsights) {
    let weights = aggregate_weights(responses);
    let insights = compute_insights(responses);
    debug!(
        responses = responses.len(),
        accuracy = weights.accuracy,
        fairness = weights.fairness,
        polarization = insights.polarization_index,
        "aggregated community responses"
    );
    (weights, insights)
}

fn aggregate_weights(responses: &[SurveyResponse]) -> ObjectiveWeights {
    if responses.is_empty() {
        return ObjectiveWeights::baseline();
    }

    let inferred: Vec<&ObjectiveWeights> = responses.iter().filter_map(|r| r.weights.as_ref()).collect();
    if !inferred.is_empty() {
        let n = inferred.len() as f64;
        let accuracy: f64 = inferred.iter().map(|w| f64::from(w.accuracy)).sum::<f64>() / n;
        let fairness: f64 = inferred.iter().map(|w| f64::from(w.fairness)).sum::<f64>() / n;
        let robustness: f64 = inferred.iter().map(|w| f64::from(w.robustness)).sum::<f64>() / n;
        return ObjectiveWeights::from_unnormalized(accuracy, fairness, robustness);
    }

    // Legacy path: only the single-axis scalar is available.
    let mean = responses
        .iter()
        .map(|r| r.accuracy_vs_fairness.clamp(0.0, 100.0))
        .sum::<f64>()
        / responses.len() as f64;
    let split = 100 - ROBUSTNESS_RESERVE;
    let accuracy = (f64::from(split) * mean / 100.0).round() as u32;
    ObjectiveWeights {
        accuracy,
        fairness: split - accuracy,
        robustness: ROBUSTNESS_RESERVE,
    }
}

fn compute_insights(responses: &[SurveyResponse]) -> CommunityInsights {
    let total = responses.len();
    if total == 0 {
        return CommunityInsights {
            total_responses: 0,
            scenario_counts: BTreeMap::new(),
            principle_counts: BTreeMap::new(),
            polarization_index: 0.0,
            stability_score: 1.0,
            preference_drift: Vec::new(),
            trend_direction: TrendDirection::Stable,
        };
    }

    let mut scenario_counts = BTreeMap::new();
    let mut principle_counts = BTreeMap::new();
    let mut clusters: BTreeMap<String, usize> = BTreeMap::new();
    for response in responses {
        if let Some(scenario) = &response.scenario {
            *scenario_counts.entry(scenario.clone()).or_insert(0) += 1;
        }
        if let Some(principle) = &response.principle {
            *principle_counts.entry(principle.clone()).or_insert(0) += 1;
        }
        *clusters.entry(cluster_key(response)).or_insert(0) += 1;
    }
    let largest = clusters.values().copied().max().unwrap_or(0);
    let polarization_index = 1.0 - largest as f64 / total as f64;

    let scalars: Vec<f64> = responses
        .iter()
        .map(|r| r.accuracy_vs_fairness.clamp(0.0, 100.0))
        .collect();
    let variance = if scalars.len() > 1 {
        scalars.iter().population_variance()
    } else {
        0.0
    };
    let stability_score = (1.0 - variance / MAX_SCALAR_VARIANCE).max(0.0);

    let preference_drift = drift_buckets(responses);
    let trend_direction = trend_for(&preference_drift);

    CommunityInsights {
        total_responses: total,
        scenario_counts,
        principle_counts,
        polarization_index,
        stability_score,
        preference_drift,
        trend_direction,
    }
}

/// Cluster key for polarization: the scenario label when present, else a
/// tercile of the legacy lean scalar.
fn cluster_key(response: &SurveyResponse) -> String {
    if let Some(scenario) = &response.scenario {
        return scenario.clone();
    }
    let lean = response.accuracy_vs_fairness.clamp(0.0, 100.0);
    if lean < 100.0 / 3.0 {
        "leans_fairness".to_string()
    } else if lean < 200.0 / 3.0 {
        "balanced".to_string()
    } else {
        "leans_accuracy".to_string()
    }
}

/// Chunks responses, sorted by submission time, into ~6 equal buckets.
fn drift_buckets(responses: &[SurveyResponse]) -> Vec<DriftBucket> {
    let mut ordered: Vec<&SurveyResponse> = responses.iter().collect();
    ordered.sort_by_key(|r| r.submitted_at);

    let chunk = ordered.len().div_ceil(DRIFT_BUCKETS);
    ordered
        .chunks(chunk.max(1))
        .map(|slice| {
            let mean = slice
                .iter()
                .map(|r| r.accuracy_vs_fairness.clamp(0.0, 100.0))
                .sum::<f64>()
                / slice.len() as f64;
            DriftBucket {
                count: slice.len(),
                mean_accuracy_lean: mean,
                mean_fairness_lean: 100.0 - mean,
            }
        })
        .collect()
}

fn trend_for(buckets: &[DriftBucket]) -> TrendDirection {
    let (Some(first), Some(last)) = (buckets.first(), buckets.last()) else {
        return TrendDirection::Stable;
    };
    let shift = last.mean_fairness_lean - first.mean_fairness_lean;
    if shift > TREND_THRESHOLD {
        TrendDirection::IncreasingFairness
    } else if shift < -TREND_THRESHOLD {
        TrendDirection::IncreasingEfficiency
    } else {
        TrendDirection::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn response(lean: f64, scenario: Option<&str>, minute: u32) -> SurveyResponse {
        SurveyResponse {
            id: Uuid::new_v4(),
            accuracy_vs_fairness: lean,
            scenario: scenario.map(str::to_string),
            principle: None,
            weights: None,
            submitted_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn empty_input_returns_baseline_and_stable_insights() {
        let (weights, insights) = aggregate_community(&[]);
        assert_eq!(weights, ObjectiveWeights::baseline());
        assert_eq!(insights.total_responses, 0);
        assert_eq!(insights.trend_direction, TrendDirection::Stable);
    }

    #[test]
    fn legacy_scalar_split_reserves_robustness() {
        let responses = vec![response(100.0, None, 0), response(50.0, None, 1)];
        let (weights, _) = aggregate_community(&responses);
        assert_eq!(weights.robustness, 15);
        // mean 75 -> accuracy = round(85 * 0.75) = 64, fairness = 21.
        assert_eq!(weights.accuracy, 64);
        assert_eq!(weights.fairness, 21);
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn inferred_weights_take_precedence_over_scalar() {
        let mut r = response(100.0, None, 0);
        r.weights = Some(ObjectiveWeights::new(20, 60, 20).unwrap());
        let (weights, _) = aggregate_community(&[r]);
        assert_eq!(weights, ObjectiveWeights::new(20, 60, 20).unwrap());
    }

    #[test]
    fn unanimous_community_has_zero_polarization() {
        let responses: Vec<_> = (0..6).map(|i| response(40.0, Some("s1"), i)).collect();
        let (_, insights) = aggregate_community(&responses);
        assert_eq!(insights.polarization_index, 0.0);
        assert!(insights.stability_score > 0.999);
    }

    #[test]
    fn fragmented_community_polarizes() {
        let responses = vec![
            response(10.0, Some("s1"), 0),
            response(50.0, Some("s2"), 1),
            response(90.0, Some("s3"), 2),
        ];
        let (_, insights) = aggregate_community(&responses);
        assert!(insights.polarization_index > 0.5);
        assert!(insights.stability_score < 1.0);
    }

    #[test]
    fn drift_detects_a_fairness_swing() {
        // Early respondents lean accuracy, late respondents lean fairness.
        let responses: Vec<_> = (0..12)
            .map(|i| response(if i < 6 { 80.0 } else { 20.0 }, None, i))
            .collect();
        let (_, insights) = aggregate_community(&responses);
        assert_eq!(insights.preference_drift.len(), 6);
        assert_eq!(insights.trend_direction, TrendDirection::IncreasingFairness);
    }

    #[test]
    fn flat_history_is_stable() {
        let responses: Vec<_> = (0..12).map(|i| response(55.0, None, i)).collect();
        let (_, insights) = aggregate_community(&responses);
        assert_eq!(insights.trend_direction, TrendDirection::Stable);
    }
}
