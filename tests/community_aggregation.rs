use chrono::{TimeZone, Utc};
use fairshare_engine::{
    aggregate_community, recommend, DomainHint, SurveyResponse, TrendDirection,
};
use uuid::Uuid;

/// Twelve canned responses spanning three scenario clusters, the shape a
/// small community deliberation actually produces.
fn canned_responses() -> Vec<SurveyResponse> {
    let make = |lean: f64, scenario: &str, principle: &str, minute: u32| SurveyResponse {
        id: Uuid::new_v4(),
        accuracy_vs_fairness: lean,
        scenario: Some(scenario.to_string()),
        principle: Some(principle.to_string()),
        weights: None,
        submitted_at: Utc.with_ymd_and_hms(2024, 5, 10, 18, minute, 0).unwrap(),
    };

    vec![
        make(20.0, "equal_access", "equity", 0),
        make(25.0, "equal_access", "equity", 2),
        make(30.0, "equal_access", "need_first", 4),
        make(15.0, "equal_access", "equity", 6),
        make(35.0, "equal_access", "need_first", 8),
        make(55.0, "case_by_case", "context", 10),
        make(60.0, "case_by_case", "context", 12),
        make(45.0, "case_by_case", "need_first", 14),
        make(50.0, "case_by_case", "context", 16),
        make(80.0, "best_overall", "efficiency", 18),
        make(85.0, "best_overall", "efficiency", 20),
        make(75.0, "best_overall", "efficiency", 22),
    ]
}

#[test]
fn clustered_community_polarization_is_strictly_between_zero_and_one() {
    let (_, insights) = aggregate_community(&canned_responses());
    assert!(
        insights.polarization_index > 0.0 && insights.polarization_index < 1.0,
        "got {}",
        insights.polarization_index
    );
    // Largest cluster is equal_access with 5 of 12.
    assert!((insights.polarization_index - (1.0 - 5.0 / 12.0)).abs() < 1e-12);
}

#[test]
fn frequency_tables_count_every_label() {
    let (_, insights) = aggregate_community(&canned_responses());
    assert_eq!(insights.total_responses, 12);
    assert_eq!(insights.scenario_counts["equal_access"], 5);
    assert_eq!(insights.scenario_counts["case_by_case"], 4);
    assert_eq!(insights.scenario_counts["best_overall"], 3);
    assert_eq!(insights.principle_counts["equity"], 3);
    assert_eq!(insights.principle_counts["efficiency"], 3);
}

#[test]
fn aggregate_weights_reserve_robustness_and_validate() {
    let (weights, _) = aggregate_community(&canned_responses());
    assert_eq!(weights.robustness, 15);
    assert_eq!(weights.accuracy + weights.fairness + weights.robustness, 100);
    // Mean lean is 47.9, so the 85-point split should be near-even.
    assert!(weights.accuracy >= 35 && weights.accuracy <= 50);
}

#[test]
fn drifting_community_flags_increasing_efficiency() {
    // Early fairness leaners, later efficiency leaners.
    let responses: Vec<SurveyResponse> = (0..12)
        .map(|i| SurveyResponse {
            id: Uuid::new_v4(),
            accuracy_vs_fairness: if i < 6 { 25.0 } else { 75.0 },
            scenario: None,
            principle: None,
            weights: None,
            submitted_at: Utc.with_ymd_and_hms(2024, 5, 11, 10, i, 0).unwrap(),
        })
        .collect();
    let (_, insights) = aggregate_community(&responses);
    assert_eq!(insights.trend_direction, TrendDirection::IncreasingEfficiency);
    assert_eq!(insights.preference_drift.len(), 6);
}

#[test]
fn community_weights_run_the_same_pipeline_as_personal_ones() {
    let (weights, _) = aggregate_community(&canned_responses());
    let rec = recommend(&weights, None, 100, DomainHint::Healthcare, "community").unwrap();
    assert_eq!(rec.weights, weights);
    assert!(rec.monte_carlo.expected_outcome > 0.0);
    assert!(rec.model.composite_score > 0.0);

    let again = recommend(&weights, None, 100, DomainHint::Healthcare, "community").unwrap();
    assert_eq!(
        serde_json::to_string(&rec).unwrap(),
        serde_json::to_string(&again).unwrap()
    );
}
