use fairshare_engine::evaluation::{run_synthetic_suite, synthetic_cases};
use fairshare_engine::TrendDirection;

fn assert_unit(x: f64) {
    assert!(
        x.is_finite() && (0.0..=1.0).contains(&x),
        "expected value in [0,1], got {x}"
    );
}

#[test]
fn synthetic_suite_filter_selects_exact_name() {
    let all = synthetic_cases();
    assert!(all.iter().any(|c| c.name == "fairness_leaning_24"));

    let selected = run_synthetic_suite(Some("fairness_leaning_24"));
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].case_name, "fairness_leaning_24");
}

#[test]
fn fairness_leaning_community_shifts_weights_and_allocation() {
    let result = run_synthetic_suite(Some("fairness_leaning_24"));
    let metrics = &result[0].metrics;

    assert!(metrics.aggregate_weights.fairness > metrics.aggregate_weights.accuracy);
    assert!(metrics.disadvantaged_share >= 0.5);
    assert!(metrics.deterministic);
    assert_unit(metrics.polarization_index);
    assert_unit(metrics.stability_score);
}

#[test]
fn accuracy_leaning_community_keeps_efficiency() {
    let result = run_synthetic_suite(Some("accuracy_leaning_24"));
    let metrics = &result[0].metrics;

    assert!(metrics.aggregate_weights.accuracy > metrics.aggregate_weights.fairness);
    assert!(
        metrics.efficiency_sacrifice_pct < 5.0,
        "got {}",
        metrics.efficiency_sacrifice_pct
    );
    assert!(metrics.deterministic);
}

#[test]
fn polarized_community_shows_up_in_the_indices() {
    let result = run_synthetic_suite(Some("polarized_30"));
    let metrics = &result[0].metrics;

    assert!(metrics.polarization_index > 0.4, "got {}", metrics.polarization_index);
    assert!(metrics.polarization_index < 1.0);
    assert!(metrics.stability_score < 0.8, "got {}", metrics.stability_score);
}

#[test]
fn drifting_community_is_flagged() {
    let result = run_synthetic_suite(Some("drifting_36"));
    let metrics = &result[0].metrics;
    assert_eq!(metrics.trend_direction, TrendDirection::IncreasingFairness);
}

#[test]
fn full_suite_reports_every_case_with_sane_scores() {
    let results = run_synthetic_suite(None);
    assert_eq!(results.len(), synthetic_cases().len());
    for result in &results {
        let m = &result.metrics;
        assert_eq!(
            m.aggregate_weights.accuracy + m.aggregate_weights.fairness
                + m.aggregate_weights.robustness,
            100,
            "{}",
            result.case_name
        );
        assert!((0.0..=100.0).contains(&m.fairness_improvement_pct));
        assert!((0.0..=100.0).contains(&m.efficiency_sacrifice_pct));
        assert!(m.composite_score > 0.5 && m.composite_score < 1.0);
        assert!(m.deterministic, "{} was not deterministic", result.case_name);
        assert!(!m.model_family.is_empty());
    }
}
