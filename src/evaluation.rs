//! Offline evaluation harness for the decision pipeline.
//!
//! Runs synthetic communities through the actual production path (per
//! respondent inference, community aggregation, allocation simulation, model
//! selection), replacing human respondents with a deterministic generator.
//! Used by the `eval` CLI subcommand and the e2e test suite to catch
//! behavioral drift in the pipeline as a whole.

use std::time::Instant;

use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::community::{aggregate_community, SurveyResponse, TrendDirection};
use crate::inference::{default_questions, infer_weights, QuestionType, ValueQuestion, ValueResponse};
use crate::model_select::{select_model_configuration, DomainHint};
use crate::simulation::run_allocation_simulation;
use crate::weights::{Objective, ObjectiveWeights};

// =============================================================================
// Synthetic case definitions
// =============================================================================

/// A synthetic respondent population.
#[derive(Debug, Clone)]
pub struct SyntheticCommunity {
    pub name: &'static str,
    pub respondents: usize,
    /// Center of the accuracy-vs-fairness lean distribution (0–100).
    pub lean_mean: f64,
    /// Half-width of the uniform lean spread.
    pub lean_spread: f64,
    /// Optional second mode `(center, mix)` for polarized populations.
    pub second_mode: Option<(f64, f64)>,
    /// Lean points added per respondent index (time drift).
    pub drift_per_respondent: f64,
    pub scenario_pool: &'static [&'static str],
    pub domain: DomainHint,
    pub runs_per_point: usize,
    pub seed: u64,
}

/// The canned evaluation populations.
pub fn synthetic_cases() -> Vec<SyntheticCommunity> {
    vec![
        SyntheticCommunity {
            name: "fairness_leaning_24",
            respondents: 24,
            lean_mean: 25.0,
            lean_spread: 10.0,
            second_mode: None,
            drift_per_respondent: 0.0,
            scenario_pool: &["equal_access", "support_first"],
            domain: DomainHint::Credit,
            runs_per_point: 200,
            seed: 11,
        },
        SyntheticCommunity {
            name: "accuracy_leaning_24",
            respondents: 24,
            lean_mean: 75.0,
            lean_spread: 10.0,
            second_mode: None,
            drift_per_respondent: 0.0,
            scenario_pool: &["best_overall", "efficiency_first"],
            domain: DomainHint::General,
            runs_per_point: 200,
            seed: 12,
        },
        SyntheticCommunity {
            name: "polarized_30",
            respondents: 30,
            lean_mean: 15.0,
            lean_spread: 8.0,
            second_mode: Some((85.0, 0.5)),
            drift_per_respondent: 0.0,
            scenario_pool: &["equal_access", "best_overall", "case_by_case"],
            domain: DomainHint::Healthcare,
            runs_per_point: 200,
            seed: 13,
        },
        SyntheticCommunity {
            name: "drifting_36",
            respondents: 36,
            lean_mean: 70.0,
            lean_spread: 6.0,
            second_mode: None,
            drift_per_respondent: -40.0 / 35.0,
            scenario_pool: &["best_overall", "equal_access"],
            domain: DomainHint::General,
            runs_per_point: 200,
            seed: 14,
        },
    ]
}

// =============================================================================
// Metrics
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationMetrics {
    pub aggregate_weights: ObjectiveWeights,
    pub polarization_index: f64,
    pub stability_score: f64,
    pub trend_direction: TrendDirection,
    /// Fraction of the optimal allocation going to the disadvantaged
    /// fallback group.
    pub disadvantaged_share: f64,
    pub fairness_improvement_pct: f64,
    pub efficiency_sacrifice_pct: f64,
    pub model_family: String,
    pub composite_score: f64,
    /// Whether two identical simulation runs serialized identically.
    pub deterministic: bool,
    pub latency_ms: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub case_name: String,
    pub metrics: EvaluationMetrics,
}

// =============================================================================
// Public API
// =============================================================================

/// Runs every case (or the one matching `filter` exactly).
pub fn run_synthetic_suite(filter: Option<&str>) -> Vec<EvaluationResult> {
    synthetic_cases()
        .into_iter()
        .filter(|case| filter.map_or(true, |name| case.name == name))
        .map(|case| run_case(&case))
        .collect()
}

fn run_case(case: &SyntheticCommunity) -> EvaluationResult {
    let start = Instant::now();
    let responses = generate_population(case);
    let (weights, insights) = aggregate_community(&responses);

    let sim_seed = format!("eval:{}", case.name);
    let monte_carlo =
        run_allocation_simulation(&weights, None, case.runs_per_point, &sim_seed)
            .expect("aggregated weights always validate");
    let rerun = run_allocation_simulation(&weights, None, case.runs_per_point, &sim_seed)
        .expect("aggregated weights always validate");
    let deterministic = serde_json::to_string(&monte_carlo)
        .ok()
        .zip(serde_json::to_string(&rerun).ok())
        .is_some_and(|(a, b)| a == b);

    let model = select_model_configuration(&weights, case.domain, &sim_seed)
        .expect("aggregated weights always validate");

    let disadvantaged_share = monte_carlo
        .optimal_allocation
        .iter()
        .find(|arm| arm.group == "Group B")
        .map(|arm| arm.fraction)
        .unwrap_or(0.0);

    debug!(case = case.name, ?weights, "evaluated synthetic community");
    EvaluationResult {
        case_name: case.name.to_string(),
        metrics: EvaluationMetrics {
            aggregate_weights: weights,
            polarization_index: insights.polarization_index,
            stability_score: insights.stability_score,
            trend_direction: insights.trend_direction,
            disadvantaged_share,
            fairness_improvement_pct: monte_carlo.fairness_improvement_pct,
            efficiency_sacrifice_pct: monte_carlo.efficiency_sacrifice_pct,
            model_family: model.model_family.label().to_string(),
            composite_score: model.composite_score,
            deterministic,
            latency_ms: start.elapsed().as_millis(),
        },
    }
}

// =============================================================================
// Population generation
// =============================================================================

/// Generates a full respondent set: each respondent gets a lean, answers the
/// default question battery consistently with that lean, and carries the
/// weights inferred from those answers.
fn generate_population(case: &SyntheticCommunity) -> Vec<SurveyResponse> {
    let mut rng = StdRng::seed_from_u64(case.seed);
    let questions = default_questions();
    let base_time = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).single().unwrap_or_default();

    (0..case.respondents)
        .map(|index| {
            let center = match case.second_mode {
                Some((second, mix)) if rng.gen_bool(mix) => second,
                _ => case.lean_mean,
            };
            let lean = (center
                + case.drift_per_respondent * index as f64
                + rng.gen_range(-case.lean_spread..=case.lean_spread))
            .clamp(0.0, 100.0);

            let answers = answers_for_lean(lean, &questions, &mut rng);
            let weights = infer_weights(&questions, &answers);
            let scenario = case.scenario_pool[rng.gen_range(0..case.scenario_pool.len())];

            SurveyResponse {
                id: Uuid::new_v4(),
                accuracy_vs_fairness: lean,
                scenario: Some(scenario.to_string()),
                principle: None,
                weights: Some(weights),
                submitted_at: base_time + Duration::minutes(index as i64),
            }
        })
        .collect()
}

/// Maps a lean to a plausible answer sheet, with one point of likert noise.
fn answers_for_lean(
    lean: f64,
    questions: &[ValueQuestion],
    rng: &mut StdRng,
) -> Vec<ValueResponse> {
    questions
        .iter()
        .map(|question| {
            let favor = match question.maps_to {
                Objective::Accuracy => lean,
                Objective::Fairness => 100.0 - lean,
                Objective::Robustness => 50.0,
            };
            let answer = match question.question_type {
                QuestionType::Likert => {
                    let graded = 1.0 + (favor / 25.0).round();
                    let noise = rng.gen_range(-1i8..=1) as f64;
                    (graded + noise).clamp(1.0, 5.0) as u8
                }
                QuestionType::Binary => u8::from(favor >= 50.0),
            };
            ValueResponse {
                question_id: question.id.clone(),
                answer,
            }
        })
        .collect()
}
