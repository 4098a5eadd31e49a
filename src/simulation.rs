//! Monte Carlo allocation simulator.
//!
//! For a grid of candidate allocation vectors over the population groups,
//! runs repeated noisy outcome simulations, scores each candidate against
//! the objective weights, picks the optimum, and derives a Pareto frontier
//! plus a confidence rating.
//!
//! Every candidate derives its own seeded stream from the run seed plus the
//! serialized allocation, so evaluations are independent and the whole
//! result is reproducible regardless of evaluation order. The "community"
//! and "personal" paths are the same function called with different weights
//! and seed; nothing here knows which one it is running.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::debug;

use crate::error::EngineError;
use crate::groups::{fallback_profiles, normalize_shares, GroupProfile};
use crate::model_select::{select_model_configuration, DomainHint, ModelConfiguration};
use crate::stream::SeededStream;
use crate::weights::ObjectiveWeights;

// =============================================================================
// Options and result types
// =============================================================================

/// Tunables for one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOptions {
    /// Grid resolution for the two-group sweep: `grid_steps + 1` candidates
    /// from all-to-A to all-to-B. Three or more groups draw `grid_steps * 5`
    /// points on the probability simplex instead.
    pub grid_steps: usize,
    /// Sigma of the Gaussian noise added to each simulated group outcome.
    pub noise_sigma: f64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            grid_steps: 20,
            noise_sigma: 0.02,
        }
    }
}

/// One group's slice of the optimal allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationArm {
    pub group: String,
    pub fraction: f64,
}

/// One non-dominated (outcome, fairness gap) point. Outcome and gap are in
/// raw simulation units (`[0, 1]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParetoPoint {
    pub outcome: f64,
    pub fairness_gap: f64,
    pub allocation: Vec<f64>,
}

/// Stability rating of a simulation run.
///
/// A heuristic over run count and top-candidate score spread, not a
/// statistical guarantee: it communicates simulation quality and is never an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Moderate,
    High,
}

/// Structured result of one allocation simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    /// Noisy iterations evaluated per candidate.
    pub total_runs: usize,
    /// The winning allocation, one arm per group in profile order.
    pub optimal_allocation: Vec<AllocationArm>,
    /// Population-weighted expected outcome at the optimum, scaled to 0–100.
    pub expected_outcome: f64,
    /// How much the optimum shrinks the outcome gap versus an equal split,
    /// in percent, clamped to `[0, 100]`.
    pub fairness_improvement_pct: f64,
    /// How much overall outcome the optimum gives up versus an equal split,
    /// in percent, clamped to `[0, 100]`.
    pub efficiency_sacrifice_pct: f64,
    pub confidence: Confidence,
    /// Non-dominated candidates ordered by descending outcome and strictly
    /// decreasing fairness gap.
    pub pareto_frontier: Vec<ParetoPoint>,
}

/// A candidate allocation with its averaged simulation measurements.
#[derive(Debug, Clone)]
struct CandidateEval {
    allocation: Vec<f64>,
    avg_outcome: f64,
    avg_gap: f64,
    score: f64,
}

// =============================================================================
// Public API
// =============================================================================

/// Runs the allocation simulation with default options.
///
/// `profiles` may be `None` or empty; the fixed fallback pair is used so a
/// simulation is always runnable.
pub fn run_allocation_simulation(
    weights: &ObjectiveWeights,
    profiles: Option<&[GroupProfile]>,
    runs_per_point: usize,
    seed: &str,
) -> Result<MonteCarloResult, EngineError> {
    run_allocation_simulation_with(
        weights,
        profiles,
        runs_per_point,
        seed,
        &SimulationOptions::default(),
    )
}

/// Runs the allocation simulation with explicit options.
pub fn run_allocation_simulation_with(
    weights: &ObjectiveWeights,
    profiles: Option<&[GroupProfile]>,
    runs_per_point: usize,
    seed: &str,
    options: &SimulationOptions,
) -> Result<MonteCarloResult, EngineError> {
    weights.validate()?;

    let profiles = match profiles {
        Some(p) if !p.is_empty() => normalize_shares(p.to_vec()),
        _ => fallback_profiles(),
    };
    validate_profiles(&profiles)?;

    let runs = runs_per_point.max(1);

    // Single group: nothing to allocate, zero fairness gap by construction.
    if profiles.len() == 1 {
        let eval = evaluate_candidate(vec![1.0], &profiles, runs, seed, options, weights);
        return Ok(MonteCarloResult {
            total_runs: runs,
            optimal_allocation: arms(&profiles, &eval.allocation),
            expected_outcome: eval.avg_outcome * 100.0,
            fairness_improvement_pct: 0.0,
            efficiency_sacrifice_pct: 0.0,
            confidence: confidence_for(runs, &[eval.score]),
            pareto_frontier: vec![ParetoPoint {
                outcome: eval.avg_outcome,
                fairness_gap: eval.avg_gap,
                allocation: eval.allocation,
            }],
        });
    }

    let candidates = candidate_allocations(profiles.len(), options, seed);
    debug!(
        groups = profiles.len(),
        candidates = candidates.len(),
        runs,
        "evaluating allocation grid"
    );

    let evals: Vec<CandidateEval> = candidates
        .into_iter()
        .map(|allocation| evaluate_candidate(allocation, &profiles, runs, seed, options, weights))
        .collect();

    // Optimum: highest score, ties to the first occurrence in generation
    // order (strict comparison keeps this deterministic).
    let mut best = 0;
    for (i, eval) in evals.iter().enumerate() {
        if eval.score > evals[best].score {
            best = i;
        }
    }

    // Identical run at the equal split for the comparison baselines.
    let equal_split = vec![1.0 / profiles.len() as f64; profiles.len()];
    let equal = evaluate_candidate(equal_split, &profiles, runs, seed, options, weights);

    let optimal = &evals[best];
    let efficiency_sacrifice_pct = if equal.avg_outcome > 0.0 {
        ((equal.avg_outcome - optimal.avg_outcome) / equal.avg_outcome * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };
    let fairness_improvement_pct = if equal.avg_gap > 0.0 {
        ((equal.avg_gap - optimal.avg_gap) / equal.avg_gap * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    let scores: Vec<f64> = evals.iter().map(|e| e.score).collect();
    let result = MonteCarloResult {
        total_runs: runs,
        optimal_allocation: arms(&profiles, &optimal.allocation),
        expected_outcome: optimal.avg_outcome * 100.0,
        fairness_improvement_pct,
        efficiency_sacrifice_pct,
        confidence: confidence_for(runs, &scores),
        pareto_frontier: pareto_frontier(&evals),
    };
    debug!(
        expected_outcome = result.expected_outcome,
        fairness_improvement_pct,
        efficiency_sacrifice_pct,
        frontier = result.pareto_frontier.len(),
        "simulation complete"
    );
    Ok(result)
}

// =============================================================================
// Candidate generation
// =============================================================================

/// Candidate allocation vectors over `k` groups.
///
/// Two groups sweep the single free fraction on a uniform grid. Three or
/// more groups sample the probability simplex by normalizing independent
/// exponential variates, an unbiased near-uniform cover without rejection.
fn candidate_allocations(k: usize, options: &SimulationOptions, seed: &str) -> Vec<Vec<f64>> {
    let steps = options.grid_steps.max(1);
    if k == 2 {
        return (0..=steps)
            .map(|i| {
                let f = i as f64 / steps as f64;
                vec![f, 1.0 - f]
            })
            .collect();
    }

    let mut stream = SeededStream::derived(seed, "simplex");
    (0..steps * 5)
        .map(|_| {
            let draws: Vec<f64> = (0..k).map(|_| -(1.0 - stream.next()).ln()).collect();
            let sum: f64 = draws.iter().sum();
            if sum > 0.0 {
                draws.iter().map(|d| d / sum).collect()
            } else {
                vec![1.0 / k as f64; k]
            }
        })
        .collect()
}

// =============================================================================
// Per-candidate evaluation
// =============================================================================

/// Stable string form of an allocation, used to derive its private stream.
fn allocation_key(allocation: &[f64]) -> String {
    let fractions: Vec<String> = allocation.iter().map(|f| format!("{f:.6}")).collect();
    format!("alloc:{}", fractions.join(","))
}

/// Averages `runs` noisy simulations of one allocation and scores it.
fn evaluate_candidate(
    allocation: Vec<f64>,
    profiles: &[GroupProfile],
    runs: usize,
    seed: &str,
    options: &SimulationOptions,
    weights: &ObjectiveWeights,
) -> CandidateEval {
    let mut stream = SeededStream::derived(seed, &allocation_key(&allocation));
    let mut outcome_sum = 0.0;
    let mut gap_sum = 0.0;

    for _ in 0..runs {
        let mut weighted = 0.0;
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for (profile, fraction) in profiles.iter().zip(&allocation) {
            let outcome = (profile.baseline_outcome
                + fraction * profile.responsiveness
                + stream.gaussian(options.noise_sigma))
            .clamp(0.0, 1.0);
            weighted += profile.population_share * outcome;
            lo = lo.min(outcome);
            hi = hi.max(outcome);
        }
        outcome_sum += weighted;
        gap_sum += hi - lo;
    }

    let avg_outcome = outcome_sum / runs as f64;
    let avg_gap = gap_sum / runs as f64;
    let score = f64::from(weights.accuracy) / 100.0 * avg_outcome
        + f64::from(weights.fairness) / 100.0 * (1.0 - avg_gap);
    CandidateEval {
        allocation,
        avg_outcome,
        avg_gap,
        score,
    }
}

fn arms(profiles: &[GroupProfile], allocation: &[f64]) -> Vec<AllocationArm> {
    profiles
        .iter()
        .zip(allocation)
        .map(|(profile, fraction)| AllocationArm {
            group: profile.name.clone(),
            fraction: *fraction,
        })
        .collect()
}

// =============================================================================
// Frontier and confidence
// =============================================================================

/// Walks candidates by descending outcome, emitting a point only when its
/// fairness gap strictly improves on the best seen so far. The result is
/// non-increasing in outcome and strictly decreasing in gap, with no
/// dominated points surviving.
fn pareto_frontier(evals: &[CandidateEval]) -> Vec<ParetoPoint> {
    let mut order: Vec<usize> = (0..evals.len()).collect();
    // Stable sort keeps generation order on outcome ties.
    order.sort_by(|&a, &b| {
        evals[b]
            .avg_outcome
            .partial_cmp(&evals[a].avg_outcome)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut best_gap = f64::INFINITY;
    let mut frontier = Vec::new();
    for i in order {
        let eval = &evals[i];
        if eval.avg_gap < best_gap {
            best_gap = eval.avg_gap;
            frontier.push(ParetoPoint {
                outcome: eval.avg_outcome,
                fairness_gap: eval.avg_gap,
                allocation: eval.allocation.clone(),
            });
        }
    }
    frontier
}

/// Run-count plus top-candidate score spread heuristic.
fn confidence_for(runs: usize, scores: &[f64]) -> Confidence {
    if runs >= 500 {
        let mut top: Vec<f64> = scores.to_vec();
        top.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        top.truncate(5);
        if top.iter().population_variance() < 0.001 {
            return Confidence::High;
        }
    }
    if runs >= 100 {
        Confidence::Moderate
    } else {
        Confidence::Low
    }
}

fn validate_profiles(profiles: &[GroupProfile]) -> Result<(), EngineError> {
    for profile in profiles {
        let fields = [
            ("baseline_outcome", profile.baseline_outcome),
            ("responsiveness", profile.responsiveness),
            ("population_share", profile.population_share),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(EngineError::InvalidProfile {
                    group: profile.name.clone(),
                    reason: format!("{name} is not finite"),
                });
            }
        }
        if profile.population_share <= 0.0 {
            return Err(EngineError::InvalidProfile {
                group: profile.name.clone(),
                reason: "population_share must be positive".to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Combined recommendation
// =============================================================================

/// The combined output the surrounding application consumes: one weight set
/// pushed through both the allocation simulator and the model selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub weights: ObjectiveWeights,
    pub monte_carlo: MonteCarloResult,
    pub model: ModelConfiguration,
}

/// Runs the full downstream pipeline for one weight set.
pub fn recommend(
    weights: &ObjectiveWeights,
    profiles: Option<&[GroupProfile]>,
    runs_per_point: usize,
    domain: DomainHint,
    seed: &str,
) -> Result<Recommendation, EngineError> {
    Ok(Recommendation {
        weights: *weights,
        monte_carlo: run_allocation_simulation(weights, profiles, runs_per_point, seed)?,
        model: select_model_configuration(weights, domain, seed)?,
    })
}
