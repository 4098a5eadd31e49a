//! Model configuration selector.
//!
//! Picks a model family from a flat decision table keyed on the domain hint
//! and the dominant objective, synthesizes plausible hyperparameters from
//! fixed per-family ranges, and synthesizes metrics consistent with the
//! weights. No training happens anywhere: metrics are synthetic functions of
//! the weights, not measured performance.
//!
//! Everything is driven by one seeded stream, so repeated calls with the
//! same seed are identical while different seeds diversify plausible
//! choices.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;
use crate::stream::SeededStream;
use crate::weights::{Objective, ObjectiveWeights};

// =============================================================================
// Domains and families
// =============================================================================

/// Pre-classified application domain. Classification itself (from dataset
/// names, column headers, whatever) is the caller's job; the engine only
/// consumes the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainHint {
    Credit,
    Healthcare,
    Hiring,
    CriminalJustice,
    Education,
    General,
}

impl DomainHint {
    /// Domains with regulated, audit-prone decisions bias toward
    /// interpretable families when fairness dominates.
    pub fn regulated(self) -> bool {
        matches!(
            self,
            Self::Credit | Self::Healthcare | Self::Hiring | Self::CriminalJustice
        )
    }
}

impl FromStr for DomainHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "credit" => Ok(Self::Credit),
            "healthcare" => Ok(Self::Healthcare),
            "hiring" => Ok(Self::Hiring),
            "criminal_justice" => Ok(Self::CriminalJustice),
            "education" => Ok(Self::Education),
            "general" => Ok(Self::General),
            other => Err(format!("unknown domain hint '{other}'")),
        }
    }
}

/// Model family the recommendation names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    LogisticRegression,
    DecisionTree,
    RandomForest,
    GradientBoosting,
    LinearSvm,
    NeuralNetwork,
}

impl ModelFamily {
    pub fn label(self) -> &'static str {
        match self {
            Self::LogisticRegression => "logistic_regression",
            Self::DecisionTree => "decision_tree",
            Self::RandomForest => "random_forest",
            Self::GradientBoosting => "gradient_boosting",
            Self::LinearSvm => "linear_svm",
            Self::NeuralNetwork => "neural_network",
        }
    }
}

/// Scalar, text, or flag hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HyperparameterValue {
    Int(i64),
    Float(f64),
    Text(String),
    Flag(bool),
}

/// Synthetic quality metrics, each in `[floor, 0.99]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub fairness_score: f64,
    pub robustness_score: f64,
    pub interpretability_score: f64,
}

/// A selected model family with hyperparameters, metrics, and the composite
/// score callers rank configurations by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfiguration {
    pub model_family: ModelFamily,
    pub hyperparameters: BTreeMap<String, HyperparameterValue>,
    pub metrics: ModelMetrics,
    /// Weight-normalized blend of the accuracy/fairness/robustness metrics.
    /// Interpretability is reported but excluded.
    pub composite_score: f64,
}

// =============================================================================
// Selection
// =============================================================================

/// Selects a model configuration for the given weights and domain.
pub fn select_model_configuration(
    weights: &ObjectiveWeights,
    domain: DomainHint,
    seed: &str,
) -> Result<ModelConfiguration, EngineError> {
    weights.validate()?;
    let mut stream = SeededStream::derived(seed, "model");

    let bucket = candidate_bucket(domain, weights);
    // One draw breaks the tie within the bucket; same seed, same family.
    let family = bucket[stream.next_index(bucket.len())];
    debug!(family = family.label(), ?domain, "selected model family");

    let hyperparameters = synthesize_hyperparameters(family, weights, &mut stream);
    let metrics = synthesize_metrics(family, weights, &mut stream);
    let composite_score = (f64::from(weights.accuracy) * metrics.accuracy
        + f64::from(weights.fairness) * metrics.fairness_score
        + f64::from(weights.robustness) * metrics.robustness_score)
        / 100.0;

    Ok(ModelConfiguration {
        model_family: family,
        hyperparameters,
        metrics,
        composite_score,
    })
}

/// The flat decision table: domain hint plus dominant-objective thresholds
/// to a small bucket of plausible families.
fn candidate_bucket(domain: DomainHint, weights: &ObjectiveWeights) -> &'static [ModelFamily] {
    use ModelFamily::*;

    if domain.regulated() && weights.fairness >= 50 {
        return &[LogisticRegression, DecisionTree];
    }
    if weights.accuracy >= 70 && !domain.regulated() {
        return &[NeuralNetwork, GradientBoosting];
    }
    if weights.accuracy >= 55 {
        return &[GradientBoosting, RandomForest];
    }
    if weights.dominant() == Objective::Robustness {
        return &[RandomForest, LinearSvm];
    }
    match domain {
        DomainHint::Education => &[DecisionTree, RandomForest, LogisticRegression],
        d if d.regulated() => &[LogisticRegression, RandomForest],
        _ => &[RandomForest, GradientBoosting, LogisticRegression],
    }
}

// =============================================================================
// Hyperparameter synthesis
// =============================================================================

fn synthesize_hyperparameters(
    family: ModelFamily,
    weights: &ObjectiveWeights,
    stream: &mut SeededStream,
) -> BTreeMap<String, HyperparameterValue> {
    use HyperparameterValue::*;

    let mut params = BTreeMap::new();
    let int = |stream: &mut SeededStream, lo: i64, hi: i64| {
        Int(lo + stream.next_index((hi - lo + 1) as usize) as i64)
    };
    let float = |stream: &mut SeededStream, lo: f64, hi: f64| {
        Float((stream.next_in(lo, hi) * 1000.0).round() / 1000.0)
    };

    match family {
        ModelFamily::LogisticRegression => {
            let penalty = if stream.next() < 0.7 { "l2" } else { "l1" };
            params.insert("penalty".to_string(), Text(penalty.to_string()));
            params.insert("c".to_string(), float(stream, 0.01, 10.0));
            params.insert("max_iter".to_string(), int(stream, 200, 1000));
            params.insert(
                "class_weight_balanced".to_string(),
                Flag(weights.fairness >= 40),
            );
        }
        ModelFamily::DecisionTree => {
            params.insert("max_depth".to_string(), int(stream, 3, 10));
            params.insert("min_samples_leaf".to_string(), int(stream, 1, 20));
            let criterion = if stream.next() < 0.5 { "gini" } else { "entropy" };
            params.insert("criterion".to_string(), Text(criterion.to_string()));
        }
        ModelFamily::RandomForest => {
            params.insert("n_estimators".to_string(), int(stream, 100, 600));
            params.insert("max_depth".to_string(), int(stream, 4, 16));
            params.insert("min_samples_split".to_string(), int(stream, 2, 10));
            params.insert("max_features".to_string(), Text("sqrt".to_string()));
        }
        ModelFamily::GradientBoosting => {
            params.insert("n_estimators".to_string(), int(stream, 100, 500));
            params.insert("learning_rate".to_string(), float(stream, 0.01, 0.3));
            params.insert("max_depth".to_string(), int(stream, 3, 8));
            params.insert("subsample".to_string(), float(stream, 0.7, 1.0));
        }
        ModelFamily::LinearSvm => {
            params.insert("c".to_string(), float(stream, 0.1, 10.0));
            params.insert("loss".to_string(), Text("squared_hinge".to_string()));
            params.insert(
                "class_weight_balanced".to_string(),
                Flag(weights.fairness >= 40),
            );
        }
        ModelFamily::NeuralNetwork => {
            params.insert("hidden_layers".to_string(), int(stream, 2, 5));
            params.insert("hidden_width".to_string(), int(stream, 32, 256));
            params.insert("dropout".to_string(), float(stream, 0.1, 0.5));
            // Learning rates need more precision than the 3-decimal default.
            let lr = (stream.next_in(0.0001, 0.01) * 1e5).round() / 1e5;
            params.insert("learning_rate".to_string(), Float(lr));
        }
    }
    params
}

// =============================================================================
// Metric synthesis
// =============================================================================

/// Per-family additive bonuses on (accuracy, fairness, robustness) plus an
/// intrinsic interpretability base.
fn family_profile(family: ModelFamily) -> (f64, f64, f64, f64) {
    match family {
        ModelFamily::LogisticRegression => (0.00, 0.05, 0.01, 0.92),
        ModelFamily::DecisionTree => (-0.01, 0.03, -0.02, 0.88),
        ModelFamily::RandomForest => (0.03, 0.00, 0.04, 0.62),
        ModelFamily::GradientBoosting => (0.04, -0.01, 0.02, 0.55),
        ModelFamily::LinearSvm => (0.01, 0.02, 0.02, 0.70),
        ModelFamily::NeuralNetwork => (0.05, -0.03, 0.00, 0.35),
    }
}

fn synthesize_metrics(
    family: ModelFamily,
    weights: &ObjectiveWeights,
    stream: &mut SeededStream,
) -> ModelMetrics {
    let (acc_bonus, fair_bonus, robust_bonus, interp_base) = family_profile(family);
    let base = |weight: u32| 0.70 + 0.25 * f64::from(weight) / 100.0;
    let mut noisy = |value: f64, floor: f64| {
        (value + (stream.next() - 0.5) * 0.04).clamp(floor, 0.99)
    };

    ModelMetrics {
        accuracy: noisy(base(weights.accuracy) + acc_bonus, 0.55),
        fairness_score: noisy(base(weights.fairness) + fair_bonus, 0.55),
        robustness_score: noisy(base(weights.robustness) + robust_bonus, 0.55),
        interpretability_score: noisy(interp_base, 0.20),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights(a: u32, f: u32, r: u32) -> ObjectiveWeights {
        ObjectiveWeights::new(a, f, r).unwrap()
    }

    #[test]
    fn same_seed_is_identical() {
        let w = weights(30, 50, 20);
        let a = select_model_configuration(&w, DomainHint::Credit, "seed-a").unwrap();
        let b = select_model_configuration(&w, DomainHint::Credit, "seed-a").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fairness_dominant_regulated_domain_is_interpretable() {
        let w = weights(25, 55, 20);
        for domain in [
            DomainHint::Credit,
            DomainHint::Healthcare,
            DomainHint::Hiring,
            DomainHint::CriminalJustice,
        ] {
            let config = select_model_configuration(&w, domain, "x").unwrap();
            assert!(
                matches!(
                    config.model_family,
                    ModelFamily::LogisticRegression | ModelFamily::DecisionTree
                ),
                "{domain:?} picked {:?}",
                config.model_family
            );
        }
    }

    #[test]
    fn accuracy_dominant_weights_pick_ensembles() {
        let w = weights(60, 25, 15);
        let config = select_model_configuration(&w, DomainHint::Credit, "x").unwrap();
        assert!(matches!(
            config.model_family,
            ModelFamily::GradientBoosting | ModelFamily::RandomForest
        ));
    }

    #[test]
    fn metrics_lean_with_the_weights() {
        let fairness_heavy = weights(10, 80, 10);
        let config =
            select_model_configuration(&fairness_heavy, DomainHint::General, "lean").unwrap();
        assert!(config.metrics.fairness_score > config.metrics.robustness_score);
        for m in [
            config.metrics.accuracy,
            config.metrics.fairness_score,
            config.metrics.robustness_score,
            config.metrics.interpretability_score,
        ] {
            assert!((0.20..=0.99).contains(&m));
        }
    }

    #[test]
    fn composite_excludes_interpretability() {
        let w = weights(40, 40, 20);
        let config = select_model_configuration(&w, DomainHint::General, "comp").unwrap();
        let expected = (40.0 * config.metrics.accuracy
            + 40.0 * config.metrics.fairness_score
            + 20.0 * config.metrics.robustness_score)
            / 100.0;
        assert!((config.composite_score - expected).abs() < 1e-12);
    }

    #[test]
    fn invalid_weights_are_rejected() {
        let bad = ObjectiveWeights {
            accuracy: 10,
            fairness: 10,
            robustness: 10,
        };
        assert!(select_model_configuration(&bad, DomainHint::General, "x").is_err());
    }

    #[test]
    fn domain_hint_parses_from_kebab_and_snake_case() {
        assert_eq!(
            "criminal-justice".parse::<DomainHint>().unwrap(),
            DomainHint::CriminalJustice
        );
        assert_eq!("General".parse::<DomainHint>().unwrap(), DomainHint::General);
        assert!("mystery".parse::<DomainHint>().is_err());
    }
}
