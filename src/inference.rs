//! Preference inference: raw survey answers to normalized objective weights.
//!
//! Each answered question contributes a bounded, multiplier-scaled signal to
//! the objective it maps to, with a fixed cross-objective coupling so the
//! zero-sum tradeoff semantics hold: pushing one objective up pulls the other
//! two down. Unanswered questions contribute nothing here; defaulting to a
//! neutral answer is a display concern, not an inference concern.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::weights::{Objective, ObjectiveWeights};

/// Per-question influence cap in weight points, applied before the question's
/// own multiplier. A maximally opinionated answer to a multiplier-1.0
/// question moves its objective by at most 15 points.
pub const INFLUENCE_CAP: f64 = 15.0;

/// Answer scale of a survey question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// 1–5 agreement scale; 3 is neutral.
    Likert,
    /// 0/1 choice.
    Binary,
}

/// A value-elicitation question. Immutable once generated for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueQuestion {
    /// Stable identifier, referenced by responses.
    pub id: String,
    /// Text shown to the respondent.
    pub prompt: String,
    pub question_type: QuestionType,
    /// Objective this question's signal is applied to.
    pub maps_to: Objective,
    /// Per-question influence multiplier (> 0).
    pub weight_multiplier: f64,
    /// Population-group attribute this question probes, if any.
    #[serde(default)]
    pub related_group_attribute: Option<String>,
}

/// A respondent's answer to one question: 1–5 for likert, 0/1 for binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueResponse {
    pub question_id: String,
    pub answer: u8,
}

/// Infers normalized objective weights from answered questions.
///
/// Starts from the fixed `(40, 40, 20)` baseline, applies one signal per
/// answered question, floors each objective at 5 and renormalizes to an
/// exact sum of 100 (rounding remainder on the robustness term only).
pub fn infer_weights(questions: &[ValueQuestion], responses: &[ValueResponse]) -> ObjectiveWeights {
    let baseline = ObjectiveWeights::baseline();
    let mut accuracy = f64::from(baseline.accuracy);
    let mut fairness = f64::from(baseline.fairness);
    let mut robustness = f64::from(baseline.robustness);

    let mut answered = 0usize;
    for question in questions {
        let Some(response) = responses.iter().find(|r| r.question_id == question.id) else {
            continue;
        };
        answered += 1;

        let signal = match question.question_type {
            QuestionType::Likert => (f64::from(response.answer.clamp(1, 5)) - 3.0) / 2.0,
            QuestionType::Binary => {
                if response.answer >= 1 {
                    0.5
                } else {
                    -0.5
                }
            }
        };
        let delta = signal * question.weight_multiplier * INFLUENCE_CAP;

        // Fixed coupling: accuracy and fairness trade mostly against each
        // other (0.6/0.4), robustness trades evenly against both (0.5/0.5).
        match question.maps_to {
            Objective::Accuracy => {
                accuracy += delta;
                fairness -= 0.6 * delta;
                robustness -= 0.4 * delta;
            }
            Objective::Fairness => {
                fairness += delta;
                accuracy -= 0.6 * delta;
                robustness -= 0.4 * delta;
            }
            Objective::Robustness => {
                robustness += delta;
                accuracy -= 0.5 * delta;
                fairness -= 0.5 * delta;
            }
        }
    }

    let weights = ObjectiveWeights::from_unnormalized(accuracy, fairness, robustness);
    debug!(
        answered,
        total = questions.len(),
        accuracy = weights.accuracy,
        fairness = weights.fairness,
        robustness = weights.robustness,
        "inferred objective weights"
    );
    weights
}

/// The canned question battery used by the CLI and the evaluation harness
/// when no external question source is wired in.
pub fn default_questions() -> Vec<ValueQuestion> {
    DEFAULT_QUESTIONS.clone()
}

static DEFAULT_QUESTIONS: Lazy<Vec<ValueQuestion>> = Lazy::new(|| {
    fn q(
        id: &str,
        prompt: &str,
        question_type: QuestionType,
        maps_to: Objective,
        weight_multiplier: f64,
        related: Option<&str>,
    ) -> ValueQuestion {
        ValueQuestion {
            id: id.to_string(),
            prompt: prompt.to_string(),
            question_type,
            maps_to,
            weight_multiplier,
            related_group_attribute: related.map(str::to_string),
        }
    }

    vec![
        q(
            "q_overall_accuracy",
            "Getting the most predictions right overall matters more than anything else.",
            QuestionType::Likert,
            Objective::Accuracy,
            1.0,
            None,
        ),
        q(
            "q_accept_tradeoff",
            "I would accept a slightly less accurate system if it treated groups more evenly.",
            QuestionType::Likert,
            Objective::Fairness,
            1.0,
            None,
        ),
        q(
            "q_group_parity",
            "Error rates should be as equal as possible across population groups.",
            QuestionType::Likert,
            Objective::Fairness,
            0.8,
            Some("group"),
        ),
        q(
            "q_edge_cases",
            "The system should keep working sensibly on unusual or shifting inputs.",
            QuestionType::Likert,
            Objective::Robustness,
            0.8,
            None,
        ),
        q(
            "q_strict_audit",
            "Should this system be held to strict external audit even at some performance cost?",
            QuestionType::Binary,
            Objective::Robustness,
            0.6,
            None,
        ),
        q(
            "q_best_for_most",
            "Should the system favor the outcome that is best for the most people?",
            QuestionType::Binary,
            Objective::Accuracy,
            0.6,
            None,
        ),
    ]
});
