//! Objective weights: the three-way accuracy/fairness/robustness tradeoff.
//!
//! Weights are integer percentage points that always sum to exactly 100.
//! The engine treats them as immutable once built; every downstream decision
//! (allocation scoring, model-family selection, synthetic metrics) is
//! parameterized by one `ObjectiveWeights` value.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Floor applied to each objective during normalization: no objective may be
/// driven to zero by survey signals.
pub const MIN_WEIGHT: u32 = 5;

/// One of the three competing objectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Accuracy,
    Fairness,
    Robustness,
}

/// Non-negative integer weights summing to exactly 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveWeights {
    pub accuracy: u32,
    pub fairness: u32,
    pub robustness: u32,
}

impl ObjectiveWeights {
    /// Builds validated weights; rejects anything not summing to 100.
    pub fn new(accuracy: u32, fairness: u32, robustness: u32) -> Result<Self, EngineError> {
        let w = Self {
            accuracy,
            fairness,
            robustness,
        };
        w.validate()?;
        Ok(w)
    }

    /// The inference starting point before any survey signal is applied.
    pub fn baseline() -> Self {
        Self {
            accuracy: 40,
            fairness: 40,
            robustness: 20,
        }
    }

    /// Checks the sum-to-100 invariant.
    pub fn validate(&self) -> Result<(), EngineError> {
        let sum = self.accuracy + self.fairness + self.robustness;
        if sum != 100 {
            return Err(EngineError::InvalidWeights {
                accuracy: self.accuracy,
                fairness: self.fairness,
                robustness: self.robustness,
                sum,
            });
        }
        Ok(())
    }

    /// Normalizes raw (possibly negative, possibly unbounded) objective
    /// scores into exact integer weights.
    ///
    /// Each score is floored at [`MIN_WEIGHT`], the three are scaled
    /// proportionally to 100, and the rounding remainder lands on the
    /// robustness term only; rounding never touches more than one term, so
    /// the sum cannot drift off 100. If the remainder assignment pushes a
    /// term under the floor, the deficit is taken from the largest term.
    pub fn from_unnormalized(accuracy: f64, fairness: f64, robustness: f64) -> Self {
        let floor = f64::from(MIN_WEIGHT);
        let a = if accuracy.is_finite() { accuracy } else { 0.0 }.max(floor);
        let f = if fairness.is_finite() { fairness } else { 0.0 }.max(floor);
        let r = if robustness.is_finite() { robustness } else { 0.0 }.max(floor);
        let total = a + f + r;

        let acc = (a / total * 100.0).round() as i64;
        let fair = (f / total * 100.0).round() as i64;
        let rob = 100 - acc - fair;

        // Repair pass: proportional scaling plus the remainder assignment can
        // leave a term under the floor; pull the deficit from the largest
        // term. The sum stays pinned at 100 throughout.
        let floor_i = i64::from(MIN_WEIGHT);
        let mut terms = [acc, fair, rob];
        while let Some(low) = (0..terms.len()).find(|&i| terms[i] < floor_i) {
            let mut high = 0;
            for i in 1..terms.len() {
                if terms[i] > terms[high] {
                    high = i;
                }
            }
            let deficit = floor_i - terms[low];
            terms[low] += deficit;
            terms[high] -= deficit;
        }

        Self {
            accuracy: terms[0] as u32,
            fairness: terms[1] as u32,
            robustness: terms[2] as u32,
        }
    }

    /// The weight attached to one objective.
    pub fn get(&self, objective: Objective) -> u32 {
        match objective {
            Objective::Accuracy => self.accuracy,
            Objective::Fairness => self.fairness,
            Objective::Robustness => self.robustness,
        }
    }

    /// The objective with the highest weight. Ties resolve in
    /// accuracy > fairness > robustness order.
    pub fn dominant(&self) -> Objective {
        if self.accuracy >= self.fairness && self.accuracy >= self.robustness {
            Objective::Accuracy
        } else if self.fairness >= self.robustness {
            Objective::Fairness
        } else {
            Objective::Robustness
        }
    }
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self::baseline()
    }
}
