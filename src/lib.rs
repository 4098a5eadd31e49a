#![forbid(unsafe_code)]

//! # fairshare-engine
//!
//! A preference-to-allocation decision engine. Given weighted objectives
//! (accuracy, fairness, robustness) elicited from stakeholder surveys, it
//! infers normalized objective weights, uses seeded Monte Carlo sampling to
//! simulate how a finite resource should be distributed across population
//! groups under those weights, and selects a representative model
//! configuration whose synthetic metrics reflect the same weights.
//!
//! Everything is a pure function over immutable inputs: no shared state, no
//! I/O, and all randomness flows through explicit seeded streams, so every
//! result is reproducible bit-for-bit from `(inputs, seed)`. Surrounding
//! concerns (file parsing, dataset heuristics, rendering, persistence) are
//! the caller's job; this crate only consumes validated records and emits
//! structured results.

pub mod community;
pub mod error;
pub mod evaluation;
pub mod groups;
pub mod inference;
pub mod model_select;
pub mod simulation;
pub mod stream;
pub mod weights;

pub use community::{aggregate_community, CommunityInsights, SurveyResponse, TrendDirection};
pub use error::EngineError;
pub use groups::{build_profiles, GroupAsymmetry, GroupProfile, GroupStat};
pub use inference::{default_questions, infer_weights, QuestionType, ValueQuestion, ValueResponse};
pub use model_select::{
    select_model_configuration, DomainHint, HyperparameterValue, ModelConfiguration, ModelFamily,
    ModelMetrics,
};
pub use simulation::{
    recommend, run_allocation_simulation, run_allocation_simulation_with, AllocationArm,
    Confidence, MonteCarloResult, ParetoPoint, Recommendation, SimulationOptions,
};
pub use stream::SeededStream;
pub use weights::{Objective, ObjectiveWeights};
