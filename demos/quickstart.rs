//! Minimal end-to-end example for `fairshare-engine`.
//!
//! This infers objective weights from a few survey answers, simulates how a
//! resource should be split across the fallback population groups, and picks
//! a matching model configuration.
//!
//! To run: `cargo run --example quickstart`

use fairshare_engine::{default_questions, infer_weights, recommend, DomainHint, ValueResponse};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // -- Survey answers ------------------------------------------------------

    // One respondent's answers to the built-in question battery. Likert
    // answers run 1-5 (3 is neutral), binary answers are 0/1.
    let questions = default_questions();
    let responses = vec![
        ValueResponse {
            question_id: "q_accept_tradeoff".into(),
            answer: 5,
        },
        ValueResponse {
            question_id: "q_group_parity".into(),
            answer: 4,
        },
        ValueResponse {
            question_id: "q_overall_accuracy".into(),
            answer: 2,
        },
        ValueResponse {
            question_id: "q_strict_audit".into(),
            answer: 1,
        },
    ];

    let weights = infer_weights(&questions, &responses);
    println!(
        "inferred weights: accuracy={} fairness={} robustness={}",
        weights.accuracy, weights.fairness, weights.robustness
    );

    // -- Simulation + model selection ----------------------------------------

    // `None` profiles means the built-in advantaged/disadvantaged pair. The
    // seed makes the whole run reproducible; change it to resample.
    let rec = recommend(&weights, None, 200, DomainHint::Credit, "quickstart")?;

    for arm in &rec.monte_carlo.optimal_allocation {
        println!("allocate {:>5.1}% to {}", arm.fraction * 100.0, arm.group);
    }
    println!(
        "expected outcome {:.1}, fairness improvement {:.1}%, sacrifice {:.1}% ({:?} confidence)",
        rec.monte_carlo.expected_outcome,
        rec.monte_carlo.fairness_improvement_pct,
        rec.monte_carlo.efficiency_sacrifice_pct,
        rec.monte_carlo.confidence,
    );
    println!(
        "model: {} (composite score {:.3})",
        rec.model.model_family.label(),
        rec.model.composite_score
    );

    Ok(())
}
