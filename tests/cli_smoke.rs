use std::process::Command;

use fairshare_engine::{ModelConfiguration, MonteCarloResult, ObjectiveWeights};
use tempfile::tempdir;

fn write_json(dir: &std::path::Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn simulate_subcommand_writes_a_parseable_result() {
    let dir = tempdir().unwrap();
    let weights = write_json(
        dir.path(),
        "weights.json",
        r#"{"accuracy":25,"fairness":55,"robustness":20}"#,
    );
    let out = dir.path().join("result.json");

    let status = Command::new(env!("CARGO_BIN_EXE_fairshare"))
        .args(["simulate", "--runs", "100", "--seed", "smoke"])
        .arg("--weights")
        .arg(&weights)
        .arg("--out")
        .arg(&out)
        .status()
        .unwrap();
    assert!(status.success());

    let raw = std::fs::read_to_string(&out).unwrap();
    let result: MonteCarloResult = serde_json::from_str(&raw).unwrap();
    assert_eq!(result.total_runs, 100);
    assert_eq!(result.optimal_allocation.len(), 2);
    assert!(!result.pareto_frontier.is_empty());
}

#[test]
fn simulate_rejects_invalid_weights() {
    let dir = tempdir().unwrap();
    let weights = write_json(
        dir.path(),
        "weights.json",
        r#"{"accuracy":50,"fairness":50,"robustness":50}"#,
    );

    let status = Command::new(env!("CARGO_BIN_EXE_fairshare"))
        .args(["simulate"])
        .arg("--weights")
        .arg(&weights)
        .status()
        .unwrap();
    assert!(!status.success());
}

#[test]
fn infer_subcommand_uses_the_builtin_battery() {
    let dir = tempdir().unwrap();
    let input = write_json(
        dir.path(),
        "responses.json",
        r#"{"responses":[
            {"question_id":"q_accept_tradeoff","answer":5},
            {"question_id":"q_group_parity","answer":5},
            {"question_id":"q_overall_accuracy","answer":2}
        ]}"#,
    );
    let out = dir.path().join("weights.json");

    let status = Command::new(env!("CARGO_BIN_EXE_fairshare"))
        .args(["infer"])
        .arg("--input")
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .status()
        .unwrap();
    assert!(status.success());

    let weights: ObjectiveWeights =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(weights.accuracy + weights.fairness + weights.robustness, 100);
    assert!(weights.fairness > weights.accuracy);
}

#[test]
fn select_model_subcommand_honors_the_domain_hint() {
    let dir = tempdir().unwrap();
    let weights = write_json(
        dir.path(),
        "weights.json",
        r#"{"accuracy":25,"fairness":55,"robustness":20}"#,
    );
    let out = dir.path().join("model.json");

    let status = Command::new(env!("CARGO_BIN_EXE_fairshare"))
        .args(["select-model", "--domain", "credit", "--seed", "smoke"])
        .arg("--weights")
        .arg(&weights)
        .arg("--out")
        .arg(&out)
        .status()
        .unwrap();
    assert!(status.success());

    let config: ModelConfiguration =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert!(!config.hyperparameters.is_empty());
    assert!(config.composite_score > 0.0);
}

#[test]
fn eval_subcommand_writes_jsonl() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("eval.jsonl");

    let status = Command::new(env!("CARGO_BIN_EXE_fairshare"))
        .args(["eval", "--case", "fairness_leaning_24"])
        .arg("--out")
        .arg(&out)
        .status()
        .unwrap();
    assert!(status.success());

    let raw = std::fs::read_to_string(&out).unwrap();
    let first: serde_json::Value = serde_json::from_str(raw.lines().next().unwrap()).unwrap();
    assert_eq!(first["case_name"], "fairness_leaning_24");
    assert_eq!(first["metrics"]["deterministic"], true);
}
