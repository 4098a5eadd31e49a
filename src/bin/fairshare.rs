#![forbid(unsafe_code)]

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use fairshare_engine::{
    aggregate_community, default_questions, infer_weights, recommend, run_allocation_simulation,
    select_model_configuration, CommunityInsights, DomainHint, GroupProfile, ObjectiveWeights,
    SurveyResponse, ValueQuestion, ValueResponse,
};

#[derive(Parser)]
#[command(name = "fairshare", version, about = "Preference-to-allocation decision engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Infer objective weights from survey answers
    Infer {
        /// JSON input: {"questions": [...], "responses": [...]}.
        /// Questions may be omitted to use the built-in battery.
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run the Monte Carlo allocation simulation
    Simulate {
        /// JSON file with objective weights: {"accuracy":40,"fairness":40,"robustness":20}
        #[arg(long)]
        weights: PathBuf,
        /// JSON array of group profiles; the fallback pair when omitted
        #[arg(long)]
        profiles: Option<PathBuf>,
        #[arg(long, default_value_t = 200)]
        runs: usize,
        #[arg(long, default_value = "fairshare")]
        seed: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Select a model configuration for a weight set
    SelectModel {
        #[arg(long)]
        weights: PathBuf,
        /// Domain hint: credit, healthcare, hiring, criminal-justice, education, general
        #[arg(long, default_value = "general")]
        domain: String,
        #[arg(long, default_value = "fairshare")]
        seed: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Aggregate community survey responses and run the full pipeline on the result
    Aggregate {
        /// JSON array of survey responses
        #[arg(long)]
        responses: PathBuf,
        /// Domain hint for the model-selection leg
        #[arg(long, default_value = "general")]
        domain: String,
        #[arg(long, default_value_t = 200)]
        runs: usize,
        #[arg(long, default_value = "community")]
        seed: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run the synthetic evaluation suite
    Eval {
        #[arg(long)]
        case: Option<String>,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Deserialize)]
struct InferInput {
    #[serde(default)]
    questions: Option<Vec<ValueQuestion>>,
    responses: Vec<ValueResponse>,
}

#[derive(Serialize)]
struct AggregateOutput {
    weights: ObjectiveWeights,
    insights: CommunityInsights,
    recommendation: fairshare_engine::Recommendation,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Infer { input, out } => {
            let input: InferInput = read_json(&input)?;
            let questions = input.questions.unwrap_or_else(default_questions);
            let weights = infer_weights(&questions, &input.responses);
            emit(&weights, out.as_deref())?;
        }
        Commands::Simulate {
            weights,
            profiles,
            runs,
            seed,
            out,
        } => {
            let weights: ObjectiveWeights = read_json(&weights)?;
            let profiles: Option<Vec<GroupProfile>> =
                profiles.as_deref().map(read_json).transpose()?;
            let result = run_allocation_simulation(&weights, profiles.as_deref(), runs, &seed)?;
            emit(&result, out.as_deref())?;
        }
        Commands::SelectModel {
            weights,
            domain,
            seed,
            out,
        } => {
            let weights: ObjectiveWeights = read_json(&weights)?;
            let domain: DomainHint = domain.parse()?;
            let config = select_model_configuration(&weights, domain, &seed)?;
            emit(&config, out.as_deref())?;
        }
        Commands::Aggregate {
            responses,
            domain,
            runs,
            seed,
            out,
        } => {
            let responses: Vec<SurveyResponse> = read_json(&responses)?;
            let domain: DomainHint = domain.parse()?;
            let (weights, insights) = aggregate_community(&responses);
            let recommendation = recommend(&weights, None, runs, domain, &seed)?;
            emit(
                &AggregateOutput {
                    weights,
                    insights,
                    recommendation,
                },
                out.as_deref(),
            )?;
        }
        Commands::Eval { case, out } => {
            let results = fairshare_engine::evaluation::run_synthetic_suite(case.as_deref());
            let mut file = File::create(&out)?;
            for result in &results {
                writeln!(file, "{}", serde_json::to_string(result)?)?;
            }
            eprintln!("[eval] {} case(s) written to {}", results.len(), out.display());
        }
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(
    path: &std::path::Path,
) -> Result<T, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("reading {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&raw).map_err(|e| format!("parsing {}: {e}", path.display()))?)
}

fn emit<T: Serialize>(
    value: &T,
    out: Option<&std::path::Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rendered = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            std::fs::write(path, rendered + "\n")?;
            eprintln!("[fairshare] written to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
