//! ReBAC Privacy Simulator
//!
//! Runs a configured experiment over a JSON dataset and prints the result
//! tables.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rebac_sim::{Dataset, ExperimentConfig, ExperimentRunner};

/// Command line arguments for the simulator
#[derive(Parser, Debug)]
#[command(name = "rebac_sim")]
#[command(about = "Relation-based privacy estimation simulator")]
struct Args {
    /// TOML experiment configuration (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON dataset with agents, relations and contents
    #[arg(long, required_unless_present = "print_default_config")]
    dataset: Option<PathBuf>,

    /// Random seed, overriding the configuration
    #[arg(long)]
    seed: Option<u64>,

    /// Write the report as JSON to this path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, short)]
    verbose: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    if args.print_default_config {
        println!("{}", ExperimentConfig::default().to_toml()?);
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => ExperimentConfig::from_file(path)?,
        None => ExperimentConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.experiment.seed = seed;
    }

    let dataset_path = args.dataset.ok_or("a --dataset file is required")?;
    let dataset = Dataset::from_json(&fs::read_to_string(&dataset_path)?)?;
    info!(
        "Loaded dataset {}: {} agents, {} relations, {} contents",
        dataset_path.display(),
        dataset.agents.len(),
        dataset.relations.len(),
        dataset.contents.len()
    );

    println!("ReBAC Privacy Simulator");
    println!("=======================");
    println!("Kind: {}", config.experiment.kind);
    println!("Seed: {}", config.experiment.seed);
    println!("Trials: {}", config.experiment.trials);
    println!();

    let runner = ExperimentRunner::new(&config, &dataset)?;
    let report = runner.run()?;
    println!("{}", report.render());

    if args.verbose {
        if let Some(env) = runner.replay_last_trial()? {
            println!("Last Trial: {}", env);
            println!();
            println!("Tag Models");
            println!("{}", env.render_tag_models());
            println!("Trust");
            println!("{}", env.render_trusts());
            println!("{}", env.render_confusion());
        }
    }

    if let Some(path) = &args.output {
        fs::write(path, report.to_json()?)?;
        info!("Report written to {}", path.display());
    }
    Ok(())
}
