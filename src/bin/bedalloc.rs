// Bed allocation CLI
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::{self, File};
use std::path::PathBuf;

use u_bedalloc::config::AllocationConfig;
use u_bedalloc::formulation::FormulationVariant;
use u_bedalloc::loader::load_path;
use u_bedalloc::pipeline::AllocationPipeline;
use u_bedalloc::validation::LogSink;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Variant {
    /// Service and treatment aware, minimizes weighted moves
    Disruption,
    /// Capacity only, maximizes babies kept in place
    Retention,
}

impl From<Variant> for FormulationVariant {
    fn from(v: Variant) -> Self {
        match v {
            Variant::Disruption => FormulationVariant::Disruption,
            Variant::Retention => FormulationVariant::Retention,
        }
    }
}

#[derive(Parser)]
#[command(name = "bedalloc")]
#[command(version = "0.1.0")]
#[command(about = "Reallocates babies to beds after a unit reconfiguration", long_about = None)]
struct Cli {
    /// Scenario name; selects <dir>/<scenario>/input_<scenario>.json
    #[arg(value_name = "SCENARIO")]
    scenario: String,

    /// Keep going on mapping and coherence issues (they are still logged)
    #[arg(short, long)]
    force: bool,

    /// Directory holding one sub-directory per scenario
    #[arg(long, value_name = "DIR", default_value = "scenarios")]
    scenarios_dir: PathBuf,

    /// Formulation to solve
    #[arg(long, value_enum, default_value = "disruption")]
    variant: Variant,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let dir = cli.scenarios_dir.join(&cli.scenario);
    let input = dir.join(format!("input_{}.json", cli.scenario));
    let output = dir.join(format!("output_{}.json", cli.scenario));
    let log_path = dir.join(format!("log_{}.log", cli.scenario));

    let log_file = File::create(&log_path)
        .with_context(|| format!("cannot create log file {}", log_path.display()))?;
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let config = AllocationConfig::new().with_force(cli.force);
    let dataset = load_path(&input, &config)
        .with_context(|| format!("cannot load scenario input {}", input.display()))?;

    let outcome = AllocationPipeline::default()
        .with_variant(cli.variant.into())
        .run(&dataset, &mut LogSink)
        .with_context(|| format!("allocation failed for scenario '{}'", cli.scenario))?;

    let json = serde_json::to_string_pretty(&outcome.report)?;
    fs::write(&output, json)
        .with_context(|| format!("cannot write {}", output.display()))?;

    println!("{}", outcome.report.summary_line());
    for row in &outcome.report.rows {
        println!(
            "{:<12} {:<12} {:<12} {}",
            row.patient,
            row.new_place,
            row.old_place.as_deref().unwrap_or("-"),
            row.moved
        );
    }
    println!("obj fun is equal to {}", outcome.report.objective);
    Ok(())
}
