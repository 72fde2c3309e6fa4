use std::fs::File;
use std::io::BufWriter;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use climsure::collector::{self, ModelRecord};
use climsure::config::{ModelConfig, RunConfig};
use climsure::error::{Result, SimError};
use climsure::simulation::Simulation;

struct Args {
    config_path: Option<String>,
    seed: Option<u64>,
    steps: Option<u64>,
    output_path: String,
    agents_path: Option<String>,
    shock: bool,
    runs: Option<u64>,
    quiet: bool,
}

/// Parse flags following the program name. Missing or malformed values are
/// configuration errors.
fn parse_args(argv: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut args = Args {
        config_path: None,
        seed: None,
        steps: None,
        output_path: "model_vars.csv".to_string(),
        agents_path: None,
        shock: false,
        runs: None,
        quiet: false,
    };

    let mut argv = argv.into_iter();
    while let Some(flag) = argv.next() {
        let mut value = || {
            argv.next()
                .ok_or_else(|| SimError::InvalidConfig(format!("{flag} requires a value")))
        };
        match flag.as_str() {
            "--config" => args.config_path = Some(value()?),
            "--seed" => args.seed = Some(parse_number(&flag, value()?)?),
            "--steps" => args.steps = Some(parse_number(&flag, value()?)?),
            "--output" => args.output_path = value()?,
            "--agents" => args.agents_path = Some(value()?),
            "--runs" => args.runs = Some(parse_number(&flag, value()?)?),
            "--shock" => args.shock = true,
            "--quiet" => args.quiet = true,
            other => eprintln!("ignoring unknown argument {other:?}"),
        }
    }
    Ok(args)
}

fn parse_number(flag: &str, raw: String) -> Result<u64> {
    raw.parse()
        .map_err(|e| SimError::InvalidConfig(format!("{flag} expects an unsigned integer, got {raw:?}: {e}")))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("climsure=info")))
        .with_writer(std::io::stderr)
        .init();

    match parse_args(std::env::args().skip(1)).and_then(run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config_path {
        Some(path) => ModelConfig::from_toml_path(path)?,
        None => ModelConfig::canonical(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let mut run_config = RunConfig::canonical();
    if let Some(steps) = args.steps {
        run_config.steps = steps;
    }
    if args.shock {
        run_config.shock = Some(RunConfig::canonical_shock());
    }

    match args.runs {
        Some(n) => run_many(&config, &run_config, n, args.quiet),
        None => run_one(config, &run_config, &args),
    }
}

fn simulate(config: ModelConfig, run_config: &RunConfig) -> Result<Simulation> {
    let mut sim = Simulation::from_config(config)?;
    sim.run_with(run_config);
    Ok(sim)
}

fn run_one(config: ModelConfig, run_config: &RunConfig, args: &Args) -> Result<()> {
    info!(steps = run_config.steps, shock = run_config.shock.is_some(), "running model");
    let sim = simulate(config, run_config)?;

    info!(path = %args.output_path, "writing model variables");
    let file = File::create(&args.output_path)?;
    collector::write_model_csv(&sim.collector.model, BufWriter::new(file))?;

    if let Some(path) = &args.agents_path {
        info!(%path, records = sim.collector.agents.len(), "writing agent variables");
        let file = File::create(path)?;
        collector::write_ndjson(&sim.collector.agents, BufWriter::new(file))?;
    }

    if !args.quiet {
        print_summary(&sim.collector.model);
    }
    Ok(())
}

/// Independent seeds `seed..seed + n` (wrapping), run in parallel; prints the final
/// model row for each.
fn run_many(config: &ModelConfig, run_config: &RunConfig, n: u64, quiet: bool) -> Result<()> {
    use rayon::prelude::*;

    let start_seed = config.seed;
    let finals: Vec<Option<ModelRecord>> = (0..n)
        .into_par_iter()
        .map(|i| -> Result<Option<ModelRecord>> {
            let mut config = config.clone();
            config.seed = start_seed.wrapping_add(i);
            let sim = simulate(config, run_config)?;
            Ok(sim.collector.last_model().cloned())
        })
        .collect::<Result<_>>()?;

    if quiet {
        return Ok(());
    }
    println!(
        "{:>6} | {:>12} | {:>16} | {:>12}",
        "Seed", "MeanPremium", "TotalCapital", "MeanRisk"
    );
    println!("{}", "-".repeat(6 + 3 + 12 + 3 + 16 + 3 + 12));
    for (i, last) in finals.iter().enumerate() {
        if let Some(r) = last {
            println!(
                "{:>6} | {:>12.6} | {:>16.2} | {:>12.6}",
                start_seed.wrapping_add(i as u64),
                r.mean_premium,
                r.total_insurer_capital,
                r.mean_climate_risk,
            );
        }
    }
    Ok(())
}

fn print_summary(records: &[ModelRecord]) {
    println!(
        "{:>5} | {:>12} | {:>16} | {:>12}",
        "Step", "MeanPremium", "TotalCapital", "MeanRisk"
    );
    println!("{}", "-".repeat(5 + 3 + 12 + 3 + 16 + 3 + 12));
    let stride = (records.len() / 10).max(1);
    for r in records.iter().step_by(stride) {
        println!(
            "{:>5} | {:>12.6} | {:>16.2} | {:>12.6}",
            r.step.0, r.mean_premium, r.total_insurer_capital, r.mean_climate_risk,
        );
    }
}
