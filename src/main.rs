use odesim::{ScenarioConfig, ScenarioKind, Scenario, ScenarioRun, RunCheck};
use odesim::{run_2d, run_3d};
use odesim::{bench_tolerances, bench_rk4};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Integrate and replay the pendulum and two-body scenarios")]
struct Args {
    /// Built-in scenario to run
    #[arg(value_enum, default_value = "pendulum")]
    scenario: ScenarioKind,

    /// YAML scenario file; bare names are looked up in scenarios/
    #[arg(short, long)]
    file: Option<String>,

    /// Integrate and log a summary without opening a window
    #[arg(long)]
    headless: bool,

    /// Run the solver benchmarks instead of a scenario
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let mut config_path = PathBuf::from(file_name);
    if !config_path.exists() {
        config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name);
    }

    let file = File::open(&config_path)
        .with_context(|| format!("failed to open scenario file {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg = ScenarioConfig::from_yaml_reader(reader)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;

    Ok(scenario_cfg)
}

fn log_summary(run: &ScenarioRun) {
    let summary = run.summary();
    info!("{} samples up to t = {:e}", summary.samples, summary.t_end);
    match summary.check {
        RunCheck::EnergyDrift(drift) => info!("largest relative energy drift: {drift:e}"),
        RunCheck::Separation { min, max } => info!("separation range: [{min:e}, {max:e}] m"),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.bench {
        bench_tolerances();
        bench_rk4();
        return Ok(());
    }

    let scenario_cfg = match &args.file {
        Some(name) => load_scenario_from_yaml(name)?,
        None => ScenarioConfig::builtin(args.scenario),
    };
    if args.file.is_some() && scenario_cfg.kind() != args.scenario {
        info!("scenario file selects {:?}", scenario_cfg.kind());
    }

    let scenario = Scenario::from_config(&scenario_cfg).context("invalid scenario")?;
    let run = match scenario.run() {
        Ok(run) => run,
        Err(e) => {
            match e.time() {
                Some(t) => warn!("integration stopped at t = {t:e}: {e}"),
                None => warn!("integration failed: {e}"),
            }
            return Err(e).context("integration failed");
        }
    };
    log_summary(&run);

    if args.headless {
        return Ok(());
    }

    match run {
        ScenarioRun::Pendulum { frames, .. } => run_3d(Box::new(frames), "3D Simple Pendulum"),
        ScenarioRun::Binary { frames, .. } => run_2d(Box::new(frames), "Binary Gravity"),
        ScenarioRun::Binary1pn { frames, .. } => run_3d(Box::new(frames), "Binary Gravity (1PN)"),
    }

    Ok(())
}
