use mfsim::{Scenario, ScenarioConfig, StepResponse};
use mfsim::{bench_steps, bench_energy_curve};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Constrained 2-DOF manifold dynamics")]
struct Args {
    /// Scenario file: a path, or a name under `scenarios/`
    #[arg(short, default_value = "double_pendulum.yaml")]
    file_name: String,

    /// Run batches on a dedicated worker thread
    #[arg(long)]
    worker: bool,

    /// Print the last batch response as JSON
    #[arg(long)]
    json: bool,

    /// Run the timing benchmarks instead of a scenario
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let direct = PathBuf::from(file_name);
    let config_path = if direct.exists() {
        direct
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
    };
    let file = File::open(&config_path)
        .with_context(|| format!("opening scenario {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg: ScenarioConfig = serde_yaml::from_reader(reader)
        .with_context(|| format!("parsing scenario {}", config_path.display()))?;

    Ok(scenario_cfg)
}

fn log_batch(response: &StepResponse) {
    if let Some(sample) = response.last_sample() {
        info!(
            step = sample.step_index,
            energy = sample.energy,
            log10_error = sample.log10_error(),
            "energy"
        );
    }
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    if args.bench {
        bench_steps();
        bench_energy_curve();
        return Ok(());
    }

    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    let mut scenario = Scenario::build_scenario(scenario_cfg);

    let last = if args.worker {
        scenario.run_on_worker(log_batch)
    } else {
        scenario.run(log_batch)
    };

    let sim = &scenario.simulation;
    info!(
        steps = sim.steps_taken(),
        t = sim.state().t,
        q = ?[sim.state().q.x, sim.state().q.y],
        v = ?[sim.state().v.x, sim.state().v.y],
        "done"
    );

    if args.json {
        if let Some(response) = last {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
