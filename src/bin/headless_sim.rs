//! Headless simulation runner
//!
//! Runs the engine without a renderer. With `--ticks` the simulation is
//! advanced synchronously as fast as possible; otherwise it runs on the
//! simulation thread for `--seconds` of wall-clock time while this thread
//! polls published snapshots like a renderer would.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;

use cellular_simulator::command::CommandRegistry;
use cellular_simulator::core::{Config, Result};
use cellular_simulator::simulation::{
    PopulationStats, SimulationHandle, SimulationState, Simulator,
};

#[derive(Parser, Debug)]
#[command(name = "headless_sim")]
#[command(about = "Run the cellular simulator without a window")]
struct Args {
    /// Grid width in tiles
    #[arg(long, default_value_t = 400)]
    width: i32,

    /// Grid height in tiles
    #[arg(long, default_value_t = 300)]
    height: i32,

    /// Probability of each tile starting occupied
    #[arg(long, default_value_t = 0.5)]
    density: f32,

    /// Run this many ticks synchronously and exit
    #[arg(long)]
    ticks: Option<u64>,

    /// Wall-clock run time on the simulation thread
    #[arg(long, default_value_t = 5)]
    seconds: u64,

    /// Override the configured tick rate
    #[arg(long)]
    ups: Option<u32>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// TOML config with [simulation] and [runner] tables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the final snapshot as JSON
    #[arg(long)]
    dump_snapshot: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_toml(path)?,
        None => Config::default(),
    };
    if args.seed.is_some() {
        config.simulation.seed = args.seed;
    }
    if let Some(ups) = args.ups {
        config.runner.updates_per_second = ups;
    }

    let registry = Arc::new(CommandRegistry::with_defaults());
    let mut sim = Simulator::new(args.width, args.height, registry, config.simulation.clone())?;
    sim.randomize(args.density);

    let final_state = match args.ticks {
        Some(ticks) => run_ticks(&mut sim, ticks),
        None => run_threaded(sim, &config, Duration::from_secs(args.seconds))?,
    };

    if let Some(path) = &args.dump_snapshot {
        let json = serde_json::to_string_pretty(&final_state)?;
        std::fs::write(path, json)?;
        tracing::info!("Wrote snapshot to {}", path.display());
    }

    Ok(())
}

fn run_ticks(sim: &mut Simulator, ticks: u64) -> SimulationState {
    let start = Instant::now();
    for _ in 0..ticks {
        let report = sim.update();
        if report.tick % 100 == 0 {
            print_stats(&sim.stats());
        }
        if report.population == 0 {
            tracing::info!("Population extinct at tick {}", report.tick);
            break;
        }
    }
    let elapsed = start.elapsed();

    println!(
        "{} ticks in {:?} ({:.1} ticks/sec)",
        sim.current_tick(),
        elapsed,
        sim.current_tick() as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );
    print_stats(&sim.stats());

    let mut state = SimulationState::default();
    state.capture(sim, None);
    state
}

fn run_threaded(sim: Simulator, config: &Config, duration: Duration) -> Result<SimulationState> {
    let inspect = (sim.width() / 2, sim.height() / 2);
    let handle = SimulationHandle::spawn(sim, config.runner.clone())?;
    handle.request_inspect(inspect.0, inspect.1);

    let start = Instant::now();
    let mut state = SimulationState::default();
    while start.elapsed() < duration {
        std::thread::sleep(Duration::from_millis(500));
        handle.read_state(&mut state);
        println!(
            "tick {:>7} | population {:>7} | inspected {:?}: {}",
            state.tick,
            state.population,
            inspect,
            if state.inspector.selected_has_agent {
                state.inspector.genome.join(" ")
            } else {
                "<empty>".to_string()
            }
        );
    }

    if let Some(sim) = handle.shutdown() {
        print_stats(&sim.stats());
    }
    Ok(state)
}

fn print_stats(stats: &PopulationStats) {
    println!(
        "tick {:>7} | population {:>7} | mean energy {:>6.2} | max age {:>5} | dominant gene {}",
        stats.tick,
        stats.population,
        stats.mean_energy,
        stats.max_age,
        stats.dominant_gene().unwrap_or("-")
    );
}
