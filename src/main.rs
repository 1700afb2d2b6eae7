//! GridSwarm - Fault-Tolerant Cooperative Robot Swarm Simulation
//!
//! Main entry point for the gridswarm CLI. The driver owns the tick rate
//! and the exit conditions; the simulation core never blocks it.

use anyhow::Context;
use clap::{Parser, Subcommand};
use gridswarm::config::SimConfig;
use gridswarm::sim::{SimEvent, Simulation};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

/// GridSwarm - cooperative robot swarm simulator
#[derive(Parser, Debug)]
#[command(name = "gridswarm")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/gridswarm/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Run the simulation until all robots fail, the tick budget runs out,
    /// or Ctrl-C
    Run {
        /// Number of robots (overrides config)
        #[arg(short, long)]
        robots: Option<u32>,

        /// RNG seed for a reproducible run (overrides config)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Maximum ticks to run (0 = unlimited)
        #[arg(short, long, default_value_t = 0)]
        ticks: u64,

        /// Milliseconds between ticks (overrides config)
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Print the final snapshot as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    gridswarm::logging::init()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => init_config(cli.config, force),
        Commands::Run {
            robots,
            seed,
            ticks,
            tick_ms,
            json,
        } => {
            let mut config = load_config(cli.config)?;
            if let Some(robots) = robots {
                config.robots = robots;
            }
            if let Some(seed) = seed {
                config.seed = Some(seed);
            }
            if let Some(tick_ms) = tick_ms {
                config.tick_interval_ms = tick_ms;
            }
            run_simulation(config, ticks, json).await
        }
    }
}

/// Load the config from an explicit path, the default path, or defaults
fn load_config(path: Option<PathBuf>) -> anyhow::Result<SimConfig> {
    match path {
        Some(path) => SimConfig::load(&path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => {
            let default_path = SimConfig::default_path();
            if default_path.exists() {
                SimConfig::load(&default_path).with_context(|| {
                    format!("failed to load config from {}", default_path.display())
                })
            } else {
                Ok(SimConfig::default())
            }
        }
    }
}

fn init_config(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(SimConfig::default_path);

    if path.exists() && !force {
        anyhow::bail!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    SimConfig::default()
        .save(&path)
        .with_context(|| format!("failed to write config to {}", path.display()))?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

async fn run_simulation(config: SimConfig, max_ticks: u64, json: bool) -> anyhow::Result<()> {
    let tick_interval = Duration::from_millis(config.tick_interval_ms);
    let mut sim = Simulation::new(config).context("failed to build simulation")?;

    sim.add_listener(narrate);

    let mut interval = tokio::time::interval(tick_interval);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let report = sim.tick();
                if report.halted {
                    println!("All robots failed after {} ticks.", report.tick);
                    break;
                }
                if max_ticks > 0 && report.tick >= max_ticks {
                    println!("Tick budget of {} reached.", max_ticks);
                    break;
                }
            }
            _ = &mut ctrl_c => {
                println!("Interrupted.");
                break;
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&sim.snapshot())?);
    } else {
        print_summary(&sim);
    }

    Ok(())
}

/// Narrate observable events to stdout, one line each
fn narrate(event: &SimEvent) {
    match event {
        SimEvent::RobotFailed { robot } => println!("[fail] {} crashed", robot),
        SimEvent::LockRecovered { previous_owner } => {
            println!("[lock] force-released from crashed {}", previous_owner)
        }
        SimEvent::WaiterPurged { robot } => {
            println!("[lock] {} purged from wait queue", robot)
        }
        SimEvent::SectionEntered { robot } => println!("[cs] {} entered", robot),
        SimEvent::SectionCompleted { robot, counter } => {
            println!("[cs] {} exited (counter {})", robot, counter)
        }
        SimEvent::SectionAborted { robot } => {
            println!("[cs] {} crashed mid-hold, no credit", robot)
        }
        SimEvent::MessageDelivered { from, to, depth } => {
            println!("[msg] {} -> {} (buffer {})", from, to, depth)
        }
        SimEvent::MessageRejected { from, to } => {
            println!("[msg] {} -> {} rejected: buffer full", from, to)
        }
        SimEvent::Migration(m) => println!(
            "[migration] {} died, {} work units moved to {}",
            m.from, m.transferred, m.to
        ),
        SimEvent::AllFailed => println!("[halt] all robots have failed"),
    }
}

fn print_summary(sim: &Simulation) {
    let snapshot = sim.snapshot();

    println!();
    println!("Run summary after {} ticks:", snapshot.tick);
    for robot in &snapshot.robots {
        let state = if robot.failed { "failed" } else { "alive" };
        println!(
            "  {} at {} | counter {} | {}",
            robot.id, robot.position, robot.shared_counter, state
        );
    }

    let total: u64 = snapshot.robots.iter().map(|r| r.shared_counter).sum();
    let alive = snapshot.robots.iter().filter(|r| !r.failed).count();
    println!(
        "  {} of {} robots alive, {} total work units",
        alive,
        snapshot.robots.len(),
        total
    );
}
