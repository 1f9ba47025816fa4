//! Lunar Station Simulation
//!
//! Runs the autonomous crew of a lunar base: eight agents with memory
//! streams, relationships, and daily plans, driven by a reasoning
//! adapter and a tick-based engine.

use clap::Parser;
use std::sync::Arc;

use station_core::engine::SimulationEngine;
use station_core::reasoning::{ReasoningAdapter, ScriptedAdapter, TalkativeAdapter};
use station_core::{SimConfig, SimError};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "station_sim")]
#[command(about = "Lunar base crew simulation")]
struct Args {
    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 48)]
    ticks: u64,

    /// Path to the tuning config
    #[arg(long, default_value = "station.toml")]
    config: String,

    /// Wall-clock pacing between ticks, overrides the config
    #[arg(long)]
    tick_interval_ms: Option<u64>,

    /// Trigger a catalog event before the run (e.g. crew_meeting)
    #[arg(long)]
    trigger_event: Option<String>,

    /// Use the plan-following adapter instead of the talkative one
    #[arg(long)]
    scripted: bool,
}

#[tokio::main]
async fn main() -> Result<(), SimError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "station_core=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = SimConfig::load(&args.config).unwrap_or_else(|e| {
        tracing::warn!("could not load {}: {}. using defaults", args.config, e);
        SimConfig::default()
    });
    if let Some(interval) = args.tick_interval_ms {
        config.simulation.tick_interval_ms = interval;
    }

    let adapter: Arc<dyn ReasoningAdapter> = if args.scripted {
        Arc::new(ScriptedAdapter)
    } else {
        Arc::new(TalkativeAdapter)
    };

    println!("Lunar Station Simulation");
    println!("========================");
    println!("Seed: {}", args.seed);
    println!("Ticks: {}", args.ticks);
    println!("Adapter: {}", adapter.name());
    println!();

    let mut engine = SimulationEngine::new(config, args.seed, adapter)?;

    let snapshot = engine.world_snapshot();
    println!("Crew of {}:", snapshot.agents.len());
    for agent in &snapshot.agents {
        println!("  {} ({}) in {}", agent.name, agent.role, agent.location);
    }
    println!();

    if let Some(event_id) = &args.trigger_event {
        let target = engine.trigger_event(event_id)?;
        println!("Triggered event '{}' on {}", event_id, target);
        println!();
    }

    engine.run(args.ticks).await?;

    let snapshot = engine.world_snapshot();
    println!();
    println!("Final state at {}:", snapshot.time.clock.label());
    for agent in &snapshot.agents {
        println!(
            "  {} in {} ({}, energy {})",
            agent.name, agent.location, agent.mood, agent.energy
        );
    }

    if let Some(event_id) = &args.trigger_event {
        let report = engine.trace_propagation(event_id);
        println!();
        println!(
            "Propagation of '{}': {} crew informed",
            event_id,
            report.informed_count()
        );
        for acq in &report.acquisitions {
            match &acq.from {
                Some(from) => println!("  tick {:>3}: {} (heard from {})", acq.tick, acq.agent_name, from),
                None => println!("  tick {:>3}: {} (seed)", acq.tick, acq.agent_name),
            }
        }
    }

    Ok(())
}
