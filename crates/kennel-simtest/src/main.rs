//! Kennel Headless Simulation Harness
//!
//! Runs the engine in-process with scripted bots: no HTTP, no rendering.
//! Restores from the state file if one exists, autosaves while running and
//! saves again on exit.
//!
//! Usage:
//!   cargo run -p kennel-simtest -- --config-file data/config.json --ticks 600
//!   RUST_LOG=debug cargo run -p kennel-simtest -- --bots 8 --state-file /tmp/kennel.bin

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use kennel_core::app::JoinInfo;
use kennel_core::prelude::*;
use kennel_logic::movement::{Action, Direction};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "kennel-simtest", about = "Drive a Kennel world with scripted bots")]
struct Args {
    /// World configuration JSON
    #[arg(short = 'c', long, default_value = "data/config.json")]
    config_file: PathBuf,

    /// Simulated milliseconds per tick
    #[arg(short = 't', long, default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..))]
    tick_period: u64,

    /// Number of ticks to run
    #[arg(long, default_value_t = 1200)]
    ticks: u64,

    /// Bots to join, spread over the maps
    #[arg(long, default_value_t = 4)]
    bots: usize,

    /// Snapshot file to restore from and save to
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Autosave period in milliseconds; needs --state-file
    #[arg(long, requires = "state_file")]
    save_state_period: Option<u64>,

    /// Spawn dogs at random road points instead of the first road's start
    #[arg(long)]
    randomize_spawn_points: bool,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
}

// ── Bots ────────────────────────────────────────────────────────────────

struct Bot {
    name: String,
    joined: JoinInfo,
    /// Ticks until the next change of direction
    countdown: u64,
}

const DIRECTIONS: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

fn next_action(rng: &mut StdRng) -> Action {
    // now and then a bot stops to rest
    if rng.gen_bool(0.1) {
        Action::Stop
    } else {
        Action::Move(DIRECTIONS[rng.gen_range(0..DIRECTIONS.len())])
    }
}

fn drive_bots(world: &WorldHandle, bots: &mut Vec<Bot>, rng: &mut StdRng) {
    bots.retain_mut(|bot| {
        if bot.countdown > 0 {
            bot.countdown -= 1;
            return true;
        }
        bot.countdown = rng.gen_range(10..60);
        match world.apply_action(bot.joined.auth_token.as_str(), next_action(rng)) {
            Ok(()) => true,
            Err(GameError::UnknownToken) => {
                info!(bot = %bot.name, "bot was retired");
                false
            }
            Err(e) => {
                warn!(bot = %bot.name, error = %e, "bot action rejected");
                true
            }
        }
    });
}

// ── Main ────────────────────────────────────────────────────────────────

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let game = load_game(&args.config_file)
        .with_context(|| format!("loading {}", args.config_file.display()))?;
    let map_ids: Vec<String> = game.maps().iter().map(|m| m.id().to_string()).collect();
    if map_ids.is_empty() && args.bots > 0 {
        anyhow::bail!("{} defines no maps to put bots on", args.config_file.display());
    }
    let settings = AppSettings {
        randomize_spawn_points: args.randomize_spawn_points,
        state_file: args.state_file.clone(),
        save_period: args.save_state_period.map(Duration::from_millis),
        seed: args.seed,
    };
    let world = WorldHandle::new(Application::new(
        game,
        settings,
        Box::new(MemoryRecordStore::new()),
    ));

    if world.restore().context("restoring state")? {
        info!("resumed from snapshot");
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut bots = Vec::with_capacity(args.bots);
    for i in 0..args.bots {
        let map = &map_ids[i % map_ids.len()];
        let name = format!("bot-{i}");
        let joined = world.join(map, &name).with_context(|| format!("joining {name} to {map}"))?;
        bots.push(Bot {
            name,
            joined,
            countdown: 0,
        });
    }

    println!("=== Kennel Simulation Harness ===\n");
    let dt = Duration::from_millis(args.tick_period);
    let mut totals = TickReport::default();
    for _ in 0..args.ticks {
        drive_bots(&world, &mut bots, &mut rng);
        let report = world.tick(dt);
        totals.spawned += report.spawned;
        totals.picked_up += report.picked_up;
        totals.delivered += report.delivered;
        totals.skipped += report.skipped;
    }

    if args.state_file.is_some() {
        world.save().context("saving state")?;
    }

    // ── Summary ──
    let elapsed = dt * u32::try_from(args.ticks).unwrap_or(u32::MAX);
    println!("Simulated {:.1}s in {} ticks", elapsed.as_secs_f64(), args.ticks);
    println!(
        "Loot: {} spawned, {} picked up, {} deliveries, {} skipped events\n",
        totals.spawned, totals.picked_up, totals.delivered, totals.skipped
    );

    world.with(|app| {
        for session in app.game().sessions() {
            let loot = app
                .game()
                .find_map(session.map_id())
                .map(|m| m.loot_count())
                .unwrap_or(0);
            println!("Session {} on {} ({} loot on the ground)", session.id(), session.map_id(), loot);
            for dog in session.dogs() {
                let name = app
                    .players()
                    .by_dog(dog.id)
                    .map(|p| p.name.as_str())
                    .unwrap_or("?");
                println!(
                    "  {:<10} score {:>5}  bag {}  at ({:.2}, {:.2})",
                    name,
                    dog.score,
                    dog.bag.len(),
                    dog.position.x,
                    dog.position.y
                );
            }
        }
    });

    let retired = world.retired_players(0, 10)?;
    if !retired.is_empty() {
        println!("\nLeaderboard:");
        for (rank, r) in retired.iter().enumerate() {
            println!(
                "  {:>2}. {:<10} {:>5}  ({:.1}s)",
                rank + 1,
                r.name,
                r.score,
                r.play_time.as_secs_f64()
            );
        }
    }
    Ok(())
}
