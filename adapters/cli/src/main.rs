#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives a headless Zone Capture session.
//!
//! Levels come from a TOML file or the built-in demo set; a scripted
//! intent stream stands in for a human player, and every discrete event
//! plus periodic snapshots are printed to stdout. Useful for smoke
//! testing level configurations and for watching the simulation without
//! any rendering layer.

mod level_file;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use zone_capture_core::{Direction, Event, PlayerIntent, RoundSnapshot};
use zone_capture_engine::Engine;

#[derive(Debug, Parser)]
#[command(name = "zone-capture", about = "Headless Zone Capture simulation driver")]
struct Args {
    /// Level configuration file (TOML). The built-in demo levels are
    /// used when omitted.
    #[arg(long)]
    levels: Option<PathBuf>,

    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 1200)]
    ticks: u32,

    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 16)]
    tick_millis: u64,

    /// Session seed for the built-in demo levels.
    #[arg(long, default_value_t = 0x7049)]
    seed: u64,

    /// Print a snapshot line every N ticks (0 disables).
    #[arg(long, default_value_t = 125)]
    report_every: u32,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = match &args.levels {
        Some(path) => level_file::load(path)?,
        None => level_file::demo_config(args.seed),
    };

    let mut engine = Engine::new(config)?;
    let dt = Duration::from_millis(args.tick_millis);
    let mut events = Vec::new();

    for index in 0..args.ticks {
        let snapshot = engine.tick(dt, scripted_intent(index), &mut events);
        for event in events.drain(..) {
            println!("[tick {index:>5}] {}", describe(&event));
        }
        if args.report_every > 0 && index % args.report_every == 0 {
            report(index, &snapshot);
        }
    }

    let snapshot = engine.snapshot();
    println!(
        "finished: score {} after {:.1}s, {} lives left, {:.1}% filled",
        snapshot.score, snapshot.total_elapsed, snapshot.lives, snapshot.filled_percent
    );
    Ok(())
}

/// A roaming stand-in for player input: sweep the four directions with
/// idle pauses in between.
fn scripted_intent(tick_index: u32) -> PlayerIntent {
    match (tick_index / 30) % 5 {
        0 => PlayerIntent::toward(Direction::Up),
        1 => PlayerIntent::toward(Direction::Left),
        2 => PlayerIntent::toward(Direction::Down),
        3 => PlayerIntent::toward(Direction::Right),
        _ => PlayerIntent::idle(),
    }
}

fn report(tick_index: u32, snapshot: &RoundSnapshot) {
    println!(
        "[tick {tick_index:>5}] level {} | {:?} | score {} | lives {} | {:.1}% filled | {:.1}s left",
        snapshot.level_index + 1,
        snapshot.phase,
        snapshot.score,
        snapshot.lives,
        snapshot.filled_percent,
        snapshot.time_remaining
    );
}

fn describe(event: &Event) -> String {
    match event {
        Event::RegionClaimed { cells, points } => {
            format!("claimed a {}-cell region (+{points})", cells.len())
        }
        Event::EnemyEliminated { id, points, .. } => {
            format!("enemy #{} eliminated (+{points})", id.get())
        }
        Event::PowerUpCollected {
            kind,
            points,
            by_fill,
            ..
        } => {
            if *by_fill {
                format!("{kind:?} destroyed by fill (+{points})")
            } else {
                format!("{kind:?} collected (+{points})")
            }
        }
        Event::LifeLost => "life lost".to_owned(),
        Event::LevelComplete { bonus } => format!("level complete (+{bonus} bonus)"),
        Event::GameOver { score, .. } => format!("game over, final score {score}"),
    }
}
