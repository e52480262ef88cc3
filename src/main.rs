//! Rockfall Demo
//!
//! Drives a scripted playthrough of a small built-in level, logs the
//! notification events, and replays the same script to verify the
//! determinism guarantee via state hashes.

use anyhow::Context;
use tracing::{info, Level as LogLevel};
use tracing_subscriber::FmtSubscriber;

use rockfall::{
    game::events::EventPayload,
    Direction, Engine, EventKind, InputCommand, Level, StateHash, STARTING_LIVES,
    TURN_DURATION, VERSION,
};

/// Small built-in level: two diamonds behind dirt, a pushable boulder, and
/// a gated exit.
const DEMO_LAYOUT: &[&str] = &[
    "##########",
    "#@...O...#",
    "#.*....#.#",
    "#..O.*.#.#",
    "#........#",
    "########E#",
];

const DEMO_QUOTA: u32 = 20;
const DEMO_TIME_LIMIT: f64 = 60.0;

/// Scripted input per turn; `None` is an idle turn that lets physics settle.
const SCRIPT: &[Option<Direction>] = &[
    Some(Direction::Down),
    Some(Direction::Right),
    None,
    Some(Direction::Down),
    Some(Direction::Down),
    Some(Direction::Right),
    Some(Direction::Right),
    Some(Direction::Right),
    Some(Direction::Up),
    None,
    Some(Direction::Right),
    Some(Direction::Right),
    Some(Direction::Right),
    Some(Direction::Down),
    Some(Direction::Down),
    Some(Direction::Down),
];

fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(LogLevel::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Rockfall Engine v{}", VERSION);
    info!(
        "Turn duration: {} ms, starting lives: {}",
        (TURN_DURATION * 1000.0) as u32,
        STARTING_LIVES
    );

    let final_hash = run_demo()?;

    info!("=== Verifying Determinism ===");
    let replay_hash = run_scripted(false)?;
    info!("Replay state hash: {}", hex::encode(replay_hash));
    if final_hash == replay_hash {
        info!("DETERMINISM VERIFIED: hashes match");
    } else {
        anyhow::bail!("determinism failure: hashes differ");
    }

    Ok(())
}

/// Run the scripted playthrough with full event logging.
fn run_demo() -> anyhow::Result<StateHash> {
    info!("=== Starting Demo Game ===");
    let hash = run_scripted(true)?;
    info!("Final state hash: {}", hex::encode(hash));
    Ok(hash)
}

/// Execute the demo script against a fresh engine and return the final
/// state hash.
fn run_scripted(verbose: bool) -> anyhow::Result<StateHash> {
    let level = Level::from_layout(DEMO_LAYOUT, DEMO_QUOTA, DEMO_TIME_LIMIT)
        .context("demo layout failed to parse")?;
    let mut engine = Engine::new(level);

    if verbose {
        attach_loggers(&mut engine);
    }

    for direction in SCRIPT {
        if let Some(direction) = direction {
            engine.handle_input(InputCommand::press(*direction));
        }
        // Two frames per turn; the second crosses the boundary.
        engine.update(TURN_DURATION / 2.0);
        engine.update(TURN_DURATION / 2.0);

        if !engine.phase().is_active() {
            break;
        }
    }

    if verbose {
        let state = engine.state();
        info!(
            "Finished in phase {:?}: score {}, lives {}, {:.1}s left after {} turns",
            state.phase, state.score, state.lives, state.time_remaining, state.turn
        );
        let snapshot =
            serde_json::to_string_pretty(&state).context("failed to serialize snapshot")?;
        println!("{snapshot}");
    }

    Ok(engine.state_hash())
}

fn attach_loggers(engine: &mut Engine) {
    let kinds = [
        EventKind::LevelLoaded,
        EventKind::DiamondCollected,
        EventKind::LevelComplete,
        EventKind::PlayerDied,
        EventKind::LifeLost,
        EventKind::GameOver,
    ];
    for kind in kinds {
        engine.add_event_listener(kind, |event| match &event.payload {
            EventPayload::LevelLoaded {
                width,
                height,
                gem_quota,
            } => {
                info!("Level loaded: {}x{}, quota {}", width, height, gem_quota);
            }
            EventPayload::DiamondCollected { points, score, .. } => {
                info!(
                    "Turn {}: diamond collected (+{}), score {}",
                    event.turn, points, score
                );
            }
            EventPayload::LevelComplete { score, bonus } => {
                info!(
                    "Turn {}: level complete! score {} (time bonus {})",
                    event.turn, score, bonus
                );
            }
            EventPayload::PlayerDied { at, lives } => {
                info!("Turn {}: crushed at {}, {} lives left", event.turn, at, lives);
            }
            EventPayload::LifeLost { lives } => {
                info!("Turn {}: life lost, {} remaining", event.turn, lives);
            }
            EventPayload::GameOver { score, reason } => {
                info!("Turn {}: game over ({:?}), score {}", event.turn, reason, score);
            }
            _ => {}
        });
    }
}
