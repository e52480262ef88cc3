//! # Rockfall Engine
//!
//! Deterministic turn-based simulation of a falling-object puzzle game:
//! dig dirt, push boulders, collect diamonds, and reach the exit before
//! anything lands on you.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ROCKFALL ENGINE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── point.rs    - Grid coordinates and directions           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Simulation (deterministic)                │
//! │  ├── entity.rs   - Entity kinds, capabilities, player        │
//! │  ├── grid.rs     - Single-occupancy cell store               │
//! │  ├── level.rs    - Layout parsing, exit gate, rebuild        │
//! │  ├── movement.rs - Player action resolution                  │
//! │  ├── physics.rs  - Two-pass gravity and rolling              │
//! │  ├── input.rs    - Held/pressed direction state              │
//! │  ├── events.rs   - Notification events and listeners         │
//! │  └── engine.rs   - Turn scheduler and state machine          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The simulation is fully deterministic:
//! - Time enters only through `Engine::update` deltas; no wall clock
//! - Fixed scan order (bottom-up rows, left-to-right columns)
//! - Fixed tie-breaks (roll right before left, held input before pressed)
//! - No randomness anywhere in the rules
//!
//! Given identical update deltas and input streams, two engines produce
//! identical state hashes every turn.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use crate::core::hash::{StateHash, StateHasher};
pub use crate::core::point::{Direction, Point};
pub use crate::game::engine::{Engine, GameState, Phase};
pub use crate::game::events::{EventKind, GameEvent, ListenerId};
pub use crate::game::input::InputCommand;
pub use crate::game::level::{Level, LevelError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Length of one discrete turn in seconds (200 ms)
pub const TURN_DURATION: f64 = 0.2;

/// Lives a fresh game starts with
pub const STARTING_LIVES: u32 = 3;
