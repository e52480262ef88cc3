//! Game simulation: grid, entities, resolvers, scheduler, and events.

pub mod engine;
pub mod entity;
pub mod events;
pub mod grid;
pub mod input;
pub mod level;
pub mod movement;
pub mod physics;

pub use engine::{Engine, GameState, Phase};
pub use entity::{Caps, Entity, EntityKind, EntityState, PlayerState, DIAMOND_VALUE};
pub use events::{
    EventKind, EventPayload, EventRegistry, GameEvent, GameOverReason, ListenerId,
};
pub use grid::Grid;
pub use input::{InputCommand, InputState};
pub use level::{Level, LevelError};
pub use movement::{can_move, resolve_move, MoveOutcome};
pub use physics::{resolve_physics, PhysicsResult};
