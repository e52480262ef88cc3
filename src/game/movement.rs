//! Movement Resolver
//!
//! Resolves the single player action of a turn against the grid: walking,
//! digging, collecting, pushing, and entering the exit. Illegal moves are
//! reported as failed outcomes with an optional player-facing message,
//! never as errors.

use serde::{Serialize, Deserialize};

use crate::core::point::{Direction, Point};
use crate::game::entity::EntityKind;
use crate::game::level::Level;

/// Result of one resolved player action.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// Did the player move this turn?
    pub success: bool,
    /// Did the move pick up a diamond?
    pub diamond_collected: bool,
    /// Points credited by the move (diamond value, else zero)
    pub points: u32,
    /// Player-facing explanation for a failed move, when one exists
    pub message: Option<String>,
}

impl MoveOutcome {
    fn failed() -> Self {
        Self::default()
    }

    fn failed_with(message: String) -> Self {
        Self {
            message: Some(message),
            ..Self::default()
        }
    }

    fn moved() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }
}

/// What a move would do, decided without mutating anything.
///
/// `resolve_move` and `can_move` both go through this single classifier so
/// the mutating and non-mutating paths can never disagree.
#[derive(Clone, Debug, PartialEq)]
enum MoveDecision {
    /// Step into an empty (or dug) cell
    Walk(Point),
    /// Clear the dirt at the target, then step in
    Dig(Point),
    /// Pick up the diamond at the target, then step in
    Collect(Point, u32),
    /// Shift the boulder from `target` to `beyond`, then step into `target`
    Push { target: Point, beyond: Point },
    /// Step onto the open exit cell
    EnterExit(Point),
    /// No movement; optional player-facing reason
    Blocked(Option<String>),
}

fn classify(level: &Level, direction: Direction) -> MoveDecision {
    if !level.player.alive {
        return MoveDecision::Blocked(None);
    }

    let target = level.player.position.step(direction);
    if !level.grid.in_bounds(target) {
        return MoveDecision::Blocked(None);
    }

    let Some(entity) = level.grid.get(target) else {
        return MoveDecision::Walk(target);
    };

    match entity.kind {
        EntityKind::Dirt => MoveDecision::Dig(target),
        EntityKind::Diamond => MoveDecision::Collect(target, entity.value()),
        EntityKind::Boulder => {
            // Boulders only yield to horizontal pushes, and only into a
            // free in-bounds cell beyond them.
            if !direction.is_horizontal() {
                return MoveDecision::Blocked(None);
            }
            let beyond = target.step(direction);
            if level.grid.in_bounds(beyond) && level.is_free(beyond) {
                MoveDecision::Push { target, beyond }
            } else {
                MoveDecision::Blocked(None)
            }
        }
        EntityKind::Wall => MoveDecision::Blocked(None),
        EntityKind::Exit => {
            let needed = entity
                .gems_required()
                .saturating_sub(level.player.gems_collected);
            if entity.is_open() && needed == 0 {
                MoveDecision::EnterExit(target)
            } else {
                MoveDecision::Blocked(Some(format!(
                    "Collect {needed} more gem points to open the exit"
                )))
            }
        }
    }
}

/// Resolve one player action, mutating the level.
///
/// Exactly one of the legal interactions happens, or nothing does. On
/// collecting a diamond the exit gate is re-evaluated in the same turn.
/// Entering the exit moves the player's coordinates onto the exit cell but
/// leaves the exit entity in place so the completion check can observe
/// "player at exit".
pub fn resolve_move(level: &mut Level, direction: Direction) -> MoveOutcome {
    match classify(level, direction) {
        MoveDecision::Walk(target) => {
            level.player.move_to(target);
            MoveOutcome::moved()
        }
        MoveDecision::Dig(target) => {
            // Dug dirt is gone for good; the cell is plain empty afterwards.
            level.grid.remove(target);
            level.player.move_to(target);
            MoveOutcome::moved()
        }
        MoveDecision::Collect(target, value) => {
            level.grid.remove(target);
            level.player.gems_collected = level.player.gems_collected.saturating_add(value);
            level.player.move_to(target);
            level.refresh_exit_gate();
            MoveOutcome {
                success: true,
                diamond_collected: true,
                points: value,
                message: None,
            }
        }
        MoveDecision::Push { target, beyond } => {
            if !level.grid.relocate(target, beyond) {
                // Classifier said free; a relocate refusal here would mean
                // the occupancy invariant broke.
                return MoveOutcome::failed();
            }
            level.player.move_to(target);
            MoveOutcome::moved()
        }
        MoveDecision::EnterExit(target) => {
            level.player.move_to(target);
            MoveOutcome::moved()
        }
        MoveDecision::Blocked(message) => match message {
            Some(text) => MoveOutcome::failed_with(text),
            None => MoveOutcome::failed(),
        },
    }
}

/// Would a move in `direction` succeed? Mutates nothing.
pub fn can_move(level: &Level, direction: Direction) -> bool {
    !matches!(classify(level, direction), MoveDecision::Blocked(_))
}

// =============================================================================
// TESTS
// =============================================================================
