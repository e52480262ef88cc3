//! Input State
//!
//! Pending player input between turn boundaries. The engine does no
//! key-code mapping; collaborators hand it directions, and this module
//! resolves which single direction a turn honors.

use serde::{Serialize, Deserialize};

use crate::core::point::Direction;

/// One input delivery from an external collaborator.
///
/// Field order mirrors the handling priority: a pause or reset request is
/// acted on immediately, a direction is queued for the next turn boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputCommand {
    /// Direction pressed this frame, if any
    pub direction: Option<Direction>,
    /// Toggle pause
    pub pause: bool,
    /// Restart the whole game
    pub reset: bool,
}

impl InputCommand {
    /// A plain directional press.
    pub const fn press(direction: Direction) -> Self {
        Self {
            direction: Some(direction),
            pause: false,
            reset: false,
        }
    }

    /// A pause toggle.
    pub const fn pause_toggle() -> Self {
        Self {
            direction: None,
            pause: true,
            reset: false,
        }
    }

    /// A full game reset.
    pub const fn restart() -> Self {
        Self {
            direction: None,
            pause: false,
            reset: true,
        }
    }
}

/// Held and pressed direction state between turns.
///
/// Priority, fixed and testable: a currently held direction wins; otherwise
/// a direction pressed inside the current turn window is used once;
/// otherwise the turn has no movement. Presses are cleared at every turn
/// boundary, so a stored press is always within the current window; the
/// timestamp is simulation time, kept for observability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    /// Direction currently held down, if any
    pub held: Option<Direction>,
    /// Direction pressed since the last turn boundary
    pub pressed: Option<Direction>,
    /// Simulation time of the pending press, seconds
    pub pressed_at: f64,
}

impl InputState {
    /// Create an idle input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the currently held direction (or its release).
    pub fn set_held(&mut self, direction: Option<Direction>) {
        self.held = direction;
    }

    /// Record a pressed direction with its simulation timestamp.
    ///
    /// Only one press is honored per turn; a later press inside the same
    /// window replaces an earlier one.
    pub fn press(&mut self, direction: Direction, now: f64) {
        self.pressed = Some(direction);
        self.pressed_at = now;
    }

    /// Resolve the direction for this turn and consume the pending press.
    pub fn take_turn_direction(&mut self) -> Option<Direction> {
        let direction = self.held.or(self.pressed);
        self.pressed = None;
        direction
    }

    /// Drop any pending press without resolving (turn boundary with no
    /// simulation, e.g. while paused).
    pub fn clear_pressed(&mut self) {
        self.pressed = None;
    }
}

// =============================================================================
// TESTS
// =============================================================================
