//! Notification Events
//!
//! Events emitted at state-machine transitions, plus the listener registry.
//! Events are notifications, not state: the engine never reads them back.
//! Listeners are plain callbacks registered per event kind and owned by the
//! engine instance; there is no global bus.

use std::collections::HashMap;

use serde::{Serialize, Deserialize};

use crate::core::point::Point;

/// The reason a game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    /// The last life was lost to a falling entity
    OutOfLives,
    /// The countdown expired with no lives left
    TimeExpired,
}

/// Event classification, used as the registry key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A level finished loading
    LevelLoaded,
    /// The player picked up a diamond
    DiamondCollected,
    /// The player reached the open exit with the quota met
    LevelComplete,
    /// A falling entity landed on the player
    PlayerDied,
    /// Terminal failure state entered
    GameOver,
    /// A life was spent (death or time-up), game continues
    LifeLost,
    /// Pause was toggled
    PauseToggled,
    /// The whole game restarted from the original level
    GameReset,
}

/// Payload carried by an event, one variant per kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    /// See [`EventKind::LevelLoaded`]
    LevelLoaded {
        /// Level width in cells
        width: i32,
        /// Level height in cells
        height: i32,
        /// Gem points required to open the exit
        gem_quota: u32,
    },
    /// See [`EventKind::DiamondCollected`]
    DiamondCollected {
        /// Points this diamond was worth
        points: u32,
        /// Player's gem total after the pickup
        gems_collected: u32,
        /// Score after the pickup
        score: u32,
    },
    /// See [`EventKind::LevelComplete`]
    LevelComplete {
        /// Final score including the time bonus
        score: u32,
        /// Bonus awarded for remaining time
        bonus: u32,
    },
    /// See [`EventKind::PlayerDied`]
    PlayerDied {
        /// Cell the player died on
        at: Point,
        /// Lives left after the death
        lives: u32,
    },
    /// See [`EventKind::GameOver`]
    GameOver {
        /// Final score
        score: u32,
        /// Why the game ended
        reason: GameOverReason,
    },
    /// See [`EventKind::LifeLost`]
    LifeLost {
        /// Lives left
        lives: u32,
    },
    /// See [`EventKind::PauseToggled`]
    PauseToggled {
        /// Paused after the toggle?
        paused: bool,
    },
    /// See [`EventKind::GameReset`]
    GameReset {
        /// Score discarded by the reset
        discarded_score: u32,
    },
}

impl EventPayload {
    /// The kind this payload belongs to.
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::LevelLoaded { .. } => EventKind::LevelLoaded,
            EventPayload::DiamondCollected { .. } => EventKind::DiamondCollected,
            EventPayload::LevelComplete { .. } => EventKind::LevelComplete,
            EventPayload::PlayerDied { .. } => EventKind::PlayerDied,
            EventPayload::GameOver { .. } => EventKind::GameOver,
            EventPayload::LifeLost { .. } => EventKind::LifeLost,
            EventPayload::PauseToggled { .. } => EventKind::PauseToggled,
            EventPayload::GameReset { .. } => EventKind::GameReset,
        }
    }
}

/// A notification event with timing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Kind tag (matches `payload`)
    pub kind: EventKind,
    /// Turn counter when the event fired
    pub turn: u64,
    /// Simulation time in seconds (accumulated update deltas)
    pub timestamp: f64,
    /// Transition-specific data
    pub payload: EventPayload,
}

impl GameEvent {
    /// Create an event; the kind is derived from the payload.
    pub fn new(turn: u64, timestamp: f64, payload: EventPayload) -> Self {
        Self {
            kind: payload.kind(),
            turn,
            timestamp,
            payload,
        }
    }
}

// =============================================================================
// LISTENER REGISTRY
// =============================================================================

/// Handle returned by listener registration, used for removal.
///
/// Callbacks are not comparable in Rust, so removal goes through this
/// handle instead of function identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&GameEvent)>;

/// Registry mapping event kinds to ordered listener lists.
///
/// Owned by one engine instance. Registration and removal are the only
/// lifecycle operations; teardown clears everything.
#[derive(Default)]
pub struct EventRegistry {
    next_id: u64,
    listeners: HashMap<EventKind, Vec<(ListenerId, Listener)>>,
}

impl EventRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for events of `kind`.
    pub fn add_listener<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&GameEvent) + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners
            .entry(kind)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Remove a listener by handle. Returns whether it was registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        for listeners in self.listeners.values_mut() {
            if let Some(index) = listeners.iter().position(|(lid, _)| *lid == id) {
                listeners.remove(index);
                return true;
            }
        }
        false
    }

    /// Dispatch `event` to every listener of its kind, in registration
    /// order.
    pub fn emit(&mut self, event: &GameEvent) {
        if let Some(listeners) = self.listeners.get_mut(&event.kind) {
            for (_, listener) in listeners.iter_mut() {
                listener(event);
            }
        }
    }

    /// Detach all listeners (engine teardown).
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Number of registered listeners across all kinds.
    pub fn len(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    /// Whether no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// TESTS
// =============================================================================
