//! Entity Model
//!
//! World entities as a closed kind tag plus a per-kind capability table,
//! with per-kind mutable state. The player is not a grid entity: it has its
//! own state type and is owned by the level beside the grid, which is what
//! lets the exit cell hold both the exit marker and the finishing player.

use bitflags::bitflags;
use serde::{Serialize, Deserialize};

use crate::core::point::Point;

/// Default point value of a diamond.
pub const DIAMOND_VALUE: u32 = 10;

bitflags! {
    /// Fixed capability flags, assigned per kind at creation.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Caps: u8 {
        /// Blocks movement and refuses to share a cell
        const SOLID = 1 << 0;
        /// Can be displaced by a player push
        const MOVABLE = 1 << 1;
        /// Picked up when the player walks into it
        const COLLECTIBLE = 1 << 2;
        /// Subject to gravity and rolling
        const FALLABLE = 1 << 3;
    }
}

// =============================================================================
// ENTITY KIND
// =============================================================================

/// The closed set of world entity kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EntityKind {
    /// Pushable rock, falls and rolls
    Boulder = 0,
    /// Collectible gem, falls and rolls
    Diamond = 1,
    /// Soft material the player digs through
    Dirt = 2,
    /// Immovable barrier
    Wall = 3,
    /// Level goal, opens once the gem quota is met
    Exit = 4,
}

impl EntityKind {
    /// Capability table. Flags are data, fixed per kind.
    pub const fn caps(self) -> Caps {
        match self {
            EntityKind::Boulder => Caps::SOLID.union(Caps::MOVABLE).union(Caps::FALLABLE),
            EntityKind::Diamond => Caps::COLLECTIBLE.union(Caps::FALLABLE),
            EntityKind::Dirt => Caps::empty(),
            EntityKind::Wall => Caps::SOLID,
            // Exit starts solid; its entity state tracks the open gate
            EntityKind::Exit => Caps::SOLID,
        }
    }

    /// Whether this kind participates in the gravity/rolling passes.
    #[inline]
    pub const fn is_fallable(self) -> bool {
        self.caps().contains(Caps::FALLABLE)
    }
}

// =============================================================================
// PER-KIND STATE
// =============================================================================

/// Mutable per-kind state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityState {
    /// Boulder: in motion since the last physics pass?
    Boulder {
        /// True exactly while descending or rolling
        falling: bool,
    },
    /// Diamond: motion flag plus point value
    Diamond {
        /// True exactly while descending or rolling
        falling: bool,
        /// Points credited on collection
        value: u32,
    },
    /// Dirt has no residual state: digging removes it from the grid
    Dirt,
    /// Wall: destructible walls exist in some layouts
    Wall {
        /// Whether effects may remove this wall
        destructible: bool,
    },
    /// Exit gate
    Exit {
        /// Irreversibly set once the gem quota is met
        open: bool,
        /// Gems the player must hold to pass
        gems_required: u32,
    },
}

// =============================================================================
// ENTITY
// =============================================================================

/// A world entity occupying one grid cell.
///
/// `previous_position` and `animating` exist only so a renderer can
/// interpolate between turns; the simulation never reads them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Kind tag (selects the capability flags)
    pub kind: EntityKind,
    /// Current cell; must always match the cell that stores this entity
    pub position: Point,
    /// Cell occupied at the last turn boundary
    pub previous_position: Point,
    /// Set when the position changes, cleared at each turn start
    pub animating: bool,
    /// Per-kind mutable state
    pub state: EntityState,
}

impl Entity {
    /// Create an entity of `kind` with its default per-kind state.
    pub fn new(kind: EntityKind, position: Point) -> Self {
        let state = match kind {
            EntityKind::Boulder => EntityState::Boulder { falling: false },
            EntityKind::Diamond => EntityState::Diamond {
                falling: false,
                value: DIAMOND_VALUE,
            },
            EntityKind::Dirt => EntityState::Dirt,
            EntityKind::Wall => EntityState::Wall { destructible: false },
            EntityKind::Exit => EntityState::Exit {
                open: false,
                gems_required: 0,
            },
        };
        Self {
            kind,
            position,
            previous_position: position,
            animating: false,
            state,
        }
    }

    /// Create an exit with its gem quota.
    pub fn exit(position: Point, gems_required: u32) -> Self {
        let mut entity = Self::new(EntityKind::Exit, position);
        entity.state = EntityState::Exit {
            open: false,
            gems_required,
        };
        entity
    }

    /// Capability flags for this entity's kind.
    #[inline]
    pub fn caps(&self) -> Caps {
        self.kind.caps()
    }

    /// Whether this entity blocks movement.
    ///
    /// An open exit is the one kind whose solidity is stateful: once open it
    /// no longer blocks, so the player can step onto its cell.
    pub fn is_solid(&self) -> bool {
        match self.state {
            EntityState::Exit { open, .. } => !open,
            _ => self.caps().contains(Caps::SOLID),
        }
    }

    /// Whether this entity is subject to gravity.
    #[inline]
    pub fn is_fallable(&self) -> bool {
        self.kind.is_fallable()
    }

    /// Falling flag, false for non-fallable kinds.
    pub fn is_falling(&self) -> bool {
        match self.state {
            EntityState::Boulder { falling } => falling,
            EntityState::Diamond { falling, .. } => falling,
            _ => false,
        }
    }

    /// Set the falling flag. No-op for non-fallable kinds.
    pub fn set_falling(&mut self, value: bool) {
        match &mut self.state {
            EntityState::Boulder { falling } => *falling = value,
            EntityState::Diamond { falling, .. } => *falling = value,
            _ => {}
        }
    }

    /// Point value, zero for non-collectibles.
    pub fn value(&self) -> u32 {
        match self.state {
            EntityState::Diamond { value, .. } => value,
            _ => 0,
        }
    }

    /// Whether this exit is open. False for non-exits.
    pub fn is_open(&self) -> bool {
        matches!(self.state, EntityState::Exit { open: true, .. })
    }

    /// Gem quota carried by an exit, zero otherwise.
    pub fn gems_required(&self) -> u32 {
        match self.state {
            EntityState::Exit { gems_required, .. } => gems_required,
            _ => 0,
        }
    }

    /// Irreversibly open an exit. No-op for other kinds.
    pub fn open_exit(&mut self) {
        if let EntityState::Exit { open, .. } = &mut self.state {
            *open = true;
        }
    }

    /// Reset the interpolation baseline at a turn boundary.
    pub fn begin_turn(&mut self) {
        self.previous_position = self.position;
        self.animating = false;
    }

    /// Record a position change, keeping the interpolation baseline.
    pub(crate) fn relocated(&mut self, to: Point) {
        self.position = to;
        self.animating = true;
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// The player, owned by the level beside the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Current cell
    pub position: Point,
    /// Cell occupied at the last turn boundary
    pub previous_position: Point,
    /// Set when the position changes, cleared at each turn start
    pub animating: bool,
    /// Cleared when a falling entity lands on the player
    pub alive: bool,
    /// Gem points collected so far this life
    pub gems_collected: u32,
}

impl PlayerState {
    /// Spawn a live player at `position`.
    pub fn new(position: Point) -> Self {
        Self {
            position,
            previous_position: position,
            animating: false,
            alive: true,
            gems_collected: 0,
        }
    }

    /// Reset the interpolation baseline at a turn boundary.
    pub fn begin_turn(&mut self) {
        self.previous_position = self.position;
        self.animating = false;
    }

    /// Move the player, keeping the interpolation baseline.
    pub fn move_to(&mut self, to: Point) {
        self.position = to;
        self.animating = true;
    }
}

// =============================================================================
// TESTS
// =============================================================================
