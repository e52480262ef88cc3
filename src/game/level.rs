//! Level
//!
//! One grid plus level metadata (gem quota, time limit), the player, and the
//! character mini-language that levels are built from. The original layout
//! text is retained so a death can rebuild the level from scratch.
//!
//! Layout characters:
//!
//! | char | entity |
//! |------|------------------------------|
//! | `@`  | player spawn                 |
//! | `#`  | wall                         |
//! | `.`  | dirt                         |
//! | `*`  | diamond                      |
//! | `O`  | boulder                      |
//! | `E`  | exit (carries the gem quota) |
//!
//! Any other character is silently an empty cell.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::point::Point;
use crate::game::entity::{Entity, EntityKind, PlayerState};
use crate::game::grid::Grid;

/// Level construction failure.
///
/// These are programmer/layout-author errors and surface immediately;
/// player-facing rule violations never raise an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    /// Layout had no rows or no columns
    #[error("layout is empty")]
    EmptyLayout,
    /// No `@` cell found
    #[error("layout has no player spawn")]
    MissingPlayer,
    /// More than one `@` cell
    #[error("duplicate player spawn at {0}")]
    DuplicatePlayer(Point),
    /// More than one `E` cell
    #[error("duplicate exit at {0}")]
    DuplicateExit(Point),
}

/// A playable level: grid, player, and metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// World entities
    pub grid: Grid,
    /// The singleton player (owned beside the grid, never inside it)
    pub player: PlayerState,
    /// Cached exit cell, if the layout has one
    pub exit_position: Option<Point>,
    /// Gem points required to open the exit
    pub gem_quota: u32,
    /// Full countdown duration in seconds
    pub time_limit: f64,
    /// Original layout rows, kept for rebuilds after a death
    layout: Vec<String>,
}

impl Level {
    /// Build a level from layout rows.
    ///
    /// The grid is as wide as the longest row; shorter rows are padded with
    /// empty cells. Exactly one player spawn and at most one exit are
    /// required; unrecognized characters become empty cells without error.
    pub fn from_layout<S: AsRef<str>>(
        rows: &[S],
        gem_quota: u32,
        time_limit: f64,
    ) -> Result<Self, LevelError> {
        let layout: Vec<String> = rows.iter().map(|row| row.as_ref().to_owned()).collect();
        let height = layout.len() as i32;
        let width = layout
            .iter()
            .map(|row| row.chars().count())
            .max()
            .unwrap_or(0) as i32;
        if width == 0 || height == 0 {
            return Err(LevelError::EmptyLayout);
        }

        let mut grid = Grid::new(width, height);
        let mut player_spawn: Option<Point> = None;
        let mut exit_position: Option<Point> = None;

        for (y, row) in layout.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let cell = Point::new(x as i32, y as i32);
                match ch {
                    '@' => {
                        if player_spawn.is_some() {
                            return Err(LevelError::DuplicatePlayer(cell));
                        }
                        player_spawn = Some(cell);
                    }
                    '#' => {
                        grid.set(cell, Some(Entity::new(EntityKind::Wall, cell)));
                    }
                    '.' => {
                        grid.set(cell, Some(Entity::new(EntityKind::Dirt, cell)));
                    }
                    '*' => {
                        grid.set(cell, Some(Entity::new(EntityKind::Diamond, cell)));
                    }
                    'O' => {
                        grid.set(cell, Some(Entity::new(EntityKind::Boulder, cell)));
                    }
                    'E' => {
                        if exit_position.is_some() {
                            return Err(LevelError::DuplicateExit(cell));
                        }
                        exit_position = Some(cell);
                        grid.set(cell, Some(Entity::exit(cell, gem_quota)));
                    }
                    // Space and anything unrecognized: empty cell
                    _ => {}
                }
            }
        }

        let spawn = player_spawn.ok_or(LevelError::MissingPlayer)?;
        Ok(Self {
            grid,
            player: PlayerState::new(spawn),
            exit_position,
            gem_quota,
            time_limit,
            layout,
        })
    }

    /// Rebuild this level from its original layout.
    ///
    /// Used after a death: every entity and the player return to their
    /// starting state. Score lives on the engine and is unaffected.
    pub fn rebuild(&self) -> Self {
        Self::from_layout(&self.layout, self.gem_quota, self.time_limit)
            .unwrap_or_else(|_| self.clone())
    }

    /// The exit entity, if the level has one.
    pub fn exit(&self) -> Option<&Entity> {
        self.exit_position.and_then(|at| self.grid.get(at))
    }

    /// Whether `point` is in bounds and occupied by neither an entity nor
    /// the live player.
    ///
    /// This is the emptiness predicate physics and pushing use: a cell the
    /// player stands on is not free even though the grid cell itself is.
    pub fn is_free(&self, point: Point) -> bool {
        self.grid.is_empty(point) && !self.is_player_at(point)
    }

    /// Whether the live player occupies `point`.
    #[inline]
    pub fn is_player_at(&self, point: Point) -> bool {
        self.player.alive && self.player.position == point
    }

    /// Open the exit once the collected gems meet the quota. Irreversible.
    pub fn refresh_exit_gate(&mut self) {
        if self.player.gems_collected < self.gem_quota {
            return;
        }
        if let Some(at) = self.exit_position {
            if let Some(exit) = self.grid.get_mut(at) {
                exit.open_exit();
            }
        }
    }

    /// Completion predicate: player standing on an open exit with the quota
    /// collected. All three conditions must hold simultaneously.
    pub fn is_complete(&self) -> bool {
        let Some(at) = self.exit_position else {
            return false;
        };
        self.player.alive
            && self.player.position == at
            && self.player.gems_collected >= self.gem_quota
            && self.exit().is_some_and(|exit| exit.is_open())
    }

    /// Reset all interpolation baselines at a turn boundary.
    pub fn begin_turn(&mut self) {
        self.grid.begin_turn();
        self.player.begin_turn();
    }

    /// Diamond cells still on the grid, in scan order.
    pub fn remaining_diamonds(&self) -> Vec<Point> {
        self.grid.find_all(EntityKind::Diamond)
    }
}

// =============================================================================
// TESTS
// =============================================================================
