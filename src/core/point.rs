//! Integer Grid Coordinates
//!
//! Deterministic cell coordinates and the four cardinal directions.
//! All simulation geometry is integer-only; fractional positions exist
//! solely in presentation-side interpolation.

use std::fmt;
use serde::{Serialize, Deserialize};

/// A cell coordinate on the level grid.
///
/// `y` grows downward: row 0 is the top of the level, so gravity moves
/// entities toward larger `y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// Column index
    pub x: i32,
    /// Row index (0 = top)
    pub y: i32,
}

impl Point {
    /// Origin cell (top-left corner).
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Create a new point.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise translation.
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// The neighboring cell one step in `direction`.
    #[inline]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy)
    }

    /// The cell directly below (gravity target).
    #[inline]
    pub const fn below(self) -> Self {
        self.offset(0, 1)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the four cardinal movement directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    /// Toward row 0
    Up = 0,
    /// Toward the bottom row
    Down = 1,
    /// Toward column 0
    Left = 2,
    /// Toward the last column
    Right = 3,
}

impl Direction {
    /// All directions, in scan order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit cell offset for this direction.
    #[inline]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Whether this direction moves along the X axis.
    ///
    /// Boulder pushes are only legal horizontally, so the movement
    /// resolver gates on this.
    #[inline]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        f.write_str(name)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_matches_delta() {
        let origin = Point::new(4, 4);
        assert_eq!(origin.step(Direction::Up), Point::new(4, 3));
        assert_eq!(origin.step(Direction::Down), Point::new(4, 5));
        assert_eq!(origin.step(Direction::Left), Point::new(3, 4));
        assert_eq!(origin.step(Direction::Right), Point::new(5, 4));
    }

    #[test]
    fn test_below_is_down() {
        let p = Point::new(2, 7);
        assert_eq!(p.below(), p.step(Direction::Down));
    }

    #[test]
    fn test_horizontal_classification() {
        assert!(Direction::Left.is_horizontal());
        assert!(Direction::Right.is_horizontal());
        assert!(!Direction::Up.is_horizontal());
        assert!(!Direction::Down.is_horizontal());
    }

    #[test]
    fn test_offsets_are_units() {
        for dir in Direction::ALL {
            let (dx, dy) = dir.delta();
            assert_eq!(dx.abs() + dy.abs(), 1);
        }
    }
}
