//! Grid Store
//!
//! Bounded 2D cell array and exclusive owner of world entity placement.
//! Every coordinate operation fails closed on out-of-bounds input: bounds
//! violations are an expected part of rule evaluation, not an error.

use serde::{Serialize, Deserialize};

use crate::core::point::Point;
use crate::game::entity::{Entity, EntityKind};

/// Rectangular store of at most one entity per cell.
///
/// Invariants:
/// - a cell holds at most one entity;
/// - a stored entity's `position` equals the coordinate of its cell;
/// - `relocate` is atomic: the source clears and the destination fills in
///   one step, with no observable intermediate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Option<Entity>>,
}

impl Grid {
    /// Create an empty grid of `width` x `height` cells.
    pub fn new(width: i32, height: i32) -> Self {
        let cell_count = (width.max(0) as usize) * (height.max(0) as usize);
        Self {
            width: width.max(0),
            height: height.max(0),
            cells: vec![None; cell_count],
        }
    }

    /// Grid width in cells.
    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Grid height in cells.
    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Whether `point` lies within [0,width) x [0,height).
    #[inline]
    pub fn in_bounds(&self, point: Point) -> bool {
        point.x >= 0 && point.x < self.width && point.y >= 0 && point.y < self.height
    }

    #[inline]
    fn index(&self, point: Point) -> Option<usize> {
        if self.in_bounds(point) {
            Some((point.y * self.width + point.x) as usize)
        } else {
            None
        }
    }

    /// Entity at `point`, if any. Out-of-bounds reads return `None`.
    pub fn get(&self, point: Point) -> Option<&Entity> {
        self.index(point).and_then(|i| self.cells[i].as_ref())
    }

    /// Mutable entity at `point`, if any.
    pub fn get_mut(&mut self, point: Point) -> Option<&mut Entity> {
        self.index(point).and_then(|i| self.cells[i].as_mut())
    }

    /// Whether `point` is in bounds and holds no entity.
    pub fn is_empty(&self, point: Point) -> bool {
        self.index(point).is_some_and(|i| self.cells[i].is_none())
    }

    /// Place `entity` at `point`, replacing any occupant.
    ///
    /// The stored entity's coordinates are updated to `point`. Returns
    /// `false` (and drops nothing) on out-of-bounds input.
    pub fn set(&mut self, point: Point, entity: Option<Entity>) -> bool {
        let Some(i) = self.index(point) else {
            return false;
        };
        self.cells[i] = entity.map(|mut e| {
            e.position = point;
            e
        });
        true
    }

    /// Remove and return the entity at `point`.
    pub fn remove(&mut self, point: Point) -> Option<Entity> {
        self.index(point).and_then(|i| self.cells[i].take())
    }

    /// Atomically move the entity at `src` to `dst`.
    ///
    /// Fails (returning `false`, touching nothing) when `src` is empty,
    /// either coordinate is out of bounds, or `dst` holds a solid entity.
    /// The moved entity's coordinates are updated and its animation flag
    /// set for presentation interpolation.
    pub fn relocate(&mut self, src: Point, dst: Point) -> bool {
        let (Some(src_i), Some(dst_i)) = (self.index(src), self.index(dst)) else {
            return false;
        };
        if self.cells[dst_i].as_ref().is_some_and(|e| e.is_solid()) {
            return false;
        }
        let Some(mut entity) = self.cells[src_i].take() else {
            return false;
        };

        entity.relocated(dst);
        self.cells[dst_i] = Some(entity);
        true
    }

    /// First entity of `kind` in scan order (row-major, top-left first).
    pub fn find_first(&self, kind: EntityKind) -> Option<&Entity> {
        self.cells
            .iter()
            .flatten()
            .find(|entity| entity.kind == kind)
    }

    /// Positions of all entities of `kind`, in scan order.
    pub fn find_all(&self, kind: EntityKind) -> Vec<Point> {
        self.cells
            .iter()
            .flatten()
            .filter(|entity| entity.kind == kind)
            .map(|entity| entity.position)
            .collect()
    }

    /// Iterate all stored entities in scan order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.cells.iter().flatten()
    }

    /// Reset every entity's interpolation baseline at a turn boundary.
    pub fn begin_turn(&mut self) {
        for entity in self.cells.iter_mut().flatten() {
            entity.begin_turn();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn boulder_at(x: i32, y: i32) -> Entity {
        Entity::new(EntityKind::Boulder, Point::new(x, y))
    }

    #[test]
    fn test_out_of_bounds_fails_closed() {
        let mut grid = Grid::new(4, 4);
        let outside = Point::new(4, 0);

        assert!(grid.get(outside).is_none());
        assert!(!grid.set(outside, Some(boulder_at(4, 0))));
        assert!(grid.remove(outside).is_none());
        assert!(!grid.relocate(Point::new(0, 0), outside));
        assert!(!grid.relocate(outside, Point::new(0, 0)));
        assert!(!grid.is_empty(outside));
    }

    #[test]
    fn test_set_updates_entity_coordinates() {
        let mut grid = Grid::new(4, 4);
        // Entity carries stale coordinates; set corrects them.
        assert!(grid.set(Point::new(2, 3), Some(boulder_at(0, 0))));
        assert_eq!(grid.get(Point::new(2, 3)).unwrap().position, Point::new(2, 3));
    }

    #[test]
    fn test_relocate_is_atomic() {
        let mut grid = Grid::new(4, 4);
        grid.set(Point::new(1, 1), Some(boulder_at(1, 1)));

        assert!(grid.relocate(Point::new(1, 1), Point::new(2, 1)));
        assert!(grid.get(Point::new(1, 1)).is_none());
        let moved = grid.get(Point::new(2, 1)).unwrap();
        assert_eq!(moved.position, Point::new(2, 1));
        assert!(moved.animating);
    }

    #[test]
    fn test_relocate_refuses_solid_destination() {
        let mut grid = Grid::new(4, 4);
        grid.set(Point::new(0, 0), Some(boulder_at(0, 0)));
        grid.set(Point::new(1, 0), Some(Entity::new(EntityKind::Wall, Point::new(1, 0))));

        assert!(!grid.relocate(Point::new(0, 0), Point::new(1, 0)));
        assert_eq!(grid.get(Point::new(0, 0)).unwrap().kind, EntityKind::Boulder);
        assert_eq!(grid.get(Point::new(1, 0)).unwrap().kind, EntityKind::Wall);
    }

    #[test]
    fn test_relocate_from_empty_source_fails() {
        let mut grid = Grid::new(4, 4);
        assert!(!grid.relocate(Point::new(0, 0), Point::new(1, 0)));
    }

    #[test]
    fn test_find_first_and_all_scan_order() {
        let mut grid = Grid::new(3, 3);
        grid.set(Point::new(2, 0), Some(Entity::new(EntityKind::Diamond, Point::ZERO)));
        grid.set(Point::new(0, 2), Some(Entity::new(EntityKind::Diamond, Point::ZERO)));
        grid.set(Point::new(1, 1), Some(boulder_at(1, 1)));

        assert_eq!(
            grid.find_first(EntityKind::Diamond).unwrap().position,
            Point::new(2, 0)
        );
        assert_eq!(
            grid.find_all(EntityKind::Diamond),
            vec![Point::new(2, 0), Point::new(0, 2)]
        );
        assert!(grid.find_first(EntityKind::Exit).is_none());
    }

    proptest! {
        /// Single occupancy: every stored entity's position matches its cell,
        /// and stays in bounds, under arbitrary set/remove/relocate traffic.
        #[test]
        fn prop_occupancy_and_bounds(ops in proptest::collection::vec(
            (0u8..3, -1i32..6, -1i32..6, -1i32..6, -1i32..6), 0..64,
        )) {
            let mut grid = Grid::new(5, 5);
            for (op, x1, y1, x2, y2) in ops {
                let a = Point::new(x1, y1);
                let b = Point::new(x2, y2);
                match op {
                    0 => { grid.set(a, Some(boulder_at(x1, y1))); }
                    1 => { grid.remove(a); }
                    _ => { grid.relocate(a, b); }
                }

                for y in 0..grid.height() {
                    for x in 0..grid.width() {
                        let cell = Point::new(x, y);
                        if let Some(entity) = grid.get(cell) {
                            prop_assert_eq!(entity.position, cell);
                            prop_assert!(grid.in_bounds(entity.position));
                        }
                    }
                }
            }
        }
    }
}
