//! Physics Resolver
//!
//! Two-pass gravity and rolling over all fallable entities, run once per
//! turn after movement. Both passes scan rows bottom-up and columns
//! left-to-right. The scan order is load-bearing: an entity that descends
//! lands in a row that was already processed, so nothing moves twice in one
//! turn.

use crate::core::point::Point;
use crate::game::level::Level;

/// Signals returned to the scheduler after a physics pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhysicsResult {
    /// Did any entity move (for animation purposes)?
    pub moved: bool,
    /// Did a falling entity land on the player this turn?
    pub player_killed: bool,
}

/// Run both physics passes over the level.
pub fn resolve_physics(level: &mut Level) -> PhysicsResult {
    let mut result = PhysicsResult::default();
    gravity_pass(level, &mut result);
    rolling_pass(level, &mut result);
    result
}

/// Pass 1: straight-down gravity.
///
/// Per fallable entity, in scan order:
/// - below out of bounds: come to rest (clear the falling flag);
/// - below holds the player and the entity was already falling: the player
///   dies and the entity stays put;
/// - below free: mark falling and descend one row;
/// - anything else: come to rest.
fn gravity_pass(level: &mut Level, result: &mut PhysicsResult) {
    for y in (0..level.grid.height()).rev() {
        for x in 0..level.grid.width() {
            let at = Point::new(x, y);
            let Some(entity) = level.grid.get(at) else {
                continue;
            };
            if !entity.is_fallable() {
                continue;
            }
            let was_falling = entity.is_falling();
            let below = at.below();

            if !level.grid.in_bounds(below) {
                set_falling(level, at, false);
                continue;
            }

            if level.is_player_at(below) {
                if was_falling {
                    // Impact: only an entity in motion kills.
                    level.player.alive = false;
                    result.player_killed = true;
                } else {
                    set_falling(level, at, false);
                }
                continue;
            }

            if level.grid.is_empty(below) {
                set_falling(level, at, true);
                if level.grid.relocate(at, below) {
                    result.moved = true;
                }
            } else {
                set_falling(level, at, false);
            }
        }
    }
}

/// Pass 2: rolling off round support.
///
/// Only entities that are still resting after pass 1 are candidates, and
/// only when sitting on another fallable, non-falling entity. Right is
/// tried before left; a roll needs both the side cell and the diagonal cell
/// free, which also prevents rolling onto the player. A successful roll is
/// one combined diagonal step and marks the entity falling.
fn rolling_pass(level: &mut Level, result: &mut PhysicsResult) {
    for y in (0..level.grid.height()).rev() {
        for x in 0..level.grid.width() {
            let at = Point::new(x, y);
            let Some(entity) = level.grid.get(at) else {
                continue;
            };
            if !entity.is_fallable() || entity.is_falling() {
                continue;
            }

            let support = level
                .grid
                .get(at.below())
                .is_some_and(|below| below.is_fallable() && !below.is_falling());
            if !support {
                continue;
            }

            // Right first, then left: the fixed tie-break.
            for dx in [1, -1] {
                let side = at.offset(dx, 0);
                let diagonal = at.offset(dx, 1);
                let side_free = level.grid.in_bounds(side) && level.is_free(side);
                let diagonal_free = level.grid.in_bounds(diagonal) && level.is_free(diagonal);
                if side_free && diagonal_free {
                    set_falling(level, at, true);
                    if level.grid.relocate(at, diagonal) {
                        result.moved = true;
                    }
                    break;
                }
            }
        }
    }
}

fn set_falling(level: &mut Level, at: Point, falling: bool) {
    if let Some(entity) = level.grid.get_mut(at) {
        entity.set_falling(falling);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::EntityKind;
    use crate::game::level::Level;

    fn level(rows: &[&str]) -> Level {
        Level::from_layout(rows, 0, 60.0).unwrap()
    }

    fn falling_at(lv: &Level, x: i32, y: i32) -> bool {
        lv.grid.get(Point::new(x, y)).unwrap().is_falling()
    }

    #[test]
    fn test_vertical_shaft_one_row_per_turn() {
        // Boulder at the top of a 1x3 shaft beside the player column.
        let mut lv = level(&["O@", "  ", "  "]);

        let r1 = resolve_physics(&mut lv);
        assert!(r1.moved);
        assert!(lv.grid.is_empty(Point::new(0, 0)));
        assert!(falling_at(&lv, 0, 1));

        let r2 = resolve_physics(&mut lv);
        assert!(r2.moved);
        assert!(falling_at(&lv, 0, 2));

        // Resting on the floor: next pass clears the flag, no movement.
        let r3 = resolve_physics(&mut lv);
        assert!(!r3.moved);
        assert!(!falling_at(&lv, 0, 2));
    }

    #[test]
    fn test_diamond_falls_like_a_boulder() {
        let mut lv = level(&["*@", "  "]);
        resolve_physics(&mut lv);
        let moved = lv.grid.get(Point::new(0, 1)).unwrap();
        assert_eq!(moved.kind, EntityKind::Diamond);
        assert!(moved.is_falling());
    }

    #[test]
    fn test_falling_entity_kills_player_on_impact() {
        // Boulder gains the falling flag on turn 1, lands on the player
        // on turn 2 without moving into the player's cell.
        let mut lv = level(&["O ", "  ", "@ "]);

        let r1 = resolve_physics(&mut lv);
        assert!(r1.moved);
        assert!(!r1.player_killed);

        let r2 = resolve_physics(&mut lv);
        assert!(r2.player_killed);
        assert!(!lv.player.alive);
        // The boulder stayed one row above the player.
        assert_eq!(
            lv.grid.get(Point::new(0, 1)).unwrap().kind,
            EntityKind::Boulder
        );
    }

    #[test]
    fn test_resting_entity_never_kills() {
        // Boulder directly above the player with falling == false.
        let mut lv = level(&["O", "@"]);
        let result = resolve_physics(&mut lv);

        assert!(!result.player_killed);
        assert!(lv.player.alive);
        assert!(!falling_at(&lv, 0, 0));
    }

    #[test]
    fn test_roll_prefers_right_on_symmetric_opportunity() {
        // Upper boulder on a resting one, both sides open.
        let mut lv = level(&[" O @", " O  ", "####"]);

        let result = resolve_physics(&mut lv);
        assert!(result.moved);
        // One combined diagonal step to the right, now falling.
        let rolled = lv.grid.get(Point::new(2, 1)).unwrap();
        assert_eq!(rolled.kind, EntityKind::Boulder);
        assert!(rolled.is_falling());
        assert!(lv.grid.is_empty(Point::new(1, 0)));
    }

    #[test]
    fn test_roll_left_when_right_blocked() {
        let mut lv = level(&[" O#@", " O  ", "####"]);

        resolve_physics(&mut lv);
        let rolled = lv.grid.get(Point::new(0, 1)).unwrap();
        assert_eq!(rolled.kind, EntityKind::Boulder);
        assert!(rolled.is_falling());
    }

    #[test]
    fn test_no_roll_when_both_sides_blocked() {
        let mut lv = level(&["#O#@", "#O# ", "####"]);
        let result = resolve_physics(&mut lv);
        assert!(!result.moved);
        assert_eq!(
            lv.grid.get(Point::new(1, 0)).unwrap().kind,
            EntityKind::Boulder
        );
    }

    #[test]
    fn test_player_occupied_diagonal_prevents_roll() {
        // Right diagonal holds the player, left side is out of bounds:
        // the stack stays put and nobody dies.
        let mut lv = level(&["O ", "O@"]);
        let result = resolve_physics(&mut lv);

        assert!(!result.moved);
        assert!(!result.player_killed);
        assert!(lv.player.alive);
        assert_eq!(
            lv.grid.get(Point::new(0, 0)).unwrap().kind,
            EntityKind::Boulder
        );
    }

    #[test]
    fn test_no_roll_off_non_fallable_support() {
        // Boulder resting on a wall with both sides open: walls are not
        // round, nothing rolls.
        let mut lv = level(&[" O @", " #  ", "####"]);
        let result = resolve_physics(&mut lv);
        assert!(!result.moved);
    }

    #[test]
    fn test_entity_that_fell_does_not_also_roll() {
        // The upper boulder falls one row in pass 1 and lands on the lower
        // one; being marked falling, it must not roll in pass 2 this turn.
        let mut lv = level(&["O  @", "    ", "O   ", "####"]);

        resolve_physics(&mut lv);
        let upper = lv.grid.get(Point::new(0, 1)).unwrap();
        assert_eq!(upper.kind, EntityKind::Boulder);
        assert!(upper.is_falling());
    }

    #[test]
    fn test_single_move_per_turn_in_tall_drop() {
        // Even with many empty rows below, one turn moves an entity exactly
        // one row.
        let mut lv = level(&["O@", "  ", "  ", "  ", "  "]);
        resolve_physics(&mut lv);
        assert_eq!(
            lv.grid.find_all(EntityKind::Boulder),
            vec![Point::new(0, 1)]
        );
    }
}
