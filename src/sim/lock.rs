//! Lock-on target selection
//!
//! Soft lock: nearest lockable entity around the aim point, recomputed every
//! tick while no manual lock is held. Manual lock: best `priority / distance`
//! around the thrower, sticky until released or out of range.

use glam::Vec3;

use super::collision::{MASK_LOCK_ON, WorldQuery};
use super::state::EntityId;
use crate::consts::KINDA_SMALL_NUMBER;

/// Why a manual lock ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseReason {
    /// Explicit release (or toggle) from the player
    Manual,
    /// Target moved beyond the manual lock range
    OutOfRange,
    /// Target entity no longer exists
    Despawned,
}

/// Nearest lockable entity strictly within `radius` of `aim_point`.
///
/// Ties keep the first candidate in query order.
pub fn soft_lock_candidate(
    world: &impl WorldQuery,
    aim_point: Vec3,
    radius: f32,
    exclude: EntityId,
) -> Option<EntityId> {
    let mut best = None;
    let mut best_dist = radius;

    for candidate in world.overlap_sphere(aim_point, radius, MASK_LOCK_ON) {
        if candidate.entity == exclude || !candidate.is_lockable() {
            continue;
        }
        let dist = (candidate.position - aim_point).length();
        if dist < best_dist {
            best_dist = dist;
            best = Some(candidate.entity);
        }
    }

    best
}

/// Highest-scoring lockable entity whose center is within `range` of `origin`.
///
/// Score is `priority / distance`: higher priority and closer both win. Ties
/// keep the first candidate in query order.
pub fn manual_lock_candidate(
    world: &impl WorldQuery,
    origin: Vec3,
    range: f32,
    exclude: EntityId,
) -> Option<EntityId> {
    let mut best = None;
    let mut best_score = f32::NEG_INFINITY;

    for candidate in world.overlap_sphere(origin, range, MASK_LOCK_ON) {
        if candidate.entity == exclude {
            continue;
        }
        let Some(priority) = candidate.lock_priority else {
            continue;
        };
        let dist = (candidate.position - origin).length();
        if dist > range {
            continue;
        }
        let score = priority / dist.max(KINDA_SMALL_NUMBER);
        if score > best_score {
            best_score = score;
            best = Some(candidate.entity);
        }
    }

    best
}

/// Whether a held lock survives this tick; `Err` carries the reason it ends
pub fn check_lock(
    world: &impl WorldQuery,
    origin: Vec3,
    target: EntityId,
    range: f32,
) -> Result<(), ReleaseReason> {
    let position = world.entity_position(target).ok_or(ReleaseReason::Despawned)?;
    if (position - origin).length() > range {
        return Err(ReleaseReason::OutOfRange);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::{LAYER_PAWNS, LAYER_PROJECTILES};
    use crate::sim::sdf::{SdfWorld, WorldEntity};

    fn pawn(id: u32, position: Vec3, priority: Option<f32>) -> WorldEntity {
        WorldEntity {
            id: EntityId(id),
            position,
            radius: 30.0,
            layer: LAYER_PAWNS,
            lock_priority: priority,
        }
    }

    #[test]
    fn test_soft_lock_picks_nearest_lockable() {
        let mut world = SdfWorld::new();
        world.add_entity(pawn(1, Vec3::ZERO, Some(1.0)));
        world.add_entity(pawn(2, Vec3::new(500.0, 50.0, 0.0), Some(1.0)));
        world.add_entity(pawn(3, Vec3::new(500.0, -20.0, 0.0), None));
        world.add_entity(pawn(4, Vec3::new(500.0, 120.0, 0.0), Some(5.0)));

        let aim = Vec3::new(500.0, 0.0, 0.0);
        assert_eq!(soft_lock_candidate(&world, aim, 300.0, EntityId(1)), Some(EntityId(2)));
    }

    #[test]
    fn test_soft_lock_strictly_within_radius() {
        let mut world = SdfWorld::new();
        // Body overlaps the sphere but the center is outside the radius
        world.add_entity(pawn(2, Vec3::new(310.0, 0.0, 0.0), Some(1.0)));
        assert_eq!(soft_lock_candidate(&world, Vec3::ZERO, 300.0, EntityId(1)), None);
    }

    #[test]
    fn test_soft_lock_tie_keeps_query_order() {
        let mut world = SdfWorld::new();
        world.add_entity(pawn(8, Vec3::new(0.0, 100.0, 0.0), Some(1.0)));
        world.add_entity(pawn(6, Vec3::new(0.0, -100.0, 0.0), Some(1.0)));
        assert_eq!(soft_lock_candidate(&world, Vec3::ZERO, 300.0, EntityId(1)), Some(EntityId(6)));
    }

    #[test]
    fn test_manual_lock_scores_priority_over_distance() {
        let mut world = SdfWorld::new();
        world.add_entity(pawn(2, Vec3::new(200.0, 0.0, 0.0), Some(1.0))); // 0.005
        world.add_entity(pawn(3, Vec3::new(600.0, 0.0, 0.0), Some(6.0))); // 0.01
        world.add_entity(pawn(4, Vec3::new(100.0, 0.0, 0.0), None));
        world.add_entity(WorldEntity {
            layer: LAYER_PROJECTILES,
            ..pawn(5, Vec3::new(10.0, 0.0, 0.0), Some(100.0))
        });

        assert_eq!(manual_lock_candidate(&world, Vec3::ZERO, 2000.0, EntityId(1)), Some(EntityId(3)));
        assert_eq!(manual_lock_candidate(&world, Vec3::ZERO, 300.0, EntityId(1)), Some(EntityId(2)));
        assert_eq!(manual_lock_candidate(&world, Vec3::ZERO, 50.0, EntityId(1)), None);
    }

    #[test]
    fn test_manual_lock_measures_to_center() {
        let mut world = SdfWorld::new();
        // Body overlaps the range but the center is past it
        world.add_entity(pawn(2, Vec3::new(2020.0, 0.0, 0.0), Some(100.0)));
        world.add_entity(pawn(3, Vec3::new(1500.0, 0.0, 0.0), Some(1.0)));
        assert_eq!(manual_lock_candidate(&world, Vec3::ZERO, 2000.0, EntityId(1)), Some(EntityId(3)));

        world.remove_entity(EntityId(3));
        assert_eq!(manual_lock_candidate(&world, Vec3::ZERO, 2000.0, EntityId(1)), None);
    }

    #[test]
    fn test_manual_lock_skips_self() {
        let mut world = SdfWorld::new();
        world.add_entity(pawn(1, Vec3::ZERO, Some(1.0)));
        assert_eq!(manual_lock_candidate(&world, Vec3::ZERO, 2000.0, EntityId(1)), None);
    }

    #[test]
    fn test_check_lock() {
        let mut world = SdfWorld::new();
        world.add_entity(pawn(2, Vec3::new(500.0, 0.0, 0.0), Some(1.0)));

        assert_eq!(check_lock(&world, Vec3::ZERO, EntityId(2), 2000.0), Ok(()));
        assert_eq!(check_lock(&world, Vec3::ZERO, EntityId(2), 400.0), Err(ReleaseReason::OutOfRange));
        world.remove_entity(EntityId(2));
        assert_eq!(check_lock(&world, Vec3::ZERO, EntityId(2), 2000.0), Err(ReleaseReason::Despawned));
    }
}
