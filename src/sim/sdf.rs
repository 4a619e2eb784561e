//! SDF-backed reference world
//!
//! Signed distance fields for the static arena plus sphere bodies for
//! entities. Ray casts are sphere-traced; overlaps are sphere/sphere tests.
//! Used by the tests and the demo harness as the world-query collaborator.

use glam::{Quat, Vec3};

use super::collision::{LAYER_ENVIRONMENT, LAYER_PROJECTILES, Overlap, RayHit, Spawner, WorldQuery};
use super::state::EntityId;

/// Distance below which a ray is considered touching a surface
pub const SURFACE_EPSILON: f32 = 0.01;
/// Smallest sphere-tracing step
const MIN_STEP: f32 = SURFACE_EPSILON * 0.5;
/// Sphere-tracing step budget per ray
const MAX_STEPS: usize = 256;

/// Signed distance to a sphere
#[inline]
pub fn sd_sphere(p: Vec3, center: Vec3, radius: f32) -> f32 {
    (p - center).length() - radius
}

/// Signed distance to an axis-aligned box
#[inline]
pub fn sd_box(p: Vec3, center: Vec3, half_extents: Vec3) -> f32 {
    let q = (p - center).abs() - half_extents;
    q.max(Vec3::ZERO).length() + q.max_element().min(0.0)
}

/// Signed distance to the half-space below `height` (infinite ground)
#[inline]
pub fn sd_ground(p: Vec3, height: f32) -> f32 {
    p.z - height
}

/// Compute SDF gradient (surface normal) using central differences
pub fn sdf_gradient<F>(p: Vec3, sdf: F) -> Vec3
where
    F: Fn(Vec3) -> f32,
{
    let eps = 0.05;
    let dx = sdf(p + Vec3::X * eps) - sdf(p - Vec3::X * eps);
    let dy = sdf(p + Vec3::Y * eps) - sdf(p - Vec3::Y * eps);
    let dz = sdf(p + Vec3::Z * eps) - sdf(p - Vec3::Z * eps);
    Vec3::new(dx, dy, dz).normalize_or_zero()
}

/// Sphere-trace the segment `start..end`.
///
/// Returns the distance along the segment of the first point closer than
/// `SURFACE_EPSILON` to a surface. A start point already inside geometry hits
/// at distance zero.
pub fn raymarch<F>(start: Vec3, end: Vec3, max_steps: usize, sdf: F) -> Option<f32>
where
    F: Fn(Vec3) -> f32,
{
    let dir = end - start;
    let total_dist = dir.length();
    if total_dist < 0.001 {
        return (sdf(start) < SURFACE_EPSILON).then_some(0.0);
    }
    let dir_norm = dir / total_dist;

    let mut t = 0.0_f32;
    for _ in 0..max_steps {
        let t_eval = t.min(total_dist);
        let d = sdf(start + dir_norm * t_eval);
        if d < SURFACE_EPSILON {
            return Some(t_eval);
        }
        if t >= total_dist {
            break;
        }
        t += d.max(MIN_STEP);
    }

    None
}

/// Static arena geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Infinite ground whose top surface is at `height`
    Ground { height: f32 },
    Box { center: Vec3, half_extents: Vec3 },
    Sphere { center: Vec3, radius: f32 },
}

impl Shape {
    #[inline]
    pub fn distance(&self, p: Vec3) -> f32 {
        match *self {
            Shape::Ground { height } => sd_ground(p, height),
            Shape::Box {
                center,
                half_extents,
            } => sd_box(p, center, half_extents),
            Shape::Sphere { center, radius } => sd_sphere(p, center, radius),
        }
    }
}

/// A dynamic entity modelled as a sphere body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldEntity {
    pub id: EntityId,
    pub position: Vec3,
    pub radius: f32,
    pub layer: u32,
    /// Lock-on priority; `None` if the entity is not lockable
    pub lock_priority: Option<f32>,
}

/// Which surface a scene distance came from
#[derive(Debug, Clone, Copy)]
struct Surface {
    entity: Option<EntityId>,
    layer: u32,
}

/// Static SDF arena plus sphere entities
#[derive(Debug, Clone)]
pub struct SdfWorld {
    statics: Vec<Shape>,
    /// Sorted by id for deterministic query order
    entities: Vec<WorldEntity>,
    /// Body radius given to spawned projectiles
    pub projectile_radius: f32,
    next_id: u32,
}

impl Default for SdfWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SdfWorld {
    pub fn new() -> Self {
        Self {
            statics: Vec::new(),
            entities: Vec::new(),
            projectile_radius: 5.0,
            next_id: 1000,
        }
    }

    /// World with flat ground at `height`
    pub fn with_ground(height: f32) -> Self {
        let mut world = Self::new();
        world.add_shape(Shape::Ground { height });
        world
    }

    pub fn add_shape(&mut self, shape: Shape) {
        self.statics.push(shape);
    }

    /// Add (or replace) an entity body
    pub fn add_entity(&mut self, entity: WorldEntity) {
        self.entities.retain(|e| e.id != entity.id);
        self.entities.push(entity);
        self.entities.sort_by_key(|e| e.id);
        self.next_id = self.next_id.max(entity.id.0 + 1);
    }

    /// Remove an entity, returning whether it existed
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        let before = self.entities.len();
        self.entities.retain(|e| e.id != id);
        self.entities.len() != before
    }

    /// Move an entity, returning whether it exists
    pub fn set_entity_position(&mut self, id: EntityId, position: Vec3) -> bool {
        match self.entities.iter_mut().find(|e| e.id == id) {
            Some(entity) => {
                entity.position = position;
                true
            }
            None => false,
        }
    }

    pub fn entities(&self) -> &[WorldEntity] {
        &self.entities
    }

    /// Closest surface among the queried layers
    fn scene_distance(&self, p: Vec3, mask: u32, ignore: &[EntityId]) -> (f32, Option<Surface>) {
        let mut best = f32::MAX;
        let mut surface = None;

        if mask & LAYER_ENVIRONMENT != 0 {
            for shape in &self.statics {
                let d = shape.distance(p);
                if d < best {
                    best = d;
                    surface = Some(Surface {
                        entity: None,
                        layer: LAYER_ENVIRONMENT,
                    });
                }
            }
        }

        for entity in &self.entities {
            if entity.layer & mask == 0 || ignore.contains(&entity.id) {
                continue;
            }
            let d = sd_sphere(p, entity.position, entity.radius);
            if d < best {
                best = d;
                surface = Some(Surface {
                    entity: Some(entity.id),
                    layer: entity.layer,
                });
            }
        }

        (best, surface)
    }
}

impl WorldQuery for SdfWorld {
    fn ray_cast(&self, start: Vec3, end: Vec3, mask: u32, ignore: &[EntityId]) -> Option<RayHit> {
        let sdf = |p: Vec3| self.scene_distance(p, mask, ignore).0;
        let distance = raymarch(start, end, MAX_STEPS, sdf)?;

        let dir = (end - start).normalize_or_zero();
        let point = start + dir * distance;
        let (_, surface) = self.scene_distance(point, mask, ignore);
        let surface = surface?;

        Some(RayHit {
            point,
            normal: sdf_gradient(point, sdf),
            distance,
            entity: surface.entity,
            layer: surface.layer,
        })
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: u32) -> Vec<Overlap> {
        self.entities
            .iter()
            .filter(|e| e.layer & mask != 0)
            .filter(|e| (e.position - center).length() <= radius + e.radius)
            .map(|e| Overlap {
                entity: e.id,
                position: e.position,
                lock_priority: e.lock_priority,
            })
            .collect()
    }

    fn entity_position(&self, id: EntityId) -> Option<Vec3> {
        self.entities.iter().find(|e| e.id == id).map(|e| e.position)
    }
}

impl Spawner for SdfWorld {
    fn spawn(&mut self, archetype: &str, position: Vec3, _orientation: Quat) -> Option<EntityId> {
        let id = EntityId(self.next_id);
        self.add_entity(WorldEntity {
            id,
            position,
            radius: self.projectile_radius,
            layer: LAYER_PROJECTILES,
            lock_priority: None,
        });
        log::trace!("Spawned {archetype} as {id:?} at {position}");
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::{LAYER_PAWNS, MASK_AIM_TRACE};

    #[test]
    fn test_sd_box() {
        let half = Vec3::splat(10.0);
        assert!((sd_box(Vec3::new(15.0, 0.0, 0.0), Vec3::ZERO, half) - 5.0).abs() < 1e-5);
        assert!(sd_box(Vec3::ZERO, Vec3::ZERO, half) < 0.0);
    }

    #[test]
    fn test_ray_hits_ground() {
        let world = SdfWorld::with_ground(0.0);
        let hit = world
            .ray_cast(Vec3::new(10.0, 20.0, 100.0), Vec3::new(10.0, 20.0, -100.0), MASK_AIM_TRACE, &[])
            .expect("ground hit");
        assert!(hit.point.z.abs() < 0.02);
        assert!((hit.distance - 100.0).abs() < 0.02);
        assert!((hit.normal - Vec3::Z).length() < 1e-3);
        assert!(hit.entity.is_none());
    }

    #[test]
    fn test_ray_hits_wall() {
        let mut world = SdfWorld::with_ground(0.0);
        world.add_shape(Shape::Box {
            center: Vec3::new(350.0, 0.0, 100.0),
            half_extents: Vec3::new(50.0, 500.0, 100.0),
        });
        let hit = world
            .ray_cast(Vec3::new(0.0, 0.0, 90.0), Vec3::new(1500.0, 0.0, 90.0), MASK_AIM_TRACE, &[])
            .expect("wall hit");
        assert!((hit.point.x - 300.0).abs() < 0.02);
        assert!((hit.normal - Vec3::NEG_X).length() < 1e-3);
    }

    #[test]
    fn test_ray_respects_mask_and_ignore() {
        let mut world = SdfWorld::new();
        world.add_entity(WorldEntity {
            id: EntityId(7),
            position: Vec3::new(100.0, 0.0, 0.0),
            radius: 10.0,
            layer: LAYER_PAWNS,
            lock_priority: Some(1.0),
        });
        let start = Vec3::ZERO;
        let end = Vec3::new(200.0, 0.0, 0.0);

        assert!(world.ray_cast(start, end, MASK_AIM_TRACE, &[]).is_none());
        let hit = world.ray_cast(start, end, LAYER_PAWNS, &[]).expect("pawn hit");
        assert_eq!(hit.entity, Some(EntityId(7)));
        assert!(world.ray_cast(start, end, LAYER_PAWNS, &[EntityId(7)]).is_none());
    }

    #[test]
    fn test_ray_miss_short_segment() {
        let world = SdfWorld::with_ground(0.0);
        assert!(world.ray_cast(Vec3::new(0.0, 0.0, 100.0), Vec3::new(0.0, 0.0, 50.0), MASK_AIM_TRACE, &[]).is_none());
    }

    #[test]
    fn test_overlap_sorted_and_masked() {
        let mut world = SdfWorld::new();
        for (id, x, layer) in [(5, 50.0, LAYER_PAWNS), (2, 20.0, LAYER_PAWNS), (9, 10.0, LAYER_PROJECTILES)] {
            world.add_entity(WorldEntity {
                id: EntityId(id),
                position: Vec3::new(x, 0.0, 0.0),
                radius: 1.0,
                layer,
                lock_priority: None,
            });
        }
        let hits = world.overlap_sphere(Vec3::ZERO, 100.0, LAYER_PAWNS);
        let ids: Vec<_> = hits.iter().map(|o| o.entity).collect();
        assert_eq!(ids, vec![EntityId(2), EntityId(5)]);
    }

    #[test]
    fn test_spawn_and_remove() {
        let mut world = SdfWorld::new();
        let id = world.spawn("rock", Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY).expect("spawned");
        assert_eq!(world.entity_position(id), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert!(world.set_entity_position(id, Vec3::ZERO));
        assert!(world.remove_entity(id));
        assert!(world.entity_position(id).is_none());
        assert!(!world.set_entity_position(id, Vec3::ZERO));
    }
}
