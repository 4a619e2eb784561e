//! World query and spawn seams
//!
//! The aim solver and projectiles never own world geometry. They ask a
//! `WorldQuery` for ray casts and sphere overlaps, and a `Spawner` for new
//! projectile entities.
//!
//! ## Layers
//! Every queryable thing sits on one layer bit; queries pass a mask of the
//! layers they care about:
//! - `LAYER_ENVIRONMENT`: static geometry (ground, walls, ledges)
//! - `LAYER_DYNAMIC`: movable props
//! - `LAYER_PAWNS`: characters
//! - `LAYER_PROJECTILES`: thrown projectiles

use glam::{Quat, Vec3};

use super::state::EntityId;

/// Static geometry (ground, walls, ledges)
pub const LAYER_ENVIRONMENT: u32 = 0b0001;
/// Movable props
pub const LAYER_DYNAMIC: u32 = 0b0010;
/// Characters
pub const LAYER_PAWNS: u32 = 0b0100;
/// Thrown projectiles
pub const LAYER_PROJECTILES: u32 = 0b1000;

/// Mask: aim traces (obstacle clamp, landing probes).
///
/// Projectiles are left out so in-flight throws never shorten the range.
pub const MASK_AIM_TRACE: u32 = LAYER_ENVIRONMENT;

/// Mask: lock-on overlap queries
pub const MASK_LOCK_ON: u32 = LAYER_ENVIRONMENT | LAYER_DYNAMIC | LAYER_PAWNS;

/// Mask: projectile sweeps (pass through pawns and other projectiles)
pub const MASK_PROJECTILE_SWEEP: u32 = LAYER_ENVIRONMENT | LAYER_DYNAMIC;

/// Nearest blocking hit of a ray cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Hit location
    pub point: Vec3,
    /// Surface normal at the hit
    pub normal: Vec3,
    /// Distance from the ray start
    pub distance: f32,
    /// Entity hit, if the surface belongs to one
    pub entity: Option<EntityId>,
    /// Layer of the surface hit
    pub layer: u32,
}

/// One entity found by an overlap query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlap {
    pub entity: EntityId,
    pub position: Vec3,
    /// Lock-on priority; `None` means the entity cannot be locked onto
    pub lock_priority: Option<f32>,
}

impl Overlap {
    #[inline]
    pub fn is_lockable(&self) -> bool {
        self.lock_priority.is_some()
    }
}

/// Synchronous spatial queries against the world
pub trait WorldQuery {
    /// Nearest blocking hit on the segment `start..end` among layers in `mask`,
    /// skipping entities in `ignore`.
    fn ray_cast(&self, start: Vec3, end: Vec3, mask: u32, ignore: &[EntityId]) -> Option<RayHit>;

    /// Every entity on a layer in `mask` overlapping the sphere, in a stable order
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: u32) -> Vec<Overlap>;

    /// Current position of an entity, or `None` once it no longer exists
    fn entity_position(&self, id: EntityId) -> Option<Vec3>;
}

/// Instantiates new entities on request
pub trait Spawner {
    /// Spawn an entity of the given archetype, returning its handle
    fn spawn(&mut self, archetype: &str, position: Vec3, orientation: Quat) -> Option<EntityId>;
}

/// Orientation facing along a launch velocity (+X is the entity's forward axis)
pub fn orientation_along(velocity: Vec3) -> Quat {
    match velocity.try_normalize() {
        Some(dir) => Quat::from_rotation_arc(Vec3::X, dir),
        None => Quat::IDENTITY,
    }
}
