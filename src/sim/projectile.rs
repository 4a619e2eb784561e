//! Thrown projectile flight
//!
//! Position is a closed-form function of simulated time since spawn, so the
//! path is identical at any tick rate. Each advance sweeps from the previous
//! position to the new one; the first blocking hit pins the projectile there
//! for good.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::arc::BallisticSolution;
use super::collision::{MASK_PROJECTILE_SWEEP, WorldQuery};
use super::state::EntityId;

/// Flight state machine: `Flying -> Landed`, never back
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FlightPhase {
    Flying,
    Landed(Landing),
}

/// Where and when a projectile came to rest
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landing {
    pub point: Vec3,
    pub normal: Vec3,
    /// Entity the projectile landed on, if any
    pub entity: Option<EntityId>,
    /// Simulation clock at impact
    pub time: f32,
}

/// A launched projectile and its analytic trajectory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    /// Thrower; ignored by the collision sweep
    pub owner: Option<EntityId>,
    pub origin: Vec3,
    pub launch_velocity: Vec3,
    /// World gravity magnitude (before scaling)
    pub world_gravity: f32,
    pub gravity_scale: f32,
    /// >1 = faster flight along the same arc
    pub time_scale: f32,
    /// Simulation clock at spawn
    pub spawn_time: f32,
    position: Vec3,
    phase: FlightPhase,
}

impl Projectile {
    /// Start a projectile at `spawn_point`, stamped with the current clock
    #[allow(clippy::too_many_arguments)]
    pub fn init(
        id: EntityId,
        owner: Option<EntityId>,
        spawn_point: Vec3,
        launch_velocity: Vec3,
        world_gravity: f32,
        gravity_scale: f32,
        time_scale: f32,
        now: f32,
    ) -> Self {
        Self {
            id,
            owner,
            origin: spawn_point,
            launch_velocity,
            world_gravity,
            gravity_scale,
            time_scale,
            spawn_time: now,
            position: spawn_point,
            phase: FlightPhase::Flying,
        }
    }

    /// Start a projectile along a resolved throw
    pub fn from_solution(
        id: EntityId,
        owner: Option<EntityId>,
        solution: &BallisticSolution,
        world_gravity: f32,
        gravity_scale: f32,
        time_scale: f32,
        now: f32,
    ) -> Self {
        Self::init(
            id,
            owner,
            solution.start,
            solution.velocity,
            world_gravity,
            gravity_scale,
            time_scale,
            now,
        )
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn phase(&self) -> FlightPhase {
        self.phase
    }

    #[inline]
    pub fn is_landed(&self) -> bool {
        matches!(self.phase, FlightPhase::Landed(_))
    }

    /// Gravity acceleration acting on this projectile
    #[inline]
    pub fn gravity(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, -self.world_gravity * self.gravity_scale)
    }

    /// Analytic position at clock `now`, ignoring collisions
    pub fn position_at(&self, now: f32) -> Vec3 {
        let t = ((now - self.spawn_time) * self.time_scale).max(0.0);
        self.origin + self.launch_velocity * t + 0.5 * self.gravity() * t * t
    }

    /// Move to the analytic position at `now`, sweeping for a blocking hit.
    ///
    /// Returns the landing on the tick it happens. Once landed this is a no-op.
    pub fn advance(&mut self, now: f32, world: &impl WorldQuery) -> Option<Landing> {
        if self.is_landed() {
            return None;
        }

        let next = self.position_at(now);
        let ignore: Vec<EntityId> = std::iter::once(self.id).chain(self.owner).collect();

        match world.ray_cast(self.position, next, MASK_PROJECTILE_SWEEP, &ignore) {
            Some(hit) => {
                let landing = Landing {
                    point: hit.point,
                    normal: hit.normal,
                    entity: hit.entity,
                    time: now,
                };
                self.position = hit.point;
                self.phase = FlightPhase::Landed(landing);
                log::debug!("Projectile {:?} landed at {} (t={:.3})", self.id, hit.point, now);
                Some(landing)
            }
            None => {
                self.position = next;
                None
            }
        }
    }
}
