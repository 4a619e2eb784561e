//! Per-entity aim state and the pose handed in each tick
//!
//! All state that must survive between ticks for one thrower lives in
//! `AimState`; nothing here is global.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::arc::BallisticSolution;
use crate::facing_basis;

/// Weak handle to an entity owned by the actor collaborator.
///
/// Holding an id never keeps the entity alive; existence is re-checked through
/// the world query every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Where the thrower is this tick, as reported by the actor collaborator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrowerPose {
    pub id: EntityId,
    /// Actor root location (lock ranges are measured from here)
    pub position: Vec3,
    /// Actor facing (flattened onto the ground plane before use)
    pub forward: Vec3,
    /// Collision capsule center, origin of all aim traces
    pub capsule_center: Option<Vec3>,
    /// Hand/throw socket, where projectiles spawn
    pub throw_socket: Option<Vec3>,
}

impl ThrowerPose {
    /// Origin of aim traces: the capsule center, or the actor root without one
    #[inline]
    pub fn trace_origin(&self) -> Vec3 {
        self.capsule_center.unwrap_or(self.position)
    }

    /// Origin of the landing traces: the capsule center, else the throw socket,
    /// else the actor root
    #[inline]
    pub fn landing_trace_origin(&self) -> Vec3 {
        self.capsule_center.or(self.throw_socket).unwrap_or(self.position)
    }
}

/// Aim state for one controlled entity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AimState {
    /// Latest stick deflection, clamped to the unit circle
    pub raw_input: Vec2,
    /// Smoothed world-space aim direction (unit, on the ground plane)
    pub smoothed_direction: Vec3,
    /// Smoothed target distance, always within [0, max_trace_distance]
    pub effective_range: f32,
    /// Last successfully resolved throw; never overwritten by a failed solve
    pub last_solution: Option<BallisticSolution>,
    /// Manually locked target
    pub locked_target: Option<EntityId>,
    /// Advisory nearest lockable entity around the aim point
    pub soft_lock_target: Option<EntityId>,
    initialized: bool,
}

impl AimState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the one-time initialization from the thrower's facing has run
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Seed direction and range from the thrower on the first tick
    pub fn initialize(&mut self, pose: &ThrowerPose) {
        let (forward, _) = facing_basis(pose.forward);
        self.smoothed_direction = forward;
        self.effective_range = 0.0;
        self.last_solution = None;
        self.initialized = true;
    }

    /// Current aim point (landing point of the cached solution)
    #[inline]
    pub fn aim_point(&self) -> Option<Vec3> {
        self.last_solution.map(|s| s.landing_point)
    }

    /// Clear the manual lock, returning what was held
    #[inline]
    pub fn take_locked_target(&mut self) -> Option<EntityId> {
        self.locked_target.take()
    }
}
