//! Deterministic simulation module
//!
//! All aiming and flight logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep and clock only
//! - Stable iteration order (by entity ID)
//! - World access only through `WorldQuery` / `Spawner`
//! - No rendering or platform dependencies

pub mod arc;
pub mod collision;
pub mod lock;
pub mod projectile;
pub mod sdf;
pub mod state;
pub mod tick;

pub use arc::{ArcError, BallisticSolution, LandingProbe, find_landing_point, ground_reticle, solve_launch};
pub use collision::{
    LAYER_DYNAMIC, LAYER_ENVIRONMENT, LAYER_PAWNS, LAYER_PROJECTILES, MASK_AIM_TRACE, MASK_LOCK_ON,
    MASK_PROJECTILE_SWEEP, Overlap, RayHit, Spawner, WorldQuery,
};
pub use lock::ReleaseReason;
pub use projectile::{FlightPhase, Landing, Projectile};
pub use sdf::{SdfWorld, Shape, WorldEntity};
pub use state::{AimState, EntityId, ThrowerPose};
pub use tick::{AimEvent, AimMode, AimSolver, LockCommand, ThrowError, TickInput};
