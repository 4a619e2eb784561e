//! Per-tick aim update
//!
//! Turns stick input into a continuously valid throw: smooth direction and
//! range, clamp the range against walls, resolve the arc, maintain lock-on.

use glam::{Vec2, Vec3};

use super::arc::{ArcError, BallisticSolution, LandingProbe, find_landing_point, solve_launch};
use super::collision::{MASK_AIM_TRACE, Spawner, WorldQuery, orientation_along};
use super::lock::{ReleaseReason, check_lock, manual_lock_candidate, soft_lock_candidate};
use super::projectile::Projectile;
use super::state::{AimState, EntityId, ThrowerPose};
use crate::tuning::AimTuning;
use crate::{facing_basis, interp_to, length_2d, rotate_toward, yaw_basis};

/// Lock-on command for a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockCommand {
    /// Lock onto the best candidate (no-op while a lock is held)
    Acquire,
    /// Drop the held lock
    Release,
    /// Release if locked, acquire otherwise
    Toggle,
}

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Stick deflection, each axis in [-1, 1]
    pub stick: Vec2,
    /// View yaw (radians) the stick is relative to; `None` uses the thrower's facing
    pub view_yaw: Option<f32>,
    pub lock: Option<LockCommand>,
}

/// What the stick did this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AimMode {
    /// Outside the dead zone: steer and extend
    Aiming,
    /// Inside the pull band and opposed to the aim: retract the range
    Retracting,
    /// Nothing to do; the cached throw is held as-is
    Idle,
}

/// Notable outcomes of one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AimEvent {
    SolutionUpdated(BallisticSolution),
    /// The solve failed; the previous solution is still cached
    SolutionRejected(ArcError),
    LockAcquired(EntityId),
    LockReleased { target: EntityId, reason: ReleaseReason },
    SoftLockChanged(Option<EntityId>),
}

/// Why a throw did not happen
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThrowError {
    #[error(transparent)]
    Arc(#[from] ArcError),
    #[error("spawner refused archetype `{archetype}`")]
    SpawnFailed { archetype: String },
}

/// Stateless solver; all per-entity state lives in the `AimState` passed in
#[derive(Debug, Clone, Default)]
pub struct AimSolver {
    pub tuning: AimTuning,
}

impl AimSolver {
    pub fn new(tuning: AimTuning) -> Self {
        Self { tuning }
    }

    /// Advance one thrower's aim by one tick
    pub fn update(
        &self,
        state: &mut AimState,
        pose: &ThrowerPose,
        input: &TickInput,
        dt: f32,
        world: &impl WorldQuery,
    ) -> Vec<AimEvent> {
        let mut events = Vec::new();

        if !state.is_initialized() {
            state.initialize(pose);
        }

        state.raw_input = input.stick.clamp_length_max(1.0);
        let mode = self.steer(state, pose, input, dt);

        if mode != AimMode::Idle {
            self.clamp_to_walls(state, pose, world);
            match self.resolve_arc(state, pose, world) {
                Ok(solution) => {
                    state.last_solution = Some(solution);
                    log::trace!("Throw resolved: {solution:?}");
                    events.push(AimEvent::SolutionUpdated(solution));
                }
                Err(err) => {
                    log::debug!("Keeping cached throw: {err}");
                    events.push(AimEvent::SolutionRejected(err));
                }
            }
        }

        if let Some(command) = input.lock {
            self.apply_lock_command(state, pose, world, command, &mut events);
        }
        self.maintain_locks(state, pose, world, &mut events);

        events
    }

    /// Smooth direction and range toward the stick
    fn steer(&self, state: &mut AimState, pose: &ThrowerPose, input: &TickInput, dt: f32) -> AimMode {
        let t = &self.tuning;
        let stick = state.raw_input;
        let magnitude = stick.length();

        let (forward, right) = match input.view_yaw {
            Some(yaw) => yaw_basis(yaw),
            None => facing_basis(pose.forward),
        };
        let stick_dir = (forward * stick.y + right * stick.x).normalize_or_zero();

        if magnitude > t.dead_zone {
            let desired = if stick_dir == Vec3::ZERO {
                state.smoothed_direction
            } else {
                stick_dir
            };
            state.smoothed_direction = rotate_toward(
                state.smoothed_direction,
                desired,
                dt,
                t.direction_interp_speed * t.movement_speed_modifier,
            );

            let ratio = (magnitude / t.movement_threshold).min(1.0);
            let target_range = ratio * t.max_trace_distance;
            state.effective_range = interp_to(
                state.effective_range,
                target_range,
                dt,
                t.range_interp_speed * t.movement_speed_modifier,
            )
            .clamp(0.0, t.max_trace_distance);
            AimMode::Aiming
        } else if magnitude > t.pull_threshold && stick_dir.dot(state.smoothed_direction) < -t.pull_threshold {
            state.effective_range = interp_to(
                state.effective_range,
                0.0,
                dt,
                t.range_interp_speed * t.movement_speed_modifier,
            )
            .clamp(0.0, t.max_trace_distance);
            AimMode::Retracting
        } else {
            AimMode::Idle
        }
    }

    /// Range allowed by the first wall along the aim, on the ground plane
    pub fn wall_clamp_range(&self, state: &AimState, pose: &ThrowerPose, world: &impl WorldQuery) -> f32 {
        let t = &self.tuning;
        let start = pose.trace_origin();
        let end = start + state.smoothed_direction * t.max_trace_distance;

        match world.ray_cast(start, end, MASK_AIM_TRACE, &[pose.id]) {
            Some(hit) => (length_2d(hit.point - start) + t.clearance_buffer).clamp(0.0, t.max_trace_distance),
            None => t.max_trace_distance,
        }
    }

    /// Clamp the effective range to the wall range; the clamp sticks
    fn clamp_to_walls(&self, state: &mut AimState, pose: &ThrowerPose, world: &impl WorldQuery) {
        let wall_range = self.wall_clamp_range(state, pose, world);
        state.effective_range = state
            .effective_range
            .min(wall_range)
            .clamp(0.0, self.tuning.max_trace_distance);
    }

    /// Resolve a full throw for the current direction and range.
    ///
    /// Pure with respect to `state`: identical state and world answers give an
    /// identical solution.
    pub fn resolve_arc(
        &self,
        state: &AimState,
        pose: &ThrowerPose,
        world: &impl WorldQuery,
    ) -> Result<BallisticSolution, ArcError> {
        let t = &self.tuning;
        let start = pose.throw_socket.ok_or(ArcError::MissingSocket)?;

        let probe = LandingProbe {
            height: t.ground_probe_height,
            depth: t.ground_probe_depth,
            apex_height: t.apex_height(),
            mask: MASK_AIM_TRACE,
        };
        let landing = find_landing_point(
            world,
            pose.landing_trace_origin(),
            state.smoothed_direction,
            state.effective_range,
            &probe,
            &[pose.id],
        );

        solve_launch(start, landing, t.effective_gravity(), t.apex_height())
    }

    fn apply_lock_command(
        &self,
        state: &mut AimState,
        pose: &ThrowerPose,
        world: &impl WorldQuery,
        command: LockCommand,
        events: &mut Vec<AimEvent>,
    ) {
        match command {
            LockCommand::Acquire => {
                self.manual_lock(state, pose, world, events);
            }
            LockCommand::Release => self.release_manual_lock(state, events),
            LockCommand::Toggle => {
                if state.locked_target.is_some() {
                    self.release_manual_lock(state, events);
                } else {
                    self.manual_lock(state, pose, world, events);
                }
            }
        }
    }

    /// Lock onto the best candidate around the thrower; no-op while locked
    pub fn manual_lock(
        &self,
        state: &mut AimState,
        pose: &ThrowerPose,
        world: &impl WorldQuery,
        events: &mut Vec<AimEvent>,
    ) -> Option<EntityId> {
        if state.locked_target.is_some() {
            return state.locked_target;
        }
        let target = manual_lock_candidate(world, pose.position, self.tuning.manual_lock_range, pose.id)?;
        state.locked_target = Some(target);
        log::info!("{:?} locked onto {:?}", pose.id, target);
        events.push(AimEvent::LockAcquired(target));
        Some(target)
    }

    /// Clear the manual lock unconditionally
    pub fn release_manual_lock(&self, state: &mut AimState, events: &mut Vec<AimEvent>) {
        release(state, ReleaseReason::Manual, events);
    }

    /// Auto-release a stale manual lock, or refresh the soft lock
    fn maintain_locks(
        &self,
        state: &mut AimState,
        pose: &ThrowerPose,
        world: &impl WorldQuery,
        events: &mut Vec<AimEvent>,
    ) {
        if let Some(target) = state.locked_target {
            if let Err(reason) = check_lock(world, pose.position, target, self.tuning.manual_lock_range) {
                release(state, reason, events);
            }
        }

        let soft = if state.locked_target.is_some() {
            None
        } else {
            state
                .aim_point()
                .and_then(|aim| soft_lock_candidate(world, aim, self.tuning.soft_lock_radius, pose.id))
        };
        if soft != state.soft_lock_target {
            state.soft_lock_target = soft;
            events.push(AimEvent::SoftLockChanged(soft));
        }
    }

    /// Resolve a fresh throw and spawn a projectile along it.
    ///
    /// Nothing is spawned when the arc cannot be resolved.
    pub fn throw(
        &self,
        state: &mut AimState,
        pose: &ThrowerPose,
        world: &impl WorldQuery,
        spawner: &mut impl Spawner,
        now: f32,
    ) -> Result<Projectile, ThrowError> {
        let t = &self.tuning;
        let solution = self.resolve_arc(state, pose, world)?;
        state.last_solution = Some(solution);

        let id = spawner
            .spawn(&t.projectile_archetype, solution.start, orientation_along(solution.velocity))
            .ok_or_else(|| ThrowError::SpawnFailed {
                archetype: t.projectile_archetype.clone(),
            })?;

        log::info!(
            "{:?} threw {:?} toward {} (v={})",
            pose.id,
            id,
            solution.landing_point,
            solution.velocity
        );
        Ok(Projectile::from_solution(
            id,
            Some(pose.id),
            &solution,
            t.world_gravity,
            t.gravity_scale,
            t.time_scale,
            now,
        ))
    }
}

fn release(state: &mut AimState, reason: ReleaseReason, events: &mut Vec<AimEvent>) {
    if let Some(target) = state.take_locked_target() {
        log::info!("Released lock on {target:?} ({reason:?})");
        events.push(AimEvent::LockReleased { target, reason });
    }
}
