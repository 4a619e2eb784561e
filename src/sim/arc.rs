//! Ballistic arc geometry
//!
//! An arc is fixed by its launch point, launch velocity and gravity:
//! - apex-driven: the vertical launch speed comes from the desired apex height
//! - the flight time is the descending root of the vertical kinematics
//! - the horizontal speed covers the ground distance in exactly that time

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collision::WorldQuery;
use super::state::EntityId;
use crate::consts::KINDA_SMALL_NUMBER;
use crate::length_2d;

/// Why an arc could not be resolved this tick
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ArcError {
    /// The landing point is above what the chosen apex can reach
    #[error("target unreachable at this apex height (discriminant {discriminant})")]
    Unreachable { discriminant: f32 },
    /// Landing point is (nearly) straight above or below the spawn point
    #[error("horizontal distance {distance} too small for a throw")]
    DegenerateHorizontal { distance: f32 },
    #[error("gravity {gravity} too small to solve an arc")]
    DegenerateGravity { gravity: f32 },
    /// Apex height of zero leaves no upward launch speed
    #[error("apex height {apex_height} gives no upward launch")]
    FlatApex { apex_height: f32 },
    /// The thrower has no throw socket to spawn from
    #[error("thrower has no throw socket")]
    MissingSocket,
}

/// One resolved throw
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallisticSolution {
    /// Spawn point (throw socket)
    pub start: Vec3,
    /// Launch velocity; `velocity.z > 0`
    pub velocity: Vec3,
    /// Where the arc comes down
    pub landing_point: Vec3,
}

impl BallisticSolution {
    /// Position along the arc `t` seconds after launch
    #[inline]
    pub fn position_at(&self, t: f32, gravity: f32) -> Vec3 {
        self.start + self.velocity * t + 0.5 * Vec3::new(0.0, 0.0, -gravity) * t * t
    }

    /// Height of the apex above the spawn point
    #[inline]
    pub fn apex_height(&self, gravity: f32) -> f32 {
        self.velocity.z * self.velocity.z / (2.0 * gravity)
    }

    /// Time from launch until the arc reaches the landing point's height on the way down
    pub fn flight_time(&self, gravity: f32) -> Result<f32, ArcError> {
        flight_time(self.velocity.z, self.landing_point.z - self.start.z, gravity)
    }

    /// `segments + 1` points along the arc from spawn to landing
    pub fn sample(&self, gravity: f32, segments: usize) -> Vec<Vec3> {
        let Ok(total) = self.flight_time(gravity) else {
            return vec![self.start];
        };
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| self.position_at(total * i as f32 / segments as f32, gravity))
            .collect()
    }
}

/// Vertical launch speed whose apex sits `apex_height` above the spawn point
#[inline]
pub fn apex_launch_speed(gravity: f32, apex_height: f32) -> f32 {
    (2.0 * gravity * apex_height.max(0.0)).sqrt()
}

/// Descending-root flight time for vertical speed `vz` to cover `delta_z`.
///
/// Solves `delta_z = vz*t - g*t²/2` for the later root.
pub fn flight_time(vz: f32, delta_z: f32, gravity: f32) -> Result<f32, ArcError> {
    if gravity < KINDA_SMALL_NUMBER {
        return Err(ArcError::DegenerateGravity { gravity });
    }
    let discriminant = vz * vz - 2.0 * gravity * delta_z;
    if discriminant < 0.0 {
        return Err(ArcError::Unreachable { discriminant });
    }
    Ok((vz + discriminant.sqrt()) / gravity)
}

/// Launch velocity from `start` that lands on `landing` with the given apex height
pub fn solve_launch(
    start: Vec3,
    landing: Vec3,
    gravity: f32,
    apex_height: f32,
) -> Result<BallisticSolution, ArcError> {
    if gravity < KINDA_SMALL_NUMBER {
        return Err(ArcError::DegenerateGravity { gravity });
    }
    let vz = apex_launch_speed(gravity, apex_height);
    if vz < KINDA_SMALL_NUMBER {
        return Err(ArcError::FlatApex { apex_height });
    }
    let time = flight_time(vz, landing.z - start.z, gravity)?;

    let offset = Vec3::new(landing.x - start.x, landing.y - start.y, 0.0);
    let distance = offset.length();
    if distance < KINDA_SMALL_NUMBER || time < KINDA_SMALL_NUMBER {
        return Err(ArcError::DegenerateHorizontal { distance });
    }

    let horizontal = offset / distance * (distance / time);
    Ok(BallisticSolution {
        start,
        velocity: horizontal + Vec3::new(0.0, 0.0, vz),
        landing_point: landing,
    })
}

/// Vertical probes used to put the landing point on the ground
#[derive(Debug, Clone, Copy)]
pub struct LandingProbe {
    /// Probe starts this far above the trace origin
    pub height: f32,
    /// Probe ends this far below the trace origin
    pub depth: f32,
    /// Desired apex height; also the reach of the ledge probe
    pub apex_height: f32,
    pub mask: u32,
}

/// Landing point `range` along `direction` from `origin`, settled onto the ground.
///
/// A downward probe finds the ground (falling back to the origin's height); a
/// second probe from apex height above that snaps onto any ledge in between.
pub fn find_landing_point(
    world: &impl WorldQuery,
    origin: Vec3,
    direction: Vec3,
    range: f32,
    probe: &LandingProbe,
    ignore: &[EntityId],
) -> Vec3 {
    let flat = origin + direction * range;

    let mut base_z = world
        .ray_cast(
            Vec3::new(flat.x, flat.y, origin.z + probe.height),
            Vec3::new(flat.x, flat.y, origin.z - probe.depth),
            probe.mask,
            ignore,
        )
        .map_or(origin.z, |hit| hit.point.z);

    if probe.apex_height > 0.0 {
        let ledge = world.ray_cast(
            Vec3::new(flat.x, flat.y, base_z + probe.apex_height),
            Vec3::new(flat.x, flat.y, base_z),
            probe.mask,
            ignore,
        );
        if let Some(hit) = ledge {
            base_z = hit.point.z;
        }
    }

    Vec3::new(flat.x, flat.y, base_z)
}

/// Ground footprint of a throw: `samples` evenly spaced points from spawn to
/// landing, each dropped onto whatever lies within `trace_height` vertically.
pub fn ground_reticle(
    world: &impl WorldQuery,
    solution: &BallisticSolution,
    samples: usize,
    trace_height: f32,
    mask: u32,
    ignore: &[EntityId],
) -> Vec<Vec3> {
    let offset = solution.landing_point - solution.start;
    let total = length_2d(offset);
    if samples < 2 || total < KINDA_SMALL_NUMBER {
        return Vec::new();
    }
    let dir = Vec3::new(offset.x, offset.y, 0.0) / total;

    (0..samples)
        .map(|i| {
            let alpha = i as f32 / (samples - 1) as f32;
            let point = solution.start + dir * (total * alpha);
            world
                .ray_cast(
                    point + Vec3::Z * trace_height,
                    point - Vec3::Z * trace_height,
                    mask,
                    ignore,
                )
                .map_or(point, |hit| hit.point)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::MASK_AIM_TRACE;
    use crate::sim::sdf::{SdfWorld, Shape};
    use proptest::prelude::*;

    const G: f32 = 980.0;

    #[test]
    fn test_flat_throw_scenario() {
        let solution = solve_launch(Vec3::ZERO, Vec3::new(1000.0, 0.0, 0.0), G, 500.0).expect("solvable");
        let expected_vz = (2.0_f32 * 980.0 * 500.0).sqrt();
        assert!((expected_vz - 989.95).abs() < 0.01);
        assert!((solution.velocity.z - expected_vz).abs() < 1e-3);

        // Symmetric arc: flight time is 2*vz/g
        let t = solution.flight_time(G).expect("time");
        assert!((t - 2.0 * expected_vz / G).abs() < 1e-4);
        assert!((solution.velocity.x - 1000.0 / t).abs() < 1e-2);
        assert!(solution.velocity.y.abs() < 1e-6);
        assert!((solution.apex_height(G) - 500.0).abs() < 0.05);

        let end = solution.position_at(t, G);
        assert!((end - solution.landing_point).length() < 0.1);
    }

    #[test]
    fn test_straight_up_is_degenerate() {
        let err = solve_launch(Vec3::ZERO, Vec3::new(0.0, 0.0, 100.0), G, 500.0).unwrap_err();
        assert!(matches!(err, ArcError::DegenerateHorizontal { .. }));
    }

    #[test]
    fn test_too_high_is_unreachable() {
        let err = solve_launch(Vec3::ZERO, Vec3::new(300.0, 0.0, 600.0), G, 500.0).unwrap_err();
        assert!(matches!(err, ArcError::Unreachable { discriminant } if discriminant < 0.0));
    }

    #[test]
    fn test_zero_apex_is_rejected() {
        let err = solve_launch(Vec3::new(0.0, 0.0, 150.0), Vec3::new(500.0, 0.0, 0.0), G, 0.0).unwrap_err();
        assert_eq!(err, ArcError::FlatApex { apex_height: 0.0 });
    }

    #[test]
    fn test_zero_gravity_is_degenerate() {
        let err = flight_time(100.0, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, ArcError::DegenerateGravity { .. }));
    }

    #[test]
    fn test_landing_point_on_ground_and_ledge() {
        let mut world = SdfWorld::with_ground(0.0);
        world.add_shape(Shape::Box {
            center: Vec3::new(1000.0, 0.0, 150.0),
            half_extents: Vec3::new(100.0, 100.0, 150.0),
        });
        let probe = LandingProbe {
            height: 100.0,
            depth: 1000.0,
            apex_height: 500.0,
            mask: MASK_AIM_TRACE,
        };
        let origin = Vec3::new(0.0, 0.0, 90.0);

        let ground = find_landing_point(&world, origin, Vec3::X, 500.0, &probe, &[]);
        assert!((ground - Vec3::new(500.0, 0.0, 0.0)).length() < 0.02);

        // Ledge top (z=300) sits above the ground probe start (z=190)
        let ledge = find_landing_point(&world, origin, Vec3::X, 1000.0, &probe, &[]);
        assert!((ledge.z - 300.0).abs() < 0.02);
    }

    #[test]
    fn test_landing_point_falls_back_to_origin_height() {
        let world = SdfWorld::new();
        let probe = LandingProbe {
            height: 200.0,
            depth: 1000.0,
            apex_height: 500.0,
            mask: MASK_AIM_TRACE,
        };
        let origin = Vec3::new(0.0, 0.0, 90.0);
        let landing = find_landing_point(&world, origin, Vec3::Y, 400.0, &probe, &[]);
        assert_eq!(landing, Vec3::new(0.0, 400.0, 90.0));
    }

    #[test]
    fn test_sample_endpoints() {
        let solution = solve_launch(Vec3::new(0.0, 0.0, 150.0), Vec3::new(600.0, 0.0, 0.0), G, 200.0).expect("solvable");
        let points = solution.sample(G, 16);
        assert_eq!(points.len(), 17);
        assert_eq!(points[0], solution.start);
        assert!((points[16] - solution.landing_point).length() < 0.1);
    }

    #[test]
    fn test_ground_reticle() {
        let world = SdfWorld::with_ground(0.0);
        let solution = solve_launch(Vec3::new(0.0, 0.0, 150.0), Vec3::new(600.0, 0.0, 0.0), G, 200.0).expect("solvable");
        let points = ground_reticle(&world, &solution, 4, 200.0, MASK_AIM_TRACE, &[]);
        assert_eq!(points.len(), 4);
        for (i, p) in points.iter().enumerate() {
            assert!(p.z.abs() < 0.02);
            assert!((p.x - 200.0 * i as f32).abs() < 1e-3);
        }
        assert!(ground_reticle(&world, &solution, 1, 200.0, MASK_AIM_TRACE, &[]).is_empty());
    }

    proptest! {
        #[test]
        fn prop_flight_time_roundtrip(vz in 0.0f32..2000.0, dz in -2000.0f32..2000.0, g in 10.0f32..2000.0) {
            prop_assume!(vz * vz - 2.0 * g * dz >= 0.0);
            let t = flight_time(vz, dz, g).unwrap();
            let reached = vz * t - 0.5 * g * t * t;
            let scale = 1.0 + dz.abs() + vz * vz / g;
            prop_assert!((reached - dz).abs() <= 1e-3 * scale);
        }

        #[test]
        fn prop_solve_is_deterministic(x in -1500.0f32..1500.0, y in -1500.0f32..1500.0, z in -300.0f32..300.0) {
            prop_assume!(x.abs() + y.abs() > 1.0);
            let landing = Vec3::new(x, y, z);
            let a = solve_launch(Vec3::new(0.0, 0.0, 150.0), landing, 392.0, 500.0);
            let b = solve_launch(Vec3::new(0.0, 0.0, 150.0), landing, 392.0, 500.0);
            prop_assert_eq!(a, b);
            if let Ok(solution) = a {
                prop_assert!(solution.velocity.z > 0.0);
            }
        }
    }
}
