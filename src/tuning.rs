//! Per-entity throw tunables
//!
//! Loaded from JSON (partial files are fine, missing fields take defaults).

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::WORLD_GRAVITY;

/// Errors raised while loading or validating tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed tuning JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid tuning value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Throw aiming and projectile tunables for one controlled entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AimTuning {
    // === Range ===
    /// Maximum throw distance on the ground plane (world units)
    pub max_trace_distance: f32,
    /// How far past a blocking wall the throw can still reach
    pub clearance_buffer: f32,
    /// How quickly the effective range approaches its target (higher = snappier)
    pub range_interp_speed: f32,

    // === Stick ===
    /// Stick deflection [0..1] at which the reticle hits full range
    pub movement_threshold: f32,
    /// How quickly the aim direction approaches the stick direction
    pub direction_interp_speed: f32,
    /// Stick magnitude at or below which aim direction and range are frozen
    pub dead_zone: f32,
    /// Lower bound of the pull-back band, also the required opposition (as -dot)
    pub pull_threshold: f32,
    /// Multiplier on both interpolation speeds (e.g. slowed while moving)
    pub movement_speed_modifier: f32,

    // === Arc ===
    /// World gravity magnitude (units/s², along -Z)
    pub world_gravity: f32,
    /// Gravity scale applied to thrown projectiles
    pub gravity_scale: f32,
    /// Fraction (0..1] of `max_arc_height` used as the desired apex
    pub arc_param: f32,
    /// Apex height at `arc_param = 1`
    pub max_arc_height: f32,
    /// Flight speed multiplier (>1 = faster flight along the same arc)
    pub time_scale: f32,
    /// Height above the aim origin where the landing ground probe starts
    pub ground_probe_height: f32,
    /// Depth below the aim origin where the landing ground probe ends
    pub ground_probe_depth: f32,

    // === Lock-on ===
    /// Radius around the aim point searched for a soft-lock suggestion
    pub soft_lock_radius: f32,
    /// Radius around the thrower searched by (and keeping) a manual lock
    pub manual_lock_range: f32,

    // === Reticle ===
    /// Number of footprint points projected onto the ground
    pub reticle_sample_count: usize,
    /// Vertical half-extent of each footprint ground probe
    pub reticle_trace_height: f32,

    /// Archetype name handed to the spawner on throw
    pub projectile_archetype: String,
}

impl Default for AimTuning {
    fn default() -> Self {
        Self {
            max_trace_distance: 1500.0,
            clearance_buffer: 100.0,
            range_interp_speed: 10.0,

            movement_threshold: 0.65,
            direction_interp_speed: 10.0,
            dead_zone: 0.3,
            pull_threshold: 0.15,
            movement_speed_modifier: 1.0,

            world_gravity: WORLD_GRAVITY,
            gravity_scale: 0.4,
            arc_param: 1.0,
            max_arc_height: 500.0,
            time_scale: 1.0,
            ground_probe_height: 200.0,
            ground_probe_depth: 1000.0,

            soft_lock_radius: 300.0,
            manual_lock_range: 2000.0,

            reticle_sample_count: 16,
            reticle_trace_height: 200.0,

            projectile_archetype: "thrown_projectile".to_string(),
        }
    }
}

impl AimTuning {
    /// Gravity magnitude actually applied to thrown projectiles
    #[inline]
    pub fn effective_gravity(&self) -> f32 {
        self.world_gravity * self.gravity_scale
    }

    /// Desired apex height of the throw arc
    #[inline]
    pub fn apex_height(&self) -> f32 {
        self.max_arc_height * self.arc_param
    }

    /// Parse and validate tuning from a JSON string
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load and validate tuning from a JSON file
    pub fn load(path: &Path) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load tuning, falling back to defaults on any failure
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(tuning) => {
                log::info!("Loaded throw tuning from {}", path.display());
                tuning
            }
            Err(err) => {
                log::warn!("Using default throw tuning ({err})");
                Self::default()
            }
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the solver cannot work with
    pub fn validate(&self) -> Result<(), TuningError> {
        fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(TuningError::Invalid {
                    field,
                    reason: format!("must be positive, got {value}"),
                })
            }
        }
        fn non_negative(field: &'static str, value: f32) -> Result<(), TuningError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(TuningError::Invalid {
                    field,
                    reason: format!("must be >= 0, got {value}"),
                })
            }
        }

        positive("max_trace_distance", self.max_trace_distance)?;
        non_negative("clearance_buffer", self.clearance_buffer)?;
        non_negative("range_interp_speed", self.range_interp_speed)?;
        non_negative("direction_interp_speed", self.direction_interp_speed)?;
        non_negative("movement_speed_modifier", self.movement_speed_modifier)?;
        positive("world_gravity", self.world_gravity)?;
        positive("gravity_scale", self.gravity_scale)?;
        positive("max_arc_height", self.max_arc_height)?;
        positive("time_scale", self.time_scale)?;
        non_negative("ground_probe_height", self.ground_probe_height)?;
        non_negative("ground_probe_depth", self.ground_probe_depth)?;
        non_negative("soft_lock_radius", self.soft_lock_radius)?;
        non_negative("manual_lock_range", self.manual_lock_range)?;
        non_negative("reticle_trace_height", self.reticle_trace_height)?;
        non_negative("dead_zone", self.dead_zone)?;
        non_negative("pull_threshold", self.pull_threshold)?;

        if !(self.arc_param > 0.0 && self.arc_param <= 1.0) {
            return Err(TuningError::Invalid {
                field: "arc_param",
                reason: format!("must be within (0, 1], got {}", self.arc_param),
            });
        }
        if !(self.movement_threshold > 0.0 && self.movement_threshold <= 1.0) {
            return Err(TuningError::Invalid {
                field: "movement_threshold",
                reason: format!("must be within (0, 1], got {}", self.movement_threshold),
            });
        }
        if self.pull_threshold >= self.dead_zone {
            return Err(TuningError::Invalid {
                field: "pull_threshold",
                reason: format!(
                    "must be below dead_zone ({}), got {}",
                    self.dead_zone, self.pull_threshold
                ),
            });
        }
        Ok(())
    }
}
