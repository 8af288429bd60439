//! Sketch engine configuration
//!
//! Every tolerance and cap used by the topology store, the solver and the
//! contour detector lives here so hosts can tune them from a RON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CIRCLE_SEGMENTS, CONTOUR_STEP_BUDGET, EXTEND_RAY_FACTOR, MIN_ENTITY_SIZE,
    MIN_FRAGMENT_LENGTH, SNAP_DISTANCE, SOLVER_MAX_ITERATIONS, SOLVER_TOLERANCE,
};
use crate::sketch::{SketchError, SketchResult};

/// Tunable parameters of a sketch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SketchConfig {
    /// Per-axis node snapping tolerance (box test, not a radius)
    pub snap_distance: f64,
    /// Minimum line length, radius, rectangle side or offset distance
    pub min_entity_size: f64,
    /// Trim fragments shorter than this are dropped
    pub min_fragment_length: f64,
    /// Length of the extend ray in multiples of the line length
    pub extend_ray_factor: f64,
    /// Maximum solver passes
    pub solver_max_iterations: usize,
    /// Total error at which the solver stops
    pub solver_tolerance: f64,
    /// Depth-first expansions allowed per start node
    pub contour_step_budget: usize,
    /// Vertices used when a circle is emitted as a profile
    pub circle_segments: u32,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            snap_distance: SNAP_DISTANCE,
            min_entity_size: MIN_ENTITY_SIZE,
            min_fragment_length: MIN_FRAGMENT_LENGTH,
            extend_ray_factor: EXTEND_RAY_FACTOR,
            solver_max_iterations: SOLVER_MAX_ITERATIONS,
            solver_tolerance: SOLVER_TOLERANCE,
            contour_step_budget: CONTOUR_STEP_BUDGET,
            circle_segments: CIRCLE_SEGMENTS,
        }
    }
}

impl SketchConfig {
    /// Check that every value is usable
    pub fn validate(&self) -> SketchResult<()> {
        let positive = [
            ("snap_distance", self.snap_distance),
            ("min_entity_size", self.min_entity_size),
            ("min_fragment_length", self.min_fragment_length),
            ("solver_tolerance", self.solver_tolerance),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(SketchError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        if !self.extend_ray_factor.is_finite() || self.extend_ray_factor <= 1.0 {
            return Err(SketchError::InvalidConfig(format!(
                "extend_ray_factor must be greater than 1, got {}",
                self.extend_ray_factor
            )));
        }
        if self.solver_max_iterations == 0 {
            return Err(SketchError::InvalidConfig(
                "solver_max_iterations must be at least 1".into(),
            ));
        }
        if self.contour_step_budget == 0 {
            return Err(SketchError::InvalidConfig(
                "contour_step_budget must be at least 1".into(),
            ));
        }
        if self.circle_segments < 3 {
            return Err(SketchError::InvalidConfig(format!(
                "circle_segments must be at least 3, got {}",
                self.circle_segments
            )));
        }

        Ok(())
    }

    /// Parse a configuration from RON text; missing fields take their defaults
    pub fn from_ron_str(content: &str) -> SketchResult<Self> {
        let config: SketchConfig =
            ron::from_str(content).map_err(|e| SketchError::Deserialize(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to pretty RON text
    pub fn to_ron_string(&self) -> SketchResult<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SketchError::Serialize(e.to_string()))
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> SketchResult<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| SketchError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }
}
