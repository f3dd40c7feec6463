//! Solver parameters.
//!
//! All knobs of the separation loop live in [`SeparateParams`], a plain
//! options struct validated once at solver construction.

use crate::error::{Result, SeparateError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How cached collision shapes are kept in sync with moved parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShapeStrategy {
    /// Rebuild the collision shape of every moved part before the next scan.
    ///
    /// Trades rebuild cost for cheaper intersection queries.
    #[default]
    Rebuild,

    /// Keep the cached shape and hand the scanner a delta transform
    /// (`built_pose⁻¹ · current_pose`) for each moved part instead.
    ///
    /// Trades more expensive queries for zero rebuild cost. Must produce
    /// the same contacts as [`ShapeStrategy::Rebuild`] up to numerical
    /// tolerance.
    DeltaTransform,
}

/// Configuration for the separation solver.
///
/// # Example
///
/// ```
/// use sim_separate::SeparateParams;
///
/// let params = SeparateParams::default()
///     .with_rotation(true)
///     .with_max_steps(200);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SeparateParams {
    /// Fraction of the average penetration corrected per step.
    ///
    /// 1.0 resolves the average overlap of a pair in a single step;
    /// smaller values separate more gently over more steps.
    /// Must be positive and finite.
    pub move_per_step: f64,

    /// Size-relative noise threshold for contact filtering.
    ///
    /// A contact between parts `a` and `b` is ignored when its depth is
    /// at most `ignore_depth_percent * (size(a) + size(b))`, where the
    /// sizes are the mean bounding-box extents reported by the collision
    /// collaborator. Must be non-negative and finite.
    pub ignore_depth_percent: f64,

    /// Enable the torque-derived rotation branch.
    ///
    /// When false, each pair is pushed apart along the line between the
    /// part centers. When true, each contact pushes along its own normal
    /// and the off-center component becomes a bounded rotation.
    pub enable_rotation: bool,

    /// Step budget before the solver reports an exhausted finish.
    ///
    /// Exhaustion is not an error; it is reported distinctly from
    /// convergence so callers can warn about residual overlap.
    /// Must be at least 1.
    pub max_steps: u32,

    /// Per-step rotation cap in degrees.
    ///
    /// A single large penetration can produce an arbitrarily large torque;
    /// the resulting rotation angle is clamped to this value so a part
    /// never spins implausibly far in one step. Must be positive.
    pub max_rotation_degrees: f64,

    /// Maximum contact count requested from the collision collaborator
    /// per pair. Must be at least 1.
    pub max_contacts_per_pair: usize,

    /// Shape refresh strategy for moved parts.
    pub shape_strategy: ShapeStrategy,
}

impl Default for SeparateParams {
    fn default() -> Self {
        Self {
            move_per_step: 1.0,
            ignore_depth_percent: 0.01,
            enable_rotation: false,
            max_steps: 1000,
            max_rotation_degrees: 10.0,
            max_contacts_per_pair: 8,
            shape_strategy: ShapeStrategy::Rebuild,
        }
    }
}

impl SeparateParams {
    /// Set the per-step correction fraction.
    #[must_use]
    pub fn with_move_per_step(mut self, move_per_step: f64) -> Self {
        self.move_per_step = move_per_step;
        self
    }

    /// Set the size-relative noise threshold.
    #[must_use]
    pub fn with_ignore_depth_percent(mut self, ignore_depth_percent: f64) -> Self {
        self.ignore_depth_percent = ignore_depth_percent;
        self
    }

    /// Enable or disable the rotation branch.
    #[must_use]
    pub fn with_rotation(mut self, enable_rotation: bool) -> Self {
        self.enable_rotation = enable_rotation;
        self
    }

    /// Set the step budget.
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the per-step rotation cap in degrees.
    #[must_use]
    pub fn with_max_rotation_degrees(mut self, max_rotation_degrees: f64) -> Self {
        self.max_rotation_degrees = max_rotation_degrees;
        self
    }

    /// Set the maximum contact count requested per pair.
    #[must_use]
    pub fn with_max_contacts_per_pair(mut self, max_contacts_per_pair: usize) -> Self {
        self.max_contacts_per_pair = max_contacts_per_pair;
        self
    }

    /// Set the shape refresh strategy.
    #[must_use]
    pub fn with_shape_strategy(mut self, shape_strategy: ShapeStrategy) -> Self {
        self.shape_strategy = shape_strategy;
        self
    }

    /// The rotation cap in radians.
    #[must_use]
    pub fn max_rotation_radians(&self) -> f64 {
        self.max_rotation_degrees.to_radians()
    }

    /// Validate the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SeparateError::InvalidParams`] describing the first
    /// offending field.
    pub fn validate(&self) -> Result<()> {
        if !self.move_per_step.is_finite() || self.move_per_step <= 0.0 {
            return Err(SeparateError::invalid_params(format!(
                "move_per_step must be positive and finite, got {}",
                self.move_per_step
            )));
        }
        if !self.ignore_depth_percent.is_finite() || self.ignore_depth_percent < 0.0 {
            return Err(SeparateError::invalid_params(format!(
                "ignore_depth_percent must be non-negative and finite, got {}",
                self.ignore_depth_percent
            )));
        }
        if self.max_steps == 0 {
            return Err(SeparateError::invalid_params(
                "max_steps must be at least 1",
            ));
        }
        if !self.max_rotation_degrees.is_finite() || self.max_rotation_degrees <= 0.0 {
            return Err(SeparateError::invalid_params(format!(
                "max_rotation_degrees must be positive and finite, got {}",
                self.max_rotation_degrees
            )));
        }
        if self.max_contacts_per_pair == 0 {
            return Err(SeparateError::invalid_params(
                "max_contacts_per_pair must be at least 1",
            ));
        }
        Ok(())
    }
}
