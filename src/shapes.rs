//! Shape lifecycle management.
//!
//! The solver owns one collision shape per part, kept in an arena indexed
//! by part index. A shape must never be queried while stale relative to its
//! part's true pose, so the cache tracks which parts moved since their shape
//! was built and either rebuilds those shapes ([`ShapeStrategy::Rebuild`])
//! or hands the scanner a delta transform per moved part
//! ([`ShapeStrategy::DeltaTransform`]). Shapes are replaced, never mutated,
//! and dropped with the cache.

use nalgebra::Isometry3;

use crate::params::ShapeStrategy;
use crate::part::Part;

/// Arena of collision shapes, one per part index.
#[derive(Debug)]
pub struct ShapeCache<S> {
    shapes: Vec<S>,
    built_poses: Vec<Isometry3<f64>>,
    moved: Vec<bool>,
    strategy: ShapeStrategy,
}

impl<S> ShapeCache<S> {
    /// Build a fresh shape for every part at its current pose.
    #[must_use]
    pub fn new<P>(parts: &[P], strategy: ShapeStrategy) -> Self
    where
        P: Part<Shape = S>,
    {
        Self {
            shapes: parts.iter().map(Part::build_shape).collect(),
            built_poses: parts.iter().map(Part::pose).collect(),
            moved: vec![false; parts.len()],
            strategy,
        }
    }

    /// The configured refresh strategy.
    #[must_use]
    pub fn strategy(&self) -> ShapeStrategy {
        self.strategy
    }

    /// Number of cached shapes (one per part).
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// The cached shapes, in part order.
    ///
    /// In [`ShapeStrategy::DeltaTransform`] mode a shape may be stale;
    /// query it together with [`ShapeCache::delta`] or force a rebuild
    /// with [`ShapeCache::rebuild_moved`] first.
    #[must_use]
    pub fn shapes(&self) -> &[S] {
        &self.shapes
    }

    /// Whether the part's pose changed since its shape was built.
    #[must_use]
    pub fn has_moved(&self, index: usize) -> bool {
        self.moved[index]
    }

    /// Record that the part's pose changed.
    pub fn mark_moved(&mut self, index: usize) {
        self.moved[index] = true;
    }

    /// Delta transform to virtually re-pose the cached shape, or `None`
    /// when the shape is current as built.
    ///
    /// Only produced in [`ShapeStrategy::DeltaTransform`] mode, for moved
    /// parts: `built_pose⁻¹ · current_pose`, so that
    /// `built_pose · delta` is the part's true current pose.
    #[must_use]
    pub fn delta(&self, index: usize, current: &Isometry3<f64>) -> Option<Isometry3<f64>> {
        if self.strategy == ShapeStrategy::DeltaTransform && self.moved[index] {
            Some(self.built_poses[index].inv_mul(current))
        } else {
            None
        }
    }

    /// Refresh the cache after a step, per the configured strategy.
    ///
    /// [`ShapeStrategy::Rebuild`] rebuilds every moved part's shape and
    /// clears its flag; [`ShapeStrategy::DeltaTransform`] leaves the cache
    /// untouched (deltas are computed at scan time).
    pub fn refresh<P>(&mut self, parts: &[P])
    where
        P: Part<Shape = S>,
    {
        if self.strategy == ShapeStrategy::Rebuild {
            self.rebuild_moved(parts);
        }
    }

    /// Force-rebuild every stale shape, regardless of strategy.
    ///
    /// Used when a caller needs up-to-date shape handles. Parts that never
    /// moved keep their shape untouched.
    pub fn rebuild_moved<P>(&mut self, parts: &[P])
    where
        P: Part<Shape = S>,
    {
        for index in 0..self.shapes.len() {
            if self.moved[index] {
                self.shapes[index] = parts[index].build_shape();
                self.built_poses[index] = parts[index].pose();
                self.moved[index] = false;
            }
        }
    }
}
