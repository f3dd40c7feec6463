//! Top-level separation solver.
//!
//! [`Separator`] is passive between steps: a caller (for example a UI
//! timer) drives it one [`Separator::advance`] at a time until it reports
//! a finished step. Each step runs scan → compute → apply → shape refresh
//! synchronously and is not re-entrant.

use tracing::debug;

use crate::contact::ContactTrace;
use crate::correction::{apply_corrections, compute_corrections};
use crate::error::Result;
use crate::params::SeparateParams;
use crate::part::Part;
use crate::query::CollisionQuery;
use crate::scan::scan_pairs;
use crate::shapes::ShapeCache;

/// How a finished run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparationOutcome {
    /// A scan found zero contacts: all parts are separated within the
    /// noise tolerance.
    Converged,

    /// The step budget ran out with contacts remaining. Not an error, but
    /// the parts may still overlap.
    Exhausted,
}

/// Result of one [`Separator::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    /// Whether the solver is finished (terminally; further calls no-op).
    pub finished: bool,

    /// Number of correcting steps performed so far.
    pub step_count: u32,
}

/// Iterative solver that pushes overlapping rigid parts apart.
///
/// Constructed once with the full ordered part list, a collision
/// collaborator, and a validated configuration; parts are never added or
/// removed during a run. See the crate docs for the overall model.
pub struct Separator<P, Q>
where
    P: Part,
    Q: CollisionQuery<Shape = P::Shape>,
{
    parts: Vec<P>,
    query: Q,
    params: SeparateParams,
    cache: ShapeCache<P::Shape>,
    step_count: u32,
    outcome: Option<SeparationOutcome>,
    last_contacts: Vec<ContactTrace>,
}

impl<P, Q> core::fmt::Debug for Separator<P, Q>
where
    P: Part + core::fmt::Debug,
    P::Shape: core::fmt::Debug,
    Q: CollisionQuery<Shape = P::Shape> + core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Separator")
            .field("parts", &self.parts)
            .field("query", &self.query)
            .field("params", &self.params)
            .field("cache", &self.cache)
            .field("step_count", &self.step_count)
            .field("outcome", &self.outcome)
            .field("last_contacts", &self.last_contacts)
            .finish()
    }
}

impl<P, Q> Separator<P, Q>
where
    P: Part,
    Q: CollisionQuery<Shape = P::Shape>,
{
    /// Create a solver over the given parts.
    ///
    /// Builds a fresh collision shape for every part at its initial pose
    /// and remembers those poses for the delta-transform strategy.
    ///
    /// # Errors
    ///
    /// Returns [`SeparateError::InvalidParams`](crate::SeparateError) when
    /// the configuration is invalid; nothing is built in that case.
    pub fn new(parts: Vec<P>, query: Q, params: SeparateParams) -> Result<Self> {
        params.validate()?;
        let cache = ShapeCache::new(&parts, params.shape_strategy);

        Ok(Self {
            parts,
            query,
            params,
            cache,
            step_count: 0,
            outcome: None,
            last_contacts: Vec::new(),
        })
    }

    /// Perform one scan → compute → apply → refresh step.
    ///
    /// A step that finds zero contacts finishes as
    /// [`SeparationOutcome::Converged`] without incrementing the step
    /// count or touching any part. Otherwise the step count increments
    /// exactly once, and the run finishes as
    /// [`SeparationOutcome::Exhausted`] when the budget is reached.
    /// Once finished, further calls are no-ops.
    ///
    /// # Errors
    ///
    /// A collision-query failure aborts the step before any part is
    /// modified (the scan phase is read-only) and is returned unchanged.
    pub fn advance(&mut self) -> Result<StepResult> {
        if self.outcome.is_some() {
            return Ok(self.step_result());
        }

        let pairs = scan_pairs(&self.parts, &self.cache, &self.query, &self.params)?;
        if pairs.is_empty() {
            debug!(
                "converged after {} steps: no penetrating pairs",
                self.step_count
            );
            self.outcome = Some(SeparationOutcome::Converged);
            self.last_contacts.clear();
            return Ok(self.step_result());
        }

        let corrections = compute_corrections(&pairs, &self.parts, &self.params);
        let moved = apply_corrections(&mut self.parts, &corrections.per_part);
        for &index in &moved {
            self.cache.mark_moved(index);
        }
        self.cache.refresh(&self.parts);

        self.last_contacts = corrections.traces;
        self.step_count += 1;
        debug!(
            "step {}: {} pairs, {} parts moved",
            self.step_count,
            pairs.len(),
            moved.len()
        );

        if self.step_count >= self.params.max_steps {
            debug!("step budget of {} exhausted", self.params.max_steps);
            self.outcome = Some(SeparationOutcome::Exhausted);
        }

        Ok(self.step_result())
    }

    /// Whether the solver reached a terminal state.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// How the run ended, once finished.
    #[must_use]
    pub fn outcome(&self) -> Option<SeparationOutcome> {
        self.outcome
    }

    /// Number of correcting steps performed so far.
    #[must_use]
    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    /// The configuration supplied at construction.
    #[must_use]
    pub fn params(&self) -> &SeparateParams {
        &self.params
    }

    /// Diagnostic snapshot of the last step's contacts and push vectors.
    ///
    /// Read-only; not consumed by the algorithm. Empty before the first
    /// step and after a converged scan.
    #[must_use]
    pub fn last_step_contacts(&self) -> &[ContactTrace] {
        &self.last_contacts
    }

    /// The parts, in their original order, at their current poses.
    #[must_use]
    pub fn parts(&self) -> &[P] {
        &self.parts
    }

    /// Up-to-date collision shapes, one per part.
    ///
    /// Force-rebuilds any shape that is stale relative to its part's pose
    /// (regardless of strategy), so callers can run final-state collision
    /// checks against current geometry.
    pub fn current_shapes(&mut self) -> &[P::Shape] {
        self.cache.rebuild_moved(&self.parts);
        self.cache.shapes()
    }

    /// Consume the solver and hand the parts back to the caller.
    ///
    /// All shapes owned by the solver are released.
    #[must_use]
    pub fn into_parts(self) -> Vec<P> {
        self.parts
    }

    fn step_result(&self) -> StepResult {
        StepResult {
            finished: self.outcome.is_some(),
            step_count: self.step_count,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::contact::Contact;
    use crate::query::Aabb;
    use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};

    #[derive(Debug)]
    struct FixedPart;

    impl Part for FixedPart {
        type Shape = ();

        fn position(&self) -> Point3<f64> {
            Point3::origin()
        }

        fn set_position(&mut self, _position: Point3<f64>) {}

        fn rotation(&self) -> UnitQuaternion<f64> {
            UnitQuaternion::identity()
        }

        fn set_rotation(&mut self, _rotation: UnitQuaternion<f64>) {}

        fn mass(&self) -> f64 {
            1.0
        }

        fn build_shape(&self) -> Self::Shape {}
    }

    #[derive(Debug)]
    struct EmptyWorld;

    impl CollisionQuery for EmptyWorld {
        type Shape = ();

        fn contacts(
            &self,
            _first: &(),
            _second: &(),
            _delta_first: Option<&Isometry3<f64>>,
            _delta_second: Option<&Isometry3<f64>>,
            _max_contacts: usize,
        ) -> Result<Vec<Contact>> {
            Ok(Vec::new())
        }

        fn bounding_box(&self, _shape: &()) -> Aabb {
            Aabb::from_center(Point3::origin(), Vector3::repeat(0.5))
        }
    }

    #[test]
    fn test_invalid_params_rejected_at_construction() {
        let params = SeparateParams::default().with_move_per_step(-1.0);
        let err = Separator::new(vec![FixedPart], EmptyWorld, params).unwrap_err();
        assert!(err.is_params_error());
    }

    #[test]
    fn test_converges_immediately_without_contacts() {
        let mut separator =
            Separator::new(vec![FixedPart, FixedPart], EmptyWorld, SeparateParams::default())
                .unwrap();

        let result = separator.advance().unwrap();
        assert!(result.finished);
        assert_eq!(result.step_count, 0);
        assert_eq!(separator.outcome(), Some(SeparationOutcome::Converged));
        assert!(separator.last_step_contacts().is_empty());
    }

    #[test]
    fn test_advance_after_finish_is_a_noop() {
        let mut separator =
            Separator::new(vec![FixedPart], EmptyWorld, SeparateParams::default()).unwrap();

        separator.advance().unwrap();
        let again = separator.advance().unwrap();
        assert!(again.finished);
        assert_eq!(again.step_count, 0);
    }

    #[test]
    fn test_empty_part_list_converges() {
        let parts: Vec<FixedPart> = Vec::new();
        let mut separator = Separator::new(parts, EmptyWorld, SeparateParams::default()).unwrap();

        let result = separator.advance().unwrap();
        assert!(result.finished);
        assert!(separator.into_parts().is_empty());
    }
}
