//! Collision collaborator interface.
//!
//! The solver never does narrow-phase geometry itself; it asks an external
//! collision backend for penetrating contacts between two opaque shape
//! handles and for a coarse bounding box per shape. Both queries must be
//! pure: they never mutate the shapes.

use nalgebra::{Isometry3, Point3, Vector3};

use crate::contact::Contact;
use crate::error::Result;

/// An axis-aligned bounding box in world coordinates.
///
/// Used by the solver only as a coarse size heuristic: the noise threshold
/// for contact filtering is relative to the mean extent of each part's box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3<f64>,
    /// Maximum corner of the bounding box.
    pub max: Point3<f64>,
}

impl Aabb {
    /// Creates a new AABB from minimum and maximum corners.
    ///
    /// The corners are automatically reordered if necessary.
    #[must_use]
    pub fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Creates an AABB centered at a point with the given half-extents.
    #[must_use]
    pub fn from_center(center: Point3<f64>, half_extents: Vector3<f64>) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Returns the center point of the AABB.
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// Returns the half-extents (half-size) of the AABB.
    #[must_use]
    pub fn half_extents(&self) -> Vector3<f64> {
        self.size() * 0.5
    }

    /// Returns the full size (dimensions) of the AABB.
    #[must_use]
    pub fn size(&self) -> Vector3<f64> {
        Vector3::new(
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        )
    }

    /// Returns the arithmetic mean of the three extents.
    ///
    /// This is the "approximate size" of a part used for the size-relative
    /// noise threshold.
    #[must_use]
    pub fn mean_extent(&self) -> f64 {
        let size = self.size();
        (size.x + size.y + size.z) / 3.0
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new(Point3::origin(), Point3::origin())
    }
}

/// The collision collaborator consumed by the solver.
///
/// Shape handles are opaque to the solver; they are produced by
/// [`Part::build_shape`](crate::Part::build_shape) and owned by the
/// solver's shape cache.
pub trait CollisionQuery {
    /// Opaque collision shape handle.
    type Shape;

    /// Returns the penetrating contacts between two shapes, or an empty
    /// sequence if they do not overlap.
    ///
    /// Each [`Contact::normal`] points from `first` toward `second`. At most
    /// `max_contacts` contacts are returned, in a stable order.
    ///
    /// A supplied delta virtually re-poses a shape without rebuilding it:
    /// the effective pose of the shape is `built_pose · delta`, where
    /// `delta = built_pose⁻¹ · current_pose`, so the query sees the part's
    /// true current pose. `None` means the shape is current as built.
    ///
    /// Must be a pure query: no mutation of either shape.
    ///
    /// # Errors
    ///
    /// Returns [`SeparateError::Query`](crate::SeparateError::Query) when
    /// the backend cannot answer; the failure is surfaced unchanged from
    /// [`Separator::advance`](crate::Separator::advance).
    fn contacts(
        &self,
        first: &Self::Shape,
        second: &Self::Shape,
        delta_first: Option<&Isometry3<f64>>,
        delta_second: Option<&Isometry3<f64>>,
        max_contacts: usize,
    ) -> Result<Vec<Contact>>;

    /// Returns a coarse bounding box for a shape, as built.
    ///
    /// Only used to derive the per-part size heuristic; looseness is fine.
    fn bounding_box(&self, shape: &Self::Shape) -> Aabb;
}
