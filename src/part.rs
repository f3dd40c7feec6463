//! Part collaborator interface.

use nalgebra::{Isometry3, Point3, UnitQuaternion};

/// A movable rigid entity subject to separation.
///
/// Parts are owned externally and supplied once at solver construction as
/// a fixed ordered sequence. The solver only reads and writes the pose,
/// reads the mass, and requests fresh collision shapes through
/// [`Part::build_shape`].
pub trait Part {
    /// Opaque collision shape handle produced for this part.
    type Shape;

    /// Current position in world coordinates.
    fn position(&self) -> Point3<f64>;

    /// Overwrite the position.
    fn set_position(&mut self, position: Point3<f64>);

    /// Current orientation as a unit quaternion.
    fn rotation(&self) -> UnitQuaternion<f64>;

    /// Overwrite the orientation.
    fn set_rotation(&mut self, rotation: UnitQuaternion<f64>);

    /// Total mass. Must be positive for a movable part; a pair whose
    /// combined mass is zero is skipped as degenerate.
    fn mass(&self) -> f64;

    /// Build a fresh collision shape reflecting the current pose.
    fn build_shape(&self) -> Self::Shape;

    /// Current pose as an isometry.
    fn pose(&self) -> Isometry3<f64> {
        Isometry3::from_parts(self.position().coords.into(), self.rotation())
    }
}
