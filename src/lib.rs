//! Quasi-static overlap resolution for rigid parts.
//!
//! Given a set of rigid parts that may initially interpenetrate, this crate
//! iteratively pushes them apart using only the pairwise penetration
//! contacts reported by an external collision backend. There is no physics
//! timestep and no velocity state: each step is a pure geometric correction,
//! which makes the loop deterministic and safe to drive at any rate (for
//! example from a UI timer).
//!
//! # Correction Model
//!
//! Every step scans all part pairs for contacts, filters out contacts
//! shallower than a size-relative noise threshold, and converts each
//! surviving contact into a mass-weighted push:
//!
//! ```text
//! scaled  = avg_depth * (depth / sum_depth) * move_per_step * dampening
//! push_a  = -direction * scaled * m_b / (m_a + m_b)
//! push_b  =  direction * scaled * m_a / (m_a + m_b)
//! ```
//!
//! so the heavier part moves less. When more pairs intersect than there are
//! parts, every push is damped by `part_count / pair_count` to keep the
//! over-constrained system stable. All corrections of one step are
//! accumulated first and applied to each part exactly once (read phase,
//! then write phase), so no part moves while the scan is in flight.
//!
//! With rotation enabled, each contact pushes along its own normal and the
//! off-center component of the push becomes a torque, converted into a
//! rotation whose angle is capped per step.
//!
//! # Collaborators
//!
//! The solver owns no geometry. Parts implement [`Part`] (pose access,
//! mass, shape factory); the collision backend implements
//! [`CollisionQuery`] (pairwise contacts and coarse bounds). Shapes are
//! opaque handles cached per part and either rebuilt when a part moves or
//! virtually re-posed with a delta transform ([`ShapeStrategy`]).
//!
//! # Example
//!
//! ```
//! use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};
//! use sim_separate::{
//!     Aabb, CollisionQuery, Contact, Part, Result, SeparateParams, Separator,
//! };
//!
//! struct Ball {
//!     position: Point3<f64>,
//!     rotation: UnitQuaternion<f64>,
//!     mass: f64,
//!     radius: f64,
//! }
//!
//! struct BallShape {
//!     pose: Isometry3<f64>,
//!     radius: f64,
//! }
//!
//! impl Part for Ball {
//!     type Shape = BallShape;
//!
//!     fn position(&self) -> Point3<f64> {
//!         self.position
//!     }
//!
//!     fn set_position(&mut self, position: Point3<f64>) {
//!         self.position = position;
//!     }
//!
//!     fn rotation(&self) -> UnitQuaternion<f64> {
//!         self.rotation
//!     }
//!
//!     fn set_rotation(&mut self, rotation: UnitQuaternion<f64>) {
//!         self.rotation = rotation;
//!     }
//!
//!     fn mass(&self) -> f64 {
//!         self.mass
//!     }
//!
//!     fn build_shape(&self) -> BallShape {
//!         BallShape {
//!             pose: self.pose(),
//!             radius: self.radius,
//!         }
//!     }
//! }
//!
//! struct BallWorld;
//!
//! impl BallWorld {
//!     fn center(shape: &BallShape, delta: Option<&Isometry3<f64>>) -> Point3<f64> {
//!         delta.map_or(shape.pose, |d| shape.pose * d) * Point3::origin()
//!     }
//! }
//!
//! impl CollisionQuery for BallWorld {
//!     type Shape = BallShape;
//!
//!     fn contacts(
//!         &self,
//!         first: &BallShape,
//!         second: &BallShape,
//!         delta_first: Option<&Isometry3<f64>>,
//!         delta_second: Option<&Isometry3<f64>>,
//!         _max_contacts: usize,
//!     ) -> Result<Vec<Contact>> {
//!         let a = Self::center(first, delta_first);
//!         let b = Self::center(second, delta_second);
//!         let depth = first.radius + second.radius - (b - a).norm();
//!         if depth > 0.0 {
//!             Ok(vec![Contact {
//!                 point: nalgebra::center(&a, &b),
//!                 normal: b - a,
//!                 depth,
//!             }])
//!         } else {
//!             Ok(Vec::new())
//!         }
//!     }
//!
//!     fn bounding_box(&self, shape: &BallShape) -> Aabb {
//!         Aabb::from_center(
//!             shape.pose * Point3::origin(),
//!             Vector3::repeat(shape.radius),
//!         )
//!     }
//! }
//!
//! // Two unit balls overlapping by 1.0 along X.
//! let balls = vec![
//!     Ball {
//!         position: Point3::new(-0.5, 0.0, 0.0),
//!         rotation: UnitQuaternion::identity(),
//!         mass: 1.0,
//!         radius: 1.0,
//!     },
//!     Ball {
//!         position: Point3::new(0.5, 0.0, 0.0),
//!         rotation: UnitQuaternion::identity(),
//!         mass: 1.0,
//!         radius: 1.0,
//!     },
//! ];
//!
//! let mut separator = Separator::new(balls, BallWorld, SeparateParams::default())?;
//! while !separator.advance()?.finished {}
//!
//! let parts = separator.into_parts();
//! let distance = (parts[1].position - parts[0].position).norm();
//! assert!(distance >= 2.0 - 0.1);
//! # Ok::<(), sim_separate::SeparateError>(())
//! ```
//!
//! # Determinism
//!
//! Pairs are scanned in a fixed enumeration order, corrections are kept in
//! ordered containers, and rotations compose in append order, so two runs
//! from identical inputs produce identical pose sequences. The optional
//! `parallel` feature distributes the scan over rayon but merges results
//! back into enumeration order before they are used.
//!
//! # Feature Flags
//!
//! - `serde`: serialization for configuration and contact types.
//! - `parallel`: [`scan_pairs_parallel`] for scenes with many parts.

#![doc(html_root_url = "https://docs.rs/sim-separate/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn)]

mod contact;
mod correction;
mod error;
mod params;
mod part;
mod query;
mod scan;
mod shapes;
mod solver;

pub use contact::{Contact, ContactTrace, PairContacts};
pub use correction::{apply_corrections, compute_corrections, Correction, CorrectionSet};
pub use error::{Result, SeparateError};
pub use params::{SeparateParams, ShapeStrategy};
pub use part::Part;
pub use query::{Aabb, CollisionQuery};
pub use scan::scan_pairs;
#[cfg(feature = "parallel")]
pub use scan::scan_pairs_parallel;
pub use shapes::ShapeCache;
pub use solver::{SeparationOutcome, Separator, StepResult};
