//! Contact and pair-intersection types.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One penetrating point between two parts.
///
/// Contacts are produced fresh by every scan and discarded after the step
/// that consumes them; the solver keeps no history beyond the read-only
/// diagnostic snapshot of the last step.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Contact {
    /// Contact location in world coordinates.
    pub point: Point3<f64>,

    /// Separation normal, pointing from the first part of the pair toward
    /// the second. Not necessarily unit length.
    pub normal: Vector3<f64>,

    /// Penetration depth along the normal. Non-negative.
    pub depth: f64,
}

/// The surviving contacts between one unordered pair of parts.
///
/// Produced by the scanner in pair enumeration order (`first < second`),
/// which fixes the tie-break order for correction application and keeps
/// runs reproducible.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PairContacts {
    /// Index of the first part of the pair.
    pub first: usize,

    /// Index of the second part of the pair.
    pub second: usize,

    /// Memoized size heuristic for the first part (mean bounding-box extent).
    pub size_first: f64,

    /// Memoized size heuristic for the second part.
    pub size_second: f64,

    /// Contacts deeper than the noise threshold, in query order.
    pub contacts: Vec<Contact>,
}

impl PairContacts {
    /// Sum of the penetration depths over all contacts of this pair.
    #[must_use]
    pub fn total_depth(&self) -> f64 {
        self.contacts.iter().map(|c| c.depth).sum()
    }

    /// Average penetration depth over all contacts of this pair.
    ///
    /// Zero when the pair holds no contacts.
    #[must_use]
    pub fn average_depth(&self) -> f64 {
        if self.contacts.is_empty() {
            0.0
        } else {
            self.total_depth() / self.contacts.len() as f64
        }
    }
}

/// Diagnostic snapshot of one contact from the last step.
///
/// Holds the contact point and the push vectors the correction calculator
/// derived from it, for debug visualization. Not consumed by the algorithm.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactTrace {
    /// Contact location in world coordinates.
    pub point: Point3<f64>,

    /// Push vectors applied because of this contact (one per affected part;
    /// empty when the contact was skipped as degenerate).
    pub pushes: Vec<Vector3<f64>>,
}
