//! Correction calculation and application.
//!
//! The step is split into a pure read-only phase and a single write phase:
//! [`compute_corrections`] turns the scanned pair intersections into an
//! ordered per-part correction map without touching any part, and
//! [`apply_corrections`] applies the merged result to each part exactly
//! once. Mutating a part mid-scan would invalidate in-flight pairwise
//! comparisons, so nothing is written until the whole map is built.

use std::collections::BTreeMap;

use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};

use crate::contact::{ContactTrace, PairContacts};
use crate::params::SeparateParams;
use crate::part::Part;

/// Direction vectors shorter than this are treated as degenerate.
const DIRECTION_EPSILON: f64 = 1e-12;

/// Torques with magnitude at or below this produce no rotation.
const TORQUE_EPSILON: f64 = 1e-12;

/// A pending pose delta for one part.
///
/// A part may receive several corrections in one step, one per contact with
/// an intersecting neighbor: translations sum, rotations compose by
/// sequential application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    /// Translation to add to the part's position, if any.
    pub translation: Option<Vector3<f64>>,

    /// Rotation delta to compose into the part's orientation, if any.
    pub rotation: Option<UnitQuaternion<f64>>,
}

impl Correction {
    /// A pure translation correction.
    #[must_use]
    pub fn translation(translation: Vector3<f64>) -> Self {
        Self {
            translation: Some(translation),
            rotation: None,
        }
    }
}

/// All corrections produced by one pass, plus the diagnostic trace.
#[derive(Debug, Clone, Default)]
pub struct CorrectionSet {
    /// Corrections per part index, appended in pair-scan order.
    ///
    /// A part with no contacts this step has no entry and is left untouched.
    pub per_part: BTreeMap<usize, Vec<Correction>>,

    /// One trace per surviving contact, in pair-scan order.
    pub traces: Vec<ContactTrace>,
}

impl CorrectionSet {
    fn push(&mut self, index: usize, correction: Correction) {
        self.per_part.entry(index).or_default().push(correction);
    }
}

/// Compute the mass-weighted corrections for one step.
///
/// When the number of intersecting pairs exceeds the number of parts, the
/// system is being asked to resolve more constraints per part than is
/// locally stable, so every correction is scaled down by
/// `part_count / pair_count` (global dampening).
///
/// Per pair, each contact contributes a push proportional to its share of
/// the pair's total penetration, split between the two parts so the heavier
/// part moves less. A pair whose combined mass is zero is skipped entirely;
/// zero-length directions or torques skip just the degenerate component.
#[must_use]
pub fn compute_corrections<P: Part>(
    pairs: &[PairContacts],
    parts: &[P],
    params: &SeparateParams,
) -> CorrectionSet {
    let mut set = CorrectionSet::default();
    if pairs.is_empty() {
        return set;
    }

    let dampening = if pairs.len() <= parts.len() {
        1.0
    } else {
        parts.len() as f64 / pairs.len() as f64
    };

    for pair in pairs {
        compute_pair(pair, parts, params, dampening, &mut set);
    }

    set
}

fn compute_pair<P: Part>(
    pair: &PairContacts,
    parts: &[P],
    params: &SeparateParams,
    dampening: f64,
    set: &mut CorrectionSet,
) {
    let (a, b) = (pair.first, pair.second);
    let mass_a = parts[a].mass();
    let mass_b = parts[b].mass();
    let total_mass = mass_a + mass_b;
    if total_mass <= 0.0 {
        // Both parts immovable; nothing to split.
        for contact in &pair.contacts {
            set.traces.push(ContactTrace {
                point: contact.point,
                pushes: Vec::new(),
            });
        }
        return;
    }

    let sum_depth = pair.total_depth();
    let avg_depth = pair.average_depth();
    if sum_depth <= 0.0 {
        return;
    }

    // Heavier part moves less: each part takes the other's mass fraction.
    let weight_a = (total_mass - mass_a) / total_mass;
    let weight_b = (total_mass - mass_b) / total_mass;

    let center_direction =
        (parts[b].position() - parts[a].position()).try_normalize(DIRECTION_EPSILON);
    let size_scale = params.move_per_step / pair.contacts.len() as f64;

    for contact in &pair.contacts {
        let percent = contact.depth / sum_depth;
        let scaled = avg_depth * percent * params.move_per_step * dampening;
        let dist_a = scaled * weight_a;
        let dist_b = scaled * weight_b;

        let mut trace = ContactTrace {
            point: contact.point,
            pushes: Vec::new(),
        };

        if params.enable_rotation {
            if let Some(direction) = contact.normal.try_normalize(DIRECTION_EPSILON) {
                let push_a = -direction * dist_a;
                let push_b = direction * dist_b;
                trace.pushes.push(push_a);
                trace.pushes.push(push_b);
                set.push(
                    a,
                    lever_arm_correction(
                        parts[a].position(),
                        contact.point,
                        push_a,
                        pair.size_first,
                        size_scale,
                        params.max_rotation_radians(),
                    ),
                );
                set.push(
                    b,
                    lever_arm_correction(
                        parts[b].position(),
                        contact.point,
                        push_b,
                        pair.size_second,
                        size_scale,
                        params.max_rotation_radians(),
                    ),
                );
            }
        } else if let Some(direction) = center_direction {
            let push_a = -direction * dist_a;
            let push_b = direction * dist_b;
            trace.pushes.push(push_a);
            trace.pushes.push(push_b);
            set.push(a, Correction::translation(push_a));
            set.push(b, Correction::translation(push_b));
        }

        set.traces.push(trace);
    }
}

/// Split a push applied at a contact point into a translation and a bounded
/// rotation about the part's center.
///
/// Standard force/lever-arm decomposition: the translation is the force
/// itself; the torque is `(contact_point - center) × force`. The torque
/// becomes a rotation about its own axis with an angle that grows with
/// `|torque| / expected_max` but never exceeds the configured per-step cap,
/// where `expected_max = size * size_scale` anchors the scale to the part.
fn lever_arm_correction(
    center: Point3<f64>,
    contact_point: Point3<f64>,
    force: Vector3<f64>,
    size: f64,
    size_scale: f64,
    max_angle: f64,
) -> Correction {
    let lever = contact_point - center;
    let torque = lever.cross(&force);

    Correction {
        translation: Some(force),
        rotation: rotation_from_torque(&torque, size * size_scale, max_angle),
    }
}

fn rotation_from_torque(
    torque: &Vector3<f64>,
    expected_max: f64,
    max_angle: f64,
) -> Option<UnitQuaternion<f64>> {
    let magnitude = torque.norm();
    if magnitude <= TORQUE_EPSILON || expected_max <= 0.0 {
        return None;
    }

    let angle = max_angle * (magnitude / expected_max).min(1.0);
    let axis = Unit::new_normalize(*torque);
    Some(UnitQuaternion::from_axis_angle(&axis, angle))
}

/// Apply the merged corrections, each part exactly once.
///
/// Translations sum into the position; rotation deltas compose into the
/// orientation by repeated rotate-by, in the order they were appended
/// (pair-scan order). Returns the indices of parts whose pose actually
/// changed, so the shape cache can mark them moved.
pub fn apply_corrections<P: Part>(
    parts: &mut [P],
    per_part: &BTreeMap<usize, Vec<Correction>>,
) -> Vec<usize> {
    let mut moved = Vec::new();

    for (&index, corrections) in per_part {
        let before_position = parts[index].position();
        let before_rotation = parts[index].rotation();

        let mut translation = Vector3::zeros();
        let mut rotation = before_rotation;
        for correction in corrections {
            if let Some(t) = correction.translation {
                translation += t;
            }
            if let Some(r) = correction.rotation {
                rotation = r * rotation;
            }
        }

        let position = before_position + translation;
        let changed = position != before_position || rotation != before_rotation;
        if changed {
            parts[index].set_position(position);
            parts[index].set_rotation(rotation);
            moved.push(index);
        }
    }

    moved
}
