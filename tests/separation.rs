//! End-to-end separation scenarios against an analytic sphere backend.

#![allow(clippy::unwrap_used, clippy::float_cmp, clippy::similar_names)]

use std::cell::Cell;

use approx::assert_relative_eq;
use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};
use sim_separate::{
    Aabb, CollisionQuery, Contact, Part, Result, SeparateError, SeparateParams, SeparationOutcome,
    Separator, ShapeStrategy,
};

struct Ball {
    position: Point3<f64>,
    rotation: UnitQuaternion<f64>,
    mass: f64,
    radius: f64,
    builds: Cell<u32>,
}

fn ball(x: f64, y: f64, z: f64, mass: f64, radius: f64) -> Ball {
    Ball {
        position: Point3::new(x, y, z),
        rotation: UnitQuaternion::identity(),
        mass,
        radius,
        builds: Cell::new(0),
    }
}

struct BallShape {
    pose: Isometry3<f64>,
    radius: f64,
}

impl Part for Ball {
    type Shape = BallShape;

    fn position(&self) -> Point3<f64> {
        self.position
    }

    fn set_position(&mut self, position: Point3<f64>) {
        self.position = position;
    }

    fn rotation(&self) -> UnitQuaternion<f64> {
        self.rotation
    }

    fn set_rotation(&mut self, rotation: UnitQuaternion<f64>) {
        self.rotation = rotation;
    }

    fn mass(&self) -> f64 {
        self.mass
    }

    fn build_shape(&self) -> BallShape {
        self.builds.set(self.builds.get() + 1);
        BallShape {
            pose: self.pose(),
            radius: self.radius,
        }
    }
}

struct BallWorld;

impl BallWorld {
    fn center(shape: &BallShape, delta: Option<&Isometry3<f64>>) -> Point3<f64> {
        delta.map_or(shape.pose, |d| shape.pose * d) * Point3::origin()
    }
}

impl CollisionQuery for BallWorld {
    type Shape = BallShape;

    fn contacts(
        &self,
        first: &BallShape,
        second: &BallShape,
        delta_first: Option<&Isometry3<f64>>,
        delta_second: Option<&Isometry3<f64>>,
        _max_contacts: usize,
    ) -> Result<Vec<Contact>> {
        let a = Self::center(first, delta_first);
        let b = Self::center(second, delta_second);
        let depth = first.radius + second.radius - (b - a).norm();
        if depth > 0.0 {
            Ok(vec![Contact {
                point: nalgebra::center(&a, &b),
                normal: b - a,
                depth,
            }])
        } else {
            Ok(Vec::new())
        }
    }

    fn bounding_box(&self, shape: &BallShape) -> Aabb {
        Aabb::from_center(shape.pose * Point3::origin(), Vector3::repeat(shape.radius))
    }
}

/// Backend that always fails its contact query.
struct BrokenWorld;

impl CollisionQuery for BrokenWorld {
    type Shape = BallShape;

    fn contacts(
        &self,
        _first: &BallShape,
        _second: &BallShape,
        _delta_first: Option<&Isometry3<f64>>,
        _delta_second: Option<&Isometry3<f64>>,
        _max_contacts: usize,
    ) -> Result<Vec<Contact>> {
        Err(SeparateError::query("backend unavailable"))
    }

    fn bounding_box(&self, shape: &BallShape) -> Aabb {
        Aabb::from_center(shape.pose * Point3::origin(), Vector3::repeat(shape.radius))
    }
}

fn run_to_finish(separator: &mut Separator<Ball, BallWorld>) -> u32 {
    loop {
        let result = separator.advance().unwrap();
        if result.finished {
            return result.step_count;
        }
    }
}

#[test]
fn test_two_unit_spheres_split_evenly() {
    // Overlap depth 1.0 along X; equal masses mean a 50/50 split.
    let balls = vec![ball(-0.5, 0.0, 0.0, 1.0, 1.0), ball(0.5, 0.0, 0.0, 1.0, 1.0)];
    let mut separator = Separator::new(balls, BallWorld, SeparateParams::default()).unwrap();

    let result = separator.advance().unwrap();
    assert!(!result.finished);
    assert_eq!(result.step_count, 1);

    let displacement_a = separator.parts()[0].position - Point3::new(-0.5, 0.0, 0.0);
    let displacement_b = separator.parts()[1].position - Point3::new(0.5, 0.0, 0.0);
    assert_relative_eq!(displacement_a, Vector3::new(-0.5, 0.0, 0.0), epsilon = 1e-12);
    assert_relative_eq!(displacement_b, Vector3::new(0.5, 0.0, 0.0), epsilon = 1e-12);
    assert_relative_eq!(displacement_a.norm(), displacement_b.norm(), epsilon = 1e-12);

    // One trace for the single contact, with both push vectors.
    assert_eq!(separator.last_step_contacts().len(), 1);
    assert_eq!(separator.last_step_contacts()[0].pushes.len(), 2);

    run_to_finish(&mut separator);
    assert_eq!(separator.outcome(), Some(SeparationOutcome::Converged));
    assert!(separator.last_step_contacts().is_empty());

    let parts = separator.into_parts();
    let distance = (parts[1].position - parts[0].position).norm();
    // Converged means no residual overlap beyond the noise tolerance.
    assert!(distance >= 2.0 - 0.05);
}

#[test]
fn test_heavier_part_moves_proportionally_less() {
    // mass(a) = 3 * mass(b): b's total displacement must converge to 3x a's.
    let start_a = Point3::new(-0.5, 0.0, 0.0);
    let start_b = Point3::new(0.5, 0.0, 0.0);
    let balls = vec![
        ball(start_a.x, 0.0, 0.0, 3.0, 1.0),
        ball(start_b.x, 0.0, 0.0, 1.0, 1.0),
    ];
    let mut separator = Separator::new(balls, BallWorld, SeparateParams::default()).unwrap();
    run_to_finish(&mut separator);

    let parts = separator.into_parts();
    let moved_a = (parts[0].position - start_a).norm();
    let moved_b = (parts[1].position - start_b).norm();
    assert_relative_eq!(moved_b / moved_a, 3.0, epsilon = 1e-9);
}

#[test]
fn test_no_op_when_nothing_overlaps() {
    let balls = vec![ball(0.0, 0.0, 0.0, 1.0, 1.0), ball(5.0, 0.0, 0.0, 1.0, 1.0)];
    let mut separator = Separator::new(balls, BallWorld, SeparateParams::default()).unwrap();

    let result = separator.advance().unwrap();
    assert!(result.finished);
    assert_eq!(result.step_count, 0);
    assert_eq!(separator.outcome(), Some(SeparationOutcome::Converged));

    let parts = separator.into_parts();
    assert_eq!(parts[0].position, Point3::new(0.0, 0.0, 0.0));
    assert_eq!(parts[1].position, Point3::new(5.0, 0.0, 0.0));
}

#[test]
fn test_runs_are_deterministic() {
    let scene = || {
        vec![
            ball(0.0, 0.0, 0.0, 1.0, 1.0),
            ball(1.2, 0.3, 0.0, 2.0, 1.0),
            ball(0.5, 1.0, 0.2, 0.5, 1.0),
        ]
    };
    let params = SeparateParams::default().with_move_per_step(0.5);

    let record = |mut separator: Separator<Ball, BallWorld>| {
        let mut poses = Vec::new();
        loop {
            let result = separator.advance().unwrap();
            for part in separator.parts() {
                poses.push((part.position, part.rotation));
            }
            if result.finished {
                return poses;
            }
        }
    };

    let first = record(Separator::new(scene(), BallWorld, params).unwrap());
    let second = record(Separator::new(scene(), BallWorld, params).unwrap());

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.0, b.0);
        assert_eq!(a.1, b.1);
    }
}

#[test]
fn test_step_budget_exhaustion_is_reported() {
    let balls = vec![ball(-0.5, 0.0, 0.0, 1.0, 1.0), ball(0.5, 0.0, 0.0, 1.0, 1.0)];
    let params = SeparateParams::default()
        .with_move_per_step(0.05)
        .with_max_steps(3);
    let mut separator = Separator::new(balls, BallWorld, params).unwrap();

    let steps = run_to_finish(&mut separator);
    assert_eq!(steps, 3);
    assert_eq!(separator.outcome(), Some(SeparationOutcome::Exhausted));

    // Finished is terminal: another call changes nothing.
    let again = separator.advance().unwrap();
    assert!(again.finished);
    assert_eq!(again.step_count, 3);

    // Residual overlap remains; that is reported, not an error.
    let parts = separator.into_parts();
    assert!((parts[1].position - parts[0].position).norm() < 2.0);
}

#[test]
fn test_shape_strategies_agree() {
    let scene = || {
        vec![
            ball(-0.3, 0.0, 0.0, 1.0, 1.0),
            ball(0.4, 0.1, 0.0, 2.0, 1.0),
        ]
    };
    let params = SeparateParams::default().with_move_per_step(0.4);

    let run = |strategy: ShapeStrategy| {
        let mut separator = Separator::new(
            scene(),
            BallWorld,
            params.with_shape_strategy(strategy),
        )
        .unwrap();
        let mut poses = Vec::new();
        loop {
            let result = separator.advance().unwrap();
            for part in separator.parts() {
                poses.push(part.position);
            }
            if result.finished {
                return poses;
            }
        }
    };

    let rebuilt = run(ShapeStrategy::Rebuild);
    let delta = run(ShapeStrategy::DeltaTransform);

    assert_eq!(rebuilt.len(), delta.len());
    for (a, b) in rebuilt.iter().zip(delta.iter()) {
        assert_relative_eq!(a.coords, b.coords, epsilon = 1e-9);
    }
}

#[test]
fn test_unmoved_parts_never_rebuild_their_shape() {
    // Two overlapping balls plus a distant bystander.
    let balls = vec![
        ball(-0.5, 0.0, 0.0, 1.0, 1.0),
        ball(0.5, 0.0, 0.0, 1.0, 1.0),
        ball(10.0, 0.0, 0.0, 1.0, 1.0),
    ];
    let mut separator = Separator::new(balls, BallWorld, SeparateParams::default()).unwrap();
    run_to_finish(&mut separator);

    let parts = separator.into_parts();
    // Overlapping balls: built at construction plus once after their move.
    assert_eq!(parts[0].builds.get(), 2);
    assert_eq!(parts[1].builds.get(), 2);
    // The bystander never moved and must never be rebuilt.
    assert_eq!(parts[2].builds.get(), 1);
}

#[test]
fn test_current_shapes_are_fresh_on_demand() {
    let balls = vec![ball(-0.5, 0.0, 0.0, 1.0, 1.0), ball(0.5, 0.0, 0.0, 1.0, 1.0)];
    let params =
        SeparateParams::default().with_shape_strategy(ShapeStrategy::DeltaTransform);
    let mut separator = Separator::new(balls, BallWorld, params).unwrap();
    run_to_finish(&mut separator);

    // Delta mode never rebuilt during the run.
    assert_eq!(separator.parts()[0].builds.get(), 1);

    let positions: Vec<_> = separator.parts().iter().map(|p| p.position).collect();
    let centers: Vec<_> = separator
        .current_shapes()
        .iter()
        .map(|shape| shape.pose * Point3::origin())
        .collect();
    for (center, position) in centers.iter().zip(positions.iter()) {
        assert_relative_eq!(center.coords, position.coords, epsilon = 1e-12);
    }

    // Shapes are now current: asking again rebuilds nothing.
    let builds_after: Vec<_> = separator.parts().iter().map(|p| p.builds.get()).collect();
    let _ = separator.current_shapes();
    let builds_again: Vec<_> = separator.parts().iter().map(|p| p.builds.get()).collect();
    assert_eq!(builds_after, builds_again);
}

#[test]
fn test_rotation_mode_with_central_contacts_stays_upright() {
    // Sphere contacts pass through both centers: zero torque everywhere,
    // so enabling rotation must not introduce any spin.
    let balls = vec![ball(-0.5, 0.0, 0.0, 1.0, 1.0), ball(0.5, 0.0, 0.0, 1.0, 1.0)];
    let params = SeparateParams::default().with_rotation(true);
    let mut separator = Separator::new(balls, BallWorld, params).unwrap();
    run_to_finish(&mut separator);

    assert_eq!(separator.outcome(), Some(SeparationOutcome::Converged));
    let parts = separator.into_parts();
    for part in &parts {
        assert_relative_eq!(part.rotation.angle(), 0.0, epsilon = 1e-12);
    }
    assert!((parts[1].position - parts[0].position).norm() >= 2.0 - 0.05);
}

#[test]
fn test_collision_failure_aborts_the_step() {
    let balls = vec![ball(-0.5, 0.0, 0.0, 1.0, 1.0), ball(0.5, 0.0, 0.0, 1.0, 1.0)];
    let mut separator = Separator::new(balls, BrokenWorld, SeparateParams::default()).unwrap();

    let err = separator.advance().unwrap_err();
    assert!(err.is_query_error());

    // The failed step changed nothing.
    assert!(!separator.is_finished());
    assert_eq!(separator.step_count(), 0);
    let parts = separator.into_parts();
    assert_eq!(parts[0].position, Point3::new(-0.5, 0.0, 0.0));
    assert_eq!(parts[1].position, Point3::new(0.5, 0.0, 0.0));
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_scan_matches_sequential() {
    use sim_separate::{scan_pairs, scan_pairs_parallel, ShapeCache};

    let balls = vec![
        ball(0.0, 0.0, 0.0, 1.0, 1.0),
        ball(1.2, 0.3, 0.0, 2.0, 1.0),
        ball(0.5, 1.0, 0.2, 0.5, 1.0),
        ball(-0.8, 0.4, -0.1, 1.5, 1.0),
    ];
    let params = SeparateParams::default();
    let cache = ShapeCache::new(&balls, params.shape_strategy);

    let sequential = scan_pairs(&balls, &cache, &BallWorld, &params).unwrap();
    let parallel = scan_pairs_parallel(&balls, &cache, &BallWorld, &params, 1).unwrap();

    assert_eq!(sequential, parallel);
}
