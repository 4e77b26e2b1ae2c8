//! Obstacle distance-field oracle.
//!
//! The planner only ever asks one question of the environment: how far is a
//! point from the nearest obstacle. Field construction (octree, voxel grid,
//! whatever the deployment uses) lives outside this crate; anything that can
//! answer the query plugs in through [`DistanceField`].

use crate::core::types::Point3;

/// Nearest-obstacle distance oracle queried during box expansion.
///
/// Implementations are treated as exact ground truth; the planner applies its
/// own margins and tolerances on top.
pub trait DistanceField {
    /// Distance from `point` to the nearest obstacle, in meters.
    fn distance(&self, point: Point3) -> f64;
}

impl<T: DistanceField + ?Sized> DistanceField for &T {
    fn distance(&self, point: Point3) -> f64 {
        (**self).distance(point)
    }
}

/// A field with no obstacles anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObstacles;

impl DistanceField for NoObstacles {
    fn distance(&self, _point: Point3) -> f64 {
        f64::INFINITY
    }
}

/// Distance to the nearest of a fixed set of obstacle points.
///
/// A brute-force field for tests and small scenes.
#[derive(Debug, Clone, Default)]
pub struct PointObstacles {
    points: Vec<Point3>,
}

impl PointObstacles {
    /// Create a field from obstacle points.
    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }
}

impl DistanceField for PointObstacles {
    fn distance(&self, point: Point3) -> f64 {
        self.points
            .iter()
            .map(|p| (*p - point).norm())
            .fold(f64::INFINITY, f64::min)
    }
}
