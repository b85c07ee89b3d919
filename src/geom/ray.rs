//! Ray casting infrastructure.
//!
//! This module provides a Ray struct and ray-geometry intersection tests
//! used for pointer picking against room surfaces and placed assets.

use crate::geom::bboxes::BoundingBox;
use crate::geom::plane::Plane;
use crate::{Point, Vector};

/// Parallel/behind-origin tolerance used by the intersection tests.
const RAY_EPS: f64 = 1e-10;

/// A ray defined by an origin point and a direction vector.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray
    pub origin: Point,
    /// Direction vector (always normalized)
    pub direction: Vector,
}

impl Ray {
    /// Creates a new ray from origin point and direction vector.
    ///
    /// The direction vector is automatically normalized.
    pub fn new(origin: Point, direction: Vector) -> Option<Self> {
        let normalized = direction.normalize().ok()?;
        Some(Self {
            origin,
            direction: normalized,
        })
    }

    /// Creates a ray from two points (origin to target).
    pub fn from_points(origin: Point, target: Point) -> Option<Self> {
        let direction = target - origin;
        Self::new(origin, direction)
    }

    /// Returns the point along the ray at parameter t.
    ///
    /// point = origin + t * direction
    pub fn point_at(&self, t: f64) -> Point {
        self.origin + self.direction * t
    }

    /// Calculates the intersection of this ray with an infinite plane.
    ///
    /// Returns `Some((t, point))` for intersections in front of the origin.
    pub fn intersect_plane(&self, plane: &Plane) -> Option<(f64, Point)> {
        let (a, b, c, d) = plane.coefficients();

        let denom = plane.normal.dot(&self.direction);
        if denom.abs() < RAY_EPS {
            return None; // Ray parallel to plane
        }

        // Plane: a*x + b*y + c*z + d = 0, Ray: P = origin + t * direction
        let origin_dot = a * self.origin.x + b * self.origin.y + c * self.origin.z + d;
        let t = -origin_dot / denom;
        if t < RAY_EPS {
            return None;
        }

        Some((t, self.point_at(t)))
    }

    /// Calculates the intersection of this ray with an axis-aligned box (slab method).
    ///
    /// Returns the entry point, or the exit point if the origin is inside the box.
    pub fn intersect_box(&self, bbox: &BoundingBox) -> Option<(f64, Point)> {
        let origin = [self.origin.x, self.origin.y, self.origin.z];
        let dir = [self.direction.dx, self.direction.dy, self.direction.dz];
        let lo = [bbox.min.x, bbox.min.y, bbox.min.z];
        let hi = [bbox.max.x, bbox.max.y, bbox.max.z];

        let mut t_near = f64::NEG_INFINITY;
        let mut t_far = f64::INFINITY;
        for axis in 0..3 {
            if dir[axis].abs() < RAY_EPS {
                if origin[axis] < lo[axis] || origin[axis] > hi[axis] {
                    return None;
                }
                continue;
            }
            let t0 = (lo[axis] - origin[axis]) / dir[axis];
            let t1 = (hi[axis] - origin[axis]) / dir[axis];
            let (t0, t1) = if t0 < t1 { (t0, t1) } else { (t1, t0) };
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_near > t_far {
                return None;
            }
        }

        if t_far < RAY_EPS {
            return None; // Box is behind the ray
        }
        let t = if t_near >= RAY_EPS { t_near } else { t_far };
        Some((t, self.point_at(t)))
    }
}
