use crate::{Point, Vector};
use anyhow::Result;

/// Infinite plane `a*x + b*y + c*z + d = 0` with a unit normal `(a, b, c)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector,
    pub d: f64,
}

impl Plane {
    /// Creates a plane through `pt` with the given normal.
    ///
    /// The normal is normalized; a zero-length normal is an error.
    pub fn from_point_normal(pt: Point, normal: Vector) -> Result<Self> {
        let normal = normal.normalize()?;
        let d = -(normal.dx * pt.x + normal.dy * pt.y + normal.dz * pt.z);
        Ok(Self { normal, d })
    }

    /// Horizontal plane at height `y`, facing up.
    pub fn horizontal(y: f64) -> Self {
        Self {
            normal: Vector::new(0.0, 1.0, 0.0),
            d: -y,
        }
    }

    /// Returns plane coefficients (a, b, c, d).
    pub fn coefficients(&self) -> (f64, f64, f64, f64) {
        (self.normal.dx, self.normal.dy, self.normal.dz, self.d)
    }

    /// Signed distance of a point from the plane.
    pub fn signed_distance(&self, pt: Point) -> f64 {
        self.normal.dx * pt.x + self.normal.dy * pt.y + self.normal.dz * pt.z + self.d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal() {
        let plane = Plane::horizontal(2.5);
        assert!(plane.signed_distance(Point::new(4.0, 2.5, -1.0)).abs() < 1e-12);
        assert!((plane.signed_distance(Point::new(0.0, 3.0, 0.0)) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_from_point_normal() -> Result<()> {
        let plane = Plane::from_point_normal(Point::new(5.0, 0.0, 0.0), Vector::new(-2.0, 0.0, 0.0))?;
        assert!(plane.signed_distance(Point::new(5.0, 7.0, 1.0)).abs() < 1e-12);
        assert!(plane.normal.is_close(&Vector::new(-1.0, 0.0, 0.0)));
        assert!(Plane::from_point_normal(Point::new(0.0, 0.0, 0.0), Vector::new(0.0, 0.0, 0.0)).is_err());
        Ok(())
    }
}
