use crate::geom::EPS;
use crate::geom::point::Point;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    /// Creates a box from two opposite corners (in any order).
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Creates a box centered at `center` with full extents `(sx, sy, sz)`.
    pub fn from_center_size(center: Point, sx: f64, sy: f64, sz: f64) -> Self {
        let (hx, hy, hz) = (0.5 * sx, 0.5 * sy, 0.5 * sz);
        Self {
            min: Point::new(center.x - hx, center.y - hy, center.z - hz),
            max: Point::new(center.x + hx, center.y + hy, center.z + hz),
        }
    }

    pub fn center(&self) -> Point {
        self.min.midpoint(&self.max)
    }

    /// Checks whether a point is inside the box (boundary included, with tolerance).
    pub fn contains(&self, pt: Point, tol: f64) -> bool {
        pt.x >= self.min.x - tol
            && pt.x <= self.max.x + tol
            && pt.y >= self.min.y - tol
            && pt.y <= self.max.y + tol
            && pt.z >= self.min.z - tol
            && pt.z <= self.max.z + tol
    }
}

/// Checks whether two bounding boxes overlap (including touching).
pub fn are_bboxes_overlapping(a: &BoundingBox, b: &BoundingBox) -> bool {
    // Boxes don't overlap if separated along any axis
    if a.max.x < b.min.x - EPS || a.min.x > b.max.x + EPS {
        return false;
    }
    if a.max.y < b.min.y - EPS || a.min.y > b.max.y + EPS {
        return false;
    }
    if a.max.z < b.min.z - EPS || a.min.z > b.max.z + EPS {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_center_size() {
        let bbox = BoundingBox::from_center_size(Point::new(1.0, 2.0, 3.0), 2.0, 4.0, 6.0);
        assert!(bbox.min.is_close(&Point::new(0.0, 0.0, 0.0)));
        assert!(bbox.max.is_close(&Point::new(2.0, 4.0, 6.0)));
        assert!(bbox.center().is_close(&Point::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_contains() {
        let bbox = BoundingBox::new(Point::new(1.0, 1.0, 1.0), Point::new(0.0, 0.0, 0.0));
        assert!(bbox.contains(Point::new(0.5, 0.5, 0.5), 0.0));
        assert!(bbox.contains(Point::new(1.0, 0.0, 0.5), 0.0));
        assert!(!bbox.contains(Point::new(1.1, 0.5, 0.5), 0.0));
        assert!(bbox.contains(Point::new(1.1, 0.5, 0.5), 0.2));
    }

    #[test]
    fn test_overlapping() {
        let a = BoundingBox::new(Point::new(0.0, 0.0, 0.0), Point::new(1.0, 1.0, 1.0));
        let b = BoundingBox::new(Point::new(1.0, 0.5, 0.5), Point::new(2.0, 2.0, 2.0));
        let c = BoundingBox::new(Point::new(1.5, 0.0, 0.0), Point::new(2.0, 1.0, 1.0));
        assert!(are_bboxes_overlapping(&a, &b));
        assert!(!are_bboxes_overlapping(&a, &c));
    }
}
