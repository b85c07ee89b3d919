//! Straight pipe/conduit segments.
//!
//! A [`RouteSegment`] is a cylinder between two endpoints. Segments are only
//! produced for drawing and reporting; routing never reads them back.

use crate::Point;
use serde::{Deserialize, Serialize};

/// Segments shorter than this are not emitted.
pub const MIN_SEGMENT_LENGTH: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub start: Point,
    pub end: Point,
    pub radius: f64,
}

impl RouteSegment {
    /// Creates a segment, or `None` if its endpoints are closer than [`MIN_SEGMENT_LENGTH`].
    pub fn new(start: Point, end: Point, radius: f64) -> Option<Self> {
        if start.distance(&end) < MIN_SEGMENT_LENGTH {
            return None;
        }
        Some(Self { start, end, radius })
    }

    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    /// Returns `(min_y, max_y)` of the segment.
    pub fn y_range(&self) -> (f64, f64) {
        (self.start.y.min(self.end.y), self.start.y.max(self.end.y))
    }

    /// True if the segment runs along the Y axis only.
    pub fn is_vertical(&self) -> bool {
        (self.start.x - self.end.x).abs() < MIN_SEGMENT_LENGTH
            && (self.start.z - self.end.z).abs() < MIN_SEGMENT_LENGTH
            && (self.start.y - self.end.y).abs() >= MIN_SEGMENT_LENGTH
    }
}

/// Appends a segment to `out` unless it is degenerate.
pub(crate) fn push_segment(out: &mut Vec<RouteSegment>, start: Point, end: Point, radius: f64) {
    if let Some(seg) = RouteSegment::new(start, end, radius) {
        out.push(seg);
    }
}

/// Sums the lengths of all segments.
pub fn total_length(segments: &[RouteSegment]) -> f64 {
    segments.iter().map(|s| s.length()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_segment_is_suppressed() {
        let p = Point::new(1.0, 1.0, 1.0);
        assert!(RouteSegment::new(p, Point::new(1.0, 1.005, 1.0), 0.02).is_none());
        assert!(RouteSegment::new(p, Point::new(1.0, 1.02, 1.0), 0.02).is_some());

        let mut out = Vec::new();
        push_segment(&mut out, p, p, 0.02);
        assert!(out.is_empty());
    }

    #[test]
    fn test_vertical_and_length() {
        let s = RouteSegment::new(Point::new(0.0, 3.0, 1.0), Point::new(0.0, 1.0, 1.0), 0.02).unwrap();
        assert!(s.is_vertical());
        assert_eq!(s.y_range(), (1.0, 3.0));
        assert!((s.length() - 2.0).abs() < 1e-12);

        let h = RouteSegment::new(Point::new(0.0, 3.0, 1.0), Point::new(2.0, 3.0, 1.0), 0.02).unwrap();
        assert!(!h.is_vertical());
        assert!((total_length(&[s, h]) - 4.0).abs() < 1e-12);
    }
}
