pub mod bboxes;
pub mod plane;
pub mod point;
pub mod ray;
pub mod segment;
pub mod vector;

/// Geometric precision
pub const EPS: f64 = 1e-9;

/// Rounds `value` to the nearest multiple of `step`.
///
/// Ties are rounded away from zero (`1.25` → `1.5` and `-1.25` → `-1.5`
/// on a `0.5` grid), which is what [`f64::round`] does.
pub fn snap_to_grid(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    (value / step).round() * step
}
