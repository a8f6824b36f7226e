//! Utilities shared by the stores.

mod sequence;

pub use sequence::{SequenceNumber, VisitTracker};

use glam::Vec2;

/// Twice the signed area contributed by the directed segment `a -> b` to the
/// shoelace sum of a closed polygon.
///
/// The sum is accumulated in `f64` so that long cycles can be updated
/// incrementally without the sign drifting.
pub fn shoelace_term(a: Vec2, b: Vec2) -> f64 {
    f64::from(a.x) * f64::from(b.y) - f64::from(b.x) * f64::from(a.y)
}

/// Twice the signed area of the triangle `a -> b -> c`.
pub fn signed_area_x2(a: Vec2, b: Vec2, c: Vec2) -> f64 {
    shoelace_term(a, b) + shoelace_term(b, c) + shoelace_term(c, a)
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use glam::Vec2;

    #[test]
    fn signed_area() {
        let (a, b, c) = (Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0));
        assert!(approx_eq!(f64, super::signed_area_x2(a, b, c), 1.0), "Counter-clockwise triangle should be positive");
        assert!(approx_eq!(f64, super::signed_area_x2(a, c, b), -1.0), "Clockwise triangle should be negative");
    }
}
