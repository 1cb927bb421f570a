use std::f64::consts::TAU;

use crate::math::polygon_3d::PlaneFrame;
use crate::math::{BoundingBox, Point3, Vector3};
use crate::model::Curve;

/// Number of chords needed to approximate an arc within `tolerance`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn arc_segments(
    radius: f64,
    sweep: f64,
    tolerance: f64,
    min_segments: usize,
    max_segments: usize,
) -> usize {
    if tolerance > 0.0 && radius > tolerance {
        let half_angle = (1.0 - tolerance / radius).acos();
        let computed = (sweep / (2.0 * half_angle)).ceil() as usize;
        computed.clamp(min_segments, max_segments)
    } else {
        min_segments
    }
}

/// Samples a full circle counter-clockwise around `normal`.
///
/// The first point is not repeated at the end. Returns an empty list for a
/// zero normal or a non-positive radius.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn circle_points(center: &Point3, normal: &Vector3, radius: f64, segments: usize) -> Vec<Point3> {
    if radius <= 0.0 || segments == 0 {
        return Vec::new();
    }
    let Some(frame) = PlaneFrame::from_normal(*center, normal) else {
        return Vec::new();
    };
    (0..segments)
        .map(|i| {
            let theta = TAU * i as f64 / segments as f64;
            frame.lift(radius * theta.cos(), radius * theta.sin())
        })
        .collect()
}

/// Diagonal of the box enclosing the curve's control hull.
#[must_use]
pub fn curve_extent(curve: &Curve) -> f64 {
    match curve {
        Curve::Polyline(points) => BoundingBox::from_points(points).diagonal(),
        Curve::Circle { radius, .. } => 2.0 * std::f64::consts::SQRT_2 * radius,
    }
}

/// Converts a bounded curve to a polyline within `tolerance`.
///
/// Circles come back closed, with the first point repeated at the end.
#[must_use]
pub fn linearize_curve(
    curve: &Curve,
    tolerance: f64,
    min_segments: usize,
    max_segments: usize,
) -> Vec<Point3> {
    match curve {
        Curve::Polyline(points) => points.clone(),
        Curve::Circle {
            center,
            normal,
            radius,
        } => {
            let n = arc_segments(*radius, TAU, tolerance, min_segments, max_segments);
            let mut points = circle_points(center, normal, *radius, n);
            if let Some(&first) = points.first() {
                points.push(first);
            }
            points
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn tighter_tolerance_needs_more_segments() {
        let coarse = arc_segments(10.0, TAU, 0.5, 4, 256);
        let fine = arc_segments(10.0, TAU, 0.01, 4, 256);
        assert!(fine > coarse);
        assert_eq!(arc_segments(0.001, TAU, 0.01, 4, 256), 4);
        assert_eq!(arc_segments(10.0, TAU, 1e-9, 4, 256), 256);
    }

    #[test]
    fn circle_points_lie_on_the_circle() {
        let center = Point3::new(1.0, 2.0, 3.0);
        let pts = circle_points(&center, &Vector3::z(), 2.0, 12);
        assert_eq!(pts.len(), 12);
        for p in &pts {
            assert_relative_eq!((p - center).norm(), 2.0, epsilon = 1e-12);
            assert_relative_eq!(p.z, 3.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn linearized_circle_is_closed() {
        let circle = Curve::Circle {
            center: Point3::origin(),
            normal: Vector3::z(),
            radius: 1.0,
        };
        let tol = curve_extent(&circle) / 100.0;
        let pts = linearize_curve(&circle, tol, 4, 256);
        assert!(pts.len() > 5);
        assert_relative_eq!(pts[0], pts[pts.len() - 1]);
    }

    #[test]
    fn polylines_pass_through() {
        let line = Curve::Polyline(vec![Point3::origin(), Point3::new(3.0, 4.0, 0.0)]);
        assert_relative_eq!(curve_extent(&line), 5.0);
        assert_eq!(linearize_curve(&line, 0.1, 4, 256).len(), 2);
    }
}
