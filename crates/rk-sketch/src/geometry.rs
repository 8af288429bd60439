//! 2D Geometry Kernel
//!
//! Stateless vector helpers and the intersection primitives that trim,
//! extend, offset and contour detection are built on. Nothing here fails on
//! degenerate input: "no solution" is `None` or an empty list.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::constants::GEOMETRY_EPSILON;

/// Closest point on a segment to a query point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Closest point on the clamped segment
    pub point: DVec2,
    /// Parameter along the infinite line through the segment
    pub t: f64,
    /// Parameter clamped to `[0, 1]`
    pub t_clamped: f64,
    /// Euclidean distance from the query point to `point`
    pub distance: f64,
}

/// Intersection of two lines
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineHit {
    /// Parameter on the first line
    pub t: f64,
    /// Parameter on the second line
    pub u: f64,
    /// Intersection point
    pub point: DVec2,
}

impl LineHit {
    /// Whether the hit lies within both segments
    pub fn is_bounded(&self) -> bool {
        in_unit_range(self.t) && in_unit_range(self.u)
    }
}

/// `t` in `[0, 1]` with the kernel tolerance
#[inline]
pub fn in_unit_range(t: f64) -> bool {
    (-GEOMETRY_EPSILON..=1.0 + GEOMETRY_EPSILON).contains(&t)
}

/// `t` strictly inside `(0, 1)` with the kernel tolerance
#[inline]
pub fn in_open_unit_range(t: f64) -> bool {
    t > GEOMETRY_EPSILON && t < 1.0 - GEOMETRY_EPSILON
}

/// Point at parameter `t` along `a -> b`
#[inline]
pub fn point_at(a: DVec2, b: DVec2, t: f64) -> DVec2 {
    a + (b - a) * t
}

/// Unit normal to the left of `dir`, or `None` for a zero-length direction
pub fn left_normal(dir: DVec2) -> Option<DVec2> {
    let len = dir.length();
    if len < GEOMETRY_EPSILON {
        return None;
    }
    Some(DVec2::new(-dir.y, dir.x) / len)
}

/// Project `p` onto the segment `[a, b]`
pub fn project_point_on_line(p: DVec2, a: DVec2, b: DVec2) -> Projection {
    let ab = b - a;
    let len_sq = ab.length_squared();
    let t = if len_sq < GEOMETRY_EPSILON * GEOMETRY_EPSILON {
        0.0
    } else {
        (p - a).dot(ab) / len_sq
    };
    let t_clamped = t.clamp(0.0, 1.0);
    let point = a + ab * t_clamped;
    Projection {
        point,
        t,
        t_clamped,
        distance: p.distance(point),
    }
}

/// Intersect the lines through `p1 -> p2` and `p3 -> p4`
///
/// Parameters are not range-checked; callers decide between bounded and
/// infinite use. Parallel or coincident lines yield `None`.
pub fn intersect_line_line(p1: DVec2, p2: DVec2, p3: DVec2, p4: DVec2) -> Option<LineHit> {
    let d1 = p2 - p1;
    let d2 = p4 - p3;
    let det = d1.perp_dot(d2);
    if det.abs() < GEOMETRY_EPSILON {
        return None;
    }

    let d = p3 - p1;
    let t = d.perp_dot(d2) / det;
    let u = d.perp_dot(d1) / det;
    Some(LineHit {
        t,
        u,
        point: p1 + d1 * t,
    })
}

/// Intersect two segments, keeping only hits inside both
pub fn intersect_segments(p1: DVec2, p2: DVec2, p3: DVec2, p4: DVec2) -> Option<LineHit> {
    intersect_line_line(p1, p2, p3, p4).filter(LineHit::is_bounded)
}

/// Intersect the ray `p1 -> p2` with a circle
///
/// Returns the raw ray parameters in ascending order: none, one for a
/// tangent, or two.
pub fn intersect_line_circle(p1: DVec2, p2: DVec2, center: DVec2, radius: f64) -> Vec<f64> {
    let d = p2 - p1;
    let f = p1 - center;

    let a = d.dot(d);
    if a < GEOMETRY_EPSILON {
        return Vec::new();
    }
    let b = 2.0 * f.dot(d);
    let c = f.dot(f) - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < -GEOMETRY_EPSILON {
        return Vec::new();
    }
    if discriminant.abs() <= GEOMETRY_EPSILON {
        return vec![-b / (2.0 * a)];
    }

    let sqrt_disc = discriminant.sqrt();
    vec![(-b - sqrt_disc) / (2.0 * a), (-b + sqrt_disc) / (2.0 * a)]
}

/// Signed area of a polygon (positive when counter-clockwise)
pub fn signed_area(points: &[DVec2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        sum += a.perp_dot(b);
    }
    sum * 0.5
}

/// Even-odd point-in-polygon test
pub fn point_in_polygon(p: DVec2, polygon: &[DVec2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Approximate a circle with `segments` evenly spaced vertices
pub fn circle_polygon(center: DVec2, radius: f64, segments: u32) -> Vec<DVec2> {
    let segments = segments.max(3);
    (0..segments)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / segments as f64;
            center + DVec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

/// Shortest distance from `p` to a chain of segments
pub fn distance_to_polyline(p: DVec2, points: &[DVec2], closed: bool) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => p.distance(*only),
        _ => {
            let mut best = f64::INFINITY;
            for pair in points.windows(2) {
                best = best.min(project_point_on_line(p, pair[0], pair[1]).distance);
            }
            if closed && let (Some(first), Some(last)) = (points.first(), points.last()) {
                best = best.min(project_point_on_line(p, *last, *first).distance);
            }
            best
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_project_inside_segment() {
        let proj = project_point_on_line(
            DVec2::new(5.0, 3.0),
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
        );
        assert_abs_diff_eq!(proj.t, 0.5);
        assert_abs_diff_eq!(proj.t_clamped, 0.5);
        assert_abs_diff_eq!(proj.distance, 3.0);
        assert_eq!(proj.point, DVec2::new(5.0, 0.0));
    }

    #[test]
    fn test_project_clamps_but_reports_raw_t() {
        let proj = project_point_on_line(
            DVec2::new(-4.0, 3.0),
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
        );
        assert_abs_diff_eq!(proj.t, -0.4);
        assert_abs_diff_eq!(proj.t_clamped, 0.0);
        assert_abs_diff_eq!(proj.distance, 5.0);
    }

    #[test]
    fn test_project_degenerate_segment() {
        let a = DVec2::new(1.0, 1.0);
        let proj = project_point_on_line(DVec2::new(4.0, 5.0), a, a);
        assert_eq!(proj.point, a);
        assert_abs_diff_eq!(proj.distance, 5.0);
    }

    #[test]
    fn test_crossing_segments() {
        let hit = intersect_line_line(
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 10.0),
            DVec2::new(0.0, 10.0),
            DVec2::new(10.0, 0.0),
        )
        .unwrap();
        assert_abs_diff_eq!(hit.t, 0.5);
        assert_abs_diff_eq!(hit.u, 0.5);
        assert_abs_diff_eq!(hit.point.x, 5.0);
        assert_abs_diff_eq!(hit.point.y, 5.0);
        assert!(hit.is_bounded());
    }

    #[test]
    fn test_parallel_lines_have_no_intersection() {
        let hit = intersect_line_line(
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(10.0, 1.0),
        );
        assert!(hit.is_none());

        // Coincident
        let hit = intersect_line_line(
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(5.0, 0.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_infinite_vs_bounded_intersection() {
        let (p1, p2) = (DVec2::new(0.0, 0.0), DVec2::new(1.0, 0.0));
        let (p3, p4) = (DVec2::new(5.0, -1.0), DVec2::new(5.0, 1.0));

        let hit = intersect_line_line(p1, p2, p3, p4).unwrap();
        assert_abs_diff_eq!(hit.t, 5.0);
        assert_abs_diff_eq!(hit.u, 0.5);
        assert!(intersect_segments(p1, p2, p3, p4).is_none());
    }

    #[test]
    fn test_line_circle_two_roots() {
        let roots = intersect_line_circle(
            DVec2::new(-10.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::ZERO,
            5.0,
        );
        assert_eq!(roots.len(), 2);
        assert_abs_diff_eq!(roots[0], 0.25);
        assert_abs_diff_eq!(roots[1], 0.75);
    }

    #[test]
    fn test_line_circle_raw_roots_outside_segment() {
        let roots = intersect_line_circle(
            DVec2::new(10.0, 0.0),
            DVec2::new(20.0, 0.0),
            DVec2::ZERO,
            5.0,
        );
        assert_eq!(roots.len(), 2);
        assert_abs_diff_eq!(roots[0], -1.5);
        assert_abs_diff_eq!(roots[1], -0.5);
    }

    #[test]
    fn test_line_circle_tangent_and_miss() {
        let tangent = intersect_line_circle(
            DVec2::new(-10.0, 5.0),
            DVec2::new(10.0, 5.0),
            DVec2::ZERO,
            5.0,
        );
        assert_eq!(tangent.len(), 1);
        assert_abs_diff_eq!(tangent[0], 0.5);

        let miss = intersect_line_circle(
            DVec2::new(-10.0, 6.0),
            DVec2::new(10.0, 6.0),
            DVec2::ZERO,
            5.0,
        );
        assert!(miss.is_empty());

        let degenerate = intersect_line_circle(DVec2::ONE, DVec2::ONE, DVec2::ZERO, 5.0);
        assert!(degenerate.is_empty());
    }

    #[test]
    fn test_signed_area_and_containment() {
        let square = [
            DVec2::new(0.0, 0.0),
            DVec2::new(4.0, 0.0),
            DVec2::new(4.0, 4.0),
            DVec2::new(0.0, 4.0),
        ];
        assert_abs_diff_eq!(signed_area(&square), 16.0);
        assert!(point_in_polygon(DVec2::new(2.0, 2.0), &square));
        assert!(!point_in_polygon(DVec2::new(5.0, 2.0), &square));

        let mut reversed = square;
        reversed.reverse();
        assert_abs_diff_eq!(signed_area(&reversed), -16.0);
    }

    #[test]
    fn test_circle_polygon() {
        let poly = circle_polygon(DVec2::new(1.0, 1.0), 2.0, 16);
        assert_eq!(poly.len(), 16);
        for p in &poly {
            assert_abs_diff_eq!(p.distance(DVec2::new(1.0, 1.0)), 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_distance_to_polyline() {
        let chain = [
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(10.0, 10.0),
        ];
        assert_abs_diff_eq!(distance_to_polyline(DVec2::new(5.0, 2.0), &chain, false), 2.0);
        // Only the closing edge is near this point
        let p = DVec2::new(3.0, 4.0);
        assert!(distance_to_polyline(p, &chain, false) > 3.0);
        assert_abs_diff_eq!(
            distance_to_polyline(p, &chain, true),
            (0.5f64).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_left_normal() {
        let n = left_normal(DVec2::new(10.0, 0.0)).unwrap();
        assert_eq!(n, DVec2::new(0.0, 1.0));
        assert!(left_normal(DVec2::ZERO).is_none());
    }
}
