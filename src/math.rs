//! Geometric predicates and measurements.
//!
//! Orientation and incircle tests are exact, see the [robust] crate. All functions work
//! on `f64` coordinates.

use std::cmp::Ordering;

use crate::Point2;

/// Triangles whose largest angle has a sine below this value are considered degenerate.
///
/// The sine of the largest angle is scale independent and approaches zero for nearly
/// collinear or coincident vertices.
pub const DEGENERACY_EPSILON: f64 = 1.0e-12;

fn to_robust_coord(point: Point2<f64>) -> robust::Coord<f64> {
    robust::Coord {
        x: point.x,
        y: point.y,
    }
}

/// Returns a positive value if `query_point` lies left of the directed line `p1 -> p2`, a
/// negative value if it lies on the right side and zero if the three points are collinear.
///
/// The sign is exact.
pub fn orient_2d(p1: Point2<f64>, p2: Point2<f64>, query_point: Point2<f64>) -> f64 {
    robust::orient2d(
        to_robust_coord(p1),
        to_robust_coord(p2),
        to_robust_coord(query_point),
    )
}

/// Returns `true` if the three points are ordered counter clock wise or are collinear.
pub fn is_ordered_ccw(p1: Point2<f64>, p2: Point2<f64>, query_point: Point2<f64>) -> bool {
    orient_2d(p1, p2, query_point) >= 0.0
}

/// Returns `true` if `p` lies strictly inside the circumcircle of `v1`, `v2` and `v3`.
///
/// The vertices may be given in any orientation. Uses exact arithmetic, points lying on the
/// circle are never contained.
pub fn contained_in_circumference(
    v1: Point2<f64>,
    v2: Point2<f64>,
    v3: Point2<f64>,
    p: Point2<f64>,
) -> bool {
    let (v1, v3) = if is_ordered_ccw(v1, v2, v3) {
        (v1, v3)
    } else {
        (v3, v1)
    };
    let v1 = to_robust_coord(v1);
    let v2 = to_robust_coord(v2);
    let v3 = to_robust_coord(v3);
    let p = to_robust_coord(p);

    robust::incircle(v1, v2, v3, p) > 0.0
}

/// Returns `true` if the triangle spanned by `positions` has no usable area.
///
/// This is the case if its vertices are exactly collinear, coincide, or if the sine of its
/// largest angle is smaller than [DEGENERACY_EPSILON].
pub fn is_degenerate(positions: [Point2<f64>; 3]) -> bool {
    let [v0, v1, v2] = positions;
    if orient_2d(v0, v1, v2) == 0.0 {
        return true;
    }
    let b = v1.sub(v0);
    let c = v2.sub(v0);
    let cross = b.x * c.y - c.x * b.y;

    let mut lengths = [b.length2(), c.length2(), v2.sub(v1).length2()];
    lengths.sort_by(|l, r| l.partial_cmp(r).unwrap_or(Ordering::Equal));
    // The two shorter edges enclose the largest angle
    let scale = (lengths[0] * lengths[1]).sqrt();
    !cross.is_finite() || !scale.is_finite() || cross.abs() <= DEGENERACY_EPSILON * scale
}

/// Returns the circumcenter and circumradius of a triangle.
///
/// Returns `None` if the triangle [is degenerate](is_degenerate).
pub fn circumcenter(positions: [Point2<f64>; 3]) -> Option<(Point2<f64>, f64)> {
    if is_degenerate(positions) {
        return None;
    }
    let [v0, v1, v2] = positions;
    let b = v1.sub(v0);
    let c = v2.sub(v0);

    let d = 2.0 * (b.x * c.y - c.x * b.y);
    let len_b = b.dot(b);
    let len_c = c.dot(c);
    let d_inv = 1.0 / d;

    let x = (len_b * c.y - len_c * b.y) * d_inv;
    let y = (-len_b * c.x + len_c * b.x) * d_inv;
    let result = Point2::new(x, y);
    Some((result.add(v0), (x * x + y * y).sqrt()))
}

/// Returns the unsigned area of a triangle.
pub fn triangle_area(positions: [Point2<f64>; 3]) -> f64 {
    let [v0, v1, v2] = positions;
    let b = v1.sub(v0);
    let c = v2.sub(v0);
    (b.x * c.y - b.y * c.x).abs() * 0.5
}
