//! Geometric primitives of a triangulation.
//!
//! Edges and triangles refer to their vertices by point id, positions are owned by the
//! surrounding [Mesh](crate::Mesh) or triangulation run.

use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::math;
use crate::{BoundingRect, Point2, SpatialObject};

/// Absolute tolerance used by [Triangle::circumcircle_contains].
///
/// A point is considered to be inside a circumcircle if its distance to the circumcenter
/// exceeds the circumradius by at most this value.
pub const CIRCUMCIRCLE_TOLERANCE: f64 = 1.0e-14;

/// An undirected edge between two points.
///
/// The edge stores its point ids in ascending order. Thus, `Edge::new(a, b)` and
/// `Edge::new(b, a)` are equal and hash identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct Edge {
    from: usize,
    to: usize,
}

impl Edge {
    /// Creates a new edge connecting `a` and `b`.
    pub fn new(a: usize, b: usize) -> Self {
        if a <= b {
            Edge { from: a, to: b }
        } else {
            Edge { from: b, to: a }
        }
    }

    /// Returns the smaller point id.
    pub fn from(&self) -> usize {
        self.from
    }

    /// Returns the larger point id.
    pub fn to(&self) -> usize {
        self.to
    }

    /// Returns both point ids in ascending order.
    pub fn vertices(&self) -> [usize; 2] {
        [self.from, self.to]
    }

    /// Returns `true` if `id` is one of the edge's end points.
    pub fn contains_vertex(&self, id: usize) -> bool {
        self.from == id || self.to == id
    }
}

/// A triangle of a triangulation.
///
/// Triangles are immutable once constructed. The vertex ids are sorted ascending, which
/// makes the three [edges](Triangle::edges) canonical: an edge shared by two adjacent
/// triangles compares equal regardless of which triangle produced it.
///
/// The circumcircle is computed once during construction. The triangle's
/// [bounds](SpatialObject::bounds) enclose the whole circumcircle, not just the vertices,
/// as they are used to locate triangles whose circumcircle contains a point.
///
/// Equality and hashing only consider the vertex ids.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct Triangle {
    vertices: [usize; 3],
    edges: [Edge; 3],
    circumcenter: Point2<f64>,
    circumradius: f64,
    bounds: BoundingRect<f64>,
}

impl Triangle {
    /// Creates a triangle from three point ids and their positions.
    ///
    /// Returns `None` if the positions don't span a proper triangle, see
    /// [is_degenerate](crate::math::is_degenerate).
    pub fn new(vertices: [usize; 3], positions: [Point2<f64>; 3]) -> Option<Self> {
        let (circumcenter, circumradius) = math::circumcenter(positions)?;

        let mut vertices = vertices;
        vertices.sort_unstable();
        let [v0, v1, v2] = vertices;

        let reach = circumradius * (1.0 + f64::EPSILON * 4.0) + CIRCUMCIRCLE_TOLERANCE;
        let offset = Point2::new(reach, reach);
        let bounds =
            BoundingRect::from_corners(circumcenter.sub(offset), circumcenter.add(offset));

        Some(Triangle {
            vertices,
            edges: [Edge::new(v0, v1), Edge::new(v1, v2), Edge::new(v0, v2)],
            circumcenter,
            circumradius,
            bounds,
        })
    }

    /// Returns the triangle's point ids in ascending order.
    pub fn vertices(&self) -> [usize; 3] {
        self.vertices
    }

    /// Returns the triangle's edges.
    ///
    /// For vertices `[v0, v1, v2]`, the edges are `[v0v1, v1v2, v0v2]`.
    pub fn edges(&self) -> [Edge; 3] {
        self.edges
    }

    /// Returns the center of the triangle's circumcircle.
    pub fn circumcenter(&self) -> Point2<f64> {
        self.circumcenter
    }

    /// Returns the radius of the triangle's circumcircle.
    pub fn circumradius(&self) -> f64 {
        self.circumradius
    }

    /// Returns `true` if `id` is one of the triangle's vertices.
    pub fn contains_vertex(&self, id: usize) -> bool {
        self.vertices.contains(&id)
    }

    /// Returns the vertex that is not part of `edge`.
    ///
    /// Returns `None` if `edge` is not an edge of this triangle.
    pub fn opposite_vertex(&self, edge: Edge) -> Option<usize> {
        let index = self.edges.iter().position(|e| *e == edge)?;
        // v0v1 -> v2, v1v2 -> v0, v0v2 -> v1
        Some(self.vertices[(index + 2) % 3])
    }

    /// Returns `true` if `point` lies inside the circumcircle or within
    /// [CIRCUMCIRCLE_TOLERANCE] of its border.
    pub fn circumcircle_contains(&self, point: Point2<f64>) -> bool {
        point.distance(self.circumcenter) - self.circumradius <= CIRCUMCIRCLE_TOLERANCE
    }

    /// Returns a copy with every point id decreased by `offset`.
    ///
    /// All vertex ids must be at least `offset`.
    pub(crate) fn shifted(&self, offset: usize) -> Self {
        let [v0, v1, v2] = self.vertices.map(|v| v - offset);
        Triangle {
            vertices: [v0, v1, v2],
            edges: [Edge::new(v0, v1), Edge::new(v1, v2), Edge::new(v0, v2)],
            ..*self
        }
    }
}

impl PartialEq for Triangle {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices
    }
}

impl Eq for Triangle {}

impl Hash for Triangle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.vertices.hash(state);
    }
}

impl SpatialObject for Triangle {
    type Scalar = f64;

    fn bounds(&self) -> BoundingRect<f64> {
        self.bounds
    }

    fn contains_point(&self, point: Point2<f64>) -> bool {
        self.circumcircle_contains(point)
    }
}

#[cfg(test)]
mod test {
    use hashbrown::HashSet;

    use super::{Edge, Triangle};
    use crate::{Point2, SpatialObject};

    fn right_triangle(ids: [usize; 3]) -> Triangle {
        Triangle::new(
            ids,
            [
                Point2::new(0.0, 0.0),
                Point2::new(2.0, 0.0),
                Point2::new(0.0, 2.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_edge_is_undirected() {
        assert_eq!(Edge::new(3, 7), Edge::new(7, 3));
        assert_eq!(Edge::new(7, 3).vertices(), [3, 7]);

        let mut set = HashSet::new();
        set.insert(Edge::new(1, 2));
        assert!(set.contains(&Edge::new(2, 1)));
        assert!(Edge::new(2, 1).contains_vertex(1));
        assert!(!Edge::new(2, 1).contains_vertex(3));
    }

    #[test]
    fn test_canonical_vertices_and_edges() {
        let triangle = right_triangle([9, 4, 6]);
        assert_eq!(triangle.vertices(), [4, 6, 9]);
        assert_eq!(
            triangle.edges(),
            [Edge::new(4, 6), Edge::new(6, 9), Edge::new(4, 9)]
        );
        assert_eq!(triangle.opposite_vertex(Edge::new(9, 6)), Some(4));
        assert_eq!(triangle.opposite_vertex(Edge::new(4, 6)), Some(9));
        assert_eq!(triangle.opposite_vertex(Edge::new(9, 4)), Some(6));
        assert_eq!(triangle.opposite_vertex(Edge::new(1, 4)), None);

        // Equality ignores the construction order
        assert_eq!(triangle, right_triangle([6, 9, 4]));
        assert_ne!(triangle, right_triangle([6, 9, 5]));
    }

    #[test]
    fn test_bounds_enclose_circumcircle() {
        let triangle = right_triangle([0, 1, 2]);
        let bounds = triangle.bounds();
        let center = triangle.circumcenter();
        let radius = triangle.circumradius();
        for angle in 0..64 {
            let angle = angle as f64 / 64.0 * std::f64::consts::TAU;
            let on_circle = Point2::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            );
            assert!(bounds.contains_point(on_circle));
        }
        // The vertices alone would not cover this point
        let beyond_vertices = Point2::new(-0.2, 1.0);
        assert!(triangle.contains_point(beyond_vertices));
        assert!(bounds.contains_point(beyond_vertices));
    }

    #[test]
    fn test_circumcircle_contains() {
        let triangle = right_triangle([0, 1, 2]);
        assert!(triangle.circumcircle_contains(Point2::new(1.0, 1.0)));
        // Vertices lie on the circle and count as contained
        assert!(triangle.circumcircle_contains(Point2::new(2.0, 0.0)));
        assert!(triangle.circumcircle_contains(Point2::new(2.0, 2.0)));
        assert!(!triangle.circumcircle_contains(Point2::new(2.5, 2.5)));
    }

    #[test]
    fn test_degenerate_triangle() {
        let collinear = Triangle::new(
            [0, 1, 2],
            [
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 1.0),
                Point2::new(3.0, 3.0),
            ],
        );
        assert!(collinear.is_none());
    }

    #[test]
    fn test_shifted() {
        let triangle = right_triangle([5, 3, 4]).shifted(3);
        assert_eq!(triangle.vertices(), [0, 1, 2]);
        assert_eq!(triangle.edges()[2], Edge::new(0, 2));
        assert_eq!(triangle.circumradius(), right_triangle([0, 1, 2]).circumradius());
    }
}
