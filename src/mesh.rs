use hashbrown::HashMap;
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::math;
use crate::{Edge, Point2, Triangle};

/// A vertex of a [Mesh].
///
/// The id of a mesh point is equal to its index in [Mesh::points] and to the index of the
/// input point it was created from.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct MeshPoint {
    id: usize,
    position: Point2<f64>,
    z: f64,
}

impl MeshPoint {
    pub(crate) fn new(id: usize, position: Point2<f64>, z: f64) -> Self {
        MeshPoint { id, position, z }
    }

    /// Returns the point's id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the point's planar position.
    pub fn position(&self) -> Point2<f64> {
        self.position
    }

    /// Returns the point's elevation as given by the input.
    pub fn z(&self) -> f64 {
        self.z
    }
}

/// The immutable result of a triangulation.
///
/// A mesh consists of the triangulated points, in input order, and the triangles between
/// them. Triangles are sorted by their vertex ids, making the triangle order independent
/// of any internal iteration order.
///
/// # Example
/// ```
/// use isomesh::{triangulate, Point2, TriangulationError};
///
/// fn main() -> Result<(), TriangulationError> {
///     let mesh = triangulate(&[
///         Point2::new(0.0, 0.0),
///         Point2::new(1.0, 0.0),
///         Point2::new(0.0, 1.0),
///     ])?;
///     assert_eq!(mesh.point_count(), 3);
///     assert_eq!(mesh.triangle_count(), 1);
///     assert_eq!(mesh.triangles()[0].vertices(), [0, 1, 2]);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct Mesh {
    points: Vec<MeshPoint>,
    triangles: Vec<Triangle>,
}

impl Mesh {
    pub(crate) fn new(points: Vec<MeshPoint>, mut triangles: Vec<Triangle>) -> Self {
        triangles.sort_unstable_by_key(|triangle| triangle.vertices());
        Mesh { points, triangles }
    }

    /// Returns all points ordered by id.
    pub fn points(&self) -> &[MeshPoint] {
        &self.points
    }

    /// Returns all triangles.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Returns the number of points.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Returns the number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Returns the point with the given id.
    pub fn point(&self, id: usize) -> Option<&MeshPoint> {
        self.points.get(id)
    }

    /// Returns the positions of a triangle's vertices, in the order of
    /// [Triangle::vertices].
    ///
    /// # Panics
    /// Panics if the triangle refers to a point that is not part of this mesh.
    pub fn positions(&self, triangle: &Triangle) -> [Point2<f64>; 3] {
        triangle.vertices().map(|id| self.points[id].position)
    }

    /// Returns the area of a triangle of this mesh.
    pub fn triangle_area(&self, triangle: &Triangle) -> f64 {
        math::triangle_area(self.positions(triangle))
    }

    /// Returns the summed area of all triangles.
    ///
    /// For a Delaunay triangulation, this is equal to the area of the input's convex hull.
    pub fn area(&self) -> f64 {
        self.triangles
            .iter()
            .map(|triangle| self.triangle_area(triangle))
            .sum()
    }

    /// Returns the vertex ids of all triangles as a flat list, three ids per triangle.
    ///
    /// This is the layout expected by most index buffers.
    pub fn triangle_indices(&self) -> Vec<usize> {
        self.triangles
            .iter()
            .flat_map(|triangle| triangle.vertices())
            .collect()
    }

    /// Returns every undirected edge of the mesh, sorted ascending.
    pub fn edges(&self) -> Vec<Edge> {
        let mut result: Vec<_> = self.edge_adjacency().into_keys().collect();
        result.sort_unstable();
        result
    }

    /// Returns the edges of the mesh's convex hull, sorted ascending.
    ///
    /// A hull edge is adjacent to exactly one triangle.
    pub fn hull_edges(&self) -> Vec<Edge> {
        let mut result: Vec<_> = self
            .edge_adjacency()
            .into_iter()
            .filter(|(_, triangles)| triangles.len() == 1)
            .map(|(edge, _)| edge)
            .collect();
        result.sort_unstable();
        result
    }

    /// Returns `true` if no edge of this mesh violates the Delaunay property.
    ///
    /// For each edge shared by two triangles, the vertex of one triangle that is opposite
    /// of the edge must not lie strictly inside the circumcircle of the other triangle.
    /// Uses exact predicates; cocircular configurations are accepted.
    pub fn is_locally_delaunay(&self) -> bool {
        self.edge_adjacency().iter().all(|(edge, triangles)| {
            let [first, second] = match triangles.as_slice() {
                [first, second] => [&self.triangles[*first], &self.triangles[*second]],
                _ => return true,
            };
            let [v0, v1, v2] = self.positions(first);
            match second.opposite_vertex(*edge) {
                Some(opposite) => {
                    !math::contained_in_circumference(v0, v1, v2, self.points[opposite].position)
                }
                None => true,
            }
        })
    }

    fn edge_adjacency(&self) -> HashMap<Edge, SmallVec<[usize; 2]>> {
        let mut result: HashMap<Edge, SmallVec<[usize; 2]>> =
            HashMap::with_capacity(self.triangles.len() * 2);
        for (index, triangle) in self.triangles.iter().enumerate() {
            for edge in triangle.edges() {
                result.entry(edge).or_default().push(index);
            }
        }
        result
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use crate::test_utilities::square_with_center;
    use crate::{triangulate, Edge, TriangulationError};

    #[test]
    fn test_square_mesh() -> Result<(), TriangulationError> {
        let mesh = triangulate(&square_with_center())?;
        assert_eq!(mesh.point_count(), 5);
        assert_eq!(mesh.triangle_count(), 4);
        assert_relative_eq!(mesh.area(), 1.0);

        for (id, point) in mesh.points().iter().enumerate() {
            assert_eq!(point.id(), id);
        }
        assert_eq!(
            mesh.hull_edges(),
            vec![
                Edge::new(0, 1),
                Edge::new(0, 3),
                Edge::new(1, 2),
                Edge::new(2, 3)
            ]
        );
        assert_eq!(mesh.edges().len(), 8);
        assert!(mesh.is_locally_delaunay());
        Ok(())
    }

    #[test]
    fn test_triangle_indices() -> Result<(), TriangulationError> {
        let mesh = triangulate(&square_with_center())?;
        let indices = mesh.triangle_indices();
        assert_eq!(indices.len(), 12);
        for (chunk, triangle) in indices.chunks(3).zip(mesh.triangles()) {
            assert_eq!(chunk, triangle.vertices());
        }
        // Triangles are sorted by vertex ids
        assert!(mesh
            .triangles()
            .windows(2)
            .all(|pair| pair[0].vertices() < pair[1].vertices()));
        Ok(())
    }

    #[test]
    fn test_point_lookup() -> Result<(), TriangulationError> {
        let mesh = triangulate(&square_with_center())?;
        assert_eq!(mesh.point(4).map(|p| p.position().x), Some(0.5));
        assert!(mesh.point(5).is_none());
        Ok(())
    }
}
