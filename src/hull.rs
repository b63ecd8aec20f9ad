//! Completion of the convex hull once the super triangle has been removed.
//!
//! A finite super triangle can lie inside the circumcircle of a flat triangle along the
//! convex hull. Such a triangle never becomes part of the triangulation, leaving a concave
//! pocket in the boundary after all triangles touching the super triangle are discarded.
//! The pockets are closed by clipping ears off the boundary, followed by edge flips that
//! restore the Delaunay property.
//!
//! If the super triangle lies inside the circumcircles of all triangles along a flat hull,
//! hull points end up in no triangle at all. Such inputs are triangulated again with a
//! sweep that needs no enclosing triangle, see [sweep_triangulation].

use hashbrown::{HashMap, HashSet};
use log::{debug, warn};
use smallvec::SmallVec;

use crate::math;
use crate::{Edge, Point2, Triangle, TriangulationError};

/// Closes all concave pockets of a triangulation's boundary.
///
/// `positions` is indexed by the triangles' vertex ids. Returns the number of added
/// triangles.
pub(crate) fn complete_convex_hull(
    positions: &[Point2<f64>],
    triangles: &mut Vec<Triangle>,
) -> usize {
    let Some(mut boundary) = Boundary::new(positions, triangles) else {
        warn!("The triangulation's boundary touches itself, skipping hull completion");
        return 0;
    };

    let first_added = triangles.len();
    while let Some([prev, vertex, next]) = boundary.find_ear(positions) {
        let corners = [positions[prev], positions[vertex], positions[next]];
        let Some(ear) = Triangle::new([prev, vertex, next], corners) else {
            break;
        };
        triangles.push(ear);
        boundary.clip(vertex);
    }

    let added = triangles.len() - first_added;
    if added > 0 {
        let edges = triangles[first_added..]
            .iter()
            .flat_map(|triangle| triangle.edges())
            .collect();
        let flips = legalize_edges(positions, triangles, edges);
        debug!(
            "Closed the convex hull with {} triangles and {} flips",
            added, flips
        );
    }
    added
}

/// Triangulates `positions` by sweeping over them in lexicographic order.
///
/// Each point lies outside the convex hull of all points before it and is connected to
/// every hull edge it sees. Flipping all edges afterwards yields the Delaunay
/// triangulation. Runs in quadratic time in the worst case.
pub(crate) fn sweep_triangulation(
    positions: &[Point2<f64>],
) -> Result<Vec<Triangle>, TriangulationError> {
    let mut order: Vec<usize> = (0..positions.len()).collect();
    order.sort_unstable_by(|l, r| {
        let (l, r) = (positions[*l], positions[*r]);
        l.x.total_cmp(&r.x).then(l.y.total_cmp(&r.y))
    });

    let (first, second) = match order.as_slice() {
        [first, second, _, ..] => (*first, *second),
        _ => {
            return Err(TriangulationError::EmptyInput {
                count: positions.len(),
            })
        }
    };
    let side = |id: usize| math::orient_2d(positions[first], positions[second], positions[id]);
    let Some(apex_index) = (2..order.len()).find(|index| side(order[*index]) != 0.0) else {
        warn!("All {} points are collinear", positions.len());
        return Err(TriangulationError::DegenerateInput {
            vertices: [None; 3],
        });
    };
    let apex = order[apex_index];

    // The points before the apex lie on a line, they are connected to it by a fan
    let mut triangles = Vec::with_capacity(positions.len() * 2);
    for pair in order[..apex_index].windows(2) {
        triangles.push(new_triangle([pair[0], pair[1], apex], positions)?);
    }

    // Counterclockwise
    let mut hull = order[..apex_index].to_vec();
    if side(apex) < 0.0 {
        hull.reverse();
    }
    hull.push(apex);

    for &id in &order[apex_index + 1..] {
        let point = positions[id];
        let len = hull.len();
        let visible = |index: usize| {
            let from = positions[hull[index % len]];
            let to = positions[hull[(index + 1) % len]];
            math::orient_2d(from, to, point) < 0.0
        };
        let Some(start) = (0..len).find(|index| visible(*index) && !visible(*index + len - 1))
        else {
            return Err(TriangulationError::DegenerateInput {
                vertices: [Some(id), None, None],
            });
        };
        let count = (start..start + len).take_while(|index| visible(*index)).count();

        for index in start..start + count {
            let corners = [hull[index % len], hull[(index + 1) % len], id];
            triangles.push(new_triangle(corners, positions)?);
        }
        // The inner vertices of the visible chain are no longer part of the hull
        let mut next_hull = Vec::with_capacity(len - count + 2);
        next_hull.push(id);
        next_hull.extend((start + count..=start + len).map(|index| hull[index % len]));
        hull = next_hull;
    }

    let edges = triangles.iter().flat_map(|triangle| triangle.edges()).collect();
    let flips = legalize_edges(positions, &mut triangles, edges);
    debug!(
        "Sweep triangulation of {} points: {} triangles, {} flips",
        positions.len(),
        triangles.len(),
        flips
    );
    Ok(triangles)
}

fn new_triangle(
    vertices: [usize; 3],
    positions: &[Point2<f64>],
) -> Result<Triangle, TriangulationError> {
    Triangle::new(vertices, vertices.map(|id| positions[id])).ok_or(
        TriangulationError::DegenerateInput {
            vertices: vertices.map(Some),
        },
    )
}

/// Flips edges until none of them violates the Delaunay property.
///
/// Starts with `edges` and continues with the outer edges of every flipped quad. Returns
/// the number of flips.
pub(crate) fn legalize_edges(
    positions: &[Point2<f64>],
    triangles: &mut [Triangle],
    mut edges: Vec<Edge>,
) -> usize {
    let mut adjacency: HashMap<Edge, SmallVec<[usize; 2]>> =
        HashMap::with_capacity(triangles.len() * 2);
    for (index, triangle) in triangles.iter().enumerate() {
        for edge in triangle.edges() {
            adjacency.entry(edge).or_default().push(index);
        }
    }

    let mut flips = 0;
    while let Some(edge) = edges.pop() {
        //        left
        //       /  |  \
        //   from --+-- to   <- edge, replaced by left-right if illegal
        //       \  |  /
        //        right
        let (first, second) = match adjacency.get(&edge).map(SmallVec::as_slice) {
            Some(&[first, second]) => (first, second),
            _ => continue,
        };
        let (Some(left), Some(right)) = (
            triangles[first].opposite_vertex(edge),
            triangles[second].opposite_vertex(edge),
        ) else {
            continue;
        };
        let [from, to] = edge.vertices();
        if !math::contained_in_circumference(
            positions[from],
            positions[to],
            positions[left],
            positions[right],
        ) {
            continue;
        }

        let flipped = Edge::new(left, right);
        if adjacency.contains_key(&flipped) {
            continue;
        }
        let (Some(new_first), Some(new_second)) = (
            Triangle::new(
                [left, right, from],
                [positions[left], positions[right], positions[from]],
            ),
            Triangle::new(
                [left, right, to],
                [positions[left], positions[right], positions[to]],
            ),
        ) else {
            continue;
        };

        triangles[first] = new_first;
        triangles[second] = new_second;
        adjacency.remove(&edge);
        adjacency.insert(flipped, SmallVec::from_slice(&[first, second]));
        replace_neighbor(&mut adjacency, Edge::new(right, from), second, first);
        replace_neighbor(&mut adjacency, Edge::new(left, to), first, second);

        edges.extend([
            Edge::new(left, from),
            Edge::new(right, from),
            Edge::new(left, to),
            Edge::new(right, to),
        ]);
        flips += 1;
    }
    flips
}

fn replace_neighbor(
    adjacency: &mut HashMap<Edge, SmallVec<[usize; 2]>>,
    edge: Edge,
    old: usize,
    new: usize,
) {
    if let Some(neighbors) = adjacency.get_mut(&edge) {
        for neighbor in neighbors.iter_mut().filter(|neighbor| **neighbor == old) {
            *neighbor = new;
        }
    }
}

/// The boundary of a triangulation as a doubly linked polygon.
///
/// The boundary is traversed counterclockwise, so the triangulation lies left of each
/// boundary edge.
struct Boundary {
    next: HashMap<usize, usize>,
    prev: HashMap<usize, usize>,
    // Points that are not part of any triangle, ears must not cover them.
    isolated: Vec<usize>,
}

impl Boundary {
    fn new(positions: &[Point2<f64>], triangles: &[Triangle]) -> Option<Self> {
        let mut directed: HashSet<(usize, usize)> = HashSet::with_capacity(triangles.len() * 3);
        let mut referenced = vec![false; positions.len()];
        for triangle in triangles {
            let [v0, mut v1, mut v2] = triangle.vertices();
            if !math::is_ordered_ccw(positions[v0], positions[v1], positions[v2]) {
                std::mem::swap(&mut v1, &mut v2);
            }
            directed.extend([(v0, v1), (v1, v2), (v2, v0)]);
            for vertex in [v0, v1, v2] {
                referenced[vertex] = true;
            }
        }

        let mut next = HashMap::new();
        let mut prev = HashMap::new();
        for &(from, to) in &directed {
            if directed.contains(&(to, from)) {
                continue;
            }
            if next.insert(from, to).is_some() || prev.insert(to, from).is_some() {
                return None;
            }
        }

        let isolated = referenced
            .iter()
            .enumerate()
            .filter(|(_, referenced)| !**referenced)
            .map(|(id, _)| id)
            .collect();
        Some(Boundary {
            next,
            prev,
            isolated,
        })
    }

    /// Returns the smallest boundary vertex at which the boundary turns right, together
    /// with its neighbors, if the triangle they span covers no other point.
    fn find_ear(&self, positions: &[Point2<f64>]) -> Option<[usize; 3]> {
        let mut candidates: Vec<usize> = self.next.keys().copied().collect();
        candidates.sort_unstable();

        candidates.into_iter().find_map(|vertex| {
            let prev = *self.prev.get(&vertex)?;
            let next = *self.next.get(&vertex)?;
            if prev == next {
                return None;
            }
            let corners = [positions[prev], positions[vertex], positions[next]];
            if math::orient_2d(corners[0], corners[1], corners[2]) >= 0.0
                || math::is_degenerate(corners)
            {
                return None;
            }

            let blocked = self
                .next
                .keys()
                .chain(&self.isolated)
                .filter(|other| ![prev, vertex, next].contains(*other))
                .any(|other| covers(corners, positions[*other]));
            (!blocked).then_some([prev, vertex, next])
        })
    }

    /// Removes `vertex` from the boundary, connecting its neighbors directly.
    fn clip(&mut self, vertex: usize) {
        if let (Some(prev), Some(next)) = (self.prev.remove(&vertex), self.next.remove(&vertex))
        {
            self.next.insert(prev, next);
            self.prev.insert(next, prev);
        }
    }
}

/// Returns `true` if `point` lies inside or on the border of the clockwise triangle `corners`.
fn covers(corners: [Point2<f64>; 3], point: Point2<f64>) -> bool {
    let [a, b, c] = corners;
    math::orient_2d(a, b, point) <= 0.0
        && math::orient_2d(b, c, point) <= 0.0
        && math::orient_2d(c, a, point) <= 0.0
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::{complete_convex_hull, legalize_edges, sweep_triangulation};
    use crate::test_utilities::{random_points_with_seed, SEED};
    use crate::{triangulate, Edge, Mesh, MeshPoint, Point2, Triangle, TriangulationError};

    fn triangle(ids: [usize; 3], positions: &[Point2<f64>]) -> Triangle {
        Triangle::new(ids, ids.map(|id| positions[id])).unwrap()
    }

    fn to_mesh(positions: &[Point2<f64>], triangles: Vec<Triangle>) -> Mesh {
        let points = positions
            .iter()
            .enumerate()
            .map(|(id, position)| MeshPoint::new(id, *position, 0.0))
            .collect();
        Mesh::new(points, triangles)
    }

    #[test]
    fn test_closes_concave_pocket() {
        let positions = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.1),
            Point2::new(2.0, 0.0),
            Point2::new(1.0, 2.0),
        ];
        let mut triangles = vec![
            triangle([0, 1, 3], &positions),
            triangle([1, 2, 3], &positions),
        ];

        assert_eq!(complete_convex_hull(&positions, &mut triangles), 1);
        assert_eq!(triangles.len(), 3);
        assert!(triangles.contains(&triangle([0, 1, 2], &positions)));

        let mesh = to_mesh(&positions, triangles);
        assert_relative_eq!(mesh.area(), 2.0);
        assert!(mesh.is_locally_delaunay());
        assert_eq!(
            mesh.hull_edges(),
            vec![Edge::new(0, 2), Edge::new(0, 3), Edge::new(2, 3)]
        );
    }

    #[test]
    fn test_convex_boundary_is_unchanged() {
        let positions = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let mut triangles = vec![
            triangle([0, 1, 2], &positions),
            triangle([0, 2, 3], &positions),
        ];
        let before = triangles.clone();
        assert_eq!(complete_convex_hull(&positions, &mut triangles), 0);
        assert_eq!(triangles, before);
    }

    #[test]
    fn test_pocket_with_several_vertices() {
        // The upper boundary 0-4-5-6-2 sags below the hull edge 0-2
        let positions = vec![
            Point2::new(0.0, 1.0),
            Point2::new(2.0, -1.0),
            Point2::new(4.0, 1.0),
            Point2::new(2.0, -0.5),
            Point2::new(1.0, 0.9),
            Point2::new(2.0, 0.85),
            Point2::new(3.0, 0.9),
        ];
        let mut triangles = vec![
            triangle([0, 3, 4], &positions),
            triangle([3, 4, 5], &positions),
            triangle([3, 5, 6], &positions),
            triangle([2, 3, 6], &positions),
            triangle([0, 1, 3], &positions),
            triangle([1, 2, 3], &positions),
        ];

        assert_eq!(complete_convex_hull(&positions, &mut triangles), 3);
        let mesh = to_mesh(&positions, triangles);
        // The convex hull is the triangle 0-1-2
        assert_relative_eq!(mesh.area(), 4.0, epsilon = 1.0e-12);
        assert_eq!(
            mesh.hull_edges(),
            vec![Edge::new(0, 1), Edge::new(0, 2), Edge::new(1, 2)]
        );
    }

    #[test]
    fn test_legalize_flips_illegal_edge() {
        let positions = vec![
            Point2::new(-1.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 3.0),
            Point2::new(0.0, -3.0),
        ];
        let mut triangles = vec![
            triangle([0, 2, 3], &positions),
            triangle([1, 2, 3], &positions),
        ];
        let flips = legalize_edges(&positions, &mut triangles, vec![Edge::new(2, 3)]);
        assert_eq!(flips, 1);
        assert_eq!(triangles[0].vertices(), [0, 1, 2]);
        assert_eq!(triangles[1].vertices(), [0, 1, 3]);

        // The result is legal, nothing left to flip
        let flips = legalize_edges(&positions, &mut triangles, vec![Edge::new(0, 1)]);
        assert_eq!(flips, 0);
    }

    #[test]
    fn test_sweep_matches_incremental_insertion() -> Result<(), TriangulationError> {
        let positions = random_points_with_seed(200, SEED);
        let swept = to_mesh(&positions, sweep_triangulation(&positions)?);
        assert!(swept.is_locally_delaunay());
        assert_eq!(
            swept.triangle_indices(),
            triangulate(&positions)?.triangle_indices()
        );
        Ok(())
    }

    #[test]
    fn test_sweep_fans_out_collinear_start() -> Result<(), TriangulationError> {
        // Sorted, the first three points lie on the x axis
        let positions = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(3.0, 1.0),
        ];
        let mesh = to_mesh(&positions, sweep_triangulation(&positions)?);
        assert_eq!(mesh.triangle_indices(), vec![0, 2, 3, 1, 2, 3]);
        assert_relative_eq!(mesh.area(), 1.0);
        assert_eq!(
            mesh.hull_edges(),
            vec![
                Edge::new(0, 2),
                Edge::new(0, 3),
                Edge::new(1, 2),
                Edge::new(1, 3)
            ]
        );
        Ok(())
    }

    #[test]
    fn test_sweep_rejects_collinear_points() {
        let positions: Vec<_> = (0..4)
            .map(|i| Point2::new(i as f64, 0.5 * i as f64))
            .collect();
        assert_eq!(
            sweep_triangulation(&positions).unwrap_err(),
            TriangulationError::DegenerateInput {
                vertices: [None; 3]
            }
        );
    }
}
