use hashbrown::HashMap;
use log::{debug, trace};
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::hull;
use crate::math::DEGENERACY_EPSILON;
use crate::{
    BoundingRect, Edge, HasPosition, Mesh, MeshPoint, PlacementPolicy, Point2, QuadTree,
    QuadTreeOptions, SpatialObject, Triangle, TriangulationError,
};

/// The number of point ids reserved for the vertices of the super triangle.
///
/// Input points receive the ids `RESERVED_IDS..RESERVED_IDS + n` while a triangulation is
/// running. The ids are shifted down by this amount when the [Mesh] is built.
pub const RESERVED_IDS: usize = 3;

/// Parameters of an [IncrementalTriangulator].
///
/// # Example
/// ```
/// use isomesh::{IncrementalTriangulator, PlacementPolicy, TriangulationOptions};
///
/// let options = TriangulationOptions::new()
///     .node_capacity(64)
///     .placement(PlacementPolicy::Duplicate);
/// let triangulator = IncrementalTriangulator::with_options(options);
/// assert_eq!(triangulator.options().quad_tree_options().placement(), PlacementPolicy::Duplicate);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct TriangulationOptions {
    super_triangle_margin: f64,
    complete_hull: bool,
    quad_tree: QuadTreeOptions,
}

impl Default for TriangulationOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl TriangulationOptions {
    /// The default super triangle margin, relative to the input's larger extent.
    pub const DEFAULT_SUPER_TRIANGLE_MARGIN: f64 = 20.0;

    /// Smaller margins would not enclose the input's bounding box.
    const MIN_SUPER_TRIANGLE_MARGIN: f64 = 2.0;

    /// Creates the default options.
    pub fn new() -> Self {
        TriangulationOptions {
            super_triangle_margin: Self::DEFAULT_SUPER_TRIANGLE_MARGIN,
            complete_hull: true,
            quad_tree: QuadTreeOptions::new(),
        }
    }

    /// Sets how far the super triangle reaches beyond the input, as a multiple of the
    /// larger side of the input's bounding box.
    ///
    /// Values below 2.0 are raised to 2.0. Larger margins reduce the chance of missing
    /// edges of a nearly flat convex hull.
    pub fn super_triangle_margin(mut self, margin: f64) -> Self {
        self.super_triangle_margin = if margin >= Self::MIN_SUPER_TRIANGLE_MARGIN {
            margin
        } else {
            Self::MIN_SUPER_TRIANGLE_MARGIN
        };
        self
    }

    /// Sets whether triangles missing along the convex hull are added after the super
    /// triangle has been removed. Enabled by default.
    ///
    /// Without completion, the mesh may miss flat triangles along the hull whose
    /// circumcircle contains a vertex of the super triangle.
    pub fn complete_hull(mut self, complete_hull: bool) -> Self {
        self.complete_hull = complete_hull;
        self
    }

    /// Sets the number of triangles a quad-tree leaf holds before it is subdivided.
    pub fn node_capacity(mut self, capacity: usize) -> Self {
        self.quad_tree = self.quad_tree.max_items(capacity);
        self
    }

    /// Sets the maximum depth of the quad-tree.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.quad_tree = self.quad_tree.max_depth(max_depth);
        self
    }

    /// Sets the quad-tree's placement policy.
    pub fn placement(mut self, placement: PlacementPolicy) -> Self {
        self.quad_tree = self.quad_tree.placement(placement);
        self
    }

    /// Returns the super triangle margin.
    pub fn margin(&self) -> f64 {
        self.super_triangle_margin
    }

    /// Returns `true` if the convex hull is completed, see
    /// [complete_hull](TriangulationOptions::complete_hull).
    pub fn completes_hull(&self) -> bool {
        self.complete_hull
    }

    /// Returns the options used for each run's quad-tree.
    pub fn quad_tree_options(&self) -> &QuadTreeOptions {
        &self.quad_tree
    }
}

/// Builds Delaunay triangulations by inserting one point after another.
///
/// This implements the Bowyer–Watson algorithm: all points are enclosed by a large super
/// triangle. Each inserted point invalidates every triangle whose circumcircle contains
/// it. These triangles form a cavity which is removed and re-triangulated by connecting
/// the new point to the cavity's boundary. Finally, all triangles touching the super
/// triangle are discarded.
///
/// Triangles are kept in a [QuadTree] which is used to find the triangles invalidated by an
/// insertion. The triangulator itself only holds options; all state of a run lives in a
/// [TriangulationRun], so a single triangulator can be reused for any number of inputs.
///
/// # Example
/// ```
/// use isomesh::{IncrementalTriangulator, Point2, TriangulationError};
///
/// fn main() -> Result<(), TriangulationError> {
///     let triangulator = IncrementalTriangulator::new();
///     let mesh = triangulator.triangulate(&[
///         Point2::new(0.0, 0.0),
///         Point2::new(1.0, 0.0),
///         Point2::new(1.0, 1.0),
///         Point2::new(0.0, 1.0),
///         Point2::new(0.5, 0.5),
///     ])?;
///     assert_eq!(mesh.triangle_count(), 4);
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug, Default)]
pub struct IncrementalTriangulator {
    options: TriangulationOptions,
}

impl IncrementalTriangulator {
    /// Creates a triangulator with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a triangulator with custom options.
    pub fn with_options(options: TriangulationOptions) -> Self {
        IncrementalTriangulator { options }
    }

    /// Returns this triangulator's options.
    pub fn options(&self) -> &TriangulationOptions {
        &self.options
    }

    /// Triangulates a point set.
    ///
    /// The input must contain at least three points, must not contain duplicates and must
    /// not be collinear. Point `i` of the input becomes the mesh point with id `i`.
    pub fn triangulate<V: HasPosition>(&self, points: &[V]) -> Result<Mesh, TriangulationError> {
        let mut run = self.begin(points)?;
        while run.insert_next()? {}
        run.finish()
    }

    /// Prepares a triangulation without inserting any point.
    ///
    /// The returned run inserts points on request, allowing callers to interleave the
    /// triangulation with other work or to abandon it early.
    ///
    /// # Example
    /// ```
    /// use isomesh::{IncrementalTriangulator, Point2, TriangulationError};
    ///
    /// fn main() -> Result<(), TriangulationError> {
    ///     let points = [
    ///         Point2::new(0.0, 0.0),
    ///         Point2::new(1.0, 0.0),
    ///         Point2::new(0.0, 1.0),
    ///     ];
    ///     let mut run = IncrementalTriangulator::new().begin(&points)?;
    ///     while run.insert_next()? {
    ///         println!("{} points left", run.remaining());
    ///     }
    ///     let mesh = run.finish()?;
    ///     assert_eq!(mesh.triangle_count(), 1);
    ///     Ok(())
    /// }
    /// ```
    pub fn begin<V: HasPosition>(
        &self,
        points: &[V],
    ) -> Result<TriangulationRun, TriangulationError> {
        TriangulationRun::new(points, &self.options)
    }
}

/// Triangulates a point set with default options.
///
/// See [IncrementalTriangulator::triangulate].
pub fn triangulate<V: HasPosition>(points: &[V]) -> Result<Mesh, TriangulationError> {
    IncrementalTriangulator::new().triangulate(points)
}

/// A triangulation in progress.
///
/// Created by [IncrementalTriangulator::begin]. A run owns its quad-tree and scratch
/// buffers and is consumed by [finish](TriangulationRun::finish).
#[derive(Debug)]
pub struct TriangulationRun {
    // Indexed by point id, the first RESERVED_IDS entries belong to the super triangle.
    positions: Vec<Point2<f64>>,
    elevations: Vec<f64>,
    next: usize,
    min_separation: f64,
    complete_hull: bool,
    index: QuadTree<Triangle>,
    edge_counts: HashMap<Edge, usize>,
    boundary: Vec<Edge>,
}

impl TriangulationRun {
    fn new<V: HasPosition>(
        points: &[V],
        options: &TriangulationOptions,
    ) -> Result<Self, TriangulationError> {
        if points.len() < 3 {
            return Err(TriangulationError::EmptyInput {
                count: points.len(),
            });
        }

        let mut positions = Vec::with_capacity(points.len() + RESERVED_IDS);
        positions.resize(RESERVED_IDS, Point2::default());
        let mut elevations = Vec::with_capacity(points.len());
        let mut first_occurrence = HashMap::with_capacity(points.len());
        for (index, point) in points.iter().enumerate() {
            let position = point.position().to_f64();
            let z: f64 = point.z().into();
            if !position.is_finite() {
                return Err(TriangulationError::NonFiniteCoordinate { index });
            }
            // Adding zero maps -0.0 to 0.0
            let key = ((position.x + 0.0).to_bits(), (position.y + 0.0).to_bits());
            if let Some(first) = first_occurrence.insert(key, index) {
                return Err(TriangulationError::DegenerateInput {
                    vertices: [Some(first), Some(index), None],
                });
            }
            positions.push(position);
            elevations.push(z);
        }

        let bounds = BoundingRect::from_points(positions[RESERVED_IDS..].iter().copied())
            .ok_or(TriangulationError::EmptyInput { count: 0 })?;
        let extent = match bounds.width().max(bounds.height()) {
            extent if extent > 0.0 => extent,
            _ => 1.0,
        };
        let center = bounds.center();
        let margin = options.super_triangle_margin * extent;
        let super_positions = [
            Point2::new(center.x - margin, center.y - extent),
            Point2::new(center.x, center.y + margin),
            Point2::new(center.x + margin, center.y - extent),
        ];
        positions[..RESERVED_IDS].copy_from_slice(&super_positions);

        let super_triangle = Triangle::new([0, 1, 2], super_positions).ok_or(
            TriangulationError::DegenerateInput {
                vertices: [None; 3],
            },
        )?;
        let mut index = options.quad_tree.clone().build(super_triangle.bounds());
        index.insert(super_triangle);

        debug!(
            "Starting triangulation of {} points, super triangle: {:?}",
            points.len(),
            super_positions
        );

        Ok(TriangulationRun {
            positions,
            elevations,
            next: 0,
            min_separation: extent * DEGENERACY_EPSILON,
            complete_hull: options.complete_hull,
            index,
            edge_counts: HashMap::new(),
            boundary: Vec::new(),
        })
    }

    /// Returns the number of points inserted so far.
    pub fn inserted(&self) -> usize {
        self.next
    }

    /// Returns the number of points that still need to be inserted.
    pub fn remaining(&self) -> usize {
        self.elevations.len() - self.next
    }

    /// Returns the number of triangles, including those touching the super triangle.
    pub fn triangle_count(&self) -> usize {
        self.index.len()
    }

    /// Inserts the next input point.
    ///
    /// Returns `Ok(false)` once all points have been inserted. If an error is returned, the
    /// triangulation is left as it was before the call.
    pub fn insert_next(&mut self) -> Result<bool, TriangulationError> {
        let id = RESERVED_IDS + self.next;
        let Some(&position) = self.positions.get(id) else {
            return Ok(false);
        };

        let bad_triangles = self.index.query(position);
        if bad_triangles.is_empty() {
            // Only reachable through rounding errors: the point must lie in some triangle
            return Err(TriangulationError::DegenerateInput {
                vertices: [input_index(id), None, None],
            });
        }

        self.edge_counts.clear();
        for triangle in &bad_triangles {
            for vertex in triangle.vertices() {
                if self.positions[vertex].distance(position) <= self.min_separation {
                    return Err(TriangulationError::DegenerateInput {
                        vertices: [input_index(vertex), input_index(id), None],
                    });
                }
            }
            for edge in triangle.edges() {
                *self.edge_counts.entry(edge).or_insert(0) += 1;
            }
        }

        // Edges shared by two cavity triangles are interior, all others form its boundary
        self.boundary.clear();
        self.boundary.extend(
            self.edge_counts
                .iter()
                .filter(|(_, count)| **count == 1)
                .map(|(edge, _)| *edge),
        );

        let mut new_triangles: SmallVec<[Triangle; 8]> = SmallVec::new();
        for edge in &self.boundary {
            let [from, to] = edge.vertices();
            let positions = [self.positions[from], self.positions[to], position];
            let triangle = Triangle::new([from, to, id], positions).ok_or(
                TriangulationError::DegenerateInput {
                    vertices: [input_index(from), input_index(to), input_index(id)],
                },
            )?;
            new_triangles.push(triangle);
        }

        for triangle in &bad_triangles {
            self.index.remove(triangle);
        }
        for triangle in new_triangles {
            let inserted = self.index.insert(triangle);
            debug_assert!(inserted, "Triangle outside of the super triangle");
        }

        trace!(
            "Inserted point {} at {:?}: {} bad triangles, {} boundary edges",
            self.next,
            position,
            bad_triangles.len(),
            self.boundary.len()
        );

        self.next += 1;
        Ok(true)
    }

    /// Inserts all remaining points and builds the mesh.
    ///
    /// All triangles touching the super triangle are removed and point ids are shifted
    /// to match the input indices. Unless disabled in the [TriangulationOptions], pockets
    /// along the convex hull are closed afterwards.
    ///
    /// Every input point is part of the resulting mesh. If removing the super triangle
    /// leaves points without a triangle, which happens along very flat hulls, the points
    /// are triangulated again by a sweep over the convex hull.
    pub fn finish(mut self) -> Result<Mesh, TriangulationError> {
        while self.insert_next()? {}

        let positions = &self.positions[RESERVED_IDS..];
        let mut triangles: Vec<_> = self
            .index
            .collect_all()
            .into_iter()
            .filter(|triangle| triangle.vertices()[0] >= RESERVED_IDS)
            .map(|triangle| triangle.shifted(RESERVED_IDS))
            .collect();

        if self.complete_hull && !triangles.is_empty() {
            hull::complete_convex_hull(positions, &mut triangles);
        }

        let unreferenced = count_unreferenced(positions.len(), &triangles);
        if unreferenced > 0 {
            debug!(
                "{} of {} points are not part of any triangle, switching to a hull sweep",
                unreferenced,
                positions.len()
            );
            triangles = hull::sweep_triangulation(positions)?;
        }

        let points: Vec<_> = positions
            .iter()
            .zip(&self.elevations)
            .enumerate()
            .map(|(id, (position, z))| MeshPoint::new(id, *position, *z))
            .collect();

        debug!(
            "Finished triangulation: {} points, {} triangles",
            points.len(),
            triangles.len()
        );
        Ok(Mesh::new(points, triangles))
    }
}

fn count_unreferenced(point_count: usize, triangles: &[Triangle]) -> usize {
    let mut referenced = vec![false; point_count];
    for triangle in triangles {
        for vertex in triangle.vertices() {
            referenced[vertex] = true;
        }
    }
    referenced.iter().filter(|referenced| !**referenced).count()
}

fn input_index(id: usize) -> Option<usize> {
    id.checked_sub(RESERVED_IDS)
}
