//! Contour extraction from scalar fields sampled at mesh points.
//!
//! Isolines are extracted with the marching triangles algorithm: every triangle that is
//! crossed by a contour level contributes one straight [Segment]. Segments can be
//! [joined](join_segments) into connected [Isoline]s afterwards.

use hashbrown::HashMap;
use log::debug;
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{ContourError, Edge, Mesh, Point2};

/// A straight piece of an isoline, lying within a single triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct Segment {
    /// The contour level this segment belongs to.
    pub level: f64,
    /// The index of the containing triangle in [Mesh::triangles].
    pub triangle: usize,
    /// The segment's first end point, lying on `edges[0]`.
    pub from: Point2<f64>,
    /// The segment's second end point, lying on `edges[1]`.
    pub to: Point2<f64>,
    /// The two triangle edges crossed by the contour level.
    pub edges: [Edge; 2],
}

/// A connected contour line made of joined [Segment]s.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct Isoline {
    /// The contour level.
    pub level: f64,
    /// The line's vertices. Closed lines don't repeat their first vertex.
    pub points: Vec<Point2<f64>>,
    /// `true` if the last vertex connects back to the first one.
    pub closed: bool,
}

/// Returns `level_count + 1` equally spaced values from `min` to `max`, both inclusive.
///
/// # Example
/// ```
/// use isomesh::contour_levels;
///
/// # fn main() -> Result<(), isomesh::ContourError> {
/// assert_eq!(contour_levels(0.0, 1.0, 4)?, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
/// # Ok(())
/// # }
/// ```
pub fn contour_levels(min: f64, max: f64, level_count: usize) -> Result<Vec<f64>, ContourError> {
    if level_count < 1 {
        return Err(ContourError::InvalidLevelCount);
    }
    let step = (max - min) / level_count as f64;
    let mut levels: Vec<_> = (0..level_count).map(|i| min + step * i as f64).collect();
    levels.push(max);
    Ok(levels)
}

/// Extracts isolines at `level_count + 1` levels evenly spread over the field's value range.
///
/// `values` holds one sample per mesh point, indexed by point id. The returned segments are
/// ordered by level first and by triangle index second.
///
/// # Example
/// ```
/// use isomesh::{build_isolines, triangulate, Point2};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let points = [
///     Point2::new(0.0, 0.0),
///     Point2::new(1.0, 0.0),
///     Point2::new(1.0, 1.0),
///     Point2::new(0.0, 1.0),
/// ];
/// let mesh = triangulate(&points)?;
/// let segments = build_isolines(&mesh, &[0.0, 1.0, 2.0, 1.0], 2)?;
/// // Only the middle level crosses the interior of the square
/// assert!(segments.iter().all(|segment| segment.level == 1.0));
/// # Ok(())
/// # }
/// ```
pub fn build_isolines(
    mesh: &Mesh,
    values: &[f64],
    level_count: usize,
) -> Result<Vec<Segment>, ContourError> {
    validate_field(mesh, values)?;
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| {
            (min.min(*value), max.max(*value))
        });
    let levels = contour_levels(min, max, level_count)?;

    let mut result = Vec::new();
    for level in &levels {
        extract_level(mesh, values, *level, &mut result);
    }

    debug!(
        "Extracted {} isoline segments at {} levels from {} triangles",
        result.len(),
        levels.len(),
        mesh.triangle_count()
    );
    Ok(result)
}

/// Extracts the isoline of a single threshold.
///
/// A threshold outside of the field's value range yields no segments.
pub fn isolines_at(
    mesh: &Mesh,
    values: &[f64],
    threshold: f64,
) -> Result<Vec<Segment>, ContourError> {
    validate_field(mesh, values)?;
    let mut result = Vec::new();
    extract_level(mesh, values, threshold, &mut result);
    debug!(
        "Extracted {} isoline segments at level {}",
        result.len(),
        threshold
    );
    Ok(result)
}

fn validate_field(mesh: &Mesh, values: &[f64]) -> Result<(), ContourError> {
    if values.len() != mesh.point_count() {
        return Err(ContourError::InconsistentField {
            expected: mesh.point_count(),
            actual: values.len(),
        });
    }
    match values.iter().position(|value| !value.is_finite()) {
        Some(index) => Err(ContourError::NonFiniteValue { index }),
        None => Ok(()),
    }
}

fn extract_level(mesh: &Mesh, values: &[f64], threshold: f64, result: &mut Vec<Segment>) {
    let mut touching: SmallVec<[Edge; 6]> = SmallVec::new();
    for (index, triangle) in mesh.triangles().iter().enumerate() {
        let above = triangle.vertices().map(|vertex| values[vertex] >= threshold);
        let state = above
            .iter()
            .enumerate()
            .fold(0u8, |state, (bit, above)| state | (u8::from(*above) << bit));
        if state == 0 || state == 0b111 {
            continue;
        }

        // Edges touching two vertices above the threshold show up twice, the remaining
        // two edges connect a vertex above to one below.
        touching.clear();
        for (vertex, _) in triangle
            .vertices()
            .into_iter()
            .zip(above)
            .filter(|(_, above)| *above)
        {
            touching.extend(
                triangle
                    .edges()
                    .into_iter()
                    .filter(|edge| edge.contains_vertex(vertex)),
            );
        }
        let mut crossing = triangle
            .edges()
            .into_iter()
            .filter(|edge| touching.iter().filter(|e| *e == edge).count() == 1);
        let (Some(first), Some(second)) = (crossing.next(), crossing.next()) else {
            continue;
        };

        let from = intersection(mesh, values, first, threshold);
        let to = intersection(mesh, values, second, threshold);
        if from == to {
            // The level only touches a vertex
            continue;
        }
        result.push(Segment {
            level: threshold,
            triangle: index,
            from,
            to,
            edges: [first, second],
        });
    }
}

fn intersection(mesh: &Mesh, values: &[f64], edge: Edge, threshold: f64) -> Point2<f64> {
    let [v1, v2] = edge.vertices();
    let (p1, p2) = (mesh.points()[v1].position(), mesh.points()[v2].position());
    let t = (threshold - values[v1]) / (values[v2] - values[v1]);
    if t <= 0.0 {
        p1
    } else if t >= 1.0 {
        p2
    } else {
        p1.lerp(p2, t)
    }
}

/// Joins segments into connected isolines.
///
/// Segments of the same level are connected if they cross the same mesh edge. Open lines
/// come first within each level, followed by closed loops. Lines are interrupted where a
/// level passes exactly through a mesh point.
///
/// `segments` are expected in the order returned by [build_isolines] or [isolines_at].
pub fn join_segments(segments: &[Segment]) -> Vec<Isoline> {
    let mut result = Vec::new();
    let mut start = 0;
    while start < segments.len() {
        let level = segments[start].level;
        let end = segments[start..]
            .iter()
            .position(|segment| segment.level != level)
            .map_or(segments.len(), |offset| start + offset);
        join_level(&segments[start..end], &mut result);
        start = end;
    }
    result
}

fn join_level(segments: &[Segment], result: &mut Vec<Isoline>) {
    let mut by_edge: HashMap<Edge, SmallVec<[usize; 2]>> = HashMap::new();
    for (index, segment) in segments.iter().enumerate() {
        for edge in segment.edges {
            by_edge.entry(edge).or_default().push(index);
        }
    }
    let is_open_end = |edge: &Edge| by_edge.get(edge).map_or(true, |users| users.len() < 2);

    let open_starts =
        (0..segments.len()).filter(|index| segments[*index].edges.iter().any(is_open_end));
    let mut visited = vec![false; segments.len()];
    for start in open_starts.chain(0..segments.len()) {
        if visited[start] {
            continue;
        }
        visited[start] = true;

        let segment = &segments[start];
        let (entry, mut exit, mut points) =
            if is_open_end(&segment.edges[1]) && !is_open_end(&segment.edges[0]) {
                (segment.edges[1], segment.edges[0], vec![segment.to, segment.from])
            } else {
                (segment.edges[0], segment.edges[1], vec![segment.from, segment.to])
            };

        let mut current = start;
        let mut closed = false;
        while let Some(users) = by_edge.get(&exit) {
            let Some(next) = users.iter().copied().find(|index| *index != current) else {
                break;
            };
            if visited[next] {
                closed = next == start && exit == entry;
                break;
            }
            visited[next] = true;

            let segment = &segments[next];
            let (point, out) = if segment.edges[0] == exit {
                (segment.to, segment.edges[1])
            } else {
                (segment.from, segment.edges[0])
            };
            points.push(point);
            exit = out;
            current = next;
        }

        if closed {
            // The last point lies on the entry edge and equals the first point
            points.pop();
        }
        result.push(Isoline {
            level: segments[start].level,
            points,
            closed,
        });
    }
}
