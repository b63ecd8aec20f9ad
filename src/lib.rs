//! # Isomesh
//!
//! Delaunay triangulation of scattered 2D points and contouring of scalar fields sampled at
//! those points.
//!
//! # Features
//! * Incremental Delaunay triangulation with the Bowyer–Watson algorithm, see
//!   [IncrementalTriangulator]. Triangles invalidated by an insertion are found with a
//!   [QuadTree].
//! * An immutable [Mesh] holding the triangulated points and triangles.
//! * Isoline extraction with marching triangles, see [build_isolines] and [join_segments].
//! * Heat map coloring of mesh points, see [PaletteColorMapper].
//!
//! # Example
//! ```
//! use isomesh::{build_isolines, triangulate, Point3};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let samples = [
//!     Point3::new(0.0, 0.0, 1.0),
//!     Point3::new(1.0, 0.0, 2.0),
//!     Point3::new(1.0, 1.0, 4.0),
//!     Point3::new(0.0, 1.0, 3.0),
//!     Point3::new(0.5, 0.5, 2.5),
//! ];
//! let mesh = triangulate(&samples)?;
//! let elevations: Vec<f64> = mesh.points().iter().map(|p| p.z()).collect();
//! let segments = build_isolines(&mesh, &elevations, 4)?;
//! assert!(!segments.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! # Cargo features
//! * `serde`: Implements `Serialize` and `Deserialize` for the public value types.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod bounding_rect;
mod color;
mod error;
mod hull;
mod isolines;
mod mesh;
mod point;
mod primitives;
mod quad_tree;
mod triangulation;

pub mod math;

#[cfg(test)]
mod test_utilities;

pub use crate::bounding_rect::BoundingRect;
pub use crate::color::{Color, InterpolationMode, PaletteColorMapper};
pub use crate::error::{ContourError, PaletteError, TriangulationError};
pub use crate::isolines::{
    build_isolines, contour_levels, isolines_at, join_segments, Isoline, Segment,
};
pub use crate::mesh::{Mesh, MeshPoint};
pub use crate::point::{HasPosition, MeshNum, Point2, Point3};
pub use crate::primitives::{Edge, Triangle, CIRCUMCIRCLE_TOLERANCE};
pub use crate::quad_tree::{PlacementPolicy, QuadTree, QuadTreeOptions, SpatialObject};
pub use crate::triangulation::{
    triangulate, IncrementalTriangulator, TriangulationOptions, TriangulationRun, RESERVED_IDS,
};
