use thiserror::Error;

/// The error type returned when building a [Mesh](crate::Mesh).
///
/// No partially built mesh is ever returned: every variant aborts the whole triangulation.
#[derive(Error, Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum TriangulationError {
    /// Fewer than three points were given.
    #[error("at least 3 points are required for a triangulation, got {count}")]
    EmptyInput {
        /// The number of points that were given.
        count: usize,
    },

    /// A triangle with zero or near zero area would have been created.
    ///
    /// This is caused by duplicated input points or by three or more (nearly) collinear
    /// points. The reported vertices are indices into the input, with `None` marking a
    /// vertex of the auxiliary super triangle. Fully collinear input reports
    /// `[None, None, None]`.
    #[error("degenerate input: the points {vertices:?} do not span a triangle")]
    DegenerateInput {
        /// The input indices of the triangle's vertices.
        vertices: [Option<usize>; 3],
    },

    /// An input coordinate was NaN or infinite.
    #[error("the coordinate of point {index} is not finite")]
    NonFiniteCoordinate {
        /// The input index of the offending point.
        index: usize,
    },
}

/// The error type used when extracting isolines.
#[derive(Error, Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum ContourError {
    /// The scalar field does not have one value per mesh point.
    #[error("expected {expected} field values (one per mesh point), got {actual}")]
    InconsistentField {
        /// The mesh's point count.
        expected: usize,
        /// The number of given values.
        actual: usize,
    },

    /// The number of contour levels was zero.
    #[error("the level count must be at least 1")]
    InvalidLevelCount,

    /// A field value was NaN or infinite.
    #[error("the field value at index {index} is not finite")]
    NonFiniteValue {
        /// The index of the offending value.
        index: usize,
    },
}

/// The error type used by the [PaletteColorMapper](crate::PaletteColorMapper).
#[derive(Error, Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum PaletteError {
    /// The palette contained no colors.
    #[error("a palette requires at least one color")]
    EmptyPalette,

    /// The value range was reversed or not finite.
    #[error("the value range must be finite with min <= max")]
    InvalidRange,

    /// The scalar field does not have one value per mesh point.
    #[error("expected {expected} field values (one per mesh point), got {actual}")]
    InconsistentField {
        /// The mesh's point count.
        expected: usize,
        /// The number of given values.
        actual: usize,
    },
}

#[cfg(test)]
mod test {
    use super::{ContourError, TriangulationError};

    #[test]
    fn test_messages() {
        assert_eq!(
            TriangulationError::EmptyInput { count: 2 }.to_string(),
            "at least 3 points are required for a triangulation, got 2"
        );
        assert_eq!(
            ContourError::InconsistentField {
                expected: 5,
                actual: 4
            }
            .to_string(),
            "expected 5 field values (one per mesh point), got 4"
        );
    }
}
