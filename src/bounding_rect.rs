use crate::{MeshNum, Point2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis aligned bounding rectangle.
///
/// Used by the [QuadTree](crate::QuadTree) to describe both the area covered by a node and
/// the extent of the objects stored within.
#[derive(Debug, PartialEq, Clone, Copy)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct BoundingRect<S> {
    lower: Point2<S>,
    upper: Point2<S>,
}

impl<S: MeshNum> BoundingRect<S> {
    /// Creates a bounding rectangle that contains exactly one point.
    ///
    /// This will create a bounding rectangle with `lower == upper == point`.
    pub fn from_point(point: Point2<S>) -> Self {
        Self {
            lower: point,
            upper: point,
        }
    }

    /// Creates a bounding rectangle that contains two points.
    pub fn from_corners(corner1: Point2<S>, corner2: Point2<S>) -> Self {
        let mut result = Self::from_point(corner1);
        result.add_point(corner2);
        result
    }

    /// Creates the smallest bounding rectangle that contains all given points.
    ///
    /// Returns `None` if the iterator is empty.
    pub fn from_points(points: impl IntoIterator<Item = Point2<S>>) -> Option<Self> {
        let mut points = points.into_iter();
        let mut result = Self::from_point(points.next()?);
        for point in points {
            result.add_point(point);
        }
        Some(result)
    }

    /// Returns the lower corner of the bounding rectangle.
    ///
    /// The lower corner has the smaller coordinates.
    pub fn lower(&self) -> Point2<S> {
        self.lower
    }

    /// Returns the upper corner of the bounding rectangle.
    ///
    /// The upper corner has the larger coordinates.
    pub fn upper(&self) -> Point2<S> {
        self.upper
    }

    /// Returns the rectangle's extent along the x axis.
    pub fn width(&self) -> S {
        self.upper.x - self.lower.x
    }

    /// Returns the rectangle's extent along the y axis.
    pub fn height(&self) -> S {
        self.upper.y - self.lower.y
    }

    /// Returns the rectangle's center.
    pub fn center(&self) -> Point2<S> {
        let two = S::one() + S::one();
        Point2::new(
            self.lower.x + self.width() / two,
            self.lower.y + self.height() / two,
        )
    }

    /// Checks if a point is contained within the bounding rectangle.
    ///
    /// A point lying exactly on the bounding rectangle's border is also contained.
    #[inline]
    pub fn contains_point(&self, point: Point2<S>) -> bool {
        self.lower.all_component_wise(point, |l, r| l <= r)
            && self.upper.all_component_wise(point, |l, r| l >= r)
    }

    /// Checks if another bounding rectangle is completely contained within this rectangle.
    #[inline]
    pub fn contains_rect(&self, rect: &Self) -> bool {
        self.lower.all_component_wise(rect.lower, |l, r| l <= r)
            && self.upper.all_component_wise(rect.upper, |l, r| l >= r)
    }

    /// Checks if this and another bounding rectangle share at least one point.
    ///
    /// Touching borders count as an intersection.
    #[inline]
    pub fn intersects(&self, rect: &Self) -> bool {
        self.lower.all_component_wise(rect.upper, |l, r| l <= r)
            && self.upper.all_component_wise(rect.lower, |l, r| l >= r)
    }

    /// Enlarges this bounding rectangle to contain a point.
    ///
    /// If the point is already contained, nothing will be changed.
    #[inline]
    pub fn add_point(&mut self, point: Point2<S>) {
        self.lower = Point2::new(
            min_inline(self.lower.x, point.x),
            min_inline(self.lower.y, point.y),
        );
        self.upper = Point2::new(
            max_inline(self.upper.x, point.x),
            max_inline(self.upper.y, point.y),
        );
    }

    /// Splits the rectangle into four equally sized quadrants.
    ///
    /// The quadrants are returned in the order north west, north east, south west, south east.
    pub fn quadrants(&self) -> [Self; 4] {
        let c = self.center();
        let (l, u) = (self.lower, self.upper);
        [
            Self::from_corners(Point2::new(l.x, c.y), Point2::new(c.x, u.y)),
            Self::from_corners(c, u),
            Self::from_corners(l, c),
            Self::from_corners(Point2::new(c.x, l.y), Point2::new(u.x, c.y)),
        ]
    }
}

// A call to l.min(r) is not available for partially ordered scalars, thus we define it ourselves.
#[inline]
fn min_inline<S: MeshNum>(a: S, b: S) -> S {
    if a < b {
        a
    } else {
        b
    }
}

#[inline]
fn max_inline<S: MeshNum>(a: S, b: S) -> S {
    if a > b {
        a
    } else {
        b
    }
}

#[cfg(test)]
mod test {
    use super::BoundingRect;
    use crate::Point2;

    #[test]
    fn test_contains_point() {
        let rect = BoundingRect::from_corners(Point2::new(1.0, 3.0), Point2::new(-1.0, 0.0));
        assert_eq!(rect.lower(), Point2::new(-1.0, 0.0));
        assert_eq!(rect.upper(), Point2::new(1.0, 3.0));

        assert!(rect.contains_point(Point2::new(0.0, 1.0)));
        assert!(rect.contains_point(Point2::new(1.0, 3.0)));
        assert!(!rect.contains_point(Point2::new(1.5, 1.0)));
        assert!(!rect.contains_point(Point2::new(0.0, -0.1)));
    }

    #[test]
    fn test_rect_relations() {
        let outer = BoundingRect::from_corners(Point2::new(0.0, 0.0), Point2::new(4.0, 4.0));
        let inner = BoundingRect::from_corners(Point2::new(1.0, 1.0), Point2::new(2.0, 2.0));
        let straddling = BoundingRect::from_corners(Point2::new(3.0, 3.0), Point2::new(5.0, 5.0));
        let touching = BoundingRect::from_corners(Point2::new(4.0, 0.0), Point2::new(6.0, 1.0));
        let outside = BoundingRect::from_corners(Point2::new(5.0, 5.0), Point2::new(6.0, 6.0));

        assert!(outer.contains_rect(&inner));
        assert!(!inner.contains_rect(&outer));
        assert!(!outer.contains_rect(&straddling));

        assert!(outer.intersects(&inner));
        assert!(outer.intersects(&straddling));
        assert!(outer.intersects(&touching));
        assert!(!outer.intersects(&outside));
        assert!(!inner.intersects(&straddling));
    }

    #[test]
    fn test_from_points() {
        assert_eq!(BoundingRect::<f64>::from_points(Vec::new()), None);

        let rect = BoundingRect::from_points(vec![
            Point2::new(0.5, 2.0),
            Point2::new(-1.0, 1.0),
            Point2::new(3.0, -4.0),
        ])
        .unwrap();
        assert_eq!(rect.lower(), Point2::new(-1.0, -4.0));
        assert_eq!(rect.upper(), Point2::new(3.0, 2.0));
        assert_eq!(rect.width(), 4.0);
        assert_eq!(rect.height(), 6.0);
        assert_eq!(rect.center(), Point2::new(1.0, -1.0));
    }

    #[test]
    fn test_quadrants() {
        let rect = BoundingRect::from_corners(Point2::new(0.0, 0.0), Point2::new(2.0, 2.0));
        let [nw, ne, sw, se] = rect.quadrants();
        assert!(nw.contains_point(Point2::new(0.5, 1.5)));
        assert!(ne.contains_point(Point2::new(1.5, 1.5)));
        assert!(sw.contains_point(Point2::new(0.5, 0.5)));
        assert!(se.contains_point(Point2::new(1.5, 0.5)));
        for quadrant in [nw, ne, sw, se] {
            assert!(rect.contains_rect(&quadrant));
            assert_eq!(quadrant.width(), 1.0);
            assert_eq!(quadrant.height(), 1.0);
        }
    }
}
