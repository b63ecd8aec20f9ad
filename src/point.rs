use num_traits::{Num, Signed, Zero};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A coordinate type that can be used as triangulation input.
///
/// All calculations are performed after converting the type into a `f64`, the scalar
/// type only determines how input positions are stored by the caller.
///
/// This type should usually be either `f32` or `f64`.
pub trait MeshNum:
    Num + PartialOrd + Into<f64> + From<f32> + Copy + Signed + std::fmt::Debug
{
}

impl<T> MeshNum for T where
    T: Num + PartialOrd + Into<f64> + From<f32> + Copy + Signed + std::fmt::Debug
{
}

/// A two dimensional point.
///
/// This is the basic type used for defining positions.
#[derive(Debug, PartialEq, Eq, PartialOrd, Clone, Copy, Default, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct Point2<S> {
    /// The point's x coordinate
    pub x: S,
    /// The point's y coordinate
    pub y: S,
}

impl<S> Point2<S> {
    /// Creates a new point.
    #[inline]
    pub const fn new(x: S, y: S) -> Self {
        Point2 { x, y }
    }
}

impl<S: MeshNum> Point2<S> {
    /// Returns the squared distance of this point and another point.
    #[inline]
    pub fn distance_2(&self, other: Self) -> S {
        self.sub(other).length2()
    }

    /// Converts this point into a `f64` point.
    pub fn to_f64(self) -> Point2<f64> {
        Point2::new(self.x.into(), self.y.into())
    }

    pub(crate) fn mul(&self, factor: S) -> Self {
        Point2 {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    pub(crate) fn add(&self, other: Self) -> Self {
        Point2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    pub(crate) fn length2(&self) -> S {
        self.x * self.x + self.y * self.y
    }

    pub(crate) fn sub(&self, other: Self) -> Self {
        Point2 {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    pub(crate) fn dot(&self, other: Self) -> S {
        self.x * other.x + self.y * other.y
    }

    pub(crate) fn all_component_wise(&self, other: Self, f: impl Fn(S, S) -> bool) -> bool {
        f(self.x, other.x) && f(self.y, other.y)
    }
}

impl Point2<f64> {
    /// Returns the euclidean distance of this point and another point.
    #[inline]
    pub fn distance(&self, other: Self) -> f64 {
        self.distance_2(other).sqrt()
    }

    /// Linearly interpolates between `self` (`t == 0`) and `other` (`t == 1`).
    #[inline]
    pub fn lerp(&self, other: Self, t: f64) -> Self {
        self.add(other.sub(*self).mul(t))
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl<S: MeshNum> From<Point2<S>> for [S; 2] {
    #[inline]
    fn from(point: Point2<S>) -> Self {
        [point.x, point.y]
    }
}

impl<S: MeshNum> From<Point2<S>> for (S, S) {
    #[inline]
    fn from(point: Point2<S>) -> (S, S) {
        (point.x, point.y)
    }
}

impl<S: MeshNum> From<[S; 2]> for Point2<S> {
    #[inline]
    fn from(source: [S; 2]) -> Self {
        Self::new(source[0], source[1])
    }
}

impl<S: MeshNum> From<(S, S)> for Point2<S> {
    #[inline]
    fn from(source: (S, S)) -> Self {
        Self::new(source.0, source.1)
    }
}

/// A three dimensional point.
///
/// Only `x` and `y` take part in the triangulation, `z` is carried through into the
/// resulting [Mesh](crate::Mesh) unchanged.
#[derive(Debug, PartialEq, PartialOrd, Clone, Copy, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct Point3<S> {
    /// The point's x coordinate
    pub x: S,
    /// The point's y coordinate
    pub y: S,
    /// The point's z coordinate
    pub z: S,
}

impl<S> Point3<S> {
    /// Creates a new point.
    #[inline]
    pub const fn new(x: S, y: S, z: S) -> Self {
        Point3 { x, y, z }
    }
}

impl<S: MeshNum> From<[S; 3]> for Point3<S> {
    #[inline]
    fn from(source: [S; 3]) -> Self {
        Self::new(source[0], source[1], source[2])
    }
}

/// An object with position.
///
/// Input values need to implement this trait to allow being triangulated.
pub trait HasPosition {
    /// The number type used by this coordinate type.
    type Scalar: MeshNum;

    /// Returns the position of this object.
    fn position(&self) -> Point2<Self::Scalar>;

    /// Returns the object's elevation.
    ///
    /// The elevation is ignored by all planar algorithms and only stored alongside each
    /// [MeshPoint](crate::MeshPoint).
    fn z(&self) -> Self::Scalar {
        Self::Scalar::zero()
    }
}

impl<S: MeshNum> HasPosition for Point2<S> {
    type Scalar = S;

    fn position(&self) -> Point2<S> {
        *self
    }
}

impl<S: MeshNum> HasPosition for Point3<S> {
    type Scalar = S;

    fn position(&self) -> Point2<S> {
        Point2::new(self.x, self.y)
    }

    fn z(&self) -> S {
        self.z
    }
}
