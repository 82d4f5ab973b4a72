//! Point types for 2D and 3D geometry.
//!
//! 2D points use scaled integer coordinates so that chaining, offsetting and
//! clipping are exact; 3D vertices stay in floating-point millimetres the way
//! mesh files deliver them.

use crate::{scale, unscale, Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// A 2D point with scaled integer coordinates.
///
/// 1 unit = 1 nanometer (see [`crate::SCALING_FACTOR`]).
///
/// # Example
/// ```
/// use layer_slicer::geometry::Point;
/// use layer_slicer::scale;
///
/// let p = Point::new(scale(1.0), scale(2.0));
/// assert_eq!(p, Point::new_scale(1.0, 2.0));
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    /// Create a new point with the given scaled coordinates.
    #[inline]
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// Create a point from millimetre coordinates.
    #[inline]
    pub fn new_scale(x: CoordF, y: CoordF) -> Self {
        Self {
            x: scale(x),
            y: scale(y),
        }
    }

    /// X in millimetres.
    #[inline]
    pub fn x_mm(&self) -> CoordF {
        unscale(self.x)
    }

    /// Y in millimetres.
    #[inline]
    pub fn y_mm(&self) -> CoordF {
        unscale(self.y)
    }

    /// Squared distance to another point, in scaled units².
    /// Returns i128 to avoid overflow with large coordinates.
    #[inline]
    pub fn distance_squared(&self, other: &Point) -> i128 {
        let dx = (other.x - self.x) as i128;
        let dy = (other.y - self.y) as i128;
        dx * dx + dy * dy
    }

    /// Distance to another point, in scaled units.
    #[inline]
    pub fn distance(&self, other: &Point) -> CoordF {
        (self.distance_squared(other) as CoordF).sqrt()
    }

    /// Distance to another point, in millimetres.
    #[inline]
    pub fn distance_mm(&self, other: &Point) -> CoordF {
        unscale(1) * self.distance(other)
    }

    /// 2D pseudo-cross product. Positive if `other` is counter-clockwise from `self`.
    #[inline]
    pub fn cross(&self, other: &Point) -> i128 {
        (self.x as i128) * (other.y as i128) - (self.y as i128) * (other.x as i128)
    }

    /// Dot product.
    #[inline]
    pub fn dot(&self, other: &Point) -> i128 {
        (self.x as i128) * (other.x as i128) + (self.y as i128) * (other.y as i128)
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({}, {})", self.x, self.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x_mm(), self.y_mm())
    }
}

impl Add for Point {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Neg for Point {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl From<(Coord, Coord)> for Point {
    #[inline]
    fn from((x, y): (Coord, Coord)) -> Self {
        Self::new(x, y)
    }
}

/// A 3D point with floating-point coordinates in millimetres.
///
/// Meshes are flat sequences of these, three per triangle.
#[derive(Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3F {
    pub x: CoordF,
    pub y: CoordF,
    pub z: CoordF,
}

/// A mesh vertex.
pub type Vertex = Point3F;

impl Point3F {
    /// Create a new 3D point.
    #[inline]
    pub const fn new(x: CoordF, y: CoordF, z: CoordF) -> Self {
        Self { x, y, z }
    }

    /// Linear interpolation towards `other` at parameter `t`.
    #[inline]
    pub fn lerp(&self, other: &Point3F, t: CoordF) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    /// Project onto the XY plane as a scaled 2D point.
    #[inline]
    pub fn to_point_xy(&self) -> Point {
        Point::new_scale(self.x, self.y)
    }
}

impl fmt::Debug for Point3F {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point3F({:.6}, {:.6}, {:.6})", self.x, self.y, self.z)
    }
}

impl Add for Point3F {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Point3F {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl From<(CoordF, CoordF, CoordF)> for Point3F {
    #[inline]
    fn from((x, y, z): (CoordF, CoordF, CoordF)) -> Self {
        Self::new(x, y, z)
    }
}

/// Collection of 2D points.
pub type Points = Vec<Point>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let a = Point::new_scale(0.0, 0.0);
        let b = Point::new_scale(3.0, 4.0);
        assert!((a.distance_mm(&b) - 5.0).abs() < 1e-9);
        assert_eq!(a.distance_squared(&b), b.distance_squared(&a));
    }

    #[test]
    fn test_point_cross_orientation() {
        let x = Point::new(1, 0);
        let y = Point::new(0, 1);
        assert!(x.cross(&y) > 0);
        assert!(y.cross(&x) < 0);
    }

    #[test]
    fn test_point3f_lerp() {
        let a = Point3F::new(0.0, 0.0, 0.0);
        let b = Point3F::new(2.0, 4.0, 10.0);
        let m = a.lerp(&b, 0.25);
        assert!((m.x - 0.5).abs() < 1e-12);
        assert!((m.y - 1.0).abs() < 1e-12);
        assert!((m.z - 2.5).abs() < 1e-12);
    }
}
