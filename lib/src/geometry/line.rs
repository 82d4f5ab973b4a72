//! Line segment type.

use super::Point;
use crate::{unscale, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A line segment defined by two endpoints.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Line {
    pub a: Point,
    pub b: Point,
}

impl Line {
    /// Create a new line segment from two points.
    #[inline]
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    /// Create a line from millimetre coordinates.
    #[inline]
    pub fn from_coords_scale(ax: CoordF, ay: CoordF, bx: CoordF, by: CoordF) -> Self {
        Self {
            a: Point::new_scale(ax, ay),
            b: Point::new_scale(bx, by),
        }
    }

    /// Direction vector (b - a).
    #[inline]
    pub fn direction(&self) -> Point {
        self.b - self.a
    }

    #[inline]
    pub fn length(&self) -> CoordF {
        self.a.distance(&self.b)
    }

    /// Length in millimetres.
    #[inline]
    pub fn length_mm(&self) -> CoordF {
        unscale(1) * self.length()
    }

    #[inline]
    pub fn reverse(&self) -> Self {
        Self {
            a: self.b,
            b: self.a,
        }
    }

    /// Point at parameter `t` along the segment (0 = a, 1 = b).
    #[inline]
    pub fn point_at(&self, t: CoordF) -> Point {
        let d = self.direction();
        Point::new(
            self.a.x + (d.x as CoordF * t).round() as i64,
            self.a.y + (d.y as CoordF * t).round() as i64,
        )
    }

    /// Parameter along `self` where it crosses `other`, if the two segments
    /// properly intersect. Parallel segments never intersect.
    pub fn intersection_param(&self, other: &Line) -> Option<CoordF> {
        let d1 = self.direction();
        let d2 = other.direction();

        let denom = d1.cross(&d2);
        if denom == 0 {
            return None;
        }

        let diff = other.a - self.a;
        let t = diff.cross(&d2) as CoordF / denom as CoordF;
        let u = diff.cross(&d1) as CoordF / denom as CoordF;

        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            Some(t)
        } else {
            None
        }
    }

    /// Intersection point of two segments, if any.
    pub fn intersection(&self, other: &Line) -> Option<Point> {
        self.intersection_param(other).map(|t| self.point_at(t))
    }

    /// Squared distance from `p` to the segment `a`-`b`, in scaled units².
    pub fn distance_to_squared(p: Point, a: Point, b: Point) -> CoordF {
        let ab = b - a;
        let len_sq = ab.dot(&ab);
        if len_sq == 0 {
            return p.distance_squared(&a) as CoordF;
        }
        let t = ((p - a).dot(&ab) as CoordF / len_sq as CoordF).clamp(0.0, 1.0);
        let proj = Line::new(a, b).point_at(t);
        p.distance_squared(&proj) as CoordF
    }

    /// Positive if `p` lies to the left of a -> b.
    #[inline]
    pub fn ccw(&self, p: &Point) -> i128 {
        (self.b - self.a).cross(&(*p - self.a))
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line({:?} -> {:?})", self.a, self.b)
    }
}

impl From<(Point, Point)> for Line {
    #[inline]
    fn from((a, b): (Point, Point)) -> Self {
        Self { a, b }
    }
}

/// Collection of segments.
pub type Lines = Vec<Line>;
