//! Polyline type for open paths.

use super::{BoundingBox, Line, Point};
use crate::{unscale, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, Index};

/// An open polyline defined by a sequence of points.
///
/// Unlike a [`super::Polygon`], a Polyline is not implicitly closed: it's a
/// path from the first point to the last point. A closed wall loop is stored as
/// a polyline whose last point repeats its first.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Point>,
}

impl Polyline {
    #[inline]
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    #[inline]
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Two-point polyline.
    #[inline]
    pub fn segment(a: Point, b: Point) -> Self {
        Self { points: vec![a, b] }
    }

    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    #[inline]
    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Get the first point, panicking if empty.
    #[inline]
    pub fn first_point(&self) -> Point {
        self.points[0]
    }

    /// Get the last point, panicking if empty.
    #[inline]
    pub fn last_point(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// All segments of the path.
    pub fn edges(&self) -> Vec<Line> {
        self.points
            .windows(2)
            .map(|w| Line::new(w[0], w[1]))
            .collect()
    }

    /// Total length in scaled units.
    pub fn length(&self) -> CoordF {
        self.points
            .windows(2)
            .map(|w| w[0].distance(&w[1]))
            .sum()
    }

    /// Total length in millimetres.
    #[inline]
    pub fn length_mm(&self) -> CoordF {
        self.length() * unscale(1)
    }

    /// True when the path ends where it started.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.points.len() > 2 && self.points.first() == self.points.last()
    }

    #[inline]
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    pub fn reversed(&self) -> Self {
        let mut r = self.clone();
        r.reverse();
        r
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// A polyline needs at least two points to describe a move.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.points.len() >= 2
    }
}

impl fmt::Debug for Polyline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polyline({} points)", self.points.len())
    }
}

impl Deref for Polyline {
    type Target = [Point];

    fn deref(&self) -> &Self::Target {
        &self.points
    }
}

impl Index<usize> for Polyline {
    type Output = Point;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl FromIterator<Point> for Polyline {
    fn from_iter<T: IntoIterator<Item = Point>>(iter: T) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Point>> for Polyline {
    fn from(points: Vec<Point>) -> Self {
        Self { points }
    }
}

/// Collection of polylines.
pub type Polylines = Vec<Polyline>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polyline_length() {
        let pl = Polyline::from_points(vec![
            Point::new_scale(0.0, 0.0),
            Point::new_scale(3.0, 0.0),
            Point::new_scale(3.0, 4.0),
        ]);
        assert!((pl.length_mm() - 7.0).abs() < 1e-9);
        assert_eq!(pl.edges().len(), 2);
    }

    #[test]
    fn test_polyline_closed() {
        let open = Polyline::segment(Point::new(0, 0), Point::new(10, 0));
        assert!(!open.is_closed());

        let closed = Polyline::from_points(vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 0),
        ]);
        assert!(closed.is_closed());
    }

    #[test]
    fn test_polyline_reversed() {
        let pl = Polyline::segment(Point::new(0, 0), Point::new(10, 0));
        let r = pl.reversed();
        assert_eq!(r.first_point(), pl.last_point());
        assert_eq!(r.last_point(), pl.first_point());
    }
}
