//! Polygon type for closed loops.

use super::{BoundingBox, Line, Point, Polyline};
use crate::{unscale, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut, Index};

/// A closed polygon defined by a sequence of points.
///
/// The closing edge from the last point back to the first is implicit; the
/// first point is never repeated at the end.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    #[inline]
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a polygon from points. A trailing point equal to the first is dropped.
    pub fn from_points(mut points: Vec<Point>) -> Self {
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Self { points }
    }

    /// Axis-aligned rectangle from two opposite corners, counter-clockwise.
    pub fn rectangle(min: Point, max: Point) -> Self {
        Self {
            points: vec![
                min,
                Point::new(max.x, min.y),
                max,
                Point::new(min.x, max.y),
            ],
        }
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

    /// First point, if any.
    #[inline]
    pub fn first_point(&self) -> Option<Point> {
        self.points.first().copied()
    }

    /// A polygon needs at least three vertices to enclose area.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.points.len() >= 3
    }

    /// Signed area in scaled units² (shoelace). Positive for counter-clockwise.
    pub fn area(&self) -> CoordF {
        if self.points.len() < 3 {
            return 0.0;
        }
        let n = self.points.len();
        let mut twice: i128 = 0;
        for i in 0..n {
            let j = (i + 1) % n;
            twice += self.points[i].cross(&self.points[j]);
        }
        twice as CoordF / 2.0
    }

    /// Signed area in mm².
    #[inline]
    pub fn area_mm2(&self) -> CoordF {
        self.area() * unscale(1) * unscale(1)
    }

    #[inline]
    pub fn is_counter_clockwise(&self) -> bool {
        self.area() > 0.0
    }

    #[inline]
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Orient counter-clockwise. Returns true if the polygon was reversed.
    pub fn make_counter_clockwise(&mut self) -> bool {
        if self.area() < 0.0 {
            self.reverse();
            true
        } else {
            false
        }
    }

    /// Orient clockwise. Returns true if the polygon was reversed.
    pub fn make_clockwise(&mut self) -> bool {
        if self.area() > 0.0 {
            self.reverse();
            true
        } else {
            false
        }
    }

    /// Perimeter length in scaled units.
    pub fn length(&self) -> CoordF {
        self.edges().iter().map(|e| e.length()).sum()
    }

    #[inline]
    pub fn length_mm(&self) -> CoordF {
        self.length() * unscale(1)
    }

    /// All edges including the closing one.
    pub fn edges(&self) -> Vec<Line> {
        let n = self.points.len();
        if n < 2 {
            return Vec::new();
        }
        (0..n)
            .map(|i| Line::new(self.points[i], self.points[(i + 1) % n]))
            .collect()
    }

    /// Even-odd point containment by ray casting towards +X.
    pub fn contains_point(&self, p: &Point) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let pi = self.points[i];
            let pj = self.points[j];
            if (pi.y > p.y) != (pj.y > p.y) {
                let x_cross = pi.x as CoordF
                    + (p.y - pi.y) as CoordF * (pj.x - pi.x) as CoordF / (pj.y - pi.y) as CoordF;
                if (p.x as CoordF) < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// Translate every vertex by `v`.
    pub fn translate(&mut self, v: Point) {
        for p in &mut self.points {
            *p = *p + v;
        }
    }

    /// Open path that walks the loop and returns to its start.
    pub fn to_closed_polyline(&self) -> Polyline {
        let mut points = self.points.clone();
        if let Some(&first) = self.points.first() {
            points.push(first);
        }
        Polyline::from_points(points)
    }

    /// Same loop walked from the vertex at `index`.
    pub fn rotated_to(&self, index: usize) -> Polygon {
        if self.points.is_empty() {
            return self.clone();
        }
        let mut points = self.points.clone();
        points.rotate_left(index % self.points.len());
        Polygon { points }
    }
}

impl fmt::Debug for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polygon({} points, area {:.3}mm²)", self.len(), self.area_mm2())
    }
}

impl Deref for Polygon {
    type Target = [Point];

    fn deref(&self) -> &Self::Target {
        &self.points
    }
}

impl DerefMut for Polygon {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.points
    }
}

impl Index<usize> for Polygon {
    type Output = Point;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl FromIterator<Point> for Polygon {
    fn from_iter<T: IntoIterator<Item = Point>>(iter: T) -> Self {
        Self::from_points(iter.into_iter().collect())
    }
}

impl From<Vec<Point>> for Polygon {
    fn from(points: Vec<Point>) -> Self {
        Self::from_points(points)
    }
}

/// Collection of polygons.
pub type Polygons = Vec<Polygon>;

#[cfg(test)]
mod tests {
    use super::*;

    fn square_mm(size: f64) -> Polygon {
        Polygon::rectangle(Point::new_scale(0.0, 0.0), Point::new_scale(size, size))
    }

    #[test]
    fn test_polygon_area_and_orientation() {
        let mut sq = square_mm(10.0);
        assert!((sq.area_mm2() - 100.0).abs() < 1e-6);
        assert!(sq.is_counter_clockwise());

        assert!(sq.make_clockwise());
        assert!((sq.area_mm2() + 100.0).abs() < 1e-6);
        assert!(!sq.make_clockwise());
    }

    #[test]
    fn test_polygon_from_points_drops_repeated_start() {
        let p = Polygon::from_points(vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 0),
        ]);
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn test_polygon_contains_point() {
        let sq = square_mm(10.0);
        assert!(sq.contains_point(&Point::new_scale(5.0, 5.0)));
        assert!(!sq.contains_point(&Point::new_scale(15.0, 5.0)));
        assert!(!sq.contains_point(&Point::new_scale(-1.0, 5.0)));
    }

    #[test]
    fn test_polygon_closed_polyline_returns_to_start() {
        let sq = square_mm(2.0);
        let pl = sq.to_closed_polyline();
        assert_eq!(pl.len(), 5);
        assert_eq!(pl.first_point(), pl.last_point());
    }

    #[test]
    fn test_polygon_rotated_to() {
        let sq = square_mm(1.0);
        let r = sq.rotated_to(2);
        assert_eq!(r[0], sq[2]);
        assert_eq!(r.len(), sq.len());
    }
}
