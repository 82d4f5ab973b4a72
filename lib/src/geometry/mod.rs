//! Geometry primitives for the slicer.
//!
//! - [`Point`] - 2D point with scaled integer coordinates
//! - [`Point3F`] / [`Vertex`] - 3D point in millimetres
//! - [`Line`] - segment between two points
//! - [`Polygon`] - closed loop
//! - [`Polyline`] - open path
//! - [`ExPolygon`] - outer contour plus holes
//! - [`BoundingBox`] - axis-aligned 2D box
//!
//! ## Coordinate System
//!
//! Coordinates are scaled by [`crate::SCALING_FACTOR`] (1,000,000), so 1 unit = 1 nanometer.
//! Use [`crate::scale`] / [`crate::unscale`] to convert between millimetres and internal units.

mod bounding_box;
mod expolygon;
mod line;
mod point;
mod polygon;
mod polyline;
pub mod simplify;

pub use bounding_box::BoundingBox;
pub use expolygon::{ExPolygon, ExPolygons};
pub use line::{Line, Lines};
pub use point::{Point, Point3F, Points, Vertex};
pub use polygon::{Polygon, Polygons};
pub use polyline::{Polyline, Polylines};
pub use simplify::{douglas_peucker, douglas_peucker_polygon};

use crate::{Coord, CoordF};

/// Linear interpolation between two points.
#[inline]
pub fn lerp(a: Point, b: Point, t: CoordF) -> Point {
    Point::new(
        (a.x as CoordF + (b.x - a.x) as CoordF * t).round() as Coord,
        (a.y as CoordF + (b.y - a.y) as CoordF * t).round() as Coord,
    )
}
