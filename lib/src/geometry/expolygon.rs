//! Polygon with holes.

use super::{BoundingBox, Point, Polygon};
use crate::{unscale, CoordF};
use serde::{Deserialize, Serialize};

/// A region bounded by one outer contour and zero or more holes.
///
/// Contours are kept counter-clockwise and holes clockwise once a value has
/// been through [`ExPolygon::normalize`] or the clipper adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExPolygon {
    pub contour: Polygon,
    pub holes: Vec<Polygon>,
}

impl ExPolygon {
    #[inline]
    pub fn new(contour: Polygon) -> Self {
        Self {
            contour,
            holes: Vec::new(),
        }
    }

    #[inline]
    pub fn with_holes(contour: Polygon, holes: Vec<Polygon>) -> Self {
        Self { contour, holes }
    }

    /// Net area in scaled units² (contour minus holes), always non-negative
    /// for a well-formed region.
    pub fn area(&self) -> CoordF {
        let holes: CoordF = self.holes.iter().map(|h| h.area().abs()).sum();
        self.contour.area().abs() - holes
    }

    /// Net area in mm².
    #[inline]
    pub fn area_mm2(&self) -> CoordF {
        self.area() * unscale(1) * unscale(1)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.contour.is_valid()
    }

    /// Inside the contour and outside every hole.
    pub fn contains_point(&self, p: &Point) -> bool {
        self.contour.contains_point(p) && !self.holes.iter().any(|h| h.contains_point(p))
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.contour.bounding_box()
    }

    /// Contour followed by holes.
    pub fn polygons(&self) -> impl Iterator<Item = &Polygon> {
        std::iter::once(&self.contour).chain(self.holes.iter())
    }

    /// Force the contour CCW and holes CW.
    pub fn normalize(&mut self) {
        self.contour.make_counter_clockwise();
        for hole in &mut self.holes {
            hole.make_clockwise();
        }
    }

    pub fn translate(&mut self, v: Point) {
        self.contour.translate(v);
        for hole in &mut self.holes {
            hole.translate(v);
        }
    }
}

impl From<Polygon> for ExPolygon {
    fn from(contour: Polygon) -> Self {
        Self::new(contour)
    }
}

/// Collection of regions.
pub type ExPolygons = Vec<ExPolygon>;
