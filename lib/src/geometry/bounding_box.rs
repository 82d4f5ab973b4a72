//! Axis-aligned bounding box.

use super::Point;
use crate::{unscale, CoordF};
use serde::{Deserialize, Serialize};

/// 2D axis-aligned bounding box in scaled coordinates.
///
/// An empty box (`defined == false`) absorbs the first point merged into it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
    pub defined: bool,
}

impl BoundingBox {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: &[Point]) -> Self {
        let mut bb = Self::new();
        for p in points {
            bb.merge_point(*p);
        }
        bb
    }

    pub fn merge_point(&mut self, p: Point) {
        if self.defined {
            self.min.x = self.min.x.min(p.x);
            self.min.y = self.min.y.min(p.y);
            self.max.x = self.max.x.max(p.x);
            self.max.y = self.max.y.max(p.y);
        } else {
            self.min = p;
            self.max = p;
            self.defined = true;
        }
    }

    pub fn merge(&mut self, other: &BoundingBox) {
        if other.defined {
            self.merge_point(other.min);
            self.merge_point(other.max);
        }
    }

    #[inline]
    pub fn width_mm(&self) -> CoordF {
        unscale(self.max.x - self.min.x)
    }

    #[inline]
    pub fn height_mm(&self) -> CoordF {
        unscale(self.max.y - self.min.y)
    }

    /// True when `other` lies entirely inside this box.
    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        self.defined
            && other.defined
            && other.min.x >= self.min.x
            && other.min.y >= self.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    /// True when the boxes share at least one point.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.defined
            && other.defined
            && self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}
