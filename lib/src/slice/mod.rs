//! Slicing module - converts meshes into layers.
//!
//! - [`intersect`] - mesh/plane intersection and contour chaining
//! - [`surface`] - roof/floor detection and surface/infill regions
//! - [`Slice`] - per-height state carried through the pipeline

pub mod intersect;
pub mod surface;

pub use intersect::{chain_segments, intersect_mesh, intersect_triangle, layer_boundary, CHAIN_EPSILON};
pub use surface::{classify_surfaces, conservative_overlap, needs_surface, SurfaceRegions};

use crate::gcode::ExtrusionRole;
use crate::geometry::{ExPolygon, ExPolygons, Polygon, Polyline};
use crate::CoordF;
use serde::Serialize;

/// One layer of the model.
///
/// Created with its boundary in the discovery phase, given walls by the
/// contour builder and fill by the classifier; read-only after that.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Slice {
    /// Position in the height-ordered slice sequence.
    pub index: usize,
    /// Slicing plane height (mm).
    pub height: CoordF,
    /// Canonical model cross-section at this height.
    pub boundary: ExPolygons,
    /// Boundary eroded by half the extrusion width.
    pub outer_wall: ExPolygons,
    /// Inward shells, outermost first.
    pub shells: Vec<ExPolygons>,
    /// Innermost wall; the clip boundary for all fill.
    pub inner_wall: ExPolygons,
    /// Extra wall printed only where solid fill is needed.
    pub surface_wall: ExPolygons,
    /// Dense fill lines inside the surface wall, in print order.
    pub surface_infill: Vec<Polyline>,
    /// Sparse fill lines, in print order.
    pub infill: Vec<Polyline>,
    /// Priming loops around the part (bottom layers only).
    pub skirt: Vec<Polygon>,
    /// Inner walls of the layers below, nearest first.
    #[serde(skip)]
    pub floor_adjacences: Vec<ExPolygons>,
    /// Inner walls of the layers above, nearest first.
    #[serde(skip)]
    pub roof_adjacences: Vec<ExPolygons>,
}

impl Slice {
    pub fn new(index: usize, height: CoordF, boundary: ExPolygons) -> Self {
        Self {
            index,
            height,
            boundary,
            ..Default::default()
        }
    }

    /// True when the plane found no material.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.boundary.is_empty()
    }

    /// One feature's paths as polylines. Loops are closed by repeating their
    /// first point.
    pub fn paths(&self, role: ExtrusionRole) -> Vec<Polyline> {
        match role {
            ExtrusionRole::Skirt => self.skirt.iter().map(Polygon::to_closed_polyline).collect(),
            ExtrusionRole::Shell => self.shells.iter().flat_map(|s| rings(s)).collect(),
            ExtrusionRole::OuterWall => rings(&self.outer_wall),
            ExtrusionRole::SurfaceWall => rings(&self.surface_wall),
            ExtrusionRole::SurfaceInfill => self.surface_infill.clone(),
            ExtrusionRole::SparseInfill => self.infill.clone(),
        }
    }

    /// Loops of one wall feature in print order, without the closing point.
    pub fn loops(&self, role: ExtrusionRole) -> Vec<Polygon> {
        let collect = |regions: &[ExPolygon]| -> Vec<Polygon> {
            regions.iter().flat_map(|ex| ex.polygons().cloned()).collect()
        };
        match role {
            ExtrusionRole::Skirt => self.skirt.clone(),
            ExtrusionRole::Shell => self.shells.iter().flat_map(|s| collect(s)).collect(),
            ExtrusionRole::OuterWall => collect(&self.outer_wall),
            ExtrusionRole::SurfaceWall => collect(&self.surface_wall),
            ExtrusionRole::SurfaceInfill | ExtrusionRole::SparseInfill => Vec::new(),
        }
    }
}

fn rings(regions: &[ExPolygon]) -> Vec<Polyline> {
    regions
        .iter()
        .flat_map(|ex| ex.polygons().map(Polygon::to_closed_polyline))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn make_square_mm(x: f64, y: f64, size: f64) -> ExPolygon {
        Polygon::rectangle(Point::new_scale(x, y), Point::new_scale(x + size, y + size)).into()
    }

    #[test]
    fn test_slice_paths_projection() {
        let mut slice = Slice::new(0, 0.1, vec![make_square_mm(0.0, 0.0, 10.0)]);
        slice.outer_wall = vec![make_square_mm(0.2, 0.2, 9.6)];
        slice.shells = vec![vec![make_square_mm(0.6, 0.6, 8.8)]];
        slice.infill = vec![Polyline::segment(Point::new_scale(1.0, 1.0), Point::new_scale(2.0, 2.0))];

        let outer = slice.paths(ExtrusionRole::OuterWall);
        assert_eq!(outer.len(), 1);
        assert!(outer[0].is_closed());
        assert_eq!(slice.paths(ExtrusionRole::Shell).len(), 1);
        assert_eq!(slice.paths(ExtrusionRole::SparseInfill).len(), 1);
        assert!(slice.paths(ExtrusionRole::Skirt).is_empty());
        assert_eq!(slice.loops(ExtrusionRole::OuterWall)[0].len(), 4);
    }

    #[test]
    fn test_slice_serializes_without_adjacences() {
        let mut slice = Slice::new(3, 0.7, vec![make_square_mm(0.0, 0.0, 1.0)]);
        slice.floor_adjacences = vec![vec![make_square_mm(0.0, 0.0, 1.0)]];
        let json = serde_json::to_string(&slice).unwrap();
        assert!(json.contains("\"index\":3"));
        assert!(!json.contains("floor_adjacences"));
    }
}
