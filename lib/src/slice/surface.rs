//! Roof/floor detection for one layer.
//!
//! A layer needs solid fill wherever it is not backed by material on every
//! layer of its neighbour window. Each side (floors below, roofs above) is
//! handled the same way:
//!
//! - **Overlap**: intersection of every inner wall in the window. An empty
//!   window, or one cut short by the bottom or top of the model, has no overlap.
//! - **Needs surface**: the layer's inner wall minus the overlap, with slivers
//!   below [`SURFACE_MIN_AREA`] dropped.
//!
//! The two sides are unioned into the surface mask. Everything inside the
//! inner wall but outside the mask is left for sparse infill.

use crate::clipper::{difference, intersection, remove_small, shrink, union, OffsetJoinType};
use crate::config::SlicerSettings;
use crate::geometry::{ExPolygon, ExPolygons};
use crate::CoordF;

/// Regions below this area (mm²) are treated as boolean noise.
pub const SURFACE_MIN_AREA: CoordF = 0.25;

/// Classified regions of one layer.
#[derive(Debug, Clone, Default)]
pub struct SurfaceRegions {
    /// Part of the inner wall not covered by the floor window.
    pub floor: ExPolygons,
    /// Part of the inner wall not covered by the roof window.
    pub roof: ExPolygons,
    /// Union of floor and roof.
    pub mask: ExPolygons,
    /// Extra wall loop inside the inner wall, restricted to the mask. Its
    /// interior receives the dense fill.
    pub surface_wall: ExPolygons,
    /// Inner wall minus the mask.
    pub sparse: ExPolygons,
}

impl SurfaceRegions {
    pub fn has_surface(&self) -> bool {
        !self.mask.is_empty()
    }
}

/// Area shared by every member of a neighbour window.
///
/// Returns an empty set for an empty window.
pub fn conservative_overlap(window: &[ExPolygons]) -> ExPolygons {
    let Some((first, rest)) = window.split_first() else {
        return Vec::new();
    };
    let mut overlap = first.clone();
    for layer in rest {
        if overlap.is_empty() {
            break;
        }
        overlap = intersection(&overlap, layer);
    }
    overlap
}

/// Part of `inner_wall` that one side's window leaves unbacked.
///
/// `count` is the configured window size. Zero disables the side. A window
/// holding fewer than `count` layers ran off the model, so nothing backs the
/// layer on that side.
pub fn needs_surface(inner_wall: &[ExPolygon], window: &[ExPolygons], count: usize) -> ExPolygons {
    if count == 0 || inner_wall.is_empty() {
        return Vec::new();
    }
    let overlap = if window.len() < count {
        Vec::new()
    } else {
        conservative_overlap(&window[..count])
    };
    if overlap.is_empty() {
        return remove_small(inner_wall, SURFACE_MIN_AREA);
    }
    remove_small(&difference(inner_wall, &overlap), SURFACE_MIN_AREA)
}

/// Split a layer's inner wall into surface and sparse regions.
///
/// `floor_window` and `roof_window` hold the inner walls of the neighbouring
/// layers, nearest first.
pub fn classify_surfaces(
    inner_wall: &[ExPolygon],
    floor_window: &[ExPolygons],
    roof_window: &[ExPolygons],
    settings: &SlicerSettings,
) -> SurfaceRegions {
    let floor = needs_surface(inner_wall, floor_window, settings.floors as usize);
    let roof = needs_surface(inner_wall, roof_window, settings.roofs as usize);

    let mask = match (floor.is_empty(), roof.is_empty()) {
        (true, true) => Vec::new(),
        (false, true) => floor.clone(),
        (true, false) => roof.clone(),
        (false, false) => union(&floor, &roof),
    };

    if mask.is_empty() {
        return SurfaceRegions {
            floor,
            roof,
            sparse: inner_wall.to_vec(),
            ..Default::default()
        };
    }

    let inset = shrink(inner_wall, settings.extrusion_width(), OffsetJoinType::Miter);
    let surface_wall = intersection(&inset, &mask);
    let sparse = remove_small(&difference(inner_wall, &mask), SURFACE_MIN_AREA);

    SurfaceRegions {
        floor,
        roof,
        mask,
        surface_wall,
        sparse,
    }
}
