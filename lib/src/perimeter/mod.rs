//! Perimeter generation module.
//!
//! Walls are derived from a layer's boundary by repeated inward offsets:
//!
//! 1. Offset inward by half the extrusion width to get the outer wall centerline
//! 2. Offset inward by the full extrusion width for each further shell
//! 3. The innermost result is the inner wall, the clip boundary for all fill
//!
//! Every offset result is simplified to drop the near-collinear vertices the
//! offsetter leaves behind. Each layer is independent of its neighbours.

use crate::clipper::{shrink, simplify_expolygons, OffsetJoinType};
use crate::config::SlicerSettings;
use crate::geometry::simplify::WALL_SIMPLIFY_TOLERANCE;
use crate::geometry::ExPolygons;
use crate::slice::Slice;
use crate::CoordF;
use log::debug;

/// Configuration for perimeter generation.
#[derive(Debug, Clone)]
pub struct PerimeterConfig {
    /// Number of walls, outer wall included.
    pub shell_count: usize,

    /// Extrusion width (mm).
    pub extrusion_width: CoordF,

    /// Douglas-Peucker tolerance applied after each offset (mm).
    pub simplify_tolerance: CoordF,
}

impl Default for PerimeterConfig {
    fn default() -> Self {
        Self {
            shell_count: 2,
            extrusion_width: 0.4,
            simplify_tolerance: WALL_SIMPLIFY_TOLERANCE,
        }
    }
}

impl PerimeterConfig {
    pub fn from_settings(settings: &SlicerSettings) -> Self {
        Self {
            shell_count: settings.shells as usize,
            extrusion_width: settings.extrusion_width(),
            simplify_tolerance: WALL_SIMPLIFY_TOLERANCE,
        }
    }

    /// Distance from the boundary to the inner wall centerline (mm).
    pub fn total_inset_distance(&self) -> CoordF {
        self.extrusion_width / 2.0
            + self.shell_count.saturating_sub(1) as CoordF * self.extrusion_width
    }
}

/// Walls of one layer.
#[derive(Debug, Clone, Default)]
pub struct PerimeterResult {
    pub outer_wall: ExPolygons,
    /// Inward shells, outermost first.
    pub shells: Vec<ExPolygons>,
    pub inner_wall: ExPolygons,
}

impl PerimeterResult {
    pub fn has_perimeters(&self) -> bool {
        !self.outer_wall.is_empty()
    }

    /// Loop count across outer wall and shells.
    pub fn loop_count(&self) -> usize {
        let rings = |r: &ExPolygons| r.iter().map(|ex| 1 + ex.holes.len()).sum::<usize>();
        rings(&self.outer_wall) + self.shells.iter().map(rings).sum::<usize>()
    }
}

/// Builds walls from a layer boundary.
#[derive(Debug, Clone, Default)]
pub struct PerimeterGenerator {
    config: PerimeterConfig,
}

impl PerimeterGenerator {
    pub fn new(config: PerimeterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PerimeterConfig {
        &self.config
    }

    /// Generate the outer wall, shells and inner wall for one boundary.
    pub fn generate(&self, boundary: &ExPolygons) -> PerimeterResult {
        let width = self.config.extrusion_width;
        let tolerance = self.config.simplify_tolerance;

        let outer_wall = simplify_expolygons(
            &shrink(boundary, width / 2.0, OffsetJoinType::Miter),
            tolerance,
        );

        let mut shells = Vec::with_capacity(self.config.shell_count.saturating_sub(1));
        let mut last = outer_wall.clone();
        for _ in 1..self.config.shell_count {
            let next = simplify_expolygons(&shrink(&last, width, OffsetJoinType::Miter), tolerance);
            shells.push(next.clone());
            last = next;
        }

        PerimeterResult {
            inner_wall: last,
            outer_wall,
            shells,
        }
    }
}

/// Fill a slice's wall fields from its boundary.
pub fn build_walls(slice: &mut Slice, generator: &PerimeterGenerator) {
    let result = generator.generate(&slice.boundary);
    debug!(
        "Layer {}: {} wall loops, {} shells",
        slice.index,
        result.loop_count(),
        result.shells.len()
    );
    slice.outer_wall = result.outer_wall;
    slice.shells = result.shells;
    slice.inner_wall = result.inner_wall;
}
