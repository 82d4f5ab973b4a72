//! Pipeline module - orchestrates the complete slicing process.
//!
//! vertices → boundaries → walls → surfaces/infill → ordered paths → G-code
//!
//! # Phases
//!
//! Each phase is data-parallel over layers and finishes completely before the
//! next one starts:
//!
//! 1. **Discovery**: plane heights are walked upward from half a layer height
//!    in fixed-size batches. Each batch is intersected in parallel, then the
//!    results are scanned in order and discovery stops at the first empty
//!    boundary. Heights are derived from the plane index, never accumulated.
//! 2. **Contours**: walls and shells per layer, then the skirt from layer 0.
//! 3. **Surfaces**: each layer reads a snapshot of its neighbours' inner walls,
//!    classifies its roof/floor area, generates fill and orders the fill paths.
//!
//! # Example
//!
//! ```rust,no_run
//! use layer_slicer::{Mesh, SlicePipeline, SlicerSettings};
//!
//! let mesh = Mesh::pyramid(20.0, 15.0);
//! let pipeline = SlicePipeline::new(SlicerSettings::default())?;
//! let slices = pipeline.process_with_callback(mesh.vertices(), |stage, progress| {
//!     println!("{stage}: {:.0}%", progress * 100.0);
//! })?;
//! let gcode = pipeline.generate_gcode(&slices)?;
//! gcode.write_to_file("pyramid.gcode")?;
//! # Ok::<(), layer_slicer::Error>(())
//! ```

use crate::adhesion::{SkirtConfig, SkirtGenerator};
use crate::config::SlicerSettings;
use crate::gcode::{generate_gcode, GCode, GCodeStats, LayerPaths};
use crate::geometry::{BoundingBox, ExPolygons, Point, Vertex};
use crate::infill::{InfillConfig, InfillGenerator};
use crate::mesh::validate_vertices;
use crate::perimeter::{build_walls, PerimeterConfig, PerimeterGenerator};
use crate::slice::{classify_surfaces, layer_boundary, Slice};
use crate::travel::sequence_paths;
use crate::{CoordF, Result};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::path::Path;

/// Runs the three slicing phases for one settings snapshot.
#[derive(Debug, Clone)]
pub struct SlicePipeline {
    settings: SlicerSettings,
}

impl SlicePipeline {
    /// Create a pipeline, rejecting invalid settings.
    pub fn new(settings: SlicerSettings) -> Result<Self> {
        settings.checked()?;
        if settings.shells == 0 {
            warn!("Shell count 0 still prints the outer wall");
        }
        if settings.skirt.enabled && settings.skirt.loop_count == 0 {
            warn!("Skirt enabled with 0 loops; no skirt will be printed");
        }
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &SlicerSettings {
        &self.settings
    }

    /// Slice a triangle soup into finished layers.
    pub fn process(&self, vertices: &[Vertex]) -> Result<Vec<Slice>> {
        self.process_with_callback(vertices, |_, _| {})
    }

    /// Slice with a progress callback.
    ///
    /// The callback receives (stage_name, progress_0_to_1).
    pub fn process_with_callback<F>(&self, vertices: &[Vertex], mut callback: F) -> Result<Vec<Slice>>
    where
        F: FnMut(&str, f64),
    {
        validate_vertices(vertices)?;

        callback("slicing", 0.0);
        let mut slices = discover_slices(vertices, &self.settings, |p| callback("slicing", p))?;
        callback("slicing", 1.0);
        info!("Discovered {} layers", slices.len());

        if slices.is_empty() {
            return Ok(slices);
        }

        callback("walls", 0.0);
        build_contours(&mut slices, &self.settings);
        callback("walls", 1.0);

        callback("surfaces", 0.0);
        classify_layers(&mut slices, &self.settings);
        callback("surfaces", 1.0);

        info!(
            "Sliced {} layers, {:.2}mm to {:.2}mm",
            slices.len(),
            slices[0].height,
            slices[slices.len() - 1].height
        );
        Ok(slices)
    }

    /// Emit G-code for finished layers.
    pub fn generate_gcode(&self, slices: &[Slice]) -> Result<GCode> {
        generate_gcode(&layer_paths(slices, &self.settings), &self.settings)
    }
}

/// Phase 1: find every non-empty layer.
///
/// `progress` receives the fraction of the mesh height covered so far.
pub fn discover_slices<F>(vertices: &[Vertex], settings: &SlicerSettings, mut progress: F) -> Result<Vec<Slice>>
where
    F: FnMut(f64),
{
    let top = vertices.iter().map(|v| v.z).fold(CoordF::MIN, CoordF::max);
    let batch = (rayon::current_num_threads() * 4).max(1);
    let mut slices: Vec<Slice> = Vec::new();
    let mut start = 0usize;

    'discover: loop {
        let found: Vec<(usize, CoordF, ExPolygons)> = (start..start + batch)
            .into_par_iter()
            .map(|index| {
                let height = settings.plane_height(index);
                layer_boundary(vertices, height).map(|boundary| (index, height, boundary))
            })
            .collect::<Result<_>>()?;

        for (index, height, boundary) in found {
            if boundary.is_empty() {
                break 'discover;
            }
            slices.push(Slice::new(index, height, boundary));
        }

        start += batch;
        if top > 0.0 {
            progress((settings.plane_height(start) / top).min(1.0));
        }
    }

    slices.sort_by(|a, b| a.height.total_cmp(&b.height));
    slices.dedup_by(|a, b| a.height == b.height);
    for (i, slice) in slices.iter_mut().enumerate() {
        slice.index = i;
    }
    Ok(slices)
}

/// Phase 2: walls for every layer, then the skirt.
pub fn build_contours(slices: &mut [Slice], settings: &SlicerSettings) {
    let generator = PerimeterGenerator::new(PerimeterConfig::from_settings(settings));
    slices.par_iter_mut().for_each(|slice| build_walls(slice, &generator));
    SkirtGenerator::new(SkirtConfig::from_settings(settings)).apply(slices);
    debug!("Walls built for {} layers", slices.len());
}

/// Extent of the sparse lattice: the build volume around the origin, grown to
/// cover any part of the model outside it.
fn infill_extent(slices: &[Slice], settings: &SlicerSettings) -> BoundingBox {
    let (hx, hy) = (settings.build_volume.x / 2.0, settings.build_volume.y / 2.0);
    let mut extent = BoundingBox::from_points(&[Point::new_scale(-hx, -hy), Point::new_scale(hx, hy)]);
    for ex in slices.iter().flat_map(|s| s.boundary.iter()) {
        extent.merge(&ex.bounding_box());
    }
    extent
}

/// Phase 3: surfaces, fill and path order for every layer.
///
/// Neighbour windows are copied from a snapshot of the inner walls taken
/// before any layer is modified.
pub fn classify_layers(slices: &mut [Slice], settings: &SlicerSettings) {
    let inner_walls: Vec<ExPolygons> = slices.iter().map(|s| s.inner_wall.clone()).collect();
    let infill = InfillGenerator::new(InfillConfig::from_settings(settings), &infill_extent(slices, settings));
    let floors = settings.floors as usize;
    let roofs = settings.roofs as usize;
    let count = slices.len();

    slices.par_iter_mut().enumerate().for_each(|(i, slice)| {
        slice.floor_adjacences = (1..=floors)
            .filter_map(|k| i.checked_sub(k))
            .map(|j| inner_walls[j].clone())
            .collect();
        slice.roof_adjacences = (1..=roofs)
            .map(|k| i + k)
            .take_while(|&j| j < count)
            .map(|j| inner_walls[j].clone())
            .collect();

        let regions = classify_surfaces(
            &slice.inner_wall,
            &slice.floor_adjacences,
            &slice.roof_adjacences,
            settings,
        );
        slice.surface_infill = sequence_paths(infill.fill_surface(&regions.surface_wall, i));
        slice.infill = sequence_paths(infill.fill_sparse(&regions.sparse));
        slice.surface_wall = regions.surface_wall;

        debug!(
            "Layer {}: {} surface lines, {} sparse lines",
            i,
            slice.surface_infill.len(),
            slice.infill.len()
        );
    });
}

/// Flatten finished slices into per-layer print plans.
pub fn layer_paths(slices: &[Slice], settings: &SlicerSettings) -> Vec<LayerPaths> {
    slices.iter().map(|s| LayerPaths::from_slice(s, settings)).collect()
}

/// Slice a triangle soup with `settings`.
///
/// Vertices must already be placed on the bed: planes start at half a layer
/// height above Z=0.
pub fn slice_model(vertices: &[Vertex], settings: &SlicerSettings) -> Result<Vec<Slice>> {
    SlicePipeline::new(settings.clone())?.process(vertices)
}

/// Write finished slices as G-code to `path`.
pub fn write_gcode<P: AsRef<Path>>(path: P, slices: &[Slice], settings: &SlicerSettings) -> Result<GCodeStats> {
    let gcode = SlicePipeline::new(settings.clone())?.generate_gcode(slices)?;
    gcode.write_to_file(path.as_ref())?;
    info!("Wrote {} to {}", gcode.stats, path.as_ref().display());
    Ok(gcode.stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipper::total_area_mm2;
    use crate::geometry::Point3F;
    use crate::mesh::Mesh;
    use crate::Error;

    fn settings() -> SlicerSettings {
        SlicerSettings::new().without_skirt()
    }

    #[test]
    fn test_empty_mesh_no_slices() {
        let slices = slice_model(&[], &settings()).unwrap();
        assert!(slices.is_empty());
    }

    #[test]
    fn test_invalid_mesh_rejected() {
        let verts = vec![Point3F::default(); 4];
        assert!(matches!(slice_model(&verts, &settings()), Err(Error::InvalidMesh(4))));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let bad = settings().layer_height(0.0);
        let cube = Mesh::cube(10.0).placed_on_bed();
        assert!(matches!(slice_model(cube.vertices(), &bad), Err(Error::Config(_))));
    }

    #[test]
    fn test_cube_layer_count_and_order() {
        let cube = Mesh::cube(10.0).placed_on_bed();
        let slices = slice_model(cube.vertices(), &settings()).unwrap();
        assert_eq!(slices.len(), 50);
        for (i, s) in slices.iter().enumerate() {
            assert_eq!(s.index, i);
            assert!((s.height - settings().plane_height(i)).abs() < 1e-12);
        }
        assert!(slices.windows(2).all(|w| w[0].height < w[1].height));
    }

    #[test]
    fn test_unit_cube_layer_count() {
        let cube = Mesh::cube(1.0).placed_on_bed();
        let slices = slice_model(cube.vertices(), &settings().roofs(0).floors(0)).unwrap();
        assert_eq!(slices.len(), 5);
        for s in &slices {
            assert_eq!(s.outer_wall.len(), 1);
            assert!((total_area_mm2(&s.outer_wall) - 0.36).abs() < 1e-3);
            // One shell step; at 1 mm its geometry collapses
            assert_eq!(s.shells.len(), 1);
            assert!(s.shells[0].is_empty());
        }
    }

    #[test]
    fn test_no_roofs_or_floors_all_sparse() {
        let cube = Mesh::cube(10.0).placed_on_bed();
        let slices = slice_model(cube.vertices(), &settings().roofs(0).floors(0)).unwrap();
        for s in &slices {
            assert_eq!(s.shells.len(), 1);
            assert!(s.surface_wall.is_empty());
            assert!(s.surface_infill.is_empty());
            assert!(!s.infill.is_empty());
        }
    }

    #[test]
    fn test_cube_top_and_bottom_are_surface() {
        let cube = Mesh::cube(10.0).placed_on_bed();
        let s = settings().roofs(3).floors(3);
        let slices = slice_model(cube.vertices(), &s).unwrap();

        // Bottom and top three layers carry a surface wall, the middle is sparse
        for i in [0, 1, 2, 47, 48, 49] {
            assert!(!slices[i].surface_wall.is_empty(), "layer {}", i);
            assert!(!slices[i].surface_infill.is_empty(), "layer {}", i);
            assert!(slices[i].infill.is_empty(), "layer {}", i);
        }
        for slice in &slices[3..47] {
            assert!(slice.surface_wall.is_empty());
            assert!(!slice.infill.is_empty());
        }
    }

    #[test]
    fn test_adjacence_windows() {
        let cube = Mesh::cube(10.0).placed_on_bed();
        let s = settings().roofs(2).floors(3);
        let slices = slice_model(cube.vertices(), &s).unwrap();
        assert!(slices[0].floor_adjacences.is_empty());
        assert_eq!(slices[1].floor_adjacences.len(), 1);
        assert_eq!(slices[10].floor_adjacences.len(), 3);
        assert_eq!(slices[10].roof_adjacences.len(), 2);
        assert_eq!(slices[49].roof_adjacences.len(), 0);
        assert_eq!(slices[10].floor_adjacences[0], slices[9].inner_wall);
    }

    #[test]
    fn test_pyramid_shrinks() {
        let pyramid = Mesh::pyramid(20.0, 10.0);
        let slices = slice_model(pyramid.vertices(), &settings()).unwrap();
        assert_eq!(slices.len(), 50);
        let areas: Vec<f64> = slices.iter().map(|s| total_area_mm2(&s.boundary)).collect();
        assert!(areas.windows(2).all(|w| w[1] < w[0]));

        // Outer wall shrinks until it vanishes at the apex
        let walls: Vec<f64> = slices.iter().map(|s| total_area_mm2(&s.outer_wall)).collect();
        assert!(walls.windows(2).all(|w| w[1] <= w[0]));
        assert!(walls[0] > walls[walls.len() / 2]);
        assert!(walls[walls.len() - 1].abs() < 1e-3);
    }

    #[test]
    fn test_skirt_only_on_first_layer() {
        let cube = Mesh::cube(10.0).placed_on_bed();
        let slices = slice_model(cube.vertices(), &SlicerSettings::default()).unwrap();
        assert_eq!(slices[0].skirt.len(), 1);
        assert!(slices[1].skirt.is_empty());
    }

    #[test]
    fn test_progress_reports_stages() {
        let cube = Mesh::cube(10.0).placed_on_bed();
        let pipeline = SlicePipeline::new(settings()).unwrap();
        let mut stages = Vec::new();
        pipeline
            .process_with_callback(cube.vertices(), |stage, p| {
                if p >= 1.0 {
                    stages.push(stage.to_string());
                }
            })
            .unwrap();
        stages.dedup();
        assert_eq!(stages, vec!["slicing", "walls", "surfaces"]);
    }
}
