//! Infill pattern generation module.
//!
//! Two kinds of fill are produced for every layer:
//!
//! - **Sparse infill**: a fixed line lattice generated once for the whole
//!   model and clipped to each layer's sparse region. The same lattice on
//!   every layer stacks lines directly on top of each other.
//! - **Surface infill**: dense diagonal lines at nozzle spacing clipped to the
//!   surface wall region. The direction alternates between 45° and 135° on
//!   even and odd layers.
//!
//! All line families are anchored at the origin, so two families with the
//! same angle and spacing share their lines regardless of the area covered.

use crate::clipper::clip_polylines;
use crate::config::{InfillPattern, SlicerSettings};
use crate::geometry::{BoundingBox, ExPolygon, Point, Polyline};
use crate::{unscale, CoordF};
use log::debug;

/// Surface fill direction on even layers (degrees).
pub const SURFACE_ANGLE_EVEN: CoordF = 45.0;
/// Surface fill direction on odd layers (degrees).
pub const SURFACE_ANGLE_ODD: CoordF = 135.0;

/// Configuration for infill generation.
#[derive(Debug, Clone)]
pub struct InfillConfig {
    /// Sparse lattice pattern.
    pub pattern: InfillPattern,

    /// Sparse density (0.0 - 1.0).
    pub density: CoordF,

    /// Extrusion width for infill lines (mm).
    pub extrusion_width: CoordF,

    /// Line spacing of the surface fill (mm).
    pub surface_spacing: CoordF,
}

impl Default for InfillConfig {
    fn default() -> Self {
        Self {
            pattern: InfillPattern::Diagonal,
            density: 0.2,
            extrusion_width: 0.4,
            surface_spacing: 0.4,
        }
    }
}

impl InfillConfig {
    pub fn from_settings(settings: &SlicerSettings) -> Self {
        Self {
            pattern: settings.infill_pattern,
            density: (settings.infill_percent / 100.0).clamp(0.0, 1.0),
            extrusion_width: settings.extrusion_width(),
            surface_spacing: settings.nozzle_diameter,
        }
    }

    /// Distance between adjacent sparse lines of one family, `None` at zero
    /// density.
    pub fn sparse_spacing(&self) -> Option<CoordF> {
        if self.density <= 0.0 {
            return None;
        }
        let spacing = match self.pattern {
            InfillPattern::Diagonal => self.extrusion_width * 2.0 / self.density,
            InfillPattern::Rect => self.extrusion_width / self.density,
        };
        Some(spacing)
    }

    /// Line directions of the sparse lattice (degrees).
    pub fn sparse_angles(&self) -> [CoordF; 2] {
        match self.pattern {
            InfillPattern::Diagonal => [45.0, 135.0],
            InfillPattern::Rect => [0.0, 90.0],
        }
    }
}

/// Surface fill direction for a layer.
#[inline]
pub fn surface_angle(layer_index: usize) -> CoordF {
    if layer_index % 2 == 0 {
        SURFACE_ANGLE_EVEN
    } else {
        SURFACE_ANGLE_ODD
    }
}

/// Parallel lines at `angle` degrees, `spacing` mm apart, covering `bbox`.
///
/// Line `k` passes through `k * spacing * n`, where `n` is the unit normal of
/// the line direction.
pub fn line_family(bbox: &BoundingBox, angle: CoordF, spacing: CoordF) -> Vec<Polyline> {
    if !bbox.defined || !(spacing > 0.0) {
        return Vec::new();
    }

    let (sin_a, cos_a) = angle.to_radians().sin_cos();
    let corners = [
        (unscale(bbox.min.x), unscale(bbox.min.y)),
        (unscale(bbox.max.x), unscale(bbox.min.y)),
        (unscale(bbox.max.x), unscale(bbox.max.y)),
        (unscale(bbox.min.x), unscale(bbox.max.y)),
    ];

    // Extent along the normal picks the lines, extent along the direction
    // bounds each line.
    let (mut n_min, mut n_max) = (CoordF::MAX, CoordF::MIN);
    let (mut d_min, mut d_max) = (CoordF::MAX, CoordF::MIN);
    for (x, y) in corners {
        let n = -x * sin_a + y * cos_a;
        let d = x * cos_a + y * sin_a;
        n_min = n_min.min(n);
        n_max = n_max.max(n);
        d_min = d_min.min(d);
        d_max = d_max.max(d);
    }

    let first = (n_min / spacing).floor() as i64;
    let last = (n_max / spacing).ceil() as i64;
    (first..=last)
        .map(|k| {
            let offset = k as CoordF * spacing;
            let (bx, by) = (-sin_a * offset, cos_a * offset);
            Polyline::segment(
                Point::new_scale(bx + cos_a * d_min, by + sin_a * d_min),
                Point::new_scale(bx + cos_a * d_max, by + sin_a * d_max),
            )
        })
        .collect()
}

/// Clip lines to `region`, skipping lines whose bounds miss it.
fn clip_lines(lines: &[Polyline], region: &[ExPolygon]) -> Vec<Polyline> {
    if region.is_empty() {
        return Vec::new();
    }
    let mut bbox = BoundingBox::new();
    for ex in region {
        bbox.merge(&ex.bounding_box());
    }
    let candidates: Vec<Polyline> = lines
        .iter()
        .filter(|l| l.bounding_box().overlaps(&bbox))
        .cloned()
        .collect();
    clip_polylines(&candidates, region)
        .into_iter()
        .filter(|l| l.is_valid() && l.length() > 0.0)
        .collect()
}

/// Infill generator.
///
/// Holds the sparse lattice, built once over a fixed extent, and cuts both
/// fill kinds out of per-layer regions.
#[derive(Debug, Clone)]
pub struct InfillGenerator {
    config: InfillConfig,
    sparse_lattice: Vec<Polyline>,
}

impl InfillGenerator {
    /// Build the sparse lattice over `extent`.
    pub fn new(config: InfillConfig, extent: &BoundingBox) -> Self {
        let sparse_lattice = match config.sparse_spacing() {
            Some(spacing) => config
                .sparse_angles()
                .iter()
                .flat_map(|&angle| line_family(extent, angle, spacing))
                .collect(),
            None => Vec::new(),
        };
        debug!(
            "Sparse {} lattice: {} lines at {:.0}% density",
            config.pattern,
            sparse_lattice.len(),
            config.density * 100.0
        );
        Self {
            config,
            sparse_lattice,
        }
    }

    /// Lattice over the build volume centred on the origin.
    pub fn for_build_volume(settings: &SlicerSettings) -> Self {
        let (hx, hy) = (settings.build_volume.x / 2.0, settings.build_volume.y / 2.0);
        let extent = BoundingBox::from_points(&[Point::new_scale(-hx, -hy), Point::new_scale(hx, hy)]);
        Self::new(InfillConfig::from_settings(settings), &extent)
    }

    pub fn config(&self) -> &InfillConfig {
        &self.config
    }

    pub fn sparse_lattice(&self) -> &[Polyline] {
        &self.sparse_lattice
    }

    /// Sparse lines inside `region`.
    pub fn fill_sparse(&self, region: &[ExPolygon]) -> Vec<Polyline> {
        clip_lines(&self.sparse_lattice, region)
    }

    /// Dense lines inside `region` in this layer's surface direction.
    pub fn fill_surface(&self, region: &[ExPolygon], layer_index: usize) -> Vec<Polyline> {
        surface_pattern(region, layer_index, self.config.surface_spacing)
    }
}

/// Dense surface lines for one layer clipped to `region`.
pub fn surface_pattern(region: &[ExPolygon], layer_index: usize, spacing: CoordF) -> Vec<Polyline> {
    if region.is_empty() {
        return Vec::new();
    }
    let mut bbox = BoundingBox::new();
    for ex in region {
        bbox.merge(&ex.bounding_box());
    }
    clip_lines(&line_family(&bbox, surface_angle(layer_index), spacing), region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;
    use crate::scale;

    fn make_square_mm(x: f64, y: f64, size: f64) -> ExPolygon {
        Polygon::rectangle(Point::new_scale(x, y), Point::new_scale(x + size, y + size)).into()
    }

    fn bbox_mm(x0: f64, y0: f64, x1: f64, y1: f64) -> BoundingBox {
        BoundingBox::from_points(&[Point::new_scale(x0, y0), Point::new_scale(x1, y1)])
    }

    fn settings(percent: f64, pattern: InfillPattern) -> SlicerSettings {
        SlicerSettings::new().infill_percent(percent).infill_pattern(pattern)
    }

    #[test]
    fn test_sparse_spacing() {
        let diag = InfillConfig::from_settings(&settings(20.0, InfillPattern::Diagonal));
        assert!((diag.sparse_spacing().unwrap() - 4.0).abs() < 1e-9);
        let rect = InfillConfig::from_settings(&settings(20.0, InfillPattern::Rect));
        assert!((rect.sparse_spacing().unwrap() - 2.0).abs() < 1e-9);
        let none = InfillConfig::from_settings(&settings(0.0, InfillPattern::Diagonal));
        assert!(none.sparse_spacing().is_none());
    }

    #[test]
    fn test_line_family_horizontal() {
        let lines = line_family(&bbox_mm(0.0, 0.0, 10.0, 10.0), 0.0, 1.0);
        assert_eq!(lines.len(), 11);
        for (k, line) in lines.iter().enumerate() {
            assert_eq!(line.first_point().y, scale(k as f64));
            assert_eq!(line.last_point().y, scale(k as f64));
        }
    }

    #[test]
    fn test_line_family_anchored_at_origin() {
        let a = line_family(&bbox_mm(0.3, 0.0, 5.0, 5.0), 0.0, 2.0);
        let b = line_family(&bbox_mm(-7.1, 1.1, 9.0, 3.9), 0.0, 2.0);
        let ys = |ls: &[Polyline]| -> Vec<i64> { ls.iter().map(|l| l.first_point().y).collect() };
        assert_eq!(ys(&a), vec![0, scale(2.0), scale(4.0), scale(6.0)]);
        assert_eq!(ys(&b), vec![0, scale(2.0), scale(4.0)]);
    }

    #[test]
    fn test_line_family_covers_box_diagonally() {
        let bbox = bbox_mm(0.0, 0.0, 10.0, 10.0);
        let lines = line_family(&bbox, 45.0, 1.0);
        // Normal extent is 10 * sqrt(2) wide
        assert!(lines.len() >= 15);
        let clipped = clip_lines(&lines, &[make_square_mm(0.0, 0.0, 10.0)]);
        assert!(!clipped.is_empty());
    }

    #[test]
    fn test_fill_sparse_stays_inside() {
        let generator = InfillGenerator::for_build_volume(&settings(20.0, InfillPattern::Diagonal));
        let region = vec![make_square_mm(-10.0, -10.0, 20.0)];
        let lines = generator.fill_sparse(&region);
        assert!(!lines.is_empty());
        let tolerance = scale(0.001);
        for line in &lines {
            for p in line.points() {
                assert!(p.x >= scale(-10.0) - tolerance && p.x <= scale(10.0) + tolerance);
                assert!(p.y >= scale(-10.0) - tolerance && p.y <= scale(10.0) + tolerance);
            }
        }
    }

    #[test]
    fn test_fill_sparse_same_lines_every_layer() {
        let generator = InfillGenerator::for_build_volume(&settings(20.0, InfillPattern::Rect));
        let region = vec![make_square_mm(-5.0, -5.0, 10.0)];
        assert_eq!(generator.fill_sparse(&region), generator.fill_sparse(&region));
    }

    #[test]
    fn test_zero_density_no_sparse() {
        let generator = InfillGenerator::for_build_volume(&settings(0.0, InfillPattern::Diagonal));
        assert!(generator.sparse_lattice().is_empty());
        assert!(generator.fill_sparse(&[make_square_mm(0.0, 0.0, 10.0)]).is_empty());
    }

    #[test]
    fn test_surface_pattern_alternates() {
        let region = vec![make_square_mm(0.0, 0.0, 10.0)];
        let even = surface_pattern(&region, 0, 0.4);
        let odd = surface_pattern(&region, 1, 0.4);
        assert!(!even.is_empty() && !odd.is_empty());

        let slope = |l: &Polyline| {
            let (a, b) = (l.first_point(), l.last_point());
            ((b.y - a.y) as f64).signum() * ((b.x - a.x) as f64).signum()
        };
        assert!(even.iter().all(|l| slope(l) > 0.0));
        assert!(odd.iter().all(|l| slope(l) < 0.0));
    }

    #[test]
    fn test_surface_pattern_dense() {
        let region = vec![make_square_mm(0.0, 0.0, 10.0)];
        let lines = surface_pattern(&region, 0, 0.4);
        let total: f64 = lines.iter().map(Polyline::length_mm).sum();
        // Roughly area / spacing
        assert!((total - 100.0 / 0.4).abs() < 15.0, "total {}", total);
    }

    #[test]
    fn test_surface_pattern_empty_region() {
        assert!(surface_pattern(&[], 0, 0.4).is_empty());
    }
}
