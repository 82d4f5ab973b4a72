//! Skirt generation.
//!
//! The skirt primes the nozzle before the part starts. Its loops are outward
//! offsets of the first layer's outer wall and are repeated unchanged on the
//! first `line_count` layers.

use crate::clipper::{grow, union_ex, OffsetJoinType};
use crate::config::{SkirtSettings, SlicerSettings};
use crate::geometry::{ExPolygon, Polygon};
use crate::slice::Slice;
use crate::CoordF;
use log::debug;

/// Skirt parameters resolved against the nozzle.
#[derive(Debug, Clone)]
pub struct SkirtConfig {
    pub enabled: bool,
    /// Number of concentric loops.
    pub loops: u32,
    /// Number of bottom layers that print the loops.
    pub height: u32,
    /// Gap between the outer wall and the innermost loop (mm).
    pub distance: CoordF,
    /// Spacing between loops (mm).
    pub line_spacing: CoordF,
}

impl Default for SkirtConfig {
    fn default() -> Self {
        Self::from_settings(&SlicerSettings::default())
    }
}

impl SkirtConfig {
    pub fn from_settings(settings: &SlicerSettings) -> Self {
        let SkirtSettings {
            enabled,
            loop_count,
            line_count,
            distance,
        } = settings.skirt;
        Self {
            enabled,
            loops: loop_count,
            height: line_count,
            distance,
            line_spacing: settings.nozzle_diameter,
        }
    }
}

/// Generated skirt loops, innermost first.
#[derive(Debug, Clone, Default)]
pub struct SkirtResult {
    pub loops: Vec<Polygon>,
    /// Total loop length (mm).
    pub total_length: CoordF,
}

impl SkirtResult {
    pub fn new(loops: Vec<Polygon>) -> Self {
        let total_length = loops.iter().map(Polygon::length_mm).sum();
        Self {
            loops,
            total_length,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SkirtGenerator {
    config: SkirtConfig,
}

impl SkirtGenerator {
    pub fn new(config: SkirtConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SkirtConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled && self.config.loops > 0 && self.config.height > 0
    }

    /// Loops around the first layer's outer wall.
    ///
    /// Loop `k` is the outer wall grown by `distance + k * line_spacing`.
    /// Only outer contours are kept.
    pub fn generate(&self, first_outer_wall: &[ExPolygon]) -> SkirtResult {
        if !self.is_enabled() || first_outer_wall.is_empty() {
            return SkirtResult::default();
        }

        let unified = union_ex(first_outer_wall);
        let loops = (0..self.config.loops)
            .flat_map(|k| {
                let offset = self.config.distance + k as CoordF * self.config.line_spacing;
                grow(&unified, offset, OffsetJoinType::Round)
                    .into_iter()
                    .map(|ex| ex.contour)
            })
            .collect();

        SkirtResult::new(loops)
    }

    /// Attach the skirt to the bottom layers of an ordered slice sequence.
    pub fn apply(&self, slices: &mut [Slice]) {
        let Some(first) = slices.first() else {
            return;
        };
        let skirt = self.generate(&first.outer_wall);
        if skirt.is_empty() {
            return;
        }
        debug!(
            "Skirt: {} loops, {:.1}mm, on {} layers",
            skirt.loops.len(),
            skirt.total_length,
            self.config.height
        );
        for slice in slices.iter_mut().take(self.config.height as usize) {
            slice.skirt = skirt.loops.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn make_square_mm(x: f64, y: f64, size: f64) -> ExPolygon {
        Polygon::rectangle(Point::new_scale(x, y), Point::new_scale(x + size, y + size)).into()
    }

    fn config(loops: u32, height: u32) -> SkirtConfig {
        SkirtConfig {
            enabled: true,
            loops,
            height,
            distance: 3.0,
            line_spacing: 0.4,
        }
    }

    #[test]
    fn test_skirt_disabled() {
        let generator = SkirtGenerator::new(SkirtConfig {
            enabled: false,
            ..config(2, 1)
        });
        assert!(generator.generate(&[make_square_mm(0.0, 0.0, 10.0)]).is_empty());
    }

    #[test]
    fn test_skirt_loops_grow_outward() {
        let generator = SkirtGenerator::new(config(3, 1));
        let skirt = generator.generate(&[make_square_mm(0.0, 0.0, 10.0)]);
        assert_eq!(skirt.loops.len(), 3);

        let widths: Vec<f64> = skirt.loops.iter().map(|l| l.bounding_box().width_mm()).collect();
        // 10 + 2 * (3.0 + k * 0.4)
        for (k, w) in widths.iter().enumerate() {
            let expected = 10.0 + 2.0 * (3.0 + k as f64 * 0.4);
            assert!((w - expected).abs() < 0.01, "loop {} width {}", k, w);
        }
        assert!(skirt.total_length > 3.0 * 40.0);
    }

    #[test]
    fn test_skirt_merges_nearby_parts() {
        let generator = SkirtGenerator::new(config(1, 1));
        let skirt = generator.generate(&[make_square_mm(0.0, 0.0, 5.0), make_square_mm(7.0, 0.0, 5.0)]);
        // 2mm gap closes with a 3mm offset
        assert_eq!(skirt.loops.len(), 1);
    }

    #[test]
    fn test_skirt_applied_to_bottom_layers() {
        let generator = SkirtGenerator::new(config(1, 2));
        let mut slices: Vec<Slice> = (0..4)
            .map(|i| {
                let mut s = Slice::new(i, 0.1 + i as f64 * 0.2, vec![make_square_mm(0.0, 0.0, 10.0)]);
                s.outer_wall = vec![make_square_mm(0.2, 0.2, 9.6)];
                s
            })
            .collect();
        generator.apply(&mut slices);
        assert_eq!(slices[0].skirt.len(), 1);
        assert_eq!(slices[1].skirt, slices[0].skirt);
        assert!(slices[2].skirt.is_empty());
        assert!(slices[3].skirt.is_empty());
    }
}
