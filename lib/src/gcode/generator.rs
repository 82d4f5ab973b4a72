//! G-code program assembly.
//!
//! [`generate_gcode`] runs the [`GCodeWriter`] over every layer in order and
//! wraps the result in the fixed header and footer. Model XY is shifted by the
//! bed centre so a mesh centred on the origin lands in the middle of the bed.

use super::path::{ExtrusionPath, ExtrusionRole, LayerPaths};
use super::writer::GCodeWriter;
use super::{GCODE_FOOTER, GCODE_HEADER};
use crate::config::SlicerSettings;
use crate::{unscale, CoordF, Error, Result};
use log::debug;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Represents generated G-code output.
#[derive(Clone, Default)]
pub struct GCode {
    content: String,

    pub stats: GCodeStats,
}

impl GCode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_string(content: String) -> Self {
        Self {
            content,
            stats: GCodeStats::default(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Append a line to the G-code.
    pub fn append_line(&mut self, line: &str) {
        self.content.push_str(line);
        self.content.push('\n');
    }

    /// Append raw content to the G-code.
    pub fn append(&mut self, content: &str) {
        self.content.push_str(content);
    }

    pub fn append_comment(&mut self, comment: &str) {
        self.content.push_str("; ");
        self.content.push_str(comment);
        self.content.push('\n');
    }

    /// Write the G-code to a file.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path).map_err(Error::Io)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(self.content.as_bytes()).map_err(Error::Io)?;
        writer.flush().map_err(Error::Io)?;
        Ok(())
    }

    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.lines()
    }
}

impl fmt::Debug for GCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GCode({} bytes, {} lines)", self.len(), self.line_count())
    }
}

impl fmt::Display for GCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl From<GCode> for String {
    fn from(gcode: GCode) -> Self {
        gcode.content
    }
}

/// Statistics about generated G-code.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GCodeStats {
    pub layer_count: usize,

    /// Final extruder position (mm of filament).
    pub filament_used_mm: f64,

    /// Total travel distance (mm).
    pub travel_distance_mm: f64,

    /// Total printed distance (mm).
    pub extrusion_distance_mm: f64,

    pub travel_moves: usize,

    pub extrusion_moves: usize,

    pub retraction_count: usize,
}

impl GCodeStats {
    pub fn filament_used_meters(&self) -> f64 {
        self.filament_used_mm / 1000.0
    }
}

impl fmt::Display for GCodeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GCodeStats(layers={}, filament={:.2}m, travel={:.0}mm, retractions={})",
            self.layer_count,
            self.filament_used_meters(),
            self.travel_distance_mm,
            self.retraction_count
        )
    }
}

/// Filament advanced per millimetre of printed path.
fn extrusion_per_mm(settings: &SlicerSettings) -> CoordF {
    settings.extrusion_width() * settings.layer_height / settings.machine.filament_area()
}

/// Emit one path: travel to its start, then print through its points.
fn emit_path(
    writer: &mut GCodeWriter,
    path: &ExtrusionPath,
    offset: (CoordF, CoordF),
    e_per_mm: CoordF,
) {
    let Some(start) = path.first_point() else {
        return;
    };
    let to_bed = |x, y| (unscale(x) + offset.0, unscale(y) + offset.1);

    let (sx, sy) = to_bed(start.x, start.y);
    writer.travel_to(sx, sy);

    let mut prev = start;
    for p in path.print_points() {
        let length = prev.distance(&p) * unscale(1);
        let (x, y) = to_bed(p.x, p.y);
        writer.extrude_to(x, y, length * e_per_mm);
        prev = p;
    }
}

/// Build the full program for an ordered sequence of layers.
///
/// Each feature's paths are printed back to back; the filament is retracted
/// once after every feature.
pub fn generate_gcode(layers: &[LayerPaths], settings: &SlicerSettings) -> Result<GCode> {
    if layers.is_empty() {
        return Err(Error::GCode("no layers to write".into()));
    }

    let offset = settings.bed_center();
    let e_per_mm = extrusion_per_mm(settings);
    let mut writer = GCodeWriter::new(settings.machine);
    writer.write_block(GCODE_HEADER);

    for layer in layers {
        debug!(
            "Layer {}: {} paths, {:.1}mm printed",
            layer.layer_index,
            layer.path_count(),
            layer.extrusion_length_mm()
        );
        writer.start_layer(layer.layer_index, layer.z_height);
        for role in ExtrusionRole::ORDER {
            let mut paths = layer.role_paths(role).peekable();
            if paths.peek().is_none() {
                continue;
            }
            writer.write_comment(&format!("FEATURE: {}", role.feature_name()));
            for path in paths {
                emit_path(&mut writer, path, offset, e_per_mm);
            }
            writer.retract();
        }
    }

    writer.write_block(GCODE_FOOTER);
    let gcode = writer.finish();
    debug!("G-code: {} lines, {}", gcode.line_count(), gcode.stats);
    Ok(gcode)
}
