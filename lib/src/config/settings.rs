//! Slicer settings.
//!
//! One immutable snapshot per slicing run. Field names serialise in
//! camelCase so settings files use the familiar option names
//! (`layerHeight`, `infillPercent`, `buildVolume`, ...). Any field missing
//! from a file takes its default.

use crate::{CoordF, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Sparse infill pattern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfillPattern {
    /// Both 45° diagonal families, spacing `2w / density`.
    #[default]
    Diagonal,
    /// Axis-aligned vertical and horizontal lines, spacing `w / density`.
    Rect,
}

impl InfillPattern {
    pub fn name(&self) -> &'static str {
        match self {
            InfillPattern::Diagonal => "diagonal",
            InfillPattern::Rect => "rect",
        }
    }
}

impl fmt::Display for InfillPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InfillPattern {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "diagonal" => Ok(InfillPattern::Diagonal),
            "rect" | "rectilinear" => Ok(InfillPattern::Rect),
            other => Err(format!("unknown infill pattern '{}'", other)),
        }
    }
}

/// Printable volume in millimetres. The bed centre is `(x/2, y/2)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildVolume {
    pub x: CoordF,
    pub y: CoordF,
    pub z: CoordF,
}

impl Default for BuildVolume {
    fn default() -> Self {
        Self {
            x: 220.0,
            y: 220.0,
            z: 250.0,
        }
    }
}

/// Skirt loops printed around the first layer(s).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SkirtSettings {
    pub enabled: bool,
    /// Number of concentric loops.
    pub loop_count: u32,
    /// Number of bottom layers that print the loops.
    pub line_count: u32,
    /// Gap between the part and the innermost loop (mm).
    pub distance: CoordF,
}

impl Default for SkirtSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            loop_count: 1,
            line_count: 1,
            distance: 6.0,
        }
    }
}

/// Machine-side parameters used by the G-code emitter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MachineSettings {
    /// Filament diameter (mm).
    pub filament_diameter: CoordF,
    /// Travel feed rate (mm/min).
    pub travel_feed: CoordF,
    /// Print feed rate (mm/min).
    pub print_feed: CoordF,
    /// Filament pulled back after each feature (mm).
    pub retract_length: CoordF,
    /// Retraction feed rate (mm/min).
    pub retract_feed: CoordF,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            filament_diameter: 1.75,
            travel_feed: 2400.0,
            print_feed: 1200.0,
            retract_length: 5.0,
            retract_feed: 2700.0,
        }
    }
}

impl MachineSettings {
    /// Filament cross-section in mm². 2.40528 for 1.75 mm filament.
    #[inline]
    pub fn filament_area(&self) -> CoordF {
        let r = self.filament_diameter / 2.0;
        std::f64::consts::PI * r * r
    }
}

/// Settings for one slicing run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SlicerSettings {
    /// Layer height (mm).
    pub layer_height: CoordF,
    /// Nozzle diameter (mm); also the extrusion width.
    pub nozzle_diameter: CoordF,
    /// Wall count, outer wall included.
    pub shells: u32,
    /// Sparse infill density, 0-100.
    pub infill_percent: CoordF,
    /// Solid layers under a top surface.
    pub roofs: u32,
    /// Solid layers over a bottom surface.
    pub floors: u32,
    pub build_volume: BuildVolume,
    pub skirt: SkirtSettings,
    pub infill_pattern: InfillPattern,
    pub machine: MachineSettings,
}

impl Default for SlicerSettings {
    fn default() -> Self {
        Self {
            layer_height: 0.2,
            nozzle_diameter: 0.4,
            shells: 2,
            infill_percent: 20.0,
            roofs: 3,
            floors: 3,
            build_volume: BuildVolume::default(),
            skirt: SkirtSettings::default(),
            infill_pattern: InfillPattern::default(),
            machine: MachineSettings::default(),
        }
    }
}

impl SlicerSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a JSON file. Missing fields take defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&text)?;
        Ok(settings)
    }

    /// Check the settings invariants, returning a crate error on failure.
    pub fn checked(&self) -> Result<()> {
        self.validate().map_err(Error::Config)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(self.layer_height > 0.0) {
            return Err("Layer height must be positive".into());
        }
        if !(self.nozzle_diameter > 0.0) {
            return Err("Nozzle diameter must be positive".into());
        }
        if !(0.0..=100.0).contains(&self.infill_percent) {
            return Err("Infill percent must be within 0-100".into());
        }
        let bv = &self.build_volume;
        if !(bv.x > 0.0 && bv.y > 0.0 && bv.z > 0.0) {
            return Err("Build volume extents must be positive".into());
        }
        if self.skirt.enabled && !(self.skirt.distance > 0.0) {
            return Err("Skirt distance must be positive".into());
        }
        let m = &self.machine;
        if !(m.filament_diameter > 0.0) {
            return Err("Filament diameter must be positive".into());
        }
        if !(m.travel_feed > 0.0 && m.print_feed > 0.0 && m.retract_feed > 0.0) {
            return Err("Feed rates must be positive".into());
        }
        if m.retract_length < 0.0 {
            return Err("Retraction length must not be negative".into());
        }
        Ok(())
    }

    /// Extrusion width; the nozzle diameter.
    #[inline]
    pub fn extrusion_width(&self) -> CoordF {
        self.nozzle_diameter
    }

    /// Bed centre (mm); model XY is shifted by this when emitting.
    #[inline]
    pub fn bed_center(&self) -> (CoordF, CoordF) {
        (self.build_volume.x / 2.0, self.build_volume.y / 2.0)
    }

    /// Centre of slicing plane `index`, perturbed off exact vertex heights.
    #[inline]
    pub fn plane_height(&self, index: usize) -> CoordF {
        self.layer_height / 2.0 + index as CoordF * self.layer_height + PLANE_EPSILON
    }
}

/// Offset added to every slicing plane so no vertex lies exactly on one.
pub const PLANE_EPSILON: CoordF = 1e-9;

impl SlicerSettings {
    pub fn layer_height(mut self, height: CoordF) -> Self {
        self.layer_height = height;
        self
    }

    pub fn nozzle_diameter(mut self, diameter: CoordF) -> Self {
        self.nozzle_diameter = diameter;
        self
    }

    pub fn shells(mut self, count: u32) -> Self {
        self.shells = count;
        self
    }

    pub fn infill_percent(mut self, percent: CoordF) -> Self {
        self.infill_percent = percent;
        self
    }

    pub fn roofs(mut self, count: u32) -> Self {
        self.roofs = count;
        self
    }

    pub fn floors(mut self, count: u32) -> Self {
        self.floors = count;
        self
    }

    pub fn build_volume(mut self, x: CoordF, y: CoordF, z: CoordF) -> Self {
        self.build_volume = BuildVolume { x, y, z };
        self
    }

    pub fn skirt(mut self, skirt: SkirtSettings) -> Self {
        self.skirt = skirt;
        self
    }

    /// Builder: turn the skirt off.
    pub fn without_skirt(mut self) -> Self {
        self.skirt.enabled = false;
        self
    }

    pub fn infill_pattern(mut self, pattern: InfillPattern) -> Self {
        self.infill_pattern = pattern;
        self
    }

    pub fn machine(mut self, machine: MachineSettings) -> Self {
        self.machine = machine;
        self
    }
}
