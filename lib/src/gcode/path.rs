//! Extrusion paths and per-layer print plans.
//!
//! A [`LayerPaths`] is the emitter's view of one slice: every feature's paths
//! flattened into print order, each tagged with its [`ExtrusionRole`].

use crate::config::SlicerSettings;
use crate::geometry::{Point, Polygon, Polyline};
use crate::slice::Slice;
use crate::{unscale, CoordF};
use serde::Serialize;

/// Type of extrusion, in per-layer print order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ExtrusionRole {
    /// Priming loops around the part.
    Skirt,
    /// Walls between the outer and inner wall.
    Shell,
    /// Outermost wall.
    OuterWall,
    /// Extra wall around solid fill.
    SurfaceWall,
    /// Dense roof/floor fill.
    SurfaceInfill,
    /// Sparse interior fill.
    SparseInfill,
}

impl ExtrusionRole {
    /// Per-layer print order.
    pub const ORDER: [ExtrusionRole; 6] = [
        ExtrusionRole::Skirt,
        ExtrusionRole::Shell,
        ExtrusionRole::OuterWall,
        ExtrusionRole::SurfaceWall,
        ExtrusionRole::SurfaceInfill,
        ExtrusionRole::SparseInfill,
    ];

    /// Walls are closed loops; fill is open lines.
    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            ExtrusionRole::Skirt
                | ExtrusionRole::Shell
                | ExtrusionRole::OuterWall
                | ExtrusionRole::SurfaceWall
        )
    }

    pub fn is_infill(&self) -> bool {
        matches!(self, ExtrusionRole::SurfaceInfill | ExtrusionRole::SparseInfill)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExtrusionRole::Skirt => "skirt",
            ExtrusionRole::Shell => "shell",
            ExtrusionRole::OuterWall => "outer wall",
            ExtrusionRole::SurfaceWall => "surface wall",
            ExtrusionRole::SurfaceInfill => "surface infill",
            ExtrusionRole::SparseInfill => "sparse infill",
        }
    }

    /// Name used in `; FEATURE: <name>` comments.
    pub fn feature_name(&self) -> &'static str {
        match self {
            ExtrusionRole::Skirt => "Skirt",
            ExtrusionRole::Shell => "Inner wall",
            ExtrusionRole::OuterWall => "Outer wall",
            ExtrusionRole::SurfaceWall => "Surface wall",
            ExtrusionRole::SurfaceInfill => "Top/bottom surface",
            ExtrusionRole::SparseInfill => "Sparse infill",
        }
    }
}

/// A single extrusion path ready for G-code generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrusionPath {
    /// The path points (in scaled coordinates).
    pub points: Vec<Point>,

    /// Closed paths return to their first point after the last.
    pub is_closed: bool,

    pub role: ExtrusionRole,
}

impl ExtrusionPath {
    pub fn new(points: Vec<Point>, is_closed: bool, role: ExtrusionRole) -> Self {
        Self {
            points,
            is_closed,
            role,
        }
    }

    pub fn from_polygon(polygon: &Polygon, role: ExtrusionRole) -> Self {
        Self::new(polygon.points().to_vec(), true, role)
    }

    pub fn from_polyline(polyline: &Polyline, role: ExtrusionRole) -> Self {
        Self::new(polyline.points().to_vec(), false, role)
    }

    pub fn first_point(&self) -> Option<Point> {
        self.points.first().copied()
    }

    /// Points printed after travelling to the first one, including the
    /// closing return for loops.
    pub fn print_points(&self) -> impl Iterator<Item = Point> + '_ {
        let closing = if self.is_closed && self.points.len() > 2 {
            self.points.first().copied()
        } else {
            None
        };
        self.points.iter().skip(1).copied().chain(closing)
    }

    /// Printed length (mm).
    pub fn length_mm(&self) -> CoordF {
        let Some(start) = self.first_point() else {
            return 0.0;
        };
        let mut prev = start;
        let mut total = 0.0;
        for p in self.print_points() {
            total += prev.distance(&p);
            prev = p;
        }
        total * unscale(1)
    }

    /// Fewer than two points prints nothing.
    pub fn is_printable(&self) -> bool {
        self.points.len() >= 2
    }
}

/// All extrusion paths of one layer, in print order.
#[derive(Debug, Clone, Default)]
pub struct LayerPaths {
    pub paths: Vec<ExtrusionPath>,

    pub layer_index: usize,

    /// Nozzle Z while printing this layer (mm).
    pub z_height: CoordF,

    /// Layer thickness (mm).
    pub layer_height: CoordF,
}

impl LayerPaths {
    pub fn new(layer_index: usize, z_height: CoordF, layer_height: CoordF) -> Self {
        Self {
            paths: Vec::new(),
            layer_index,
            z_height,
            layer_height,
        }
    }

    /// Flatten a finished slice into print order. The nozzle sits at the top
    /// of the layer, half a layer above the slicing plane.
    pub fn from_slice(slice: &Slice, settings: &SlicerSettings) -> Self {
        let mut layer = Self::new(
            slice.index,
            slice.height + settings.layer_height / 2.0,
            settings.layer_height,
        );
        for role in ExtrusionRole::ORDER {
            if role.is_loop() {
                for polygon in slice.loops(role) {
                    layer.add_path(ExtrusionPath::from_polygon(&polygon, role));
                }
            } else {
                for polyline in slice.paths(role) {
                    layer.add_path(ExtrusionPath::from_polyline(&polyline, role));
                }
            }
        }
        layer
    }

    /// Printable paths only.
    pub fn add_path(&mut self, path: ExtrusionPath) {
        if path.is_printable() {
            self.paths.push(path);
        }
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    pub fn has_paths(&self) -> bool {
        !self.paths.is_empty()
    }

    /// Paths of one role, in print order.
    pub fn role_paths(&self, role: ExtrusionRole) -> impl Iterator<Item = &ExtrusionPath> {
        self.paths.iter().filter(move |p| p.role == role)
    }

    /// Total printed length (mm).
    pub fn extrusion_length_mm(&self) -> CoordF {
        self.paths.iter().map(ExtrusionPath::length_mm).sum()
    }
}
