//! # Layer Slicer
//!
//! A layer-by-layer FDM slicer.
//!
//! This library turns a triangle soup into printable G-code:
//! - Mesh/plane intersection and contour reconstruction
//! - Outer wall and inward shell generation, plus skirt loops
//! - Roof/floor detection with solid surface fill and sparse infill
//! - Nearest-neighbour path ordering
//! - G-code emission with extrusion and retraction accounting
//!
//! ## Example
//!
//! ```rust,no_run
//! use layer_slicer::{pipeline, Mesh, SlicerSettings};
//!
//! let mesh = Mesh::cube(20.0).placed_on_bed();
//! let settings = SlicerSettings::default();
//! let slices = pipeline::slice_model(mesh.vertices(), &settings)?;
//! pipeline::write_gcode("cube.gcode", &slices, &settings)?;
//! # Ok::<(), layer_slicer::Error>(())
//! ```

// Core modules
pub mod adhesion;
pub mod clipper;
pub mod config;
pub mod gcode;
pub mod geometry;
pub mod infill;
pub mod mesh;
pub mod perimeter;
pub mod pipeline;
pub mod slice;
pub mod travel;

// Re-export commonly used types
pub use config::{InfillPattern, MachineSettings, SkirtSettings, SlicerSettings};
pub use gcode::{ExtrusionRole, GCode, GCodeCommand, GCodeStats, GCodeWriter, LayerPaths};
pub use geometry::{BoundingBox, ExPolygon, ExPolygons, Line, Point, Point3F, Polygon, Polyline, Vertex};
pub use mesh::Mesh;
pub use pipeline::{slice_model, write_gcode, SlicePipeline};
pub use slice::Slice;

// Re-export clipper operations
pub use clipper::{difference, intersection, offset_expolygons, shrink, union_ex, OffsetJoinType};

/// Coordinate type used throughout the slicer.
/// Using i64 for integer coordinates (scaled by SCALING_FACTOR) to avoid floating-point issues.
pub type Coord = i64;

/// Floating-point coordinate type for unscaled values.
pub type CoordF = f64;

/// Scaling factor: coordinates are stored as integers scaled by this factor.
/// 1 unit = 1 nanometer, so 1mm = 1_000_000 units.
pub const SCALING_FACTOR: f64 = 1_000_000.0;

/// Scale a floating-point coordinate to integer.
#[inline]
pub fn scale(v: CoordF) -> Coord {
    (v * SCALING_FACTOR).round() as Coord
}

/// Unscale an integer coordinate to floating-point.
#[inline]
pub fn unscale(v: Coord) -> CoordF {
    v as CoordF / SCALING_FACTOR
}

/// Result type used throughout the slicer.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for slicer operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid mesh: {0} vertices is not a multiple of 3")]
    InvalidMesh(usize),

    #[error("Mesh error: {0}")]
    Mesh(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings file error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("G-code error: {0}")]
    GCode(String),
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaling() {
        // 1mm should scale to 1_000_000
        assert_eq!(scale(1.0), 1_000_000);

        // And back
        assert!((unscale(1_000_000) - 1.0).abs() < 1e-10);

        // Sub-millimeter precision
        assert_eq!(scale(0.001), 1_000);
        assert_eq!(scale(0.0001), 100);
    }

    #[test]
    fn test_invalid_mesh_message() {
        let err = Error::InvalidMesh(7);
        assert!(err.to_string().contains("7 vertices"));
    }
}
