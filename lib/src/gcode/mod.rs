//! G-code generation module.
//!
//! - [`GCodeCommand`] - one output line
//! - [`GCodeWriter`] - stateful emitter tracking extrusion and retraction
//! - [`LayerPaths`] - a slice flattened into print order
//! - [`generate_gcode`] - full program: header, layers, footer

mod generator;
mod path;
mod writer;

pub use generator::{generate_gcode, GCode, GCodeStats};
pub use path::{ExtrusionPath, ExtrusionRole, LayerPaths};
pub use writer::{fan_speed_for_layer, GCodeWriter};

/// Start-of-print boilerplate: heat up, home, prime line.
pub const GCODE_HEADER: &str = "M140 S60 ;set bed temperature
M190 S60 ;wait for bed temperature to be reached
M104 S200 ;set temperature
M109 S200 ;wait for temperature to be reached
M82 ;set extruder to absolute mode
G28 ;home all axes
G92 E0 ;zero the extruder
G1 Z2.0 F3000 ;move the nozzle up
G1 X0.1 Y20 Z0.3 F5000.0 ;move to start-line position
G1 X0.1 Y200.0 Z0.3 F1500.0 E15 ;draw 1st line
G1 X0.4 Y200.0 Z0.3 F5000.0 ;move to side a little
G1 X0.4 Y20 Z0.3 F1500.0 E30 ;draw 2nd line
G92 E0 ;zero the extruder
G1 Z2.0 F3000 ;move the nozzle up
G92 E0 ;zero the extruder
G1 F24
M107 ; fan off for first layer
";

/// End-of-print boilerplate: cool down, lift, park, motors off.
pub const GCODE_FOOTER: &str = "M140 S0 ;set bed temperature
M107 ;fan off
M220 S100 ;reset speed factor override percentage to default (100%)
M221 S100 ;reset extrude factor override percentage to default (100%)
G91 ;relative positioning
G1 F1800 E-3 ;retract the filament a bit before lifting the nozzle, to release some of the pressure
G1 F3000 Z20 ;move Z up a bit and retract filament even more
G90 ;absolute positioning
G1 X0 Y235 F9000 ;move to park position
M84 ;steppers off
M82 ;absolute extrusion mode
M104 S0 ;turn off extruder
";

/// G-code command types.
///
/// Moves put the feed rate first: `G1 F<feed> X<x> Y<y> E<e>`.
#[derive(Clone, Debug, PartialEq)]
pub enum GCodeCommand {
    /// G0 - Rapid move (travel)
    RapidMove {
        f: Option<f64>,
        x: Option<f64>,
        y: Option<f64>,
        z: Option<f64>,
    },
    /// G1 - Linear move (extrusion, retraction)
    LinearMove {
        f: Option<f64>,
        x: Option<f64>,
        y: Option<f64>,
        z: Option<f64>,
        e: Option<f64>,
    },
    /// M106 - Set fan speed
    SetFanSpeed { s: u32 },
    /// Comment
    Comment(String),
}

fn push_field(cmd: &mut String, letter: char, value: Option<f64>, precision: usize) {
    if let Some(v) = value {
        cmd.push_str(&format!(" {}{:.*}", letter, precision, v));
    }
}

impl GCodeCommand {
    /// Convert the command to a G-code string.
    pub fn to_gcode(&self) -> String {
        match self {
            GCodeCommand::RapidMove { f, x, y, z } => {
                let mut cmd = String::from("G0");
                push_field(&mut cmd, 'F', *f, 0);
                push_field(&mut cmd, 'X', *x, 3);
                push_field(&mut cmd, 'Y', *y, 3);
                push_field(&mut cmd, 'Z', *z, 3);
                cmd
            }
            GCodeCommand::LinearMove { f, x, y, z, e } => {
                let mut cmd = String::from("G1");
                push_field(&mut cmd, 'F', *f, 0);
                push_field(&mut cmd, 'X', *x, 3);
                push_field(&mut cmd, 'Y', *y, 3);
                push_field(&mut cmd, 'Z', *z, 3);
                push_field(&mut cmd, 'E', *e, 5);
                cmd
            }
            GCodeCommand::SetFanSpeed { s } => format!("M106 S{}", s),
            GCodeCommand::Comment(text) => format!("; {}", text),
        }
    }
}
