//! Stateful G-code writer.
//!
//! Tracks the absolute extruder position E and whether the filament is
//! currently retracted. E only ever grows through extrusion; a retraction
//! commands `E - retract_length` and the matching de-retraction commands E
//! again, so the tracked value itself never goes backwards.

use super::generator::{GCode, GCodeStats};
use super::GCodeCommand;
use crate::config::MachineSettings;
use crate::CoordF;

/// Fan power for the first layers; full power from the third layer on.
pub fn fan_speed_for_layer(layer_index: usize) -> Option<u32> {
    match layer_index {
        0 => Some(0),
        1 => Some(127),
        2 => Some(255),
        _ => None,
    }
}

/// G-code writer with extrusion and retraction state.
#[derive(Debug, Clone)]
pub struct GCodeWriter {
    gcode: GCode,
    machine: MachineSettings,
    /// Cumulative extruder position (mm of filament).
    e: CoordF,
    retracted: bool,
    /// Last commanded XY (mm).
    position: Option<(CoordF, CoordF)>,
    z: CoordF,
    stats: GCodeStats,
}

impl GCodeWriter {
    pub fn new(machine: MachineSettings) -> Self {
        Self {
            gcode: GCode::new(),
            machine,
            e: 0.0,
            retracted: false,
            position: None,
            z: 0.0,
            stats: GCodeStats::default(),
        }
    }

    #[inline]
    pub fn e(&self) -> CoordF {
        self.e
    }

    #[inline]
    pub fn is_retracted(&self) -> bool {
        self.retracted
    }

    pub fn stats(&self) -> &GCodeStats {
        &self.stats
    }

    pub fn write_command(&mut self, cmd: &GCodeCommand) {
        self.gcode.append_line(&cmd.to_gcode());
    }

    /// Append a multi-line block as is.
    pub fn write_block(&mut self, block: &str) {
        self.gcode.append(block);
    }

    pub fn write_comment(&mut self, comment: &str) {
        self.gcode.append_comment(comment);
    }

    /// Mark a layer boundary and set the Z used by following travels.
    pub fn start_layer(&mut self, layer_index: usize, z: CoordF) {
        self.write_comment(&format!("LAYER:{}", layer_index));
        self.z = z;
        self.stats.layer_count += 1;
        if let Some(s) = fan_speed_for_layer(layer_index) {
            self.set_fan_speed(s);
        }
    }

    pub fn set_fan_speed(&mut self, s: u32) {
        self.write_command(&GCodeCommand::SetFanSpeed { s });
    }

    /// Rapid move to `(x, y)` at the current layer Z.
    pub fn travel_to(&mut self, x: CoordF, y: CoordF) {
        if let Some((px, py)) = self.position {
            self.stats.travel_distance_mm += ((x - px).powi(2) + (y - py).powi(2)).sqrt();
        }
        self.write_command(&GCodeCommand::RapidMove {
            f: Some(self.machine.travel_feed),
            x: Some(x),
            y: Some(y),
            z: Some(self.z),
        });
        self.position = Some((x, y));
        self.stats.travel_moves += 1;
    }

    /// Print to `(x, y)` adding `delta_e` to E. De-retracts first if needed.
    pub fn extrude_to(&mut self, x: CoordF, y: CoordF, delta_e: CoordF) {
        if self.retracted {
            self.unretract();
        }
        if let Some((px, py)) = self.position {
            self.stats.extrusion_distance_mm += ((x - px).powi(2) + (y - py).powi(2)).sqrt();
        }
        self.e += delta_e;
        self.write_command(&GCodeCommand::LinearMove {
            f: Some(self.machine.print_feed),
            x: Some(x),
            y: Some(y),
            z: None,
            e: Some(self.e),
        });
        self.position = Some((x, y));
        self.stats.extrusion_moves += 1;
    }

    /// Pull filament back. No-op when already retracted.
    pub fn retract(&mut self) {
        if self.retracted {
            return;
        }
        self.write_command(&GCodeCommand::LinearMove {
            f: Some(self.machine.retract_feed),
            x: None,
            y: None,
            z: None,
            e: Some(self.e - self.machine.retract_length),
        });
        self.retracted = true;
        self.stats.retraction_count += 1;
    }

    /// Push filament back to the tracked E. No-op when not retracted.
    pub fn unretract(&mut self) {
        if !self.retracted {
            return;
        }
        self.write_command(&GCodeCommand::LinearMove {
            f: Some(self.machine.retract_feed),
            x: None,
            y: None,
            z: None,
            e: Some(self.e),
        });
        self.retracted = false;
    }

    /// Consume the writer, returning the program and its statistics.
    pub fn finish(mut self) -> GCode {
        self.stats.filament_used_mm = self.e;
        self.gcode.stats = self.stats;
        self.gcode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer() -> GCodeWriter {
        GCodeWriter::new(MachineSettings::default())
    }

    #[test]
    fn test_travel_uses_layer_z() {
        let mut w = writer();
        w.start_layer(3, 0.6);
        w.travel_to(110.0, 110.0);
        let gcode = w.finish();
        let lines: Vec<&str> = gcode.lines().collect();
        assert_eq!(lines, vec!["; LAYER:3", "G0 F2400 X110.000 Y110.000 Z0.600"]);
    }

    #[test]
    fn test_retract_then_unretract() {
        let mut w = writer();
        w.travel_to(0.0, 0.0);
        w.extrude_to(10.0, 0.0, 0.5);
        w.retract();
        w.retract();
        assert!(w.is_retracted());
        w.travel_to(20.0, 0.0);
        w.extrude_to(30.0, 0.0, 0.5);
        assert!(!w.is_retracted());

        let gcode = w.finish();
        let lines: Vec<&str> = gcode.lines().collect();
        assert_eq!(
            lines,
            vec![
                "G0 F2400 X0.000 Y0.000 Z0.000",
                "G1 F1200 X10.000 Y0.000 E0.50000",
                "G1 F2700 E-4.50000",
                "G0 F2400 X20.000 Y0.000 Z0.000",
                "G1 F2700 E0.50000",
                "G1 F1200 X30.000 Y0.000 E1.00000",
            ]
        );
        assert_eq!(gcode.stats.retraction_count, 1);
        assert!((gcode.stats.filament_used_mm - 1.0).abs() < 1e-12);
        assert!((gcode.stats.travel_distance_mm - 10.0).abs() < 1e-9);
        assert!((gcode.stats.extrusion_distance_mm - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_fan_on_first_layers() {
        assert_eq!(fan_speed_for_layer(0), Some(0));
        assert_eq!(fan_speed_for_layer(1), Some(127));
        assert_eq!(fan_speed_for_layer(2), Some(255));
        assert_eq!(fan_speed_for_layer(3), None);

        let mut w = writer();
        w.start_layer(1, 0.4);
        assert!(w.finish().content().contains("M106 S127"));
    }
}
