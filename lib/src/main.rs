//! Layer slicer CLI
//!
//! Usage:
//!   layer-slicer slice <input.stl> -o <output.gcode> [options]
//!   layer-slicer slice <input.stl> --config settings.json
//!   layer-slicer info <input.stl>

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use layer_slicer::config::InfillPattern;
use layer_slicer::mesh::load_stl;
use layer_slicer::{ExtrusionRole, Polyline, Slice, SlicePipeline, SlicerSettings};
use log::{info, warn, LevelFilter};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Layer-by-layer FDM slicer
#[derive(Parser, Debug)]
#[command(name = "layer-slicer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Slice an STL file and generate G-code
    Slice {
        /// Input STL file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output G-code file
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Settings file (JSON); flags below override it
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: SettingsOverrides,

        /// Write the per-layer paths as JSON
        #[arg(long, value_name = "FILE")]
        dump_layers: Option<PathBuf>,

        /// Number of threads to use (0 = auto)
        #[arg(short = 'j', long, default_value = "0")]
        threads: usize,
    },

    /// Display information about an STL file
    Info {
        /// Input STL file
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
}

/// Per-run overrides applied on top of defaults or a settings file.
#[derive(clap::Args, Debug, Default)]
struct SettingsOverrides {
    /// Layer height in mm
    #[arg(long)]
    layer_height: Option<f64>,

    /// Nozzle diameter in mm
    #[arg(long)]
    nozzle: Option<f64>,

    /// Wall count, outer wall included
    #[arg(long)]
    shells: Option<u32>,

    /// Infill density (0-100)
    #[arg(long)]
    infill_percent: Option<f64>,

    /// Infill pattern (diagonal, rect)
    #[arg(long)]
    infill_pattern: Option<String>,

    /// Solid layers under top surfaces
    #[arg(long)]
    roofs: Option<u32>,

    /// Solid layers over bottom surfaces
    #[arg(long)]
    floors: Option<u32>,

    /// Disable the skirt
    #[arg(long)]
    no_skirt: bool,
}

impl SettingsOverrides {
    fn apply(&self, mut settings: SlicerSettings) -> Result<SlicerSettings> {
        if let Some(v) = self.layer_height {
            settings = settings.layer_height(v);
        }
        if let Some(v) = self.nozzle {
            settings = settings.nozzle_diameter(v);
        }
        if let Some(v) = self.shells {
            settings = settings.shells(v);
        }
        if let Some(v) = self.infill_percent {
            settings = settings.infill_percent(v);
        }
        if let Some(name) = &self.infill_pattern {
            let pattern = match name.parse::<InfillPattern>() {
                Ok(p) => p,
                Err(e) => bail!("Invalid settings: {}", e),
            };
            settings = settings.infill_pattern(pattern);
        }
        if let Some(v) = self.roofs {
            settings = settings.roofs(v);
        }
        if let Some(v) = self.floors {
            settings = settings.floors(v);
        }
        if self.no_skirt {
            settings = settings.without_skirt();
        }
        if let Err(e) = settings.validate() {
            bail!("Invalid settings: {}", e);
        }
        Ok(settings)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        LevelFilter::Debug
    } else if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::Slice {
            input,
            output,
            config,
            overrides,
            dump_layers,
            threads,
        } => cmd_slice(input, output, config, overrides, dump_layers, threads),
        Commands::Info { input } => cmd_info(input),
    }
}

/// Map a pipeline stage onto the progress bar range it owns.
fn stage_span(stage: &str) -> (u64, u64) {
    match stage {
        "slicing" => (10, 60),
        "walls" => (60, 75),
        "surfaces" => (75, 90),
        _ => (90, 100),
    }
}

fn cmd_slice(
    input: PathBuf,
    output: Option<PathBuf>,
    config_file: Option<PathBuf>,
    overrides: SettingsOverrides,
    dump_layers: Option<PathBuf>,
    threads: usize,
) -> Result<()> {
    info!("Loading STL file: {}", input.display());

    let output_path = output.unwrap_or_else(|| input.with_extension("gcode"));

    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to initialize thread pool")?;
    }

    let progress = ProgressBar::new(100);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .context("Invalid progress template")?
            .progress_chars("#>-"),
    );

    progress.set_message("Loading mesh...");
    progress.set_position(5);

    let mut mesh = load_stl(&input).context("Failed to load STL file")?;
    mesh.center_xy();
    mesh.place_on_bed();
    info!("Mesh loaded: {} triangles", mesh.triangle_count());

    let base = match &config_file {
        Some(path) => {
            info!("Loading settings from: {}", path.display());
            SlicerSettings::from_file(path).context("Failed to load settings file")?
        }
        None => SlicerSettings::default(),
    };
    let settings = overrides.apply(base)?;

    info!("Configuration:");
    info!("  Layer height: {} mm", settings.layer_height);
    info!("  Nozzle: {} mm", settings.nozzle_diameter);
    info!("  Shells: {}", settings.shells);
    info!("  Infill: {}% {}", settings.infill_percent, settings.infill_pattern);
    info!("  Roofs/floors: {}/{}", settings.roofs, settings.floors);

    if let Some((lo, hi)) = mesh.bounds() {
        let bv = &settings.build_volume;
        if hi.x - lo.x > bv.x || hi.y - lo.y > bv.y || hi.z > bv.z {
            warn!("Model exceeds the {} x {} x {} mm build volume", bv.x, bv.y, bv.z);
        }
    }

    let pipeline = SlicePipeline::new(settings).context("Invalid settings")?;
    let slices = pipeline
        .process_with_callback(mesh.vertices(), |stage, fraction| {
            let (start, end) = stage_span(stage);
            progress.set_message(format!("{}...", stage));
            progress.set_position(start + ((end - start) as f64 * fraction) as u64);
        })
        .context("Slicing failed")?;

    if slices.is_empty() {
        progress.finish_and_clear();
        bail!("No layers produced; is the model above Z=0?");
    }

    if let Some(path) = &dump_layers {
        progress.set_message("Writing layers...");
        write_layer_dump(path, &slices).context("Failed to write layer dump")?;
    }

    progress.set_message("Generating G-code...");
    progress.set_position(90);
    let gcode = pipeline.generate_gcode(&slices).context("G-code generation failed")?;
    gcode
        .write_to_file(&output_path)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    progress.set_position(100);
    progress.finish_with_message("Done!");

    let stats = &gcode.stats;
    println!();
    println!("Slicing complete!");
    println!("  Output: {}", output_path.display());
    println!("  Layers: {}", stats.layer_count);
    println!(
        "  Filament used: {:.2} m ({:.1} mm)",
        stats.filament_used_meters(),
        stats.filament_used_mm
    );
    println!("  Extrusion moves: {}", stats.extrusion_moves);
    println!("  Travel moves: {}", stats.travel_moves);
    println!("  Travel distance: {:.0} mm", stats.travel_distance_mm);
    println!("  Retractions: {}", stats.retraction_count);

    Ok(())
}

/// One layer's printable paths, grouped by feature.
#[derive(Serialize)]
struct LayerDump {
    index: usize,
    height: f64,
    features: Vec<FeatureDump>,
}

#[derive(Serialize)]
struct FeatureDump {
    role: ExtrusionRole,
    paths: Vec<Polyline>,
}

fn write_layer_dump(path: &Path, slices: &[Slice]) -> Result<()> {
    let layers: Vec<LayerDump> = slices
        .iter()
        .map(|slice| LayerDump {
            index: slice.index,
            height: slice.height,
            features: ExtrusionRole::ORDER
                .iter()
                .map(|&role| FeatureDump {
                    role,
                    paths: slice.paths(role),
                })
                .filter(|f| !f.paths.is_empty())
                .collect(),
        })
        .collect();

    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, &layers)?;
    info!("Wrote {} layers to {}", layers.len(), path.display());
    Ok(())
}

fn cmd_info(input: PathBuf) -> Result<()> {
    info!("Loading STL file: {}", input.display());

    let mesh = load_stl(&input).context("Failed to load STL file")?;

    println!("Mesh Information:");
    println!("  File: {}", input.display());
    println!("  Triangles: {}", mesh.triangle_count());

    let Some((lo, hi)) = mesh.bounds() else {
        println!("  (empty mesh)");
        return Ok(());
    };
    let size_z = hi.z - lo.z;

    println!("  Bounding box:");
    println!("    Min: ({:.3}, {:.3}, {:.3}) mm", lo.x, lo.y, lo.z);
    println!("    Max: ({:.3}, {:.3}, {:.3}) mm", hi.x, hi.y, hi.z);
    println!("    Size: {:.3} x {:.3} x {:.3} mm", hi.x - lo.x, hi.y - lo.y, size_z);
    println!("  Estimated volume: {:.2} mm³", mesh.volume());

    println!("  Estimated layers:");
    for lh in [0.1, 0.2, 0.3] {
        let layers = (size_z / lh).round() as u32;
        println!("    At {:.1}mm layer height: {} layers", lh, layers);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply() {
        let overrides = SettingsOverrides {
            shells: Some(3),
            infill_pattern: Some("rect".into()),
            no_skirt: true,
            ..Default::default()
        };
        let settings = overrides.apply(SlicerSettings::default()).unwrap();
        assert_eq!(settings.shells, 3);
        assert_eq!(settings.infill_pattern, InfillPattern::Rect);
        assert!(!settings.skirt.enabled);
    }

    #[test]
    fn test_unknown_infill_pattern_rejected() {
        let overrides = SettingsOverrides {
            infill_pattern: Some("gyroid".into()),
            ..Default::default()
        };
        assert!(overrides.apply(SlicerSettings::default()).is_err());
    }

    #[test]
    fn test_invalid_override_rejected() {
        let overrides = SettingsOverrides {
            layer_height: Some(0.0),
            ..Default::default()
        };
        assert!(overrides.apply(SlicerSettings::default()).is_err());
    }
}
