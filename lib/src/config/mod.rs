//! Configuration types for the slicing run.

mod settings;

pub use settings::{
    BuildVolume, InfillPattern, MachineSettings, SkirtSettings, SlicerSettings, PLANE_EPSILON,
};
