//! Input configuration layer: the resource table shared by both subcommands,
//! step-script naming, and the GPU stage policy.
//!
//! This module is separate from timing log parsing and rendering.

pub mod gpu;
pub mod resources;
pub mod script;

pub use gpu::GpuStages;
pub use resources::{ResourceRow, ResourceTable, parse_resource_file};
pub use script::StageScript;
