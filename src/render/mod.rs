//! Output rendering: text report, bar chart, and the sbatch script template.

pub mod chart;
pub mod sbatch;
pub mod text;

pub use chart::render_chart_svg;
pub use sbatch::{SbatchContext, render_sbatch};
pub use text::render_text_report;
