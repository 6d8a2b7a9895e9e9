//! Log parsing for the per-array-task timings log (time_unix.txt).

pub mod parse;
pub mod row;

pub use parse::parse_timing_file;
pub use row::{TimingLog, TimingRecord};
