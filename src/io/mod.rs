//! Logging setup and run output files

mod output;

pub use output::{setup_output, write_sweep_file, OutputFiles};
