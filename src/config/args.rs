//! Command-line argument parsing for Monte Carlo runs

use clap::Parser;

/// Lennard-Jones Monte Carlo (NVT / μVT) with YAML configuration
#[derive(Parser, Debug, Default, Clone)]
#[command(author, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file (built-in defaults when missing)
    #[arg(short, long, default_value = "config.yaml")]
    pub config_file: String,

    /// Box volume; replaces the box with a cube of this volume
    #[arg(short = 'V', long)]
    pub volume: Option<f64>,

    /// Number of particles
    #[arg(short = 'N', long = "particles")]
    pub n_particles: Option<usize>,

    /// Temperature
    #[arg(short = 'T', long)]
    pub temperature: Option<f64>,

    /// Chemical potential; switches the run to the grand-canonical ensemble
    #[arg(long)]
    pub mu: Option<f64>,

    /// Output file name root
    #[arg(long)]
    pub outfile: Option<String>,

    /// Override the number of Monte Carlo steps
    #[arg(long)]
    pub steps: Option<usize>,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the log to this file instead of stdout
    #[arg(long)]
    pub log_file: Option<String>,

    /// Also log debug messages
    #[arg(short, long)]
    pub verbose: bool,
}
