mod report;
mod runner;

use self::runner::{run_single, run_sweep};
use crate::io::setup_output;
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use ljmc::config::{Args, RunConfig};
use std::fs;
use std::path::Path;
use tracing::info;

pub struct McApplication {
    args: Args,
    config: RunConfig,
}

impl McApplication {
    pub fn from_cli() -> Result<Self> {
        let args = Args::parse();
        setup_output(args.log_file.as_ref(), args.verbose);

        let mut config = load_config(&args)?;
        config.apply_args(&args);
        config
            .validate()
            .wrap_err("Invalid run configuration")?;

        Ok(Self { args, config })
    }

    pub fn run(self) -> Result<()> {
        info!("Configuration loaded:\n{:?}", self.config);
        if let Some(seed) = self.args.seed {
            info!("Random seed fixed to {}", seed);
        }

        match (self.config.ndim(), self.config.sweep.is_some()) {
            (1, false) => run_single::<1>(&self.config),
            (2, false) => run_single::<2>(&self.config),
            (3, false) => run_single::<3>(&self.config),
            (1, true) => run_sweep::<1>(&self.config),
            (2, true) => run_sweep::<2>(&self.config),
            (3, true) => run_sweep::<3>(&self.config),
            (n, _) => Err(color_eyre::eyre::eyre!(
                "Unsupported number of dimensions: {}",
                n
            )),
        }
    }
}

/// Read the YAML file, or fall back to the built-in defaults when it does
/// not exist.
fn load_config(args: &Args) -> Result<RunConfig> {
    if !Path::new(&args.config_file).exists() {
        info!(
            "Configuration file {} not found, using built-in defaults",
            args.config_file
        );
        return Ok(RunConfig::default());
    }

    info!("Reading configuration from: {}", args.config_file);
    let config_content = fs::read_to_string(&args.config_file)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", args.config_file))?;

    let config = RunConfig::from_yaml(&config_content)
        .wrap_err("Failed to parse configuration file")?;

    Ok(config)
}
