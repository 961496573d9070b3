//! Configuration management for Monte Carlo runs
//!
//! A YAML file provides the run setup; command-line switches override it.
//! Everything is validated here, before any engine is built.

mod args;

pub use args::Args;

use crate::error::{Error, Result};
use crate::gcmc::{Ensemble, EnsembleParams, MoveMixture};
use serde::{Deserialize, Serialize};

/// Slot ceiling of a grand-canonical run when none is configured.
pub const DEFAULT_MAX_PARTICLES: usize = 10_000;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RunConfig {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub ensemble: EnsembleConfig,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub potential: PotentialConfig,
    /// Move mixture; the ensemble's default when absent
    #[serde(default)]
    pub moves: Option<MoveConfig>,
    #[serde(default)]
    pub run: RunParams,
    #[serde(default)]
    pub output: OutputConfig,
    /// Chemical potentials for a parallel sweep instead of a single run
    #[serde(default)]
    pub sweep: Option<SweepConfig>,
}

/// Box and particle setup
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SystemConfig {
    /// Box edge lengths, one per dimension (1 to 3)
    #[serde(default = "default_box_lengths")]
    pub box_lengths: Vec<f64>,
    /// Initial number of particles
    #[serde(default = "default_n_particles")]
    pub n_particles: usize,
    /// Slot ceiling for μVT; NVT always uses `n_particles`
    #[serde(default)]
    pub max_particles: Option<usize>,
}

/// Ensemble selection
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Default)]
#[serde(tag = "type")]
pub enum EnsembleConfig {
    /// Canonical (NVT) ensemble
    #[serde(rename = "nvt")]
    #[default]
    Nvt,
    /// Grand-canonical (μVT) ensemble
    #[serde(rename = "muvt")]
    MuVt { chemical_potential: f64 },
}

/// Lennard-Jones parameters
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct PotentialConfig {
    #[serde(default = "default_unit")]
    pub sigma: f64,
    #[serde(default = "default_unit")]
    pub epsilon: f64,
    /// Absent or negative: half the shortest box edge
    #[serde(default)]
    pub cutoff: Option<f64>,
}

/// Move-type fractions, must sum to one
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct MoveConfig {
    pub displacement: f64,
    #[serde(default)]
    pub insertion: f64,
    #[serde(default)]
    pub deletion: f64,
}

/// Run length and sampling cadence
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct RunParams {
    #[serde(default = "default_n_steps")]
    pub n_steps: usize,
    #[serde(default = "default_equilibration_steps")]
    pub equilibration_steps: usize,
    #[serde(default = "default_sample_interval")]
    pub sample_interval: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Output settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct OutputConfig {
    /// File name root for `.data`, `.ave`, `.moves` and `.xyz`
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_write_trajectory")]
    pub write_trajectory: bool,
}

/// Parallel chemical-potential sweep
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SweepConfig {
    pub chemical_potentials: Vec<f64>,
}

// Default value functions
fn default_temperature() -> f64 {
    2.0
}
fn default_box_lengths() -> Vec<f64> {
    vec![10.0, 10.0, 10.0]
}
fn default_n_particles() -> usize {
    108
}
fn default_unit() -> f64 {
    1.0
}
fn default_n_steps() -> usize {
    20_000
}
fn default_equilibration_steps() -> usize {
    10_000
}
fn default_sample_interval() -> usize {
    50
}
fn default_prefix() -> String {
    "mc".to_string()
}
fn default_write_trajectory() -> bool {
    true
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            system: SystemConfig::default(),
            ensemble: EnsembleConfig::default(),
            temperature: default_temperature(),
            potential: PotentialConfig::default(),
            moves: None,
            run: RunParams::default(),
            output: OutputConfig::default(),
            sweep: None,
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            box_lengths: default_box_lengths(),
            n_particles: default_n_particles(),
            max_particles: None,
        }
    }
}

impl Default for PotentialConfig {
    fn default() -> Self {
        Self {
            sigma: default_unit(),
            epsilon: default_unit(),
            cutoff: None,
        }
    }
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            n_steps: default_n_steps(),
            equilibration_steps: default_equilibration_steps(),
            sample_interval: default_sample_interval(),
            seed: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            write_trajectory: default_write_trajectory(),
        }
    }
}

impl RunConfig {
    /// Parse a YAML document.
    pub fn from_yaml(text: &str) -> std::result::Result<Self, serde_yml::Error> {
        serde_yml::from_str(text)
    }

    /// Apply command-line overrides on top of the file values.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(volume) = args.volume {
            let edge = volume.cbrt();
            self.system.box_lengths = vec![edge; 3];
            self.potential.cutoff = None;
        }
        if let Some(n) = args.n_particles {
            self.system.n_particles = n;
        }
        if let Some(t) = args.temperature {
            self.temperature = t;
        }
        if let Some(mu) = args.mu {
            self.ensemble = EnsembleConfig::MuVt {
                chemical_potential: mu,
            };
            self.system.max_particles = Some(DEFAULT_MAX_PARTICLES);
        }
        if let Some(prefix) = &args.outfile {
            self.output.prefix = prefix.clone();
        }
        if let Some(steps) = args.steps {
            self.run.n_steps = steps;
        }
        if let Some(seed) = args.seed {
            self.run.seed = Some(seed);
        }
    }

    pub fn ndim(&self) -> usize {
        self.system.box_lengths.len()
    }

    pub fn chemical_potential(&self) -> Option<f64> {
        match self.ensemble {
            EnsembleConfig::Nvt => None,
            EnsembleConfig::MuVt { chemical_potential } => Some(chemical_potential),
        }
    }

    /// Number of particle slots: `N` for NVT, the configured ceiling for μVT.
    pub fn capacity(&self) -> usize {
        match self.ensemble {
            EnsembleConfig::Nvt => self.system.n_particles,
            EnsembleConfig::MuVt { .. } => self
                .system
                .max_particles
                .unwrap_or(DEFAULT_MAX_PARTICLES),
        }
    }

    /// Cutoff handed to the potential; negative values mean "default".
    pub fn cutoff(&self) -> Option<f64> {
        self.potential.cutoff.filter(|&rc| rc >= 0.0)
    }

    pub fn mixture(&self) -> Result<MoveMixture> {
        match (self.moves, self.ensemble) {
            (Some(m), _) => MoveMixture::new(m.displacement, m.insertion, m.deletion),
            (None, EnsembleConfig::Nvt) => Ok(MoveMixture::displacement_only()),
            (None, EnsembleConfig::MuVt { .. }) => Ok(MoveMixture::grand_canonical_default()),
        }
    }

    pub fn ensemble_params(&self) -> Result<EnsembleParams> {
        let ensemble = match self.ensemble {
            EnsembleConfig::Nvt => Ensemble::Canonical,
            EnsembleConfig::MuVt { chemical_potential } => {
                Ensemble::GrandCanonical { chemical_potential }
            }
        };
        let params = EnsembleParams {
            temperature: self.temperature,
            ensemble,
            mixture: self.mixture()?,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check everything that can be checked without building the engine.
    pub fn validate(&self) -> Result<()> {
        let edges = &self.system.box_lengths;
        if !(1..=3).contains(&edges.len()) {
            return Err(Error::config(format!(
                "box_lengths must have 1 to 3 entries, got {}",
                edges.len()
            )));
        }
        if edges.iter().any(|l| !l.is_finite() || *l <= 0.0) {
            return Err(Error::config(format!(
                "box lengths must be positive, got {edges:?}"
            )));
        }

        let capacity = self.capacity();
        if self.system.n_particles > capacity {
            return Err(Error::config(format!(
                "requested {} initial particles but the maximum is {capacity}",
                self.system.n_particles
            )));
        }

        self.ensemble_params()?;

        if let Some(rc) = self.cutoff() {
            let limit = 0.5 * edges.iter().copied().fold(f64::INFINITY, f64::min);
            if rc > limit {
                return Err(Error::config(format!(
                    "cutoff {rc} exceeds half the shortest box edge ({limit})"
                )));
            }
        }

        if self.run.sample_interval == 0 {
            return Err(Error::config("sample_interval must be at least 1"));
        }

        if let Some(sweep) = &self.sweep {
            if self.chemical_potential().is_none() {
                return Err(Error::config(
                    "a chemical-potential sweep needs the muvt ensemble",
                ));
            }
            if sweep.chemical_potentials.is_empty() {
                return Err(Error::config("sweep lists no chemical potentials"));
            }
        }
        Ok(())
    }
}
