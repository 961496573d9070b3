//! Monte Carlo simulation of a single-species Lennard-Jones fluid in a
//! rectangular periodic box, in the canonical (NVT) and grand-canonical
//! (μVT) ensembles.

pub mod config;
pub mod domain;
pub mod error;
pub mod gcmc;
pub mod lj_pot;
pub mod particles;
pub mod sweep;
pub mod tally;
pub mod trajectory;

pub use domain::PeriodicDomain;
pub use error::{Error, Result};
pub use gcmc::{
    AcceptanceInput, Ensemble, EnsembleParams, MonteCarloEngine, MoveKind, MoveMixture,
    MoveOutcome, MoveStatistics,
};
pub use lj_pot::{ForceProvider, LennardJones, VirialResult};
pub use particles::ParticleSystem;
pub use sweep::{parallel_sweep, SweepResult};
pub use tally::{Averages, MeanStd, Sample, Tally};
pub use trajectory::XyzWriter;
