mod moves;

#[cfg(test)]
mod tests;

pub use moves::{AcceptanceInput, MoveKind, MoveMixture, MoveStatistics};

use crate::error::{Error, Result};
use crate::lj_pot::{ForceProvider, LennardJones};
use crate::particles::ParticleSystem;
use crate::tally::Sample;
use nalgebra::SVector;
use rand::prelude::*;
use rand::rngs::StdRng;
use tracing::{debug, trace};

/// Which thermodynamic ensemble the engine samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ensemble {
    /// Fixed N, V, T.
    Canonical,
    /// Fixed μ, V, T; the particle count fluctuates.
    GrandCanonical { chemical_potential: f64 },
}

/// Temperature, ensemble and move mixture of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnsembleParams {
    /// Temperature in reduced units (k_B = 1)
    pub temperature: f64,
    pub ensemble: Ensemble,
    pub mixture: MoveMixture,
}

impl EnsembleParams {
    /// NVT with displacement moves only.
    pub fn canonical(temperature: f64) -> Self {
        Self {
            temperature,
            ensemble: Ensemble::Canonical,
            mixture: MoveMixture::displacement_only(),
        }
    }

    /// μVT with 60% displacement and 20% each insertion and deletion.
    pub fn grand_canonical(temperature: f64, chemical_potential: f64) -> Self {
        Self {
            temperature,
            ensemble: Ensemble::GrandCanonical { chemical_potential },
            mixture: MoveMixture::grand_canonical_default(),
        }
    }

    pub fn with_mixture(mut self, mixture: MoveMixture) -> Self {
        self.mixture = mixture;
        self
    }

    pub fn beta(&self) -> f64 {
        1.0 / self.temperature
    }

    pub fn chemical_potential(&self) -> Option<f64> {
        match self.ensemble {
            Ensemble::Canonical => None,
            Ensemble::GrandCanonical { chemical_potential } => Some(chemical_potential),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(Error::config(format!(
                "temperature must be positive, got {}",
                self.temperature
            )));
        }
        match self.ensemble {
            Ensemble::Canonical if self.mixture.changes_particle_count() => Err(Error::config(
                "the canonical ensemble cannot use insertion or deletion moves",
            )),
            Ensemble::GrandCanonical { chemical_potential } if chemical_potential.is_nan() => {
                Err(Error::config("chemical potential must be a number"))
            }
            _ => Ok(()),
        }
    }
}

/// Result of one call to [`MonteCarloEngine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub kind: MoveKind,
    pub accepted: bool,
}

/// A trial configuration built from a snapshot of the live system.
struct Proposal<const D: usize> {
    kind: MoveKind,
    /// Slot whose environment is evaluated.
    index: usize,
    trial: ParticleSystem<D>,
    old_energy: f64,
}

/// A proposal together with its candidate energy and acceptance probability.
struct Evaluated<const D: usize> {
    proposal: Proposal<D>,
    new_energy: f64,
    probability: f64,
}

/// Metropolis Monte Carlo engine for a Lennard-Jones fluid.
///
/// Every [`step`](MonteCarloEngine::step) runs one full cycle: select a move
/// kind, build a trial configuration from a snapshot, evaluate the
/// one-particle energies before and after, apply the ensemble's acceptance
/// rule and either commit the trial (by moving it into place) or drop it.
///
/// The engine is the only owner of the live particle state and the move
/// counters.
#[derive(Debug)]
pub struct MonteCarloEngine<const D: usize> {
    lj: LennardJones<D>,
    system: ParticleSystem<D>,
    params: EnsembleParams,
    beta: f64,
    rng: StdRng,
    /// Running total potential energy
    energy: f64,
    steps: u64,
    stats: MoveStatistics,
}

impl<const D: usize> MonteCarloEngine<D> {
    /// Validate the setup and compute the initial total energy.
    pub fn new(
        lj: LennardJones<D>,
        system: ParticleSystem<D>,
        params: EnsembleParams,
        rng: StdRng,
    ) -> Result<Self> {
        lj.validate()?;
        params.validate()?;

        let energy = lj.total_energy(&system);
        debug!(
            "Monte Carlo engine: ndim={}, N={}, capacity={}, V={:.4}, rc={:.4}, T={}, ensemble={:?}",
            D,
            system.active_count(),
            system.capacity(),
            lj.domain().volume(),
            lj.cutoff(),
            params.temperature,
            params.ensemble
        );

        Ok(Self {
            lj,
            system,
            beta: params.beta(),
            params,
            rng,
            energy,
            steps: 0,
            stats: MoveStatistics::new(),
        })
    }

    /// Like [`MonteCarloEngine::new`], seeding the generator from `seed` or,
    /// without one, from system entropy.
    pub fn from_seed(
        lj: LennardJones<D>,
        system: ParticleSystem<D>,
        params: EnsembleParams,
        seed: Option<u64>,
    ) -> Result<Self> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(lj, system, params, rng)
    }

    /// Perform one Monte Carlo trial move.
    pub fn step(&mut self) -> MoveOutcome {
        let kind = self.params.mixture.select(self.rng.gen::<f64>());

        let accepted = match self.propose(kind) {
            Some(proposal) => {
                let evaluated = self.evaluate(proposal);
                self.decide(evaluated)
            }
            None => false,
        };

        self.stats.record(kind, accepted);
        self.steps += 1;
        MoveOutcome { kind, accepted }
    }

    /// Perform `n_steps` trial moves.
    pub fn run(&mut self, n_steps: usize) {
        for _ in 0..n_steps {
            self.step();
        }
    }

    /// Build the trial configuration for `kind`, or `None` when the move
    /// cannot be attempted (no particle to touch, or no free slot).
    fn propose(&mut self, kind: MoveKind) -> Option<Proposal<D>> {
        let n = self.system.active_count();
        match kind {
            MoveKind::Displacement => {
                if n == 0 {
                    return None;
                }
                let index = self.rng.gen_range(0..n);
                let old_energy = self.lj.one_particle_energy(&self.system, index);
                let trial = self
                    .system
                    .snapshot()
                    .displace_trial(index, self.lj.domain(), &mut self.rng);
                Some(Proposal {
                    kind,
                    index,
                    trial,
                    old_energy,
                })
            }
            MoveKind::Insertion => {
                match self.system.snapshot().insert_trial(self.lj.domain(), &mut self.rng) {
                    Ok((trial, index)) => Some(Proposal {
                        kind,
                        index,
                        trial,
                        old_energy: 0.0,
                    }),
                    Err(err) => {
                        trace!("insertion rejected: {err}");
                        self.stats.capacity_rejections += 1;
                        None
                    }
                }
            }
            MoveKind::Deletion => {
                if n == 0 {
                    return None;
                }
                let index = self.rng.gen_range(0..n);
                let old_energy = self.lj.one_particle_energy(&self.system, index);
                let trial = self.system.snapshot().delete_trial(index);
                Some(Proposal {
                    kind,
                    index,
                    trial,
                    old_energy,
                })
            }
        }
    }

    /// Energy of the touched particle in the trial configuration and the
    /// resulting acceptance probability.
    fn evaluate(&self, proposal: Proposal<D>) -> Evaluated<D> {
        // a deleted particle has no environment left to evaluate
        let new_energy = match proposal.kind {
            MoveKind::Deletion => 0.0,
            MoveKind::Displacement | MoveKind::Insertion => {
                self.lj.one_particle_energy(&proposal.trial, proposal.index)
            }
        };

        let input = AcceptanceInput {
            beta: self.beta,
            chemical_potential: self.params.chemical_potential().unwrap_or(0.0),
            volume: self.lj.domain().volume(),
            n_before: self.system.active_count(),
            old_energy: proposal.old_energy,
            new_energy,
        };
        let probability = proposal.kind.acceptance_probability(&input);

        Evaluated {
            proposal,
            new_energy,
            probability,
        }
    }

    /// Metropolis test; commits the trial configuration on acceptance.
    fn decide(&mut self, evaluated: Evaluated<D>) -> bool {
        let accepted = self.rng.gen::<f64>() < evaluated.probability;
        if accepted {
            self.energy += evaluated.new_energy - evaluated.proposal.old_energy;
            self.system = evaluated.proposal.trial;
        }
        accepted
    }

    /// Running total potential energy, updated incrementally on every
    /// accepted move.
    pub fn current_energy(&self) -> f64 {
        self.energy
    }

    /// Recompute the total energy from scratch and resynchronise the running
    /// value with it.
    pub fn recompute_energy(&mut self) -> f64 {
        self.energy = self.lj.total_energy(&self.system);
        self.energy
    }

    /// Virial pressure of the live configuration as seen by `evaluator`.
    pub fn current_pressure<F: ForceProvider<D>>(&self, evaluator: &F) -> f64 {
        evaluator
            .forces_and_virial(&self.system, false)
            .pressure(self.params.temperature, self.density(), self.volume())
    }

    /// Per-axis pressure of the live configuration, from the stress tensor.
    pub fn current_axis_pressures<F: ForceProvider<D>>(&self, evaluator: &F) -> SVector<f64, D> {
        let result = evaluator.forces_and_virial(&self.system, true);
        let (t, rho, v) = (self.params.temperature, self.density(), self.volume());
        result
            .axis_pressures(t, rho, v)
            .unwrap_or_else(|| SVector::repeat(result.pressure(t, rho, v)))
    }

    /// Full energy recomputation and pressure at the current step.
    pub fn sample(&mut self) -> Sample {
        let energy = self.recompute_energy();
        Sample {
            step: self.steps,
            pressure: self.current_pressure(&self.lj),
            energy,
            density: self.density(),
            active_count: self.active_count(),
            volume: self.volume(),
        }
    }

    pub fn active_count(&self) -> usize {
        self.system.active_count()
    }

    /// Read-only view of the active positions.
    pub fn positions(&self) -> &[SVector<f64, D>] {
        self.system.positions()
    }

    pub fn system(&self) -> &ParticleSystem<D> {
        &self.system
    }

    pub fn interaction(&self) -> &LennardJones<D> {
        &self.lj
    }

    pub fn params(&self) -> &EnsembleParams {
        &self.params
    }

    pub fn temperature(&self) -> f64 {
        self.params.temperature
    }

    pub fn chemical_potential(&self) -> Option<f64> {
        self.params.chemical_potential()
    }

    pub fn volume(&self) -> f64 {
        self.lj.domain().volume()
    }

    pub fn density(&self) -> f64 {
        self.active_count() as f64 / self.volume()
    }

    /// Number of steps executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn statistics(&self) -> &MoveStatistics {
        &self.stats
    }

    /// Acceptance ratios in displacement, insertion, deletion order.
    pub fn move_acceptance_ratios(&self) -> [f64; 3] {
        self.stats.acceptance_ratios()
    }
}
