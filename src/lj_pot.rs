// file: `src/lj_pot.rs`
use crate::domain::PeriodicDomain;
use crate::error::{Error, Result};
use crate::particles::ParticleSystem;
use itertools::Itertools;
use nalgebra::{SMatrix, SVector};
use rayon::prelude::*;

/// Anything that can evaluate pair forces and the virial of a configuration.
pub trait ForceProvider<const D: usize> {
    /// Forces on every active particle and the virial `Σ r·f / D`.
    ///
    /// The per-axis stress tensor `Σ r ⊗ f` is accumulated only when
    /// `with_tensor` is set.
    fn forces_and_virial(&self, system: &ParticleSystem<D>, with_tensor: bool) -> VirialResult<D>;
}

/// Output of a force/virial evaluation.
#[derive(Debug, Clone)]
pub struct VirialResult<const D: usize> {
    pub forces: Vec<SVector<f64, D>>,
    /// Virial sum already divided by the dimensionality.
    pub virial: f64,
    pub stress: Option<SMatrix<f64, D, D>>,
}

impl<const D: usize> VirialResult<D> {
    /// Virial pressure `P = T·ρ + W/V`.
    pub fn pressure(&self, temperature: f64, density: f64, volume: f64) -> f64 {
        temperature * density + self.virial / volume
    }

    /// Diagonal pressure components `P_aa = T·ρ + W_aa/V`, when the stress
    /// tensor was accumulated.
    pub fn axis_pressures(
        &self,
        temperature: f64,
        density: f64,
        volume: f64,
    ) -> Option<SVector<f64, D>> {
        self.stress.as_ref().map(|stress| {
            SVector::from_fn(|k, _| temperature * density + stress[(k, k)] / volume)
        })
    }
}

/// Truncated (unshifted) Lennard-Jones pair potential in a periodic box.
///
/// All energies and distances are in reduced units. Every separation goes
/// through the domain's minimum-image wrap, and the cutoff test uses squared
/// distances.
#[derive(Debug, Clone)]
pub struct LennardJones<const D: usize> {
    pub epsilon: f64,
    pub sigma: f64,
    /// 4εσ¹²
    a: f64,
    /// 4εσ⁶
    b: f64,
    /// 48εσ¹²
    force_a: f64,
    /// 24εσ⁶
    force_b: f64,
    cutoff: f64,
    cutoff2: f64,
    domain: PeriodicDomain<D>,
}

impl<const D: usize> LennardJones<D> {
    /// Reduced-unit potential (σ = ε = 1) with the default cutoff.
    pub fn new(domain: PeriodicDomain<D>) -> Self {
        Self::with_parameters(domain, 1.0, 1.0, None)
    }

    pub fn with_parameters(
        domain: PeriodicDomain<D>,
        sigma: f64,
        epsilon: f64,
        cutoff: Option<f64>,
    ) -> Self {
        let mut lj = LennardJones {
            epsilon,
            sigma,
            a: 0.0,
            b: 0.0,
            force_a: 0.0,
            force_b: 0.0,
            cutoff: 0.0,
            cutoff2: 0.0,
            domain,
        };
        lj.set_parameters(sigma, epsilon, cutoff);
        lj
    }

    /// Store σ, ε and the cutoff together with the derived prefactors.
    ///
    /// A missing or negative cutoff selects half of the shortest box edge.
    /// A cutoff beyond that would count more than one image of a particle;
    /// [`LennardJones::validate`] reports it.
    pub fn set_parameters(&mut self, sigma: f64, epsilon: f64, cutoff: Option<f64>) {
        let sigma6 = sigma.powi(6);
        let sigma12 = sigma6 * sigma6;
        self.sigma = sigma;
        self.epsilon = epsilon;
        self.a = 4.0 * epsilon * sigma12;
        self.b = 4.0 * epsilon * sigma6;
        self.force_a = 48.0 * epsilon * sigma12;
        self.force_b = 24.0 * epsilon * sigma6;
        self.cutoff = match cutoff {
            Some(rc) if rc >= 0.0 => rc,
            _ => self.domain.min_half_length(),
        };
        self.cutoff2 = self.cutoff * self.cutoff;
    }

    /// Reject parameter sets the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(Error::config(format!("sigma must be positive, got {}", self.sigma)));
        }
        if !self.epsilon.is_finite() {
            return Err(Error::config(format!("epsilon must be finite, got {}", self.epsilon)));
        }
        if !(self.cutoff.is_finite() && self.cutoff > 0.0) {
            return Err(Error::config(format!("cutoff must be positive, got {}", self.cutoff)));
        }
        let limit = self.domain.min_half_length();
        if self.cutoff > limit {
            return Err(Error::config(format!(
                "cutoff {} exceeds half the shortest box edge ({limit})",
                self.cutoff
            )));
        }
        Ok(())
    }

    pub fn domain(&self) -> &PeriodicDomain<D> {
        &self.domain
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn cutoff2(&self) -> f64 {
        self.cutoff2
    }

    /// Pair energy `A/r¹² − B/r⁶` for a squared separation inside the cutoff.
    #[inline]
    pub fn pair_energy(&self, r2: f64) -> f64 {
        let r6 = r2 * r2 * r2;
        self.a / (r6 * r6) - self.b / r6
    }

    /// Squared minimum-image separation of two positions.
    #[inline]
    fn separation2(&self, pi: &SVector<f64, D>, pj: &SVector<f64, D>) -> f64 {
        self.domain.wrap(pi - pj).norm_squared()
    }

    /// Interaction energy of particle `index` with every other active
    /// particle. `index` must be an active slot.
    pub fn one_particle_energy(&self, system: &ParticleSystem<D>, index: usize) -> f64 {
        let positions = system.positions();
        let target = &positions[index];
        positions
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != index)
            .map(|(_, other)| self.separation2(other, target))
            .filter(|&r2| r2 < self.cutoff2)
            .map(|r2| self.pair_energy(r2))
            .sum()
    }

    /// Total potential energy over all unique active pairs.
    ///
    /// Parallel over the outer particle; the summation order is not fixed,
    /// so the last bits may differ between runs.
    pub fn total_energy(&self, system: &ParticleSystem<D>) -> f64 {
        let positions = system.positions();
        positions
            .par_iter()
            .enumerate()
            .map(|(i, pi)| {
                positions[i + 1..]
                    .iter()
                    .map(|pj| self.separation2(pi, pj))
                    .filter(|&r2| r2 < self.cutoff2)
                    .map(|r2| self.pair_energy(r2))
                    .sum::<f64>()
            })
            .sum()
    }
}

impl<const D: usize> ForceProvider<D> for LennardJones<D> {
    fn forces_and_virial(&self, system: &ParticleSystem<D>, with_tensor: bool) -> VirialResult<D> {
        let positions = system.positions();
        let n = positions.len();
        let mut forces = vec![SVector::<f64, D>::zeros(); n];
        let mut virial = 0.0;
        let mut stress = with_tensor.then(SMatrix::<f64, D, D>::zeros);

        for (i, j) in (0..n).tuple_combinations() {
            let rij = self.domain.wrap(positions[i] - positions[j]);
            let r2 = rij.norm_squared();
            if r2 >= self.cutoff2 {
                continue;
            }

            let r6 = r2 * r2 * r2;
            let fij = rij * ((self.force_a / (r6 * r6) - self.force_b / r6) / r2);

            forces[i] += fij;
            forces[j] -= fij;
            virial += rij.dot(&fij);
            if let Some(stress) = stress.as_mut() {
                *stress += rij * fij.transpose();
            }
        }

        VirialResult {
            forces,
            virial: virial / D as f64,
            stress,
        }
    }
}
