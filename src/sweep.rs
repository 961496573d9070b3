use crate::error::Result;
use crate::gcmc::{MonteCarloEngine, MoveKind};
use crate::tally::{MeanStd, Tally};
use rayon::prelude::*;
use std::io::Write;
use tracing::debug;

/// Averages of one independent chain in a parallel sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    pub chemical_potential: Option<f64>,
    pub temperature: f64,
    pub n_samples: usize,
    pub active_count: MeanStd,
    pub density: MeanStd,
    pub energy: MeanStd,
    pub pressure: MeanStd,
    pub displacement_acceptance: f64,
    pub insertion_acceptance: f64,
    pub deletion_acceptance: f64,
    pub capacity_rejections: u64,
}

impl SweepResult {
    /// Mean energy per particle, zero for an empty box.
    pub fn energy_per_particle(&self) -> f64 {
        if self.active_count.mean > 0.0 {
            self.energy.mean / self.active_count.mean
        } else {
            0.0
        }
    }
}

/// Run independent engines concurrently, one chain per engine.
///
/// Each chain equilibrates for `equilibration_steps`, then samples every
/// `sample_interval` steps during `production_steps`. Chains never share
/// state; results come back in input order.
pub fn parallel_sweep<const D: usize>(
    engines: Vec<MonteCarloEngine<D>>,
    equilibration_steps: usize,
    production_steps: usize,
    sample_interval: usize,
) -> Vec<SweepResult> {
    let interval = sample_interval.max(1);
    engines
        .into_par_iter()
        .map(|mut engine| {
            engine.run(equilibration_steps);

            let mut tally = Tally::new();
            for step in 0..production_steps {
                engine.step();
                if step % interval == 0 {
                    tally.record(engine.sample());
                }
            }

            let stats = engine.statistics();
            let averages = tally.averages();
            debug!(
                "sweep chain mu={:?} finished: N={}, samples={}",
                engine.chemical_potential(),
                engine.active_count(),
                tally.len()
            );

            SweepResult {
                chemical_potential: engine.chemical_potential(),
                temperature: engine.temperature(),
                n_samples: tally.len(),
                active_count: averages.map(|a| a.active_count).unwrap_or_default(),
                density: averages.map(|a| a.density).unwrap_or_default(),
                energy: averages.map(|a| a.energy).unwrap_or_default(),
                pressure: averages.map(|a| a.pressure).unwrap_or_default(),
                displacement_acceptance: stats.acceptance_ratio(MoveKind::Displacement),
                insertion_acceptance: stats.acceptance_ratio(MoveKind::Insertion),
                deletion_acceptance: stats.acceptance_ratio(MoveKind::Deletion),
                capacity_rejections: stats.capacity_rejections,
            }
        })
        .collect()
}

/// Tabulate sweep results, one chain per line.
pub fn write_sweep<W: Write>(writer: &mut W, results: &[SweepResult]) -> Result<()> {
    writeln!(
        writer,
        "# mu T N N_std rho rho_std U/N P P_std fa_translate fa_insert fa_delete"
    )?;
    for r in results {
        writeln!(
            writer,
            "{:.6} {:.6} {:.4} {:.4} {:.6} {:.6} {:.6} {:.6} {:.6} {:.4} {:.4} {:.4}",
            r.chemical_potential.unwrap_or(f64::NAN),
            r.temperature,
            r.active_count.mean,
            r.active_count.std,
            r.density.mean,
            r.density.std,
            r.energy_per_particle(),
            r.pressure.mean,
            r.pressure.std,
            r.displacement_acceptance,
            r.insertion_acceptance,
            r.deletion_acceptance
        )?;
    }
    Ok(())
}
