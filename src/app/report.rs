use ljmc::{Averages, MonteCarloEngine, MoveKind, SweepResult};
use tracing::info;

pub fn report_run_summary<const D: usize>(
    engine: &MonteCarloEngine<D>,
    averages: Option<&Averages>,
    n_samples: usize,
) {
    info!("\nMonte Carlo run finished after {} steps.", engine.steps());

    let stats = engine.statistics();
    info!("\nMove acceptance:");
    for kind in MoveKind::ALL {
        if stats.attempts(kind) == 0 {
            continue;
        }
        info!(
            "  {:<12} {:>10} / {:<10} ({:.4})",
            kind.label(),
            stats.accepts(kind),
            stats.attempts(kind),
            stats.acceptance_ratio(kind)
        );
    }

    let Some(ave) = averages else {
        info!("\nNo samples were taken; increase n_steps or lower equilibration_steps.");
        return;
    };

    info!("\nAverages over {} samples:", n_samples);
    info!("  N   = {:.4} +/- {:.4}", ave.active_count.mean, ave.active_count.std);
    info!("  rho = {:.6} +/- {:.6}", ave.density.mean, ave.density.std);
    info!("  U   = {:.6} +/- {:.6}", ave.energy.mean, ave.energy.std);
    info!("  P   = {:.6} +/- {:.6}", ave.pressure.mean, ave.pressure.std);
    if ave.active_count.mean > 0.0 {
        info!("  U/N = {:.6}", ave.energy.mean / ave.active_count.mean);
    }
}

pub fn report_sweep_summary(results: &[SweepResult]) {
    info!("\nChemical-potential sweep finished.");
    for r in results {
        info!(
            "  mu = {:>10.4}: rho = {:.6} +/- {:.6}, P = {:.6}, U/N = {:.6}",
            r.chemical_potential.unwrap_or(f64::NAN),
            r.density.mean,
            r.density.std,
            r.pressure.mean,
            r.energy_per_particle()
        );
    }
}
