use super::report::{report_run_summary, report_sweep_summary};
use crate::io::{write_sweep_file, OutputFiles};
use color_eyre::eyre::Result;
use ljmc::config::RunConfig;
use ljmc::{
    parallel_sweep, EnsembleParams, LennardJones, MonteCarloEngine, ParticleSystem,
    PeriodicDomain, Tally,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

/// Build a ready-to-run engine: random initial configuration, then the
/// same generator drives the chain.
fn build_engine<const D: usize>(
    config: &RunConfig,
    params: EnsembleParams,
    seed: Option<u64>,
) -> Result<MonteCarloEngine<D>> {
    let domain = PeriodicDomain::<D>::from_slice(&config.system.box_lengths)?;
    let potential = &config.potential;
    let lj = LennardJones::with_parameters(
        domain,
        potential.sigma,
        potential.epsilon,
        config.cutoff(),
    );

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let system = ParticleSystem::random(
        config.system.n_particles,
        config.capacity(),
        lj.domain(),
        &mut rng,
    )?;

    Ok(MonteCarloEngine::new(lj, system, params, rng)?)
}

/// One chain with `.data`, `.ave`, `.moves` and optional `.xyz` output.
pub fn run_single<const D: usize>(config: &RunConfig) -> Result<()> {
    let params = config.ensemble_params()?;
    let mut engine = build_engine::<D>(config, params, config.run.seed)?;

    info!(
        "Starting {}-D run: N={}, V={:.4}, T={}, rc={:.4}, {} steps",
        D,
        engine.active_count(),
        engine.volume(),
        engine.temperature(),
        engine.interaction().cutoff(),
        config.run.n_steps
    );

    let run = &config.run;
    let interval = run.sample_interval.max(1);
    let mut output = OutputFiles::create(&config.output.prefix, config.output.write_trajectory)?;
    let mut tally = Tally::new();

    info!("Equilibrating for {} steps", run.equilibration_steps);
    for i in 0..run.n_steps {
        engine.step();
        if i == run.equilibration_steps {
            info!(
                "Equilibration done: N={}, U={:.6}; sampling every {} steps",
                engine.active_count(),
                engine.current_energy(),
                interval
            );
        }
        if i % interval == 0 && i > run.equilibration_steps {
            let sample = engine.sample();
            debug!(
                "step {}: P={:.6}, U={:.6}, N={}",
                sample.step, sample.pressure, sample.energy, sample.active_count
            );
            output.record(&sample, engine.positions())?;
            tally.record(sample);
        }
    }

    let averages = tally.averages();
    let stats = engine.statistics().clone();
    if stats.capacity_rejections > 0 {
        warn!(
            "{} insertions were rejected because all {} particle slots were occupied",
            stats.capacity_rejections,
            engine.system().capacity()
        );
    }

    output.finish(
        averages.as_ref(),
        &stats,
        engine.temperature(),
        engine.chemical_potential(),
    )?;
    report_run_summary(&engine, averages.as_ref(), tally.len());
    Ok(())
}

/// Independent μVT chains, one per chemical potential, run in parallel.
pub fn run_sweep<const D: usize>(config: &RunConfig) -> Result<()> {
    let mixture = config.mixture()?;
    let potentials = config
        .sweep
        .as_ref()
        .map(|s| s.chemical_potentials.clone())
        .unwrap_or_default();

    info!(
        "Starting {}-D chemical-potential sweep over {} chains",
        D,
        potentials.len()
    );

    let engines = potentials
        .iter()
        .enumerate()
        .map(|(i, &mu)| {
            let params = EnsembleParams::grand_canonical(config.temperature, mu)
                .with_mixture(mixture);
            let seed = config.run.seed.map(|s| s.wrapping_add(i as u64));
            build_engine::<D>(config, params, seed)
        })
        .collect::<Result<Vec<_>>>()?;

    let run = &config.run;
    let production = run.n_steps.saturating_sub(run.equilibration_steps);
    let results = parallel_sweep(
        engines,
        run.equilibration_steps,
        production,
        run.sample_interval,
    );

    for result in results.iter().filter(|r| r.capacity_rejections > 0) {
        warn!(
            "mu={:?}: {} insertions were rejected at full capacity",
            result.chemical_potential, result.capacity_rejections
        );
    }

    write_sweep_file(&config.output.prefix, &results)?;
    report_sweep_summary(&results);
    Ok(())
}
