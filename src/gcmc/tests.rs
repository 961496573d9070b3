use super::*;
use crate::domain::PeriodicDomain;
use approx::*;
use nalgebra::Vector3;

fn cubic_lj(l: f64) -> LennardJones<3> {
    LennardJones::with_parameters(PeriodicDomain::new([l, l, l]).unwrap(), 1.0, 1.0, None)
}

fn input(n_before: usize, old_energy: f64, new_energy: f64, mu: f64) -> AcceptanceInput {
    AcceptanceInput {
        beta: 0.5,
        chemical_potential: mu,
        volume: 1000.0,
        n_before,
        old_energy,
        new_energy,
    }
}

fn vacuum_engine(mu: f64, capacity: usize, mixture: MoveMixture, seed: u64) -> MonteCarloEngine<3> {
    let params = EnsembleParams::grand_canonical(1.5, mu).with_mixture(mixture);
    MonteCarloEngine::from_seed(cubic_lj(10.0), ParticleSystem::new(capacity), params, Some(seed))
        .unwrap()
}

#[test]
fn test_displacement_acceptance() {
    let downhill = MoveKind::Displacement.acceptance_probability(&input(10, -1.0, -3.0, 0.0));
    assert_eq!(downhill, 1.0);

    let uphill = MoveKind::Displacement.acceptance_probability(&input(10, -1.0, 1.0, 0.0));
    assert_relative_eq!(uphill, (-0.5f64 * 2.0).exp(), max_relative = 1e-12);
}

#[test]
fn test_insertion_acceptance() {
    let p = MoveKind::Insertion.acceptance_probability(&input(10, 0.0, 0.5, -10.0));
    let expected = (1000.0 / 11.0) * (0.5f64 * -10.0).exp() * (-0.5f64 * 0.5).exp();
    assert_relative_eq!(p, expected, max_relative = 1e-12);
    assert!(p < 1.0);
}

#[test]
fn test_deletion_acceptance() {
    let p = MoveKind::Deletion.acceptance_probability(&input(10, -1.5, 0.0, -2.0));
    let expected = (10.0 / 1000.0) * (0.5f64 * 2.0).exp() * (0.5f64 * -1.5).exp();
    assert_relative_eq!(p, expected, max_relative = 1e-12);
}

#[test]
fn test_insertion_and_deletion_weights_are_reciprocal() {
    // N → N+1 followed by N+1 → N with no interaction must balance exactly
    for &n in &[0usize, 1, 7, 250] {
        let ins = MoveKind::Insertion.log_acceptance(&input(n, 0.0, 0.0, -1.3));
        let del = MoveKind::Deletion.log_acceptance(&input(n + 1, 0.0, 0.0, -1.3));
        assert_abs_diff_eq!(ins + del, 0.0, epsilon = 1e-12);
    }
}

#[test]
fn test_chemical_potential_limits() {
    for &energy in &[-5.0, 0.0, 3.0, 40.0] {
        let low = MoveKind::Insertion.acceptance_probability(&input(10, 0.0, energy, -1e6));
        assert_eq!(low, 0.0);
        let high = MoveKind::Insertion.acceptance_probability(&input(10, 0.0, energy, 1e6));
        assert_eq!(high, 1.0);
    }
}

#[test]
fn test_overflow_is_an_unconditional_accept() {
    let p = MoveKind::Displacement.acceptance_probability(&input(10, 1e308, -1e308, 0.0));
    assert_eq!(p, 1.0);
    let p = MoveKind::Insertion.acceptance_probability(&input(10, 0.0, f64::NEG_INFINITY, 0.0));
    assert_eq!(p, 1.0);
}

#[test]
fn test_undefined_ratio_is_rejected() {
    let p = MoveKind::Displacement
        .acceptance_probability(&input(10, f64::INFINITY, f64::INFINITY, 0.0));
    assert_eq!(p, 0.0);
}

#[test]
fn test_mixture_validation() {
    assert!(MoveMixture::new(0.6, 0.2, 0.2).is_ok());
    assert!(MoveMixture::new(0.6, 0.2, 0.1).is_err());
    assert!(MoveMixture::new(1.2, -0.1, -0.1).is_err());
    assert!(matches!(
        MoveMixture::from_insert_delete(0.5, 0.4),
        Err(Error::Configuration(_))
    ));
    let mix = MoveMixture::from_insert_delete(0.6, 0.4).unwrap();
    assert_relative_eq!(mix.fraction(MoveKind::Deletion), 0.2, epsilon = 1e-12);
}

#[test]
fn test_mixture_selection_thresholds() {
    let mix = MoveMixture::new(0.5, 0.3, 0.2).unwrap();
    assert_eq!(mix.select(0.0), MoveKind::Displacement);
    assert_eq!(mix.select(0.49), MoveKind::Displacement);
    assert_eq!(mix.select(0.5), MoveKind::Insertion);
    assert_eq!(mix.select(0.79), MoveKind::Insertion);
    assert_eq!(mix.select(0.81), MoveKind::Deletion);
    assert_eq!(mix.select(0.999_999), MoveKind::Deletion);

    let only = MoveMixture::displacement_only();
    assert_eq!(only.select(0.999_999_999), MoveKind::Displacement);

    // rounding must not leak into a disabled kind
    let uneven = MoveMixture::new(0.1 + 0.2, 0.7 - 1e-12, 0.0).unwrap();
    assert_eq!(uneven.select(0.999_999_999_999_9), MoveKind::Insertion);
}

#[test]
fn test_canonical_rejects_particle_count_moves() {
    let params = EnsembleParams::canonical(2.0)
        .with_mixture(MoveMixture::new(0.6, 0.2, 0.2).unwrap());
    let err = MonteCarloEngine::from_seed(cubic_lj(10.0), ParticleSystem::new(10), params, Some(1))
        .unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn test_cutoff_beyond_half_box_is_rejected() {
    let lj = LennardJones::with_parameters(
        PeriodicDomain::new([10.0, 10.0, 10.0]).unwrap(),
        1.0,
        1.0,
        Some(6.0),
    );
    let err = MonteCarloEngine::from_seed(
        lj,
        ParticleSystem::new(10),
        EnsembleParams::canonical(2.0),
        Some(1),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn test_non_positive_temperature_is_rejected() {
    let err = MonteCarloEngine::from_seed(
        cubic_lj(10.0),
        ParticleSystem::new(10),
        EnsembleParams::canonical(0.0),
        Some(1),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn test_empty_system_moves_are_counted_no_ops() {
    let mix = MoveMixture::new(0.5, 0.0, 0.5).unwrap();
    let mut engine = vacuum_engine(-2.0, 50, mix, 11);
    for _ in 0..200 {
        let outcome = engine.step();
        assert!(!outcome.accepted);
    }
    let stats = engine.statistics();
    assert_eq!(stats.total_attempts(), 200);
    assert_eq!(stats.accepts(MoveKind::Displacement), 0);
    assert_eq!(stats.accepts(MoveKind::Deletion), 0);
    assert!(stats.attempts(MoveKind::Displacement) > 0);
    assert!(stats.attempts(MoveKind::Deletion) > 0);
    assert_eq!(engine.current_energy(), 0.0);
    assert_eq!(engine.active_count(), 0);
}

#[test]
fn test_grand_canonical_bootstraps_from_vacuum() {
    let mut engine = vacuum_engine(-1.0, 1000, MoveMixture::grand_canonical_default(), 5);
    engine.run(2000);
    assert!(engine.active_count() > 0);
    assert!(engine.statistics().accepts(MoveKind::Insertion) > 0);
}

#[test]
fn test_insertion_at_capacity_is_rejected_deterministically() {
    let insert_only = MoveMixture::new(0.0, 1.0, 0.0).unwrap();
    let mut engine = vacuum_engine(50.0, 20, insert_only, 3);
    engine.run(500);

    assert_eq!(engine.active_count(), 20);
    let stats = engine.statistics();
    assert_eq!(stats.attempts(MoveKind::Insertion), 500);
    assert_eq!(stats.accepts(MoveKind::Insertion), 20);
    assert!(stats.capacity_rejections > 0);
    assert!(stats.capacity_rejections <= 480);
    assert!(engine.system().is_full());
}

#[test]
fn test_rejected_moves_leave_live_state_untouched() {
    let domain = PeriodicDomain::new([10.0, 10.0, 10.0]).unwrap();
    let mut rng = StdRng::seed_from_u64(21);
    let system = ParticleSystem::random(30, 100, &domain, &mut rng).unwrap();
    let lj = LennardJones::with_parameters(domain, 1.0, 1.0, None);
    let insert_only = MoveMixture::new(0.0, 1.0, 0.0).unwrap();
    let params = EnsembleParams::grand_canonical(1.0, -1e6).with_mixture(insert_only);
    let mut engine = MonteCarloEngine::new(lj, system.clone(), params, rng).unwrap();
    let energy = engine.current_energy();

    engine.run(300);

    assert_eq!(engine.system(), &system);
    assert_eq!(engine.current_energy(), energy);
    assert_eq!(engine.statistics().accepts(MoveKind::Insertion), 0);
}

#[test]
fn test_running_energy_tracks_full_recomputation() {
    let mut engine = vacuum_engine(-2.0, 1000, MoveMixture::grand_canonical_default(), 17);
    for _ in 0..10 {
        engine.run(2000);
        let running = engine.current_energy();
        let full = engine.recompute_energy();
        assert_abs_diff_eq!(running, full, epsilon = 1e-8 * full.abs().max(1.0));
    }
    assert!(engine.active_count() > 0);
}

#[test]
fn test_move_statistics_invariants() {
    let domain = PeriodicDomain::new([8.0, 8.0, 8.0]).unwrap();
    let mut rng = StdRng::seed_from_u64(99);
    let system = ParticleSystem::random(40, 400, &domain, &mut rng).unwrap();
    let lj = LennardJones::with_parameters(domain, 1.0, 1.0, Some(3.0));
    let params = EnsembleParams::grand_canonical(2.0, -3.0);
    let mut engine = MonteCarloEngine::new(lj, system, params, rng).unwrap();

    for step in 1..=3000u64 {
        engine.step();
        if step % 500 == 0 {
            let stats = engine.statistics();
            for kind in MoveKind::ALL {
                assert!(stats.accepts(kind) <= stats.attempts(kind));
            }
            assert_eq!(stats.total_attempts(), step);
            assert_eq!(engine.steps(), step);
        }
    }
    let ratios = engine.move_acceptance_ratios();
    assert!(ratios.iter().all(|r| (0.0..=1.0).contains(r)));
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let build = || vacuum_engine(-1.5, 500, MoveMixture::grand_canonical_default(), 1234);
    let mut a = build();
    let mut b = build();
    a.run(3000);
    b.run(3000);
    assert_eq!(a.positions(), b.positions());
    assert_eq!(a.statistics(), b.statistics());
    assert_eq!(a.current_energy(), b.current_energy());
}

#[test]
fn test_deletion_then_insertion_round_trip() {
    let domain = PeriodicDomain::new([6.0, 6.0, 6.0]).unwrap();
    let lj = LennardJones::with_parameters(domain.clone(), 1.0, 1.0, None);
    let mut rng = StdRng::seed_from_u64(8);
    let base = ParticleSystem::random(6, 10, &domain, &mut rng).unwrap();

    // a particle added with a known draw can be deleted and re-added with the same draw
    let draw = StdRng::seed_from_u64(77);
    let (full, inserted) = base.snapshot().insert_trial(&domain, &mut draw.clone()).unwrap();
    let energy = lj.total_energy(&full);
    let (restored, again) = full
        .snapshot()
        .delete_trial(inserted)
        .insert_trial(&domain, &mut draw.clone())
        .unwrap();
    assert_eq!(again, inserted);
    assert_eq!(restored, full);
    assert_relative_eq!(lj.total_energy(&restored), energy, max_relative = 1e-12);

    // deleting an interior particle moves the last one into its slot
    let victim = 2;
    let removed = full.positions()[victim];
    let (refilled, slot) = full
        .snapshot()
        .delete_trial(victim)
        .insert_at_trial(removed)
        .unwrap();
    assert_eq!(slot, full.active_count() - 1);
    assert_eq!(refilled.active_count(), full.active_count());
    assert_relative_eq!(lj.total_energy(&refilled), energy, max_relative = 1e-10);
    let mut before: Vec<_> = full.positions().iter().map(|p| [p.x, p.y, p.z]).collect();
    let mut after: Vec<_> = refilled.positions().iter().map(|p| [p.x, p.y, p.z]).collect();
    before.sort_by(|a, b| a.partial_cmp(b).unwrap());
    after.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(before, after);
}

#[test]
fn test_sample_reports_consistent_state() {
    let domain = PeriodicDomain::new([10.0, 10.0, 10.0]).unwrap();
    let positions = vec![Vector3::new(1.0, 1.0, 1.0), Vector3::new(2.2, 1.0, 1.0)];
    let system = ParticleSystem::from_positions(positions, 2).unwrap();
    let lj = LennardJones::with_parameters(domain, 1.0, 1.0, Some(5.0));
    let mut engine =
        MonteCarloEngine::from_seed(lj, system, EnsembleParams::canonical(2.0), Some(4)).unwrap();

    let sample = engine.sample();
    assert_eq!(sample.step, 0);
    assert_eq!(sample.active_count, 2);
    assert_relative_eq!(sample.volume, 1000.0, epsilon = 1e-12);
    assert_relative_eq!(sample.density, 0.002, epsilon = 1e-15);
    let sr6 = (1.0f64 / 1.2).powi(6);
    assert_relative_eq!(sample.energy, 4.0 * (sr6 * sr6 - sr6), max_relative = 1e-10);

    let rf = 48.0 / 1.2f64.powi(12) - 24.0 / 1.2f64.powi(6);
    let expected = 2.0 * 0.002 + rf / 3.0 / 1000.0;
    assert_relative_eq!(sample.pressure, expected, max_relative = 1e-10);

    let axes = engine.current_axis_pressures(engine.interaction());
    assert_relative_eq!(axes.sum() / 3.0, sample.pressure, max_relative = 1e-10);
}

#[test]
fn test_empty_system_has_zero_pressure() {
    let engine = vacuum_engine(-2.0, 10, MoveMixture::grand_canonical_default(), 2);
    assert_eq!(engine.current_pressure(engine.interaction()), 0.0);
    assert_eq!(engine.density(), 0.0);
}
