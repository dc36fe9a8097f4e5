//! End-to-end tests of the driver loop

use glam::DVec3;
use pdsim_core::tests::test_helpers::{approx_eq, lattice, load_deck, vec_approx_eq};
use pdsim_core::{
    parse_deck, run_deck, run_parsed, BodyForce, Error, Execution, FnForce, ForceView,
    Integrator, ParticleInit, Particles, ProcessContext, Reporter, Simulation,
};

fn coordinator() -> Reporter<Vec<u8>> {
    Reporter::new(ProcessContext::single(), Vec::new())
}

#[test]
fn test_free_fall_deck() {
    let source = load_deck("free_fall.deck").expect("fixture");
    let mut reporter = coordinator();

    let summary = run_deck(&source, &mut reporter).expect("run");

    assert_eq!(summary.steps, 100);
    assert_eq!(summary.particles, 2);
    assert!(approx_eq(summary.time, 1.0, 1e-12));
    // mass 1 each: vy = -9.81 at t = 1, plus vx = 1 on the second particle
    assert!(approx_eq(summary.kinetic_energy, 2.0 * 0.5 * 9.81 * 9.81 + 0.5, 1e-8));
    assert!(vec_approx_eq(summary.momentum, DVec3::new(1.0, -2.0 * 9.81, 0.0), 1e-9));

    let out = String::from_utf8(reporter.into_inner()).expect("utf8");
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 5, "4 status lines and a summary: {}", out);
    assert!(lines[0].starts_with("step 25 "));
    assert!(lines[4].starts_with("finished 100 steps"));
}

#[test]
fn test_drift_deck_moves_in_straight_lines() {
    let source = load_deck("drift.deck").expect("fixture");
    let mut reporter = coordinator();

    let summary = run_deck(&source, &mut reporter).expect("run");

    assert_eq!(summary.steps, 10);
    // Energy is exactly conserved without force
    let expected = 0.5 * 14.0 + 0.5 * 0.75 * 1.0;
    assert!(approx_eq(summary.kinetic_energy, expected, 1e-12));
}

#[test]
fn test_non_coordinator_runs_silently() {
    let source = load_deck("free_fall.deck").expect("fixture");
    let mut reporter = Reporter::new(ProcessContext::new(2, 4), Vec::new());

    let summary = run_deck(&source, &mut reporter).expect("run");

    assert_eq!(summary.steps, 100);
    assert!(reporter.into_inner().is_empty());
}

#[test]
fn test_broken_decks_fail_without_panic() {
    for name in [
        "broken/zero_density.deck",
        "broken/missing_steps.deck",
        "broken/bad_timestep.deck",
        "broken/unknown_keyword.deck",
    ] {
        let source = load_deck(name).expect("fixture");
        let mut reporter = coordinator();
        let result = run_deck(&source, &mut reporter);
        assert!(
            matches!(result, Err(Error::Parse(_)) | Err(Error::Validation(_))),
            "{} should fail",
            name
        );
    }
}

#[test]
fn test_step_orders_kick_force_kick() {
    // The second half-kick must see the force computed at the drifted position
    let stage = FnForce::new(|view: ForceView<'_>| {
        for (f, x) in view.f.iter_mut().zip(view.x) {
            *f = -*x;
        }
    });
    let mut particles = Particles::new();
    particles.push(ParticleInit::at(DVec3::new(1.0, 0.0, 0.0), 1.0, 1.0));

    let dt = 0.1;
    let mut sim = Simulation::new(particles, Integrator::new(dt, 1.0), stage).expect("valid");
    sim.step().expect("step");

    // v_half = -0.5*dt*1, x1 = 1 + dt*v_half, v1 = v_half - 0.5*dt*x1
    let v_half = -0.05;
    let x1 = 1.0 + dt * v_half;
    let v1 = v_half - 0.05 * x1;
    assert!(approx_eq(sim.particles().x()[0].x, x1, 1e-15));
    assert!(approx_eq(sim.particles().v()[0].x, v1, 1e-15));
    assert!(approx_eq(sim.time(), dt, 1e-15));
}

#[test]
fn test_harmonic_oscillator_energy_is_bounded() {
    let k = 4.0;
    let stage = FnForce::new(move |view: ForceView<'_>| {
        for (f, x) in view.f.iter_mut().zip(view.x) {
            *f = -k * *x;
        }
    });
    let energy = |p: &Particles| p.kinetic_energy() + 0.5 * k * p.x()[0].length_squared();

    let mut particles = Particles::new();
    particles.push(ParticleInit::at(DVec3::new(1.0, 0.0, 0.0), 1.0, 1.0));
    let mut sim = Simulation::new(particles, Integrator::new(0.01, 1.0), stage).expect("valid");
    let e0 = energy(sim.particles());

    let mut max_drift: f64 = 0.0;
    for _ in 0..5000 {
        sim.step().expect("step");
        max_drift = max_drift.max((energy(sim.particles()) - e0).abs() / e0);
    }

    assert!(max_drift < 1e-3, "relative energy drift {}", max_drift);
}

#[test]
fn test_simulation_is_deterministic() {
    let run = || {
        let mut sim = Simulation::new(
            lattice(100),
            Integrator::new(0.01, 1.0),
            BodyForce(DVec3::new(0.5, -1.0, 0.25)),
        )
        .expect("valid");
        let mut reporter = coordinator();
        sim.run(200, &mut reporter, 50).expect("run");
        (sim.summary(), reporter.into_inner())
    };

    let (a, out_a) = run();
    let (b, out_b) = run();
    assert_eq!(a, b);
    assert_eq!(out_a, out_b);
}

#[test]
fn test_particles_added_between_steps_receive_forces() {
    let mut sim = Simulation::new(
        lattice(2),
        Integrator::new(0.1, 1.0),
        BodyForce(DVec3::new(1.0, 0.0, 0.0)),
    )
    .expect("valid");
    sim.step().expect("step");

    sim.particles_mut().push(ParticleInit::at(DVec3::ZERO, 1.0, 1.0));
    sim.step().expect("step");

    // The new particle started at rest and got one full kick-drift-kick
    assert!(vec_approx_eq(sim.particles().v()[2], DVec3::new(0.1, 0.0, 0.0), 1e-12));
    assert!(vec_approx_eq(sim.particles().x()[2], DVec3::new(0.005, 0.0, 0.0), 1e-12));
}

#[test]
fn test_force_stage_accumulates_into_zeroed_forces() {
    let stage = FnForce::new(|view: ForceView<'_>| {
        for f in view.f.iter_mut() {
            *f += DVec3::new(0.0, 0.0, 1.0);
        }
    });
    let mut sim = Simulation::new(lattice(5), Integrator::new(0.01, 1.0), stage).expect("valid");

    for _ in 0..10 {
        sim.step().expect("step");
    }

    assert!(sim
        .particles()
        .f()
        .iter()
        .all(|f| *f == DVec3::new(0.0, 0.0, 1.0)));
}

#[test]
fn test_force_stage_sees_the_validated_particle_set() {
    let seen = std::cell::RefCell::new(Vec::new());
    let stage = FnForce::new(|view: ForceView<'_>| {
        let min_mass = (0..view.len()).map(|i| view.mass(i)).fold(f64::INFINITY, f64::min);
        seen.borrow_mut().push((view.len(), view.f.len(), view.kind.len(), min_mass));
    });
    let mut sim = Simulation::new(lattice(3), Integrator::new(0.01, 1.0), stage).expect("valid");
    sim.step().expect("step");
    sim.particles_mut().push(ParticleInit::at(DVec3::ZERO, 2.0, 0.25));
    sim.step().expect("step");
    drop(sim);

    let seen = seen.into_inner();
    // initial evaluation, one per step, one after the external edit
    assert_eq!(seen.len(), 4);
    for (i, &(n, nf, nk, min_mass)) in seen.iter().enumerate() {
        let expected = if i < 2 { 3 } else { 4 };
        assert_eq!((n, nf, nk), (expected, expected, expected), "call {}", i);
        assert!(min_mass > 0.0, "call {}", i);
    }
}

#[test]
fn test_simulation_rejects_bad_integrator_coefficients() {
    for (dt, mvv2e) in [(0.0, 1.0), (-0.1, 1.0), (f64::NAN, 1.0), (0.1, 0.0), (0.1, -2.0)] {
        let result = Simulation::new(lattice(2), Integrator::new(dt, mvv2e), BodyForce(DVec3::X));
        assert!(
            matches!(result, Err(Error::InvalidParam(_))),
            "dt={} mvv2e={} must be rejected",
            dt,
            mvv2e
        );
    }
}

#[test]
fn test_run_parsed_honours_overridden_backend() {
    let source = load_deck("free_fall.deck").expect("fixture");
    let mut deck = parse_deck(&source).expect("Should parse");
    assert_eq!(deck.execution, Execution::Threads);

    let threaded = run_parsed(&deck, &mut coordinator()).expect("run");
    deck.execution = Execution::Serial;
    let serial = run_parsed(&deck, &mut coordinator()).expect("run");

    assert_eq!(threaded, serial);
    assert_eq!(serial, run_deck(&source, &mut coordinator()).expect("run"));
}
