use crate::ast::{Deck, ForceDecl};
use crate::error::{Error, Result};
use crate::force::{BodyForce, ForceStage, NoForce};
use crate::integrator::Integrator;
use crate::parser::parse_deck;
use crate::particles::{ParticleInit, Particles};
use crate::report;
use crate::report::Reporter;
use crate::validate::{check_deck, check_particles};
use glam::DVec3;
use std::io::Write;

/// State at the end of a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub steps: u64,
    pub time: f64,
    pub particles: usize,
    pub kinetic_energy: f64,
    pub momentum: DVec3,
}

/// Drives the velocity-Verlet loop around an external force stage
pub struct Simulation<S: ForceStage> {
    particles: Particles,
    integrator: Integrator,
    stage: S,
    step: u64,
    time: f64,
    /// Set when particles were handed out mutably; re-validated on the next step
    dirty: bool,
}

impl<S: ForceStage> Simulation<S> {
    /// Validate the integrator and particles, then evaluate the initial forces
    pub fn new(particles: Particles, integrator: Integrator, stage: S) -> Result<Self> {
        check_integrator(&integrator)?;
        ensure_valid(&particles)?;
        let mut sim = Self {
            particles,
            integrator,
            stage,
            step: 0,
            time: 0.0,
            dirty: false,
        };
        sim.compute_forces();
        Ok(sim)
    }

    /// Advance one timestep: half-kick and drift, force evaluation, half-kick
    pub fn step(&mut self) -> Result<()> {
        if self.dirty {
            ensure_valid(&self.particles)?;
            self.compute_forces();
            self.dirty = false;
        }

        self.integrator.initial_integrate(&mut self.particles);
        self.compute_forces();
        self.integrator.final_integrate(&mut self.particles);

        self.step += 1;
        self.time += self.integrator.dtv();
        Ok(())
    }

    /// Run `steps` timesteps, reporting status every `every` steps (0 = never)
    pub fn run<W: Write>(
        &mut self,
        steps: u64,
        reporter: &mut Reporter<W>,
        every: u64,
    ) -> Result<()> {
        log::debug!(
            "running {} steps on {} particles ({})",
            steps,
            self.particles.len(),
            self.integrator.execution()
        );
        for _ in 0..steps {
            self.step()?;
            if every > 0 && self.step % every == 0 {
                report!(
                    reporter,
                    "step {} time {:.6e} kinetic_energy {:.12e}",
                    self.step,
                    self.time,
                    self.particles.kinetic_energy()
                )?;
            }
        }
        Ok(())
    }

    fn compute_forces(&mut self) {
        self.particles.reset_forces();
        self.stage.compute(self.particles.force_view());
    }

    pub fn particles(&self) -> &Particles {
        &self.particles
    }

    /// Mutable access between steps, e.g. to insert or delete particles.
    ///
    /// Preconditions and forces are re-established before the next step.
    pub fn particles_mut(&mut self) -> &mut Particles {
        self.dirty = true;
        &mut self.particles
    }

    pub fn integrator(&self) -> &Integrator {
        &self.integrator
    }

    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            steps: self.step,
            time: self.time,
            particles: self.particles.len(),
            kinetic_energy: self.particles.kinetic_energy(),
            momentum: self.particles.momentum(),
        }
    }
}

/// Reject coefficients that would make every kick non-finite or reversed
fn check_integrator(integrator: &Integrator) -> Result<()> {
    let dt = integrator.dtv();
    let mvv2e = integrator.mvv2e();
    if !dt.is_finite() || dt <= 0.0 {
        return Err(Error::InvalidParam(format!(
            "timestep dt must be finite and > 0, got {}",
            dt
        )));
    }
    if !mvv2e.is_finite() || mvv2e <= 0.0 {
        return Err(Error::InvalidParam(format!(
            "mvv2e must be finite and > 0, got {}",
            mvv2e
        )));
    }
    Ok(())
}

fn ensure_valid(particles: &Particles) -> Result<()> {
    let diagnostics = check_particles(particles);
    if diagnostics.has_errors() {
        return Err(Error::Validation(diagnostics.to_string()));
    }
    Ok(())
}

/// Build the particle store declared by a deck
pub fn build_particles(deck: &Deck) -> Particles {
    deck.particles
        .iter()
        .map(|p| {
            ParticleInit::at(p.position, p.density, p.volume)
                .with_velocity(p.velocity)
                .with_kind(p.kind)
        })
        .collect()
}

/// Build a ready-to-run simulation from a parsed deck
pub fn build_simulation(deck: &Deck) -> Result<Simulation<Box<dyn ForceStage>>> {
    let diagnostics = check_deck(deck);
    if diagnostics.has_errors() {
        return Err(Error::Validation(diagnostics.to_string()));
    }
    for warning in diagnostics.iter() {
        log::debug!("{}", warning);
    }

    let integrator =
        Integrator::with_execution(deck.timestep.dt, deck.timestep.mvv2e, deck.execution);
    let stage: Box<dyn ForceStage> = match deck.force {
        ForceDecl::None => Box::new(NoForce),
        ForceDecl::Body(f) => Box::new(BodyForce(f)),
    };
    Simulation::new(build_particles(deck), integrator, stage)
}

/// Main entry point: parse, validate and run a deck, reporting on the coordinator
pub fn run_deck<W: Write>(source: &str, reporter: &mut Reporter<W>) -> Result<RunSummary> {
    let deck = parse_deck(source)?;
    run_parsed(&deck, reporter)
}

/// Validate and run an already parsed deck
pub fn run_parsed<W: Write>(deck: &Deck, reporter: &mut Reporter<W>) -> Result<RunSummary> {
    let mut sim = build_simulation(deck)?;

    sim.run(deck.steps, reporter, deck.report_every)?;

    let summary = sim.summary();
    report!(
        reporter,
        "finished {} steps, time {:.6e}, {} particles, kinetic_energy {:.12e}",
        summary.steps,
        summary.time,
        summary.particles,
        summary.kinetic_energy
    )?;
    Ok(summary)
}
