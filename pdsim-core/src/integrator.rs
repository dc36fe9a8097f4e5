//! Velocity-Verlet time integration
//!
//! One timestep is `initial_integrate` (half-kick then drift), an external
//! force evaluation, then `final_integrate` (second half-kick).

use crate::execution::Execution;
use crate::particles::Particles;
use glam::DVec3;
use rayon::prelude::*;

/// Explicit velocity-Verlet integrator with fixed coefficients
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integrator {
    dtv: f64,
    dtf: f64,
    mvv2e: f64,
    execution: Execution,
}

impl Integrator {
    /// `mvv2e` converts force * time / mass into velocity units
    pub fn new(dt: f64, mvv2e: f64) -> Self {
        Self::with_execution(dt, mvv2e, Execution::default())
    }

    pub fn with_execution(dt: f64, mvv2e: f64, execution: Execution) -> Self {
        Self {
            dtv: dt,
            dtf: 0.5 * dt / mvv2e,
            mvv2e,
            execution,
        }
    }

    /// Replace the timestep, keeping the unit conversion
    pub fn set_timestep(&mut self, dt: f64) {
        self.dtv = dt;
        self.dtf = 0.5 * dt / self.mvv2e;
    }

    pub fn dtv(&self) -> f64 {
        self.dtv
    }

    pub fn dtf(&self) -> f64 {
        self.dtf
    }

    pub fn mvv2e(&self) -> f64 {
        self.mvv2e
    }

    pub fn execution(&self) -> Execution {
        self.execution
    }

    /// First half-step: `v += dtf/(rho*vol) * f`, then `x += dt * v`.
    ///
    /// Density and volume must be positive; this is not checked here.
    pub fn initial_integrate(&self, particles: &mut Particles) {
        let (dtf, dtv) = (self.dtf, self.dtv);
        let view = particles.view_mut();
        log::trace!("Integrator::Initial n={}", view.x.len());

        let kick_drift = |((((x, v), f), rho), vol): (
            (((&mut DVec3, &mut DVec3), &DVec3), &f64),
            &f64,
        )| {
            let dtfm = dtf / rho / vol;
            *v += dtfm * *f;
            *x += dtv * *v;
        };

        match self.execution {
            Execution::Serial => view
                .x
                .iter_mut()
                .zip(view.v.iter_mut())
                .zip(view.f.iter())
                .zip(view.density.iter())
                .zip(view.volume.iter())
                .for_each(kick_drift),
            Execution::Threads => view
                .x
                .par_iter_mut()
                .zip(view.v.par_iter_mut())
                .zip(view.f.par_iter())
                .zip(view.density.par_iter())
                .zip(view.volume.par_iter())
                .for_each(kick_drift),
        }
    }

    /// Second half-step: `v += dtf/(rho*vol) * f` with the freshly computed force
    pub fn final_integrate(&self, particles: &mut Particles) {
        let dtf = self.dtf;
        let view = particles.view_mut();
        log::trace!("Integrator::Final n={}", view.v.len());

        let kick = |(((v, f), rho), vol): (((&mut DVec3, &DVec3), &f64), &f64)| {
            let dtfm = dtf / rho / vol;
            *v += dtfm * *f;
        };

        match self.execution {
            Execution::Serial => view
                .v
                .iter_mut()
                .zip(view.f.iter())
                .zip(view.density.iter())
                .zip(view.volume.iter())
                .for_each(kick),
            Execution::Threads => view
                .v
                .par_iter_mut()
                .zip(view.f.par_iter())
                .zip(view.density.par_iter())
                .zip(view.volume.par_iter())
                .for_each(kick),
        }
    }
}
