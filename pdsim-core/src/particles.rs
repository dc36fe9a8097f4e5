//! Structure-of-arrays particle store
//!
//! Every per-particle field lives in its own contiguous array. All arrays are
//! grown and shrunk together, so slot `i` always names the same particle.

use glam::DVec3;

/// Initial values for a single particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleInit {
    pub x: DVec3,
    pub v: DVec3,
    pub density: f64,
    pub volume: f64,
    pub kind: i32,
}

impl ParticleInit {
    /// A particle at rest at `x`
    pub fn at(x: DVec3, density: f64, volume: f64) -> Self {
        Self {
            x,
            v: DVec3::ZERO,
            density,
            volume,
            kind: 0,
        }
    }

    pub fn with_velocity(mut self, v: DVec3) -> Self {
        self.v = v;
        self
    }

    pub fn with_kind(mut self, kind: i32) -> Self {
        self.kind = kind;
        self
    }
}

/// Particle fields stored as parallel arrays
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Particles {
    x: Vec<DVec3>,
    v: Vec<DVec3>,
    f: Vec<DVec3>,
    density: Vec<f64>,
    volume: Vec<f64>,
    kind: Vec<i32>,
}

/// Borrowed fields for one integration call.
///
/// Holding this view borrows the store, so the particle count cannot change
/// while a kernel runs.
pub struct IntegrationView<'a> {
    pub x: &'a mut [DVec3],
    pub v: &'a mut [DVec3],
    pub f: &'a [DVec3],
    pub density: &'a [f64],
    pub volume: &'a [f64],
}

/// Borrowed fields for one force evaluation.
///
/// Only `f` is writable; positions, velocities and material data are fixed
/// and the particle count cannot change while the view is alive.
pub struct ForceView<'a> {
    pub x: &'a [DVec3],
    pub v: &'a [DVec3],
    pub f: &'a mut [DVec3],
    pub density: &'a [f64],
    pub volume: &'a [f64],
    pub kind: &'a [i32],
}

impl ForceView<'_> {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn mass(&self, i: usize) -> f64 {
        self.density[i] * self.volume[i]
    }
}

impl Particles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            x: Vec::with_capacity(n),
            v: Vec::with_capacity(n),
            f: Vec::with_capacity(n),
            density: Vec::with_capacity(n),
            volume: Vec::with_capacity(n),
            kind: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Append a particle with zero force
    pub fn push(&mut self, p: ParticleInit) {
        self.x.push(p.x);
        self.v.push(p.v);
        self.f.push(DVec3::ZERO);
        self.density.push(p.density);
        self.volume.push(p.volume);
        self.kind.push(p.kind);
    }

    /// Grow or shrink to `n` particles, filling new slots from `template`
    pub fn resize(&mut self, n: usize, template: ParticleInit) {
        self.x.resize(n, template.x);
        self.v.resize(n, template.v);
        self.f.resize(n, DVec3::ZERO);
        self.density.resize(n, template.density);
        self.volume.resize(n, template.volume);
        self.kind.resize(n, template.kind);
    }

    /// Keep only the particles for which `keep(i, self)` is true.
    ///
    /// Surviving particles keep their relative order.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(usize, &Particles) -> bool,
    {
        let mask: Vec<bool> = (0..self.len()).map(|i| keep(i, self)).collect();
        retain_by_mask(&mut self.x, &mask);
        retain_by_mask(&mut self.v, &mask);
        retain_by_mask(&mut self.f, &mask);
        retain_by_mask(&mut self.density, &mask);
        retain_by_mask(&mut self.volume, &mask);
        retain_by_mask(&mut self.kind, &mask);
    }

    /// Zero the accumulated force on every particle
    pub fn reset_forces(&mut self) {
        self.f.fill(DVec3::ZERO);
    }

    pub fn x(&self) -> &[DVec3] {
        &self.x
    }

    pub fn v(&self) -> &[DVec3] {
        &self.v
    }

    pub fn f(&self) -> &[DVec3] {
        &self.f
    }

    pub fn density(&self) -> &[f64] {
        &self.density
    }

    pub fn volume(&self) -> &[f64] {
        &self.volume
    }

    pub fn kind(&self) -> &[i32] {
        &self.kind
    }

    pub fn x_mut(&mut self) -> &mut [DVec3] {
        &mut self.x
    }

    pub fn v_mut(&mut self) -> &mut [DVec3] {
        &mut self.v
    }

    /// Force array, written by the force stage
    pub fn f_mut(&mut self) -> &mut [DVec3] {
        &mut self.f
    }

    pub fn density_mut(&mut self) -> &mut [f64] {
        &mut self.density
    }

    pub fn volume_mut(&mut self) -> &mut [f64] {
        &mut self.volume
    }

    /// Split-borrow the fields the integrator touches
    pub fn view_mut(&mut self) -> IntegrationView<'_> {
        IntegrationView {
            x: &mut self.x,
            v: &mut self.v,
            f: &self.f,
            density: &self.density,
            volume: &self.volume,
        }
    }

    /// Split-borrow for a force stage: `f` writable, everything else read-only
    pub fn force_view(&mut self) -> ForceView<'_> {
        ForceView {
            x: &self.x,
            v: &self.v,
            f: &mut self.f,
            density: &self.density,
            volume: &self.volume,
            kind: &self.kind,
        }
    }

    pub fn mass(&self, i: usize) -> f64 {
        self.density[i] * self.volume[i]
    }

    /// Total kinetic energy, `sum(0.5 * m * |v|^2)`
    pub fn kinetic_energy(&self) -> f64 {
        self.v
            .iter()
            .enumerate()
            .map(|(i, v)| 0.5 * self.mass(i) * v.length_squared())
            .sum()
    }

    pub fn momentum(&self) -> DVec3 {
        self.v
            .iter()
            .enumerate()
            .map(|(i, v)| *v * self.mass(i))
            .sum()
    }
}

impl FromIterator<ParticleInit> for Particles {
    fn from_iter<I: IntoIterator<Item = ParticleInit>>(iter: I) -> Self {
        let mut particles = Particles::new();
        for p in iter {
            particles.push(p);
        }
        particles
    }
}

fn retain_by_mask<T>(values: &mut Vec<T>, mask: &[bool]) {
    let mut idx = 0;
    values.retain(|_| {
        let keep = mask[idx];
        idx += 1;
        keep
    });
}
