use crate::particles::ForceView;
use glam::DVec3;

/// Fills the force array from the current configuration.
///
/// The driver zeroes `f` before each call, so implementations accumulate
/// into it. Everything else in the view is read-only.
pub trait ForceStage {
    fn compute(&mut self, view: ForceView<'_>);
}

/// Leaves forces at zero
#[derive(Debug, Clone, Copy, Default)]
pub struct NoForce;

impl ForceStage for NoForce {
    fn compute(&mut self, _view: ForceView<'_>) {}
}

/// The same external force on every particle
#[derive(Debug, Clone, Copy)]
pub struct BodyForce(pub DVec3);

impl ForceStage for BodyForce {
    fn compute(&mut self, view: ForceView<'_>) {
        for f in view.f.iter_mut() {
            *f += self.0;
        }
    }
}

/// Adapts a closure into a force stage
pub struct FnForce<F>(pub F);

impl<F> FnForce<F>
where
    F: FnMut(ForceView<'_>),
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> ForceStage for FnForce<F>
where
    F: FnMut(ForceView<'_>),
{
    fn compute(&mut self, view: ForceView<'_>) {
        (self.0)(view)
    }
}

impl<S: ForceStage + ?Sized> ForceStage for Box<S> {
    fn compute(&mut self, view: ForceView<'_>) {
        (**self).compute(view)
    }
}
