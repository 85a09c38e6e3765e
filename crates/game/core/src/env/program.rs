//! Behavior programs: the authored logic behind every state.

use crate::character::StateController;

/// Drives one entity for one tick.
///
/// The same program instance serves every entity; it tells them apart through
/// the controller (`ctl.me().id`, `helper_id`, `state_no`, ...). Programs must
/// be pure functions of what the controller exposes so that re-simulation
/// reproduces the same tick.
pub trait BehaviorProgram: Send + Sync {
    fn step(&self, ctl: &mut StateController<'_>);
}

impl<F> BehaviorProgram for F
where
    F: Fn(&mut StateController<'_>) + Send + Sync,
{
    fn step(&self, ctl: &mut StateController<'_>) {
        self(ctl)
    }
}

/// Program that never acts.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdleProgram;

impl BehaviorProgram for IdleProgram {
    fn step(&self, _ctl: &mut StateController<'_>) {}
}
