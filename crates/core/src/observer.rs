use crate::Snapshot;

/// Receives events from a running simulation.
///
/// Observers are passive: they see each step after it completes but cannot
/// alter or stop the run.
///
/// Implemented for `()` (ignores all events) and for any `FnMut(&E)` closure.
pub trait Observer<E> {
    /// Handles one event.
    fn observe(&mut self, event: &E);
}

impl<E> Observer<E> for () {
    fn observe(&mut self, _event: &E) {}
}

impl<E, F> Observer<E> for F
where
    F: FnMut(&E),
{
    fn observe(&mut self, event: &E) {
        self(event);
    }
}

/// Event emitted after each step of [`System::simulate_observed`].
///
/// [`System::simulate_observed`]: crate::System::simulate_observed
#[derive(Debug, Clone, Copy)]
pub struct StepEvent<'a> {
    /// Zero-based index of the step that just completed.
    pub step: usize,

    /// The values recorded at the end of the step.
    pub snapshot: &'a Snapshot,
}
