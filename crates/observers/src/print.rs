//! Line-per-step text output.

use std::io::{self, Write};

use stockflow_core::{Observer, StepEvent};

/// An observer that writes `Step {i}: {name: value, ...}` as each step completes.
///
/// The format matches [`History`](stockflow_core::History)'s `Display`, so a
/// live run and a printed history read the same. Write errors are kept and
/// returned by [`Printer::finish`]; once one occurs, later steps are skipped.
///
/// # Example
///
/// ```
/// use stockflow_core::{Flow, Stock, System, rate::Constant};
/// use stockflow_observers::Printer;
///
/// let mut system = System::new(2);
/// let a = system.add_stock(Stock::new("a", 0.0).unwrap());
/// system.add_flow(Flow::new("in").with_destination(a).with_rate(Constant(1.0)));
///
/// let mut printer = Printer::new(Vec::new());
/// system.simulate_observed(&mut printer).unwrap();
///
/// let out = String::from_utf8(printer.finish().unwrap()).unwrap();
/// assert_eq!(out, "Step 0: {a: 1}\nStep 1: {a: 2}\n");
/// ```
#[derive(Debug)]
pub struct Printer<W> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> Printer<W> {
    /// Creates a printer writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// Flushes and returns the writer.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered while writing or flushing.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

impl Printer<io::Stdout> {
    /// Creates a printer writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<'a, W: Write> Observer<StepEvent<'a>> for Printer<W> {
    fn observe(&mut self, event: &StepEvent<'a>) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = writeln!(self.out, "Step {}: {}", event.step, event.snapshot) {
            self.error = Some(err);
        }
    }
}

/// Allows `&mut Printer` to be passed to
/// [`System::simulate_observed`](stockflow_core::System::simulate_observed),
/// so [`Printer::finish`] can be called after the run.
impl<'a, W: Write> Observer<StepEvent<'a>> for &mut Printer<W> {
    fn observe(&mut self, event: &StepEvent<'a>) {
        (*self).observe(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use stockflow_core::{Flow, Stock, System, rate::Constant};

    /// A writer that always fails.
    #[derive(Debug)]
    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn system() -> System {
        let mut system = System::new(3);
        let tank = system.add_stock(Stock::bounded("tank", 0.0, 5.0).unwrap());
        system.add_stock(Stock::new("spare", 1.5).unwrap());
        system.add_flow(
            Flow::new("fill")
                .with_destination(tank)
                .with_rate(Constant(2.0)),
        );
        system
    }

    #[test]
    fn live_output_matches_history_display() {
        let mut system = system();
        let mut printer = Printer::new(Vec::new());

        system.simulate_observed(&mut printer).unwrap();

        let out = String::from_utf8(printer.finish().unwrap()).unwrap();
        assert_eq!(out, system.history().to_string());
        assert_eq!(
            out,
            "Step 0: {tank: 2, spare: 1.5}\n\
             Step 1: {tank: 4, spare: 1.5}\n\
             Step 2: {tank: 5, spare: 1.5}\n"
        );
    }

    #[test]
    fn write_error_is_reported_by_finish() {
        let mut system = system();
        let mut printer = Printer::new(Broken);

        system.simulate_observed(&mut printer).unwrap();

        let err = printer.finish().unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }
}
