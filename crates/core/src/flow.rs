use std::fmt;

use thiserror::Error;

use crate::{
    Stock, StockId, Transfer,
    rate::{Levels, Rate},
};

/// Identifies a [`Flow`] within the [`System`](crate::System) that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowId(pub(crate) usize);

impl FlowId {
    /// Returns the insertion index of the flow.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Errors that can occur when a flow executes.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FlowError {
    #[error("flow `{flow}` has no rate function")]
    MissingRate { flow: String },

    #[error("flow `{flow}` produced a non-finite rate: {rate}")]
    NonFiniteRate { flow: String, rate: f64 },

    #[error("flow `{flow}` refers to unknown stock {stock}")]
    UnknownStock { flow: String, stock: StockId },
}

/// A directed transfer between up to two stocks, driven by a [`Rate`].
///
/// A flow without a source draws from outside the system (an inflow); a flow
/// without a destination drains to outside the system (an outflow). A flow
/// with neither evaluates its rate and discards it.
///
/// # Example
///
/// ```
/// use stockflow_core::{Flow, Stock, System, rate::Constant};
///
/// let mut system = System::new(2);
/// let a = system.add_stock(Stock::new("a", 10.0).unwrap());
/// let b = system.add_stock(Stock::new("b", 0.0).unwrap());
/// system.add_flow(Flow::new("a to b").with_source(a).with_destination(b).with_rate(Constant(4.0)));
///
/// system.simulate().unwrap();
/// assert_eq!(system.stock(a).unwrap().value(), 2.0);
/// assert_eq!(system.stock(b).unwrap().value(), 8.0);
/// ```
pub struct Flow {
    name: String,
    source: Option<StockId>,
    destination: Option<StockId>,
    rate: Option<Box<dyn Rate>>,
}

impl Flow {
    /// Creates a flow with no endpoints and no rate.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            destination: None,
            rate: None,
        }
    }

    /// Sets the stock this flow withdraws from.
    #[must_use]
    pub fn with_source(mut self, source: StockId) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the stock this flow deposits into.
    #[must_use]
    pub fn with_destination(mut self, destination: StockId) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Sets the rate that drives this flow.
    #[must_use]
    pub fn with_rate(mut self, rate: impl Rate + 'static) -> Self {
        self.set_rate(rate);
        self
    }

    /// Replaces the rate that drives this flow.
    pub fn set_rate(&mut self, rate: impl Rate + 'static) {
        self.rate = Some(Box::new(rate));
    }

    /// Returns the flow's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the source stock, or `None` for an inflow.
    #[must_use]
    pub fn source(&self) -> Option<StockId> {
        self.source
    }

    /// Returns the destination stock, or `None` for an outflow.
    #[must_use]
    pub fn destination(&self) -> Option<StockId> {
        self.destination
    }

    /// Returns `true` if a rate has been set.
    #[must_use]
    pub fn has_rate(&self) -> bool {
        self.rate.is_some()
    }

    /// Evaluates the rate and applies it to `stocks`.
    ///
    /// The source (if any) is updated before the destination (if any).
    ///
    /// # Errors
    ///
    /// Returns a [`FlowError`] if no rate is set, the rate is not finite, or
    /// an endpoint is not in `stocks`. Nothing is modified on error.
    pub fn execute(&self, stocks: &mut [Stock], transfer: Transfer) -> Result<(), FlowError> {
        let amount = self.evaluate(&Levels::new(stocks))?;
        self.apply(amount, stocks, transfer)
    }

    /// Evaluates the rate without touching any stock.
    pub(crate) fn evaluate(&self, levels: &Levels<'_>) -> Result<f64, FlowError> {
        let rate = self.rate.as_ref().ok_or_else(|| FlowError::MissingRate {
            flow: self.name.clone(),
        })?;

        let amount = rate.evaluate(levels);
        if !amount.is_finite() {
            return Err(FlowError::NonFiniteRate {
                flow: self.name.clone(),
                rate: amount,
            });
        }

        Ok(amount)
    }

    /// Moves `amount` from source to destination.
    pub(crate) fn apply(
        &self,
        amount: f64,
        stocks: &mut [Stock],
        transfer: Transfer,
    ) -> Result<(), FlowError> {
        for id in self.source.iter().chain(&self.destination) {
            if id.0 >= stocks.len() {
                return Err(FlowError::UnknownStock {
                    flow: self.name.clone(),
                    stock: *id,
                });
            }
        }

        let amount = match transfer {
            Transfer::Independent => amount,
            Transfer::Conserving => self.deliverable(amount, stocks),
        };

        if let Some(source) = self.source {
            stocks[source.0].update(-amount);
        }
        if let Some(destination) = self.destination {
            stocks[destination.0].update(amount);
        }

        Ok(())
    }

    /// Limits `requested` to what the giving end holds and the receiving end
    /// can accept. A negative amount runs from destination to source.
    fn deliverable(&self, requested: f64, stocks: &[Stock]) -> f64 {
        let (giver, taker) = if requested >= 0.0 {
            (self.source, self.destination)
        } else {
            (self.destination, self.source)
        };

        let mut amount = requested.abs();
        if let Some(id) = giver {
            amount = amount.min(stocks[id.0].value());
        }
        if let Some(id) = taker {
            amount = amount.min(stocks[id.0].headroom());
        }

        amount.copysign(requested)
    }
}

impl fmt::Debug for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flow")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("has_rate", &self.has_rate())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::rate::{Constant, from_fn};

    // --- Test fixtures ---

    /// Stocks `a`, `b` (limit 10), `c`.
    fn stocks() -> Vec<Stock> {
        vec![
            Stock::new("a", 5.0).unwrap(),
            Stock::bounded("b", 8.0, 10.0).unwrap(),
            Stock::new("c", 0.0).unwrap(),
        ]
    }

    fn values(stocks: &[Stock]) -> Vec<f64> {
        stocks.iter().map(Stock::value).collect()
    }

    const A: StockId = StockId(0);
    const B: StockId = StockId(1);
    const C: StockId = StockId(2);

    // --- Tests ---

    #[test]
    fn missing_rate_is_an_error_naming_the_flow() {
        let mut stocks = stocks();
        let flow = Flow::new("leak").with_source(A);

        let err = flow.execute(&mut stocks, Transfer::Independent).unwrap_err();

        assert_eq!(
            err,
            FlowError::MissingRate {
                flow: "leak".into()
            }
        );
        assert_eq!(err.to_string(), "flow `leak` has no rate function");
        assert_eq!(values(&stocks), [5.0, 8.0, 0.0]);
    }

    #[test]
    fn destination_only_flow_deposits_and_touches_nothing_else() {
        let mut stocks = stocks();
        let flow = Flow::new("rain").with_destination(C).with_rate(Constant(3.0));

        flow.execute(&mut stocks, Transfer::Independent).unwrap();

        assert_eq!(values(&stocks), [5.0, 8.0, 3.0]);
    }

    #[test]
    fn source_only_flow_withdraws() {
        let mut stocks = stocks();
        let flow = Flow::new("spill").with_source(A).with_rate(Constant(2.0));

        flow.execute(&mut stocks, Transfer::Independent).unwrap();

        assert_eq!(values(&stocks), [3.0, 8.0, 0.0]);
    }

    #[test]
    fn endpointless_flow_is_a_no_op() {
        let mut stocks = stocks();
        let flow = Flow::new("nowhere").with_rate(Constant(100.0));

        flow.execute(&mut stocks, Transfer::Independent).unwrap();

        assert_eq!(values(&stocks), [5.0, 8.0, 0.0]);
    }

    #[test]
    fn independent_transfer_delivers_full_rate_from_dry_source() {
        let mut stocks = stocks();
        let flow = Flow::new("a to c")
            .with_source(A)
            .with_destination(C)
            .with_rate(Constant(12.0));

        flow.execute(&mut stocks, Transfer::Independent).unwrap();

        assert_relative_eq!(stocks[0].value(), 0.0);
        assert_relative_eq!(stocks[2].value(), 12.0);
    }

    #[test]
    fn independent_transfer_destroys_excess_at_full_destination() {
        let mut stocks = stocks();
        let flow = Flow::new("a to b")
            .with_source(A)
            .with_destination(B)
            .with_rate(Constant(4.0));

        flow.execute(&mut stocks, Transfer::Independent).unwrap();

        assert_relative_eq!(stocks[0].value(), 1.0);
        assert_relative_eq!(stocks[1].value(), 10.0);
    }

    #[test]
    fn conserving_transfer_is_limited_by_source_balance() {
        let mut stocks = stocks();
        let flow = Flow::new("a to c")
            .with_source(A)
            .with_destination(C)
            .with_rate(Constant(12.0));

        flow.execute(&mut stocks, Transfer::Conserving).unwrap();

        assert_relative_eq!(stocks[0].value(), 0.0);
        assert_relative_eq!(stocks[2].value(), 5.0);
    }

    #[test]
    fn conserving_transfer_is_limited_by_destination_headroom() {
        let mut stocks = stocks();
        let flow = Flow::new("a to b")
            .with_source(A)
            .with_destination(B)
            .with_rate(Constant(4.0));

        flow.execute(&mut stocks, Transfer::Conserving).unwrap();

        assert_relative_eq!(stocks[0].value(), 3.0);
        assert_relative_eq!(stocks[1].value(), 10.0);
    }

    #[test]
    fn conserving_negative_rate_runs_backwards() {
        let mut stocks = stocks();
        let flow = Flow::new("a to b reversed")
            .with_source(A)
            .with_destination(B)
            .with_rate(Constant(-20.0));

        flow.execute(&mut stocks, Transfer::Conserving).unwrap();

        assert_relative_eq!(stocks[0].value(), 13.0);
        assert_relative_eq!(stocks[1].value(), 0.0);
    }

    #[test]
    fn rate_reads_levels_before_update() {
        let mut stocks = stocks();
        let flow = Flow::new("halve a")
            .with_source(A)
            .with_rate(from_fn(|levels| levels.get(A).unwrap_or(0.0) / 2.0));

        flow.execute(&mut stocks, Transfer::Independent).unwrap();

        assert_relative_eq!(stocks[0].value(), 2.5);
    }

    #[test]
    fn non_finite_rate_is_rejected() {
        let mut stocks = stocks();
        let flow = Flow::new("bad")
            .with_destination(C)
            .with_rate(Constant(f64::INFINITY));

        let err = flow.execute(&mut stocks, Transfer::Independent).unwrap_err();

        assert!(matches!(err, FlowError::NonFiniteRate { ref flow, .. } if flow == "bad"));
        assert_eq!(values(&stocks), [5.0, 8.0, 0.0]);
    }

    #[test]
    fn unknown_stock_is_rejected_before_any_update() {
        let mut stocks = stocks();
        let flow = Flow::new("dangling")
            .with_source(A)
            .with_destination(StockId(9))
            .with_rate(Constant(1.0));

        let err = flow.execute(&mut stocks, Transfer::Independent).unwrap_err();

        assert_eq!(
            err,
            FlowError::UnknownStock {
                flow: "dangling".into(),
                stock: StockId(9)
            }
        );
        assert_eq!(values(&stocks), [5.0, 8.0, 0.0]);
    }
}
