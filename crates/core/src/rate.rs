//! Rate functions that drive flows.
//!
//! A [`Rate`] is evaluated once per flow execution against a read-only
//! [`Levels`] view of the system's stocks. Any dependency a rate has on stock
//! values goes through that view, so nothing has to be captured by reference
//! when the rate is built.
//!
//! - [`Constant`] — a fixed amount per step
//! - [`from_fn`] — wraps a closure over [`Levels`]

use crate::{Stock, StockId};

/// Read-only view of stock values at the moment a rate is evaluated.
#[derive(Debug, Clone, Copy)]
pub struct Levels<'a> {
    stocks: &'a [Stock],
}

impl<'a> Levels<'a> {
    /// Creates a view over a slice of stocks, indexed by [`StockId`].
    #[must_use]
    pub fn new(stocks: &'a [Stock]) -> Self {
        Self { stocks }
    }

    /// Returns the value of the stock with the given id.
    #[must_use]
    pub fn get(&self, id: StockId) -> Option<f64> {
        self.stocks.get(id.0).map(Stock::value)
    }

    /// Returns the value of the first stock with the given name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<f64> {
        self.stocks
            .iter()
            .find(|stock| stock.name() == name)
            .map(Stock::value)
    }

    /// Returns the number of stocks in view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    /// Returns `true` if there are no stocks in view.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        self.stocks.iter().map(|stock| (stock.name(), stock.value()))
    }
}

/// Produces the amount a flow transfers in one execution.
pub trait Rate {
    /// Evaluates the rate given the current stock levels.
    fn evaluate(&self, levels: &Levels<'_>) -> f64;
}

/// A rate that ignores stock levels and always returns the same amount.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Constant(pub f64);

impl Rate for Constant {
    fn evaluate(&self, _levels: &Levels<'_>) -> f64 {
        self.0
    }
}

/// A rate backed by a closure. Created with [`from_fn`].
#[derive(Clone, Copy)]
pub struct FromFn<F>(F);

impl<F> Rate for FromFn<F>
where
    F: Fn(&Levels<'_>) -> f64,
{
    fn evaluate(&self, levels: &Levels<'_>) -> f64 {
        (self.0)(levels)
    }
}

/// Creates a [`Rate`] from a closure over the current [`Levels`].
///
/// # Example
///
/// ```
/// use stockflow_core::{Flow, Stock, System, rate};
///
/// let mut system = System::new(1);
/// let tank = system.add_stock(Stock::new("tank", 100.0).unwrap());
/// system.add_flow(
///     Flow::new("drain")
///         .with_source(tank)
///         .with_rate(rate::from_fn(move |levels| 0.1 * levels.get(tank).unwrap_or(0.0))),
/// );
///
/// system.simulate().unwrap();
/// assert_eq!(system.stock(tank).unwrap().value(), 90.0);
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(&Levels<'_>) -> f64,
{
    FromFn(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn stocks() -> Vec<Stock> {
        vec![
            Stock::new("a", 4.0).unwrap(),
            Stock::new("b", 9.0).unwrap(),
            Stock::new("a", 1.0).unwrap(),
        ]
    }

    #[test]
    fn levels_lookup_by_id_and_name() {
        let stocks = stocks();
        let levels = Levels::new(&stocks);

        assert_eq!(levels.len(), 3);
        assert_eq!(levels.get(StockId(1)), Some(9.0));
        assert_eq!(levels.get(StockId(7)), None);
        assert_eq!(levels.by_name("a"), Some(4.0), "first match wins");
        assert_eq!(levels.by_name("missing"), None);
    }

    #[test]
    fn levels_iterate_in_insertion_order() {
        let stocks = stocks();
        let names: Vec<_> = Levels::new(&stocks).iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["a", "b", "a"]);
    }

    #[test]
    fn constant_ignores_levels() {
        let levels = Levels::new(&[]);
        assert_relative_eq!(Constant(6.0).evaluate(&levels), 6.0);
    }

    #[test]
    fn closure_reads_live_levels() {
        let stocks = stocks();
        let rate = from_fn(|levels| levels.by_name("b").unwrap_or(0.0) / 3.0);
        assert_relative_eq!(rate.evaluate(&Levels::new(&stocks)), 3.0);
    }
}
