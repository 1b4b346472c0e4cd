use std::fmt;

use thiserror::Error;
use tracing::debug;

/// Identifies a [`Stock`] within the [`System`](crate::System) that owns it.
///
/// Ids are handed out by [`System::add_stock`](crate::System::add_stock) in
/// insertion order and are only meaningful for that system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StockId(pub(crate) usize);

impl StockId {
    /// Returns the insertion index of the stock.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors that can occur when constructing a [`Stock`].
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum StockError {
    #[error("initial value must be finite and non-negative, got {0}")]
    InitialValue(f64),

    #[error("limit must be finite and non-negative, got {0}")]
    Limit(f64),

    #[error("initial value {value} exceeds limit {limit}")]
    AboveLimit { value: f64, limit: f64 },
}

/// A named, non-negative accumulator with an optional upper limit.
///
/// The value can only change through [`Stock::update`], which clamps the
/// result into `[0, limit]` instead of reporting an error. Clamping is not
/// conservative: whatever falls outside the bounds is discarded.
///
/// # Example
///
/// ```
/// use stockflow_core::Stock;
///
/// let mut tank = Stock::bounded("tank", 1900.0, 2000.0).unwrap();
/// tank.update(200.0);
/// assert_eq!(tank.value(), 2000.0);
///
/// tank.update(-5000.0);
/// assert_eq!(tank.value(), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Stock {
    name: String,
    value: f64,
    limit: Option<f64>,
}

impl Stock {
    /// Creates an unbounded stock with the given initial value.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::InitialValue`] if `initial` is negative or not finite.
    pub fn new(name: impl Into<String>, initial: f64) -> Result<Self, StockError> {
        if !initial.is_finite() || initial < 0.0 {
            return Err(StockError::InitialValue(initial));
        }

        Ok(Self {
            name: name.into(),
            value: initial,
            limit: None,
        })
    }

    /// Creates a stock whose value can never exceed `limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if `initial` or `limit` is negative or not finite, or
    /// if `initial` is greater than `limit`.
    pub fn bounded(name: impl Into<String>, initial: f64, limit: f64) -> Result<Self, StockError> {
        Self::new(name, initial)?.with_limit(limit)
    }

    /// Sets an upper limit on an existing stock.
    ///
    /// # Errors
    ///
    /// Returns an error if `limit` is negative or not finite, or if the
    /// current value is already above it.
    pub fn with_limit(mut self, limit: f64) -> Result<Self, StockError> {
        if !limit.is_finite() || limit < 0.0 {
            return Err(StockError::Limit(limit));
        }
        if self.value > limit {
            return Err(StockError::AboveLimit {
                value: self.value,
                limit,
            });
        }

        self.limit = Some(limit);
        Ok(self)
    }

    /// Returns the stock's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Returns the upper limit, if any.
    #[must_use]
    pub fn limit(&self) -> Option<f64> {
        self.limit
    }

    /// Returns how much can still be deposited before the limit is reached.
    ///
    /// Unbounded stocks report `f64::INFINITY`.
    #[must_use]
    pub fn headroom(&self) -> f64 {
        self.limit
            .map_or(f64::INFINITY, |limit| (limit - self.value).max(0.0))
    }

    /// Applies a signed change to the value.
    ///
    /// If the result would exceed the limit, the value is set exactly to the
    /// limit and the excess is dropped. Otherwise a negative result is
    /// truncated to zero. No input is rejected.
    pub fn update(&mut self, change: f64) {
        debug!(stock = %self.name, value = self.value, change, "updating stock");

        let proposed = self.value + change;
        match self.limit {
            Some(limit) if proposed > limit => {
                debug!(stock = %self.name, limit, "limit reached");
                self.value = limit;
            }
            _ => self.value = proposed.max(0.0),
        }

        debug!(stock = %self.name, value = self.value, "stock updated");
    }
}
