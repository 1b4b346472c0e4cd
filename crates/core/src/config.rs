/// How flows within a single step see each other's effects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UpdateMode {
    /// Flows run one after another in insertion order. Each flow evaluates its
    /// rate against stock values already changed by earlier flows in the step.
    #[default]
    Sequential,

    /// Every rate is evaluated against the values at the start of the step,
    /// then the transfers are applied in insertion order.
    Synchronous,
}

/// How a flow moves its amount between source and destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Transfer {
    /// Withdrawal and deposit are separate clamped updates of the full rate.
    ///
    /// If the source runs dry or the destination is full, quantity is created
    /// or destroyed at that boundary.
    #[default]
    Independent,

    /// The amount is first reduced to what the source holds and what the
    /// destination can accept, then applied identically on both ends.
    Conserving,
}

/// Configuration for a [`System`](crate::System).
///
/// Construct with [`Config::new`] and chain builder methods as needed.
/// The defaults reproduce chained, independently clamped transfers.
///
/// # Example
///
/// ```
/// use stockflow_core::{Config, Transfer, UpdateMode};
///
/// let config = Config::new()
///     .update(UpdateMode::Synchronous)
///     .transfer(Transfer::Conserving);
///
/// assert_eq!(config.update_mode(), UpdateMode::Synchronous);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    update: UpdateMode,
    transfer: Transfer,
}

impl Config {
    /// Creates a config with sequential updates and independent transfers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the within-step update mode.
    #[must_use]
    pub fn update(mut self, update: UpdateMode) -> Self {
        self.update = update;
        self
    }

    /// Sets the transfer semantics.
    #[must_use]
    pub fn transfer(mut self, transfer: Transfer) -> Self {
        self.transfer = transfer;
        self
    }

    /// Returns the within-step update mode.
    #[must_use]
    pub fn update_mode(&self) -> UpdateMode {
        self.update
    }

    /// Returns the transfer semantics.
    #[must_use]
    pub fn transfer_mode(&self) -> Transfer {
        self.transfer
    }
}
