//! Name-based descriptions of a stock-and-flow graph.
//!
//! Whatever ingests a model (a spreadsheet reader, a config file, a test)
//! produces a [`ModelSpec`] that refers to stocks by name. [`ModelSpec::build`]
//! resolves those names into a ready-to-run [`System`].
//!
//! With the `serde` feature these types deserialize from any serde format:
//!
//! ```json
//! {
//!   "stocks": [{ "name": "ice", "initial": 1.0, "limit": 2000.0 }],
//!   "flows": [{ "name": "melt", "source": "ice", "destination": "water", "rate": 6.0 }]
//! }
//! ```

use tracing::debug;

use crate::{Config, Flow, Stock, StockError, StockId, System, rate::Constant};

/// A stock as described by name.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StockSpec {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub initial: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub limit: Option<f64>,
}

impl StockSpec {
    /// Describes an unbounded stock.
    #[must_use]
    pub fn new(name: impl Into<String>, initial: f64) -> Self {
        Self {
            name: name.into(),
            initial,
            limit: None,
        }
    }

    /// Adds an upper limit.
    #[must_use]
    pub fn limit(mut self, limit: f64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A flow as described by the names of its endpoints.
///
/// An endpoint name that matches no stock stands for the environment, so the
/// flow has no stock on that side. Setting `inflow` marks the flow as a pure
/// inflow: any `source` is ignored.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlowSpec {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub source: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub destination: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub inflow: bool,
    /// A constant amount per step. Flows without one must be given a rate
    /// before the system runs.
    #[cfg_attr(feature = "serde", serde(default))]
    pub rate: Option<f64>,
}

impl FlowSpec {
    /// Describes a flow with no endpoints and no rate.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            destination: None,
            inflow: false,
            rate: None,
        }
    }

    /// Sets the source stock name.
    #[must_use]
    pub fn from(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the destination stock name.
    #[must_use]
    pub fn to(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Marks the flow as a pure inflow.
    #[must_use]
    pub fn inflow(mut self) -> Self {
        self.inflow = true;
        self
    }

    /// Sets a constant rate.
    #[must_use]
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }
}

/// An ordered description of stocks and flows.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelSpec {
    #[cfg_attr(feature = "serde", serde(default))]
    pub stocks: Vec<StockSpec>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub flows: Vec<FlowSpec>,
}

impl ModelSpec {
    /// Builds a system that runs `steps` steps.
    ///
    /// Stocks and flows keep their order. A name shared by several stocks
    /// resolves to the first of them.
    ///
    /// # Errors
    ///
    /// Returns a [`StockError`] if any stock has an invalid initial value or
    /// limit.
    pub fn build(&self, steps: usize, config: Config) -> Result<System, StockError> {
        let mut system = System::with_config(steps, config);

        for spec in &self.stocks {
            let stock = Stock::new(spec.name.as_str(), spec.initial)?;
            let stock = match spec.limit {
                Some(limit) => stock.with_limit(limit)?,
                None => stock,
            };
            system.add_stock(stock);
        }

        for spec in &self.flows {
            let mut flow = Flow::new(spec.name.as_str());

            let source = if spec.inflow {
                None
            } else {
                resolve(&system, &spec.name, spec.source.as_deref())
            };
            if let Some(id) = source {
                flow = flow.with_source(id);
            }
            if let Some(id) = resolve(&system, &spec.name, spec.destination.as_deref()) {
                flow = flow.with_destination(id);
            }
            if let Some(rate) = spec.rate {
                flow = flow.with_rate(Constant(rate));
            }

            system.add_flow(flow);
        }

        Ok(system)
    }
}

fn resolve(system: &System, flow: &str, name: Option<&str>) -> Option<StockId> {
    let name = name?;
    let id = system.stock_id(name);

    if id.is_none() {
        debug!(flow, endpoint = name, "no stock with this name, using environment");
    }
    id
}
