//! Discrete-time stock-and-flow simulation.
//!
//! A [`System`] holds named quantities ([`Stock`]s) and directed transfers
//! between them ([`Flow`]s). Each step executes every flow once, in order,
//! and records a [`Snapshot`] of all stock values in the [`History`].
//!
//! - [`Stock`] — a non-negative accumulator with an optional upper limit
//! - [`Flow`] — moves an amount set by a [`Rate`] from a source to a destination
//! - [`System`] — owns the graph, steps it, and records history
//! - [`Config`] — within-step update order and transfer semantics
//! - [`ModelSpec`] — a name-based graph description that builds a [`System`]
//! - [`Observer`] — receives a [`StepEvent`] after each step
//!
//! # Example
//!
//! ```
//! use stockflow_core::{Flow, Stock, System, rate::Constant};
//!
//! let mut system = System::new(10);
//! let ice = system.add_stock(Stock::bounded("ice", 1.0, 2000.0).unwrap());
//! system.add_flow(Flow::new("mining").with_destination(ice).with_rate(Constant(6.0)));
//!
//! system.simulate().unwrap();
//!
//! assert_eq!(system.history().len(), 10);
//! assert_eq!(system.stock(ice).unwrap().value(), 61.0);
//! ```
//!
//! # Features
//!
//! - `serde` — `Deserialize` for [`ModelSpec`] and [`Config`], `Serialize`
//!   for [`History`] (each snapshot as a name → value map).

mod config;
mod flow;
mod history;
mod model;
mod observer;
pub mod rate;
mod stock;
mod system;

pub use config::{Config, Transfer, UpdateMode};
pub use flow::{Flow, FlowError, FlowId};
pub use history::{History, Snapshot};
pub use model::{FlowSpec, ModelSpec, StockSpec};
pub use observer::{Observer, StepEvent};
pub use rate::{Levels, Rate};
pub use stock::{Stock, StockError, StockId};
pub use system::{Error, System};
