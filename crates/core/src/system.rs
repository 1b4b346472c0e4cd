use std::sync::Arc;

use thiserror::Error;
use tracing::{debug_span, info};

use crate::{
    Config, Flow, FlowError, FlowId, History, Observer, Snapshot, Stock, StepEvent, StockId,
    UpdateMode, rate::Levels,
};

/// Errors that can occur while simulating.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("step {step} failed: {source}")]
    Step {
        step: usize,
        #[source]
        source: FlowError,
    },
}

/// A collection of stocks and the flows between them, advanced in fixed steps.
///
/// Each [`step`](System::step) executes every flow once, in insertion order,
/// and then records a [`Snapshot`] of all stock values in the [`History`].
/// Flow order is part of the model: under [`UpdateMode::Sequential`] a flow
/// sees the stock values left by the flows before it in the same step.
///
/// # Example
///
/// ```
/// use stockflow_core::{Flow, Stock, System, rate::Constant};
///
/// let mut system = System::new(3);
/// let lake = system.add_stock(Stock::bounded("lake", 0.0, 10.0).unwrap());
/// system.add_flow(Flow::new("river").with_destination(lake).with_rate(Constant(4.0)));
///
/// system.simulate().unwrap();
///
/// let lake_levels: Vec<_> = system.history().iter().map(|s| s.get("lake").unwrap()).collect();
/// assert_eq!(lake_levels, [4.0, 8.0, 10.0]);
/// ```
#[derive(Debug)]
pub struct System {
    steps: usize,
    config: Config,
    stocks: Vec<Stock>,
    flows: Vec<Flow>,
    history: History,
    names: Option<Arc<[String]>>,
}

impl System {
    /// Creates an empty system that will run `steps` steps per simulation.
    #[must_use]
    pub fn new(steps: usize) -> Self {
        Self::with_config(steps, Config::default())
    }

    /// Creates an empty system with the given configuration.
    #[must_use]
    pub fn with_config(steps: usize, config: Config) -> Self {
        Self {
            steps,
            config,
            stocks: Vec::new(),
            flows: Vec::new(),
            history: History::default(),
            names: None,
        }
    }

    /// Adds a stock and returns its id. Names are not checked for uniqueness.
    pub fn add_stock(&mut self, stock: Stock) -> StockId {
        self.stocks.push(stock);
        self.names = None;
        StockId(self.stocks.len() - 1)
    }

    /// Appends a flow to the execution order and returns its id.
    pub fn add_flow(&mut self, flow: Flow) -> FlowId {
        self.flows.push(flow);
        FlowId(self.flows.len() - 1)
    }

    /// Returns the number of steps [`simulate`](System::simulate) runs.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        self.config
    }

    /// Returns the stock with the given id.
    #[must_use]
    pub fn stock(&self, id: StockId) -> Option<&Stock> {
        self.stocks.get(id.0)
    }

    /// Returns the first stock with the given name.
    #[must_use]
    pub fn stock_by_name(&self, name: &str) -> Option<&Stock> {
        self.stocks.iter().find(|stock| stock.name() == name)
    }

    /// Returns the id of the first stock with the given name.
    #[must_use]
    pub fn stock_id(&self, name: &str) -> Option<StockId> {
        self.stocks
            .iter()
            .position(|stock| stock.name() == name)
            .map(StockId)
    }

    /// Returns all stocks in insertion order.
    #[must_use]
    pub fn stocks(&self) -> &[Stock] {
        &self.stocks
    }

    /// Returns the flow with the given id.
    #[must_use]
    pub fn flow(&self, id: FlowId) -> Option<&Flow> {
        self.flows.get(id.0)
    }

    /// Returns the id of the first flow with the given name.
    #[must_use]
    pub fn flow_id(&self, name: &str) -> Option<FlowId> {
        self.flows
            .iter()
            .position(|flow| flow.name() == name)
            .map(FlowId)
    }

    /// Returns the flow with the given id for configuration, such as
    /// attaching a rate with [`Flow::set_rate`].
    pub fn flow_mut(&mut self, id: FlowId) -> Option<&mut Flow> {
        self.flows.get_mut(id.0)
    }

    /// Returns all flows in execution order.
    #[must_use]
    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    /// Returns a read-only view of current stock values.
    #[must_use]
    pub fn levels(&self) -> Levels<'_> {
        Levels::new(&self.stocks)
    }

    /// Returns the snapshots recorded so far.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Advances the system by one step.
    ///
    /// 1. Executes every flow in insertion order. Under
    ///    [`UpdateMode::Sequential`] each flow reads the values left by the
    ///    ones before it; under [`UpdateMode::Synchronous`] all rates are
    ///    evaluated first against the values at the start of the step.
    /// 2. Appends a snapshot of every stock to the history.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Step`] if any flow fails. Flows that already ran in
    /// this step keep their effect and no snapshot is recorded.
    pub fn step(&mut self) -> Result<(), Error> {
        let step = self.history.len();
        let _span = debug_span!("step", step).entered();
        let transfer = self.config.transfer_mode();
        let fail = |source| Error::Step { step, source };

        match self.config.update_mode() {
            UpdateMode::Sequential => {
                for flow in &self.flows {
                    flow.execute(&mut self.stocks, transfer).map_err(fail)?;
                }
            }
            UpdateMode::Synchronous => {
                let levels = Levels::new(&self.stocks);
                let amounts = self
                    .flows
                    .iter()
                    .map(|flow| flow.evaluate(&levels))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(fail)?;

                for (flow, amount) in self.flows.iter().zip(amounts) {
                    flow.apply(amount, &mut self.stocks, transfer)
                        .map_err(fail)?;
                }
            }
        }

        let snapshot = self.snapshot();
        self.history.push(snapshot);
        Ok(())
    }

    /// Runs [`step`](System::step) exactly [`steps`](System::steps) times.
    ///
    /// # Errors
    ///
    /// Returns the first step error; the run stops there.
    pub fn simulate(&mut self) -> Result<(), Error> {
        self.simulate_observed(())
    }

    /// Runs the simulation, passing a [`StepEvent`] to `observer` after each
    /// step is recorded.
    ///
    /// # Errors
    ///
    /// Returns the first step error; the run stops there.
    pub fn simulate_observed<O>(&mut self, mut observer: O) -> Result<(), Error>
    where
        O: for<'a> Observer<StepEvent<'a>>,
    {
        info!(
            steps = self.steps,
            stocks = self.stocks.len(),
            flows = self.flows.len(),
            "starting simulation"
        );

        for _ in 0..self.steps {
            self.step()?;

            let step = self.history.len() - 1;
            if let Some(snapshot) = self.history.last() {
                observer.observe(&StepEvent { step, snapshot });
            }
        }

        info!(recorded = self.history.len(), "simulation complete");
        Ok(())
    }

    fn snapshot(&mut self) -> Snapshot {
        let names = self
            .names
            .get_or_insert_with(|| self.stocks.iter().map(|s| s.name().to_owned()).collect())
            .clone();
        let values = self.stocks.iter().map(Stock::value).collect();
        Snapshot::new(names, values)
    }
}
