//! Line chart of stock levels over time.
//!
//! See [`PlotObserver`] and [`show`] for usage.

use eframe::egui;
use egui_plot::{HLine, Legend, Line, LineStyle, Plot, PlotPoints};
use stockflow_core::{History, Observer, Snapshot, StepEvent, Stock, System};
use thiserror::Error;

/// Errors that can occur when showing a plot.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("nothing to plot: no steps have been recorded")]
    EmptyHistory,

    #[error("failed to open plot window: {0}")]
    Window(#[from] eframe::Error),
}

/// What to draw when a [`PlotObserver`] result is shown.
///
/// # Example
///
/// ```ignore
/// obs.show(ShowConfig::new().legend().limits().only(["ice", "water"]))?;
/// ```
#[derive(Debug, Clone)]
pub struct ShowConfig {
    title: String,
    legend: bool,
    limits: bool,
    only: Option<Vec<String>>,
}

impl ShowConfig {
    /// Every stock, no legend, no limit lines.
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: "Stock Levels".to_owned(),
            legend: false,
            limits: false,
            only: None,
        }
    }

    /// Sets the window title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Labels each stock by name.
    #[must_use]
    pub fn legend(mut self) -> Self {
        self.legend = true;
        self
    }

    /// Draws a dashed line at the limit of every bounded stock.
    ///
    /// Limits are only known when the observer was created with
    /// [`PlotObserver::for_stocks`] or the plot comes from [`show`].
    #[must_use]
    pub fn limits(mut self) -> Self {
        self.limits = true;
        self
    }

    /// Restricts the chart to the named stocks.
    #[must_use]
    pub fn only<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = Some(names.into_iter().map(Into::into).collect());
        self
    }

    fn includes(&self, name: &str) -> bool {
        self.only
            .as_ref()
            .is_none_or(|names| names.iter().any(|n| n == name))
    }
}

impl Default for ShowConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// The level of one stock at each recorded step.
#[derive(Debug, Clone, PartialEq)]
struct Trace {
    name: String,
    limit: Option<f64>,
    points: Vec<[f64; 2]>,
}

impl Trace {
    fn new(name: impl Into<String>, limit: Option<f64>) -> Self {
        Self {
            name: name.into(),
            limit,
            points: Vec::new(),
        }
    }
}

/// An observer that collects one trace per stock and displays them via egui.
///
/// Traces follow stock position, not name, so stocks sharing a name each
/// keep their own trajectory. Without [`PlotObserver::for_stocks`] the traces
/// are fixed by the first recorded snapshot.
///
/// # Example
///
/// ```ignore
/// let mut obs = PlotObserver::for_stocks(system.stocks());
/// system.simulate_observed(&mut obs)?;
/// obs.show(ShowConfig::new().legend().limits())?;
/// ```
#[derive(Debug, Default)]
pub struct PlotObserver {
    traces: Vec<Trace>,
}

impl PlotObserver {
    /// Creates an observer with no traces.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an observer with a trace for each stock, carrying its limit.
    #[must_use]
    pub fn for_stocks(stocks: &[Stock]) -> Self {
        let traces = stocks
            .iter()
            .map(|stock| Trace::new(stock.name(), stock.limit()))
            .collect();
        Self { traces }
    }

    /// Collects every snapshot of an already finished run.
    #[must_use]
    pub fn from_history(history: &History) -> Self {
        let mut obs = Self::new();
        obs.extend(history);
        obs
    }

    /// Records one step.
    ///
    /// A trace gets a point only if the snapshot has a stock at the trace's
    /// position with the trace's name.
    pub fn record(&mut self, step: usize, snapshot: &Snapshot) {
        if self.traces.is_empty() {
            self.traces = snapshot
                .names()
                .iter()
                .map(|name| Trace::new(name.as_str(), None))
                .collect();
        }

        #[allow(clippy::cast_precision_loss)]
        let x = step as f64;
        let levels = snapshot.names().iter().zip(snapshot.values());
        for (trace, (name, &level)) in self.traces.iter_mut().zip(levels) {
            if *name == trace.name {
                trace.points.push([x, level]);
            }
        }
    }

    fn extend(&mut self, history: &History) {
        for (step, snapshot) in history.iter().enumerate() {
            self.record(step, snapshot);
        }
    }

    fn is_empty(&self) -> bool {
        self.traces.iter().all(|trace| trace.points.is_empty())
    }

    /// Opens a blocking egui window displaying the collected traces.
    ///
    /// Blocks until the window is closed by the user.
    ///
    /// # Errors
    ///
    /// Returns [`PlotError::EmptyHistory`] if nothing was recorded, or
    /// [`PlotError::Window`] if the native window cannot be created.
    pub fn show(self, config: ShowConfig) -> Result<(), PlotError> {
        if self.is_empty() {
            return Err(PlotError::EmptyHistory);
        }

        let traces = self
            .traces
            .into_iter()
            .filter(|trace| config.includes(&trace.name))
            .map(|trace| Trace {
                limit: trace.limit.filter(|_| config.limits),
                ..trace
            })
            .collect();
        let app = LevelsApp {
            traces,
            legend: config.legend,
        };

        eframe::run_native(
            &config.title,
            eframe::NativeOptions::default(),
            Box::new(move |_cc| Ok(Box::new(app))),
        )?;
        Ok(())
    }
}

impl<'a> Observer<StepEvent<'a>> for PlotObserver {
    fn observe(&mut self, event: &StepEvent<'a>) {
        self.record(event.step, event.snapshot);
    }
}

/// Allows `&mut PlotObserver` to be passed to
/// [`System::simulate_observed`](stockflow_core::System::simulate_observed),
/// so [`PlotObserver::show`] can be called after the run.
impl<'a> Observer<StepEvent<'a>> for &mut PlotObserver {
    fn observe(&mut self, event: &StepEvent<'a>) {
        (*self).observe(event);
    }
}

/// Plots each stock's level against step index for a finished run.
///
/// # Errors
///
/// Returns [`PlotError::EmptyHistory`] if the system has not stepped, or
/// [`PlotError::Window`] if the native window cannot be created.
pub fn show(system: &System, config: ShowConfig) -> Result<(), PlotError> {
    let mut obs = PlotObserver::for_stocks(system.stocks());
    obs.extend(system.history());
    obs.show(config)
}

struct LevelsApp {
    traces: Vec<Trace>,
    legend: bool,
}

impl eframe::App for LevelsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            // Levels are never negative.
            let mut plot = Plot::new("stock_levels")
                .x_axis_label("Step")
                .y_axis_label("Level")
                .include_y(0.0);
            for limit in self.traces.iter().filter_map(|trace| trace.limit) {
                plot = plot.include_y(limit);
            }
            if self.legend {
                plot = plot.legend(Legend::default());
            }

            plot.show(ui, |plot_ui| {
                for trace in &self.traces {
                    let points: PlotPoints = trace.points.iter().copied().collect();
                    plot_ui.line(Line::new(points).name(&trace.name));

                    if let Some(limit) = trace.limit {
                        plot_ui.hline(
                            HLine::new(limit)
                                .name(format!("{} limit", trace.name))
                                .style(LineStyle::dashed_loose()),
                        );
                    }
                }
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use stockflow_core::{Flow, rate::Constant};

    fn run(steps: usize) -> System {
        let mut system = System::new(steps);
        let a = system.add_stock(Stock::bounded("a", 0.0, 2.5).unwrap());
        system.add_stock(Stock::new("b", 3.0).unwrap());
        system.add_flow(Flow::new("in").with_destination(a).with_rate(Constant(1.0)));
        system.simulate().unwrap();
        system
    }

    fn trace<'a>(obs: &'a PlotObserver, name: &str) -> &'a Trace {
        obs.traces.iter().find(|t| t.name == name).unwrap()
    }

    fn levels(trace: &Trace) -> Vec<f64> {
        trace.points.iter().map(|p| p[1]).collect()
    }

    #[test]
    fn one_trace_per_stock() {
        let obs = PlotObserver::from_history(run(3).history());

        assert_eq!(obs.traces.len(), 2);
        assert_eq!(levels(trace(&obs, "a")), [1.0, 2.0, 2.5]);
        assert_eq!(levels(trace(&obs, "b")), [3.0, 3.0, 3.0]);
        for (i, point) in trace(&obs, "a").points.iter().enumerate() {
            assert_relative_eq!(point[0], i as f64);
        }
    }

    #[test]
    fn traces_carry_stock_limits() {
        let system = run(2);
        let mut obs = PlotObserver::for_stocks(system.stocks());
        obs.extend(system.history());

        assert_eq!(trace(&obs, "a").limit, Some(2.5));
        assert_eq!(trace(&obs, "b").limit, None);
        assert_relative_eq!(trace(&obs, "a").points[1][1], 2.0);

        let unbounded = PlotObserver::from_history(system.history());
        assert_eq!(trace(&unbounded, "a").limit, None);
    }

    #[test]
    fn observing_matches_collecting_afterwards() {
        let mut system = System::new(4);
        let a = system.add_stock(Stock::new("a", 0.0).unwrap());
        system.add_flow(Flow::new("in").with_destination(a).with_rate(Constant(2.0)));

        let mut live = PlotObserver::new();
        system.simulate_observed(&mut live).unwrap();
        let replay = PlotObserver::from_history(system.history());

        assert_eq!(live.traces, replay.traces);
    }

    #[test]
    fn stocks_sharing_a_name_keep_their_own_trace() {
        let mut system = System::new(2);
        let first = system.add_stock(Stock::new("dup", 0.0).unwrap());
        system.add_stock(Stock::new("dup", 10.0).unwrap());
        system.add_flow(Flow::new("in").with_destination(first).with_rate(Constant(1.5)));
        system.simulate().unwrap();

        let obs = PlotObserver::from_history(system.history());

        assert_eq!(obs.traces.len(), 2);
        assert_eq!(obs.traces[0].name, obs.traces[1].name);
        assert_relative_eq!(obs.traces[0].points[1][1], 3.0);
        assert_relative_eq!(obs.traces[1].points[1][1], 10.0);
    }

    #[test]
    fn stocks_added_later_are_not_traced() {
        let mut system = System::new(1);
        system.add_stock(Stock::new("a", 1.0).unwrap());
        system.step().unwrap();
        system.add_stock(Stock::new("late", 9.0).unwrap());
        system.step().unwrap();

        let obs = PlotObserver::from_history(system.history());

        assert_eq!(obs.traces.len(), 1);
        assert_eq!(trace(&obs, "a").points.len(), 2);
    }

    #[test]
    fn selection_keeps_named_stocks() {
        let config = ShowConfig::new().only(["b"]);

        assert!(config.includes("b"));
        assert!(!config.includes("a"));
        assert!(ShowConfig::new().includes("a"));
    }

    #[test]
    fn showing_an_unstepped_system_is_an_error() {
        let system = run(0);
        let err = show(&system, ShowConfig::new().limits()).unwrap_err();
        assert!(matches!(err, PlotError::EmptyHistory));
    }
}
