//! A small lunar water supply chain, printed and plotted.
//!
//! Ice is mined into a depot, melted into a water tank, and drawn off by a
//! habitat. Every stock starts at 1 and holds at most 2000; every flow moves
//! 6 per step, except the habitat which draws a tenth of the tank.
//!
//! # Usage
//!
//! ```text
//! cargo run --example reservoirs --features plot
//! cargo run --example reservoirs --features plot -- 50
//! cargo run --example reservoirs --features plot -- 50 conserving
//! RUST_LOG=stockflow_core=debug cargo run --example reservoirs --features plot -- 3
//! ```

use std::error::Error;

use stockflow_core::{
    Config, FlowSpec, ModelSpec, Observer, StepEvent, StockSpec, Transfer, rate,
};
use stockflow_observers::{PlotObserver, Printer, ShowConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let steps = args
        .next()
        .as_deref()
        .map(str::parse::<usize>)
        .transpose()
        .unwrap_or_else(|_| {
            eprintln!("Invalid step count: expected a whole number, e.g. 10");
            std::process::exit(1);
        })
        .unwrap_or(10);
    let transfer = match args.next().as_deref() {
        None | Some("independent") => Transfer::Independent,
        Some("conserving") => Transfer::Conserving,
        Some(other) => {
            eprintln!("Unknown transfer mode: {other}");
            eprintln!("Usage: reservoirs [steps] [independent|conserving]");
            std::process::exit(1);
        }
    };

    let mut system = supply_chain().build(steps, Config::new().transfer(transfer))?;

    // The habitat's draw depends on the live tank level.
    let tank = system.stock_id("water tank").ok_or("missing water tank")?;
    let habitat = system.flow_id("habitat use").ok_or("missing habitat flow")?;
    if let Some(flow) = system.flow_mut(habitat) {
        flow.set_rate(rate::from_fn(move |levels| levels.get(tank).unwrap_or(0.0) / 10.0));
    }

    let mut printer = Printer::stdout();
    let mut plot = PlotObserver::for_stocks(system.stocks());
    system.simulate_observed(|event: &StepEvent<'_>| {
        printer.observe(event);
        plot.observe(event);
    })?;
    printer.finish()?;

    plot.show(ShowConfig::new().title("Reservoirs").legend().limits())?;
    Ok(())
}

/// The graph as an ingestion step would hand it over: names only.
fn supply_chain() -> ModelSpec {
    let stock = |name: &str| StockSpec::new(name, 1.0).limit(2000.0);

    ModelSpec {
        stocks: vec![stock("ice depot"), stock("water tank")],
        flows: vec![
            FlowSpec::new("mining").inflow().to("ice depot").rate(6.0),
            FlowSpec::new("melting")
                .from("ice depot")
                .to("water tank")
                .rate(6.0),
            FlowSpec::new("habitat use").from("water tank").to("habitat"),
        ],
    }
}
