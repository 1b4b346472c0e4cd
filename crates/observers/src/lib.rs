//! Reusable step observers for stockflow simulations.
//!
//! This crate provides [`Observer`] implementations for reporting on a
//! [`System`] run, either while it steps or from its finished [`History`].
//!
//! - [`Printer`] — writes one `Step {i}: {...}` line per step
//!
//! # Features
//!
//! - `plot` — Enables [`PlotObserver`] and [`show`] for charting each stock's
//!   level over time via egui, with optional limit lines. This feature adds
//!   dependencies on `eframe`, `egui_plot` and `thiserror`.
//!
//! [`Observer`]: stockflow_core::Observer
//! [`System`]: stockflow_core::System
//! [`History`]: stockflow_core::History

mod print;

#[cfg(feature = "plot")]
mod plot;

pub use print::Printer;

#[cfg(feature = "plot")]
pub use plot::{PlotError, PlotObserver, ShowConfig, show};
