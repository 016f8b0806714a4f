//! Native chart window built with egui/eframe

mod app;
mod components;
mod constants;
mod painter;

pub use app::{run_gui, ViewOptions};
