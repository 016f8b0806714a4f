#![forbid(unsafe_code)]

//! Dental chart rendering and interaction engine

pub mod chart;
pub mod chart_view;
pub mod color;
pub mod config;
pub mod constants;
pub mod dispatcher;
pub mod interaction;
pub mod ipc;
pub mod layout;
pub mod preference;
pub mod taxonomy;
