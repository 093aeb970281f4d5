//! `quake-map` library crate.
//!
//! The binary (`quake`) is a thin wrapper around this library so that:
//!
//! - the fetch -> layer -> map pipeline is testable without a terminal or network
//! - every front-end (TUI, text summary, HTML page) shares one map model

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod layers;
pub mod logging;
pub mod map;
pub mod report;
pub mod style;
pub mod tui;
