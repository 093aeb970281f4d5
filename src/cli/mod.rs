//! Command-line parsing for the earthquake map.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fetch/layer/map code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::FeedWindow;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "quake", version, about = "Recent earthquakes and plate boundaries on a map")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive terminal map (the default).
    Tui(FeedArgs),
    /// Print layer counts, the legend, and the strongest events.
    Summary(FeedArgs),
    /// Write a standalone Leaflet page with the assembled map.
    Html(HtmlArgs),
}

/// Options shared by every command.
#[derive(Debug, Args, Clone)]
pub struct FeedArgs {
    /// Time window of the USGS earthquake feed.
    #[arg(short = 'w', long, value_enum, default_value_t = FeedWindow::Month)]
    pub window: FeedWindow,

    /// Override the earthquake feed URL (takes precedence over --window).
    #[arg(long, value_name = "URL")]
    pub quakes_url: Option<String>,

    /// Override the plate-boundary GeoJSON URL.
    #[arg(long, value_name = "URL")]
    pub faults_url: Option<String>,

    /// Tile access token; falls back to MAPBOX_ACCESS_TOKEN (.env is read).
    #[arg(long, value_name = "TOKEN")]
    pub access_token: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// How many of the strongest events to list.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

/// Options for the HTML export.
#[derive(Debug, Args)]
pub struct HtmlArgs {
    #[command(flatten)]
    pub feed: FeedArgs,

    /// Output file.
    #[arg(short = 'o', long, value_name = "HTML", default_value = "quake-map.html")]
    pub out: PathBuf,
}
