//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - decoded feed records (`EarthquakeFeature`, `FaultLineFeature`, `Feature`)
//! - coordinate types in both axis orders (`LonLat`, `LatLng`)
//! - run configuration (`MapConfig`, `FeedWindow`, `AccessToken`)

pub mod types;

pub use types::*;
