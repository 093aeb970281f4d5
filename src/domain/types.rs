//! Shared domain types.
//!
//! Feature records are decoded once per run and are read-only afterwards.
//! GeoJSON stores positions as `(lon, lat)`; map graphics use `(lat, lon)`.
//! Both orders get their own type so a swap can't go unnoticed.

use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A position in GeoJSON axis order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

/// A position in map axis order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<LonLat> for LatLng {
    fn from(value: LonLat) -> Self {
        LatLng {
            lat: value.lat,
            lng: value.lon,
        }
    }
}

/// One seismic event from the earthquake feed.
#[derive(Debug, Clone, PartialEq)]
pub struct EarthquakeFeature {
    pub id: Option<String>,
    pub coordinates: LonLat,
    /// The feed occasionally publishes events without a magnitude.
    pub magnitude: Option<f64>,
    pub place: String,
    /// Milliseconds since the Unix epoch.
    pub time: i64,
}

/// One plate-boundary polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct FaultLineFeature {
    pub name: Option<String>,
    pub vertices: Vec<LonLat>,
}

/// A feature routed to its projector by geometry type.
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    Point(EarthquakeFeature),
    Line(FaultLineFeature),
}

/// Descriptive metadata published alongside the earthquake feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedMetadata {
    pub title: Option<String>,
    pub generated: Option<i64>,
    pub count: Option<usize>,
}

impl FeedMetadata {
    /// One-line description of when the feed was generated and how many
    /// events it reports; `None` when the feed published neither.
    pub fn describe(&self) -> Option<String> {
        let generated = self
            .generated
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| format!("generated {}", dt.format("%Y-%m-%d %H:%M UTC")));
        let count = self.count.map(|n| format!("{n} events"));
        match (count, generated) {
            (Some(c), Some(g)) => Some(format!("{c}, {g}")),
            (Some(one), None) | (None, Some(one)) => Some(one),
            (None, None) => None,
        }
    }
}

/// Decoded earthquake feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EarthquakeCollection {
    pub metadata: FeedMetadata,
    pub features: Vec<EarthquakeFeature>,
    /// Records dropped during decoding (no geometry, short coordinates, ...).
    pub skipped: usize,
}

/// Decoded fault-line document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaultLineCollection {
    pub features: Vec<FaultLineFeature>,
    pub skipped: usize,
}

/// Time window of the USGS summary feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FeedWindow {
    Hour,
    Day,
    Week,
    Month,
}

impl FeedWindow {
    pub fn slug(self) -> &'static str {
        match self {
            FeedWindow::Hour => "hour",
            FeedWindow::Day => "day",
            FeedWindow::Week => "week",
            FeedWindow::Month => "month",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            FeedWindow::Hour => "past hour",
            FeedWindow::Day => "past day",
            FeedWindow::Week => "past week",
            FeedWindow::Month => "past month",
        }
    }
}

/// Tile-server credential.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Everything a run needs, resolved from CLI arguments and the environment.
#[derive(Debug, Clone)]
pub struct MapConfig {
    pub earthquake_url: String,
    pub fault_lines_url: String,
    pub window: FeedWindow,
    pub access_token: AccessToken,
    pub timeout: Duration,
    /// How many of the strongest events to list in reports.
    pub top_n: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_description_uses_what_the_feed_published() {
        let full = FeedMetadata {
            title: Some("USGS All Earthquakes, Past Day".to_string()),
            generated: Some(1_700_000_100_000),
            count: Some(4),
        };
        assert_eq!(full.describe().unwrap(), "4 events, generated 2023-11-14 22:15 UTC");

        let count_only = FeedMetadata {
            count: Some(12),
            ..Default::default()
        };
        assert_eq!(count_only.describe().unwrap(), "12 events");
        assert_eq!(FeedMetadata::default().describe(), None);
    }
}
