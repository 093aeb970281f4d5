//! Shared "map pipeline" logic used by every front-end.
//!
//! fetch both feeds -> build layers -> assemble map
//!
//! The TUI, the text summary and the HTML export then only deal with
//! presentation.

use crate::data::{FeedClient, FetchedFeeds};
use crate::domain::{EarthquakeCollection, FeedMetadata, MapConfig};
use crate::error::AppError;
use crate::layers::{build_earthquake_layer, build_fault_line_layer};
use crate::map::{MapModel, OverlayKind, assemble_map};

/// A feed that failed while the other one made it onto the map.
#[derive(Debug, Clone)]
pub struct FeedIssue {
    pub overlay: OverlayKind,
    pub error: AppError,
}

/// All outputs of a single run.
#[derive(Debug, Clone)]
pub struct MapRun {
    pub map: MapModel,
    pub metadata: FeedMetadata,
    pub earthquakes: Option<EarthquakeCollection>,
    pub issues: Vec<FeedIssue>,
}

/// Fetch both feeds and assemble the map.
pub fn run_map(config: &MapConfig) -> Result<MapRun, AppError> {
    let client = FeedClient::new(config)?;
    let fetched = client.fetch_all();
    build_map(config, fetched)
}

/// Assemble the map from already fetched feeds.
///
/// One failed feed is a partial failure: the other layer is still rendered and
/// the failure is recorded in [`MapRun::issues`]. Two failed feeds fail the run
/// with the earthquake error.
pub fn build_map(config: &MapConfig, fetched: FetchedFeeds) -> Result<MapRun, AppError> {
    let FetchedFeeds {
        earthquakes,
        fault_lines,
    } = fetched;

    let (earthquakes, fault_lines) = match (earthquakes, fault_lines) {
        (Err(quake_err), Err(fault_err)) => {
            tracing::error!(%quake_err, %fault_err, "both feeds failed");
            return Err(quake_err);
        }
        pair => pair,
    };

    let mut issues = Vec::new();

    let quakes = match earthquakes {
        Ok(collection) => Some(collection),
        Err(error) => {
            tracing::warn!(%error, "earthquake feed failed; rendering fault lines only");
            issues.push(FeedIssue {
                overlay: OverlayKind::Earthquakes,
                error,
            });
            None
        }
    };
    let faults = match fault_lines {
        Ok(collection) => Some(collection),
        Err(error) => {
            tracing::warn!(%error, "fault-line feed failed; rendering earthquakes only");
            issues.push(FeedIssue {
                overlay: OverlayKind::FaultLines,
                error,
            });
            None
        }
    };

    let quake_layer = quakes.as_ref().map(build_earthquake_layer);
    let fault_layer = faults.as_ref().map(build_fault_line_layer);
    let map = assemble_map(quake_layer, fault_layer, &config.access_token);

    let metadata = quakes
        .as_ref()
        .map(|q| q.metadata.clone())
        .unwrap_or_default();

    Ok(MapRun {
        map,
        metadata,
        earthquakes: quakes,
        issues,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::data::{decode_earthquakes, decode_fault_lines};
    use crate::domain::{AccessToken, FeedWindow};
    use crate::error::ErrorKind;

    const QUAKES: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"mag": 1.5, "place": "A", "time": 0},
         "geometry": {"type": "Point", "coordinates": [-117.5, 35.7, 2.0]}},
        {"type": "Feature", "properties": {"mag": 6.0, "place": "B", "time": 0},
         "geometry": {"type": "Point", "coordinates": [142.3, 38.3, 20.0]}}
    ]}"#;

    const FAULTS: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"Name": "NA-PA"},
         "geometry": {"type": "LineString", "coordinates": [[-124.0, 40.3], [-122.5, 37.5], [-115.5, 32.5]]}}
    ]}"#;

    fn config() -> MapConfig {
        MapConfig {
            earthquake_url: "http://localhost/quakes".to_string(),
            fault_lines_url: "http://localhost/faults".to_string(),
            window: FeedWindow::Month,
            access_token: AccessToken::new("pk.test"),
            timeout: Duration::from_secs(1),
            top_n: 5,
        }
    }

    #[test]
    fn end_to_end_from_documents() {
        let fetched = FetchedFeeds {
            earthquakes: decode_earthquakes(QUAKES),
            fault_lines: decode_fault_lines(FAULTS),
        };
        let run = build_map(&config(), fetched).unwrap();

        assert_eq!(run.map.marker_count(), 2);
        assert_eq!(run.map.polyline_count(), 1);
        assert_eq!(run.map.base_layers.len(), 3);
        assert_eq!(run.map.layer_control.overlay_names.len(), 2);
        assert!(run.issues.is_empty());
    }

    #[test]
    fn one_failed_feed_renders_the_other() {
        let fetched = FetchedFeeds {
            earthquakes: decode_earthquakes(QUAKES),
            fault_lines: Err(AppError::network("fault-line request failed with status 503.")),
        };
        let run = build_map(&config(), fetched).unwrap();

        assert_eq!(run.map.overlays.len(), 1);
        assert_eq!(run.map.marker_count(), 2);
        assert_eq!(run.issues.len(), 1);
        assert_eq!(run.issues[0].overlay, OverlayKind::FaultLines);
        assert_eq!(run.issues[0].error.kind(), ErrorKind::Network);
    }

    #[test]
    fn malformed_earthquakes_still_show_fault_lines() {
        let fetched = FetchedFeeds {
            earthquakes: decode_earthquakes("not json"),
            fault_lines: decode_fault_lines(FAULTS),
        };
        let run = build_map(&config(), fetched).unwrap();

        assert_eq!(run.map.polyline_count(), 1);
        assert!(run.earthquakes.is_none());
        assert_eq!(run.issues[0].error.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn both_failed_is_an_error() {
        let fetched = FetchedFeeds {
            earthquakes: Err(AppError::network("earthquake request failed: timeout")),
            fault_lines: Err(AppError::network("fault-line request failed: timeout")),
        };
        let err = build_map(&config(), fetched).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.to_string().contains("earthquake"));
    }
}
