//! HTTP access to the earthquake and plate-boundary feeds.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::data::geojson::{decode_earthquakes, decode_fault_lines};
use crate::domain::{EarthquakeCollection, FaultLineCollection, FeedWindow, MapConfig};
use crate::error::AppError;

const USGS_SUMMARY_BASE: &str = "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary";
pub const DEFAULT_FAULT_LINES_URL: &str =
    "https://raw.githubusercontent.com/fraxen/tectonicplates/master/GeoJSON/PB2002_boundaries.json";

/// Default request timeout per feed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("quake-map/", env!("CARGO_PKG_VERSION"));

/// USGS summary feed URL covering every magnitude for `window`.
pub fn earthquake_feed_url(window: FeedWindow) -> String {
    format!("{USGS_SUMMARY_BASE}/all_{}.geojson", window.slug())
}

/// Both feeds after the join; either side may have failed independently.
#[derive(Debug, Clone)]
pub struct FetchedFeeds {
    pub earthquakes: Result<EarthquakeCollection, AppError>,
    pub fault_lines: Result<FaultLineCollection, AppError>,
}

pub struct FeedClient {
    client: Client,
    earthquake_url: String,
    fault_lines_url: String,
}

impl FeedClient {
    pub fn new(config: &MapConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            earthquake_url: config.earthquake_url.clone(),
            fault_lines_url: config.fault_lines_url.clone(),
        })
    }

    /// Fetch both documents in parallel and join.
    ///
    /// The two payloads are independent, so one failing doesn't cancel the
    /// other; the caller decides what a partial result means.
    pub fn fetch_all(&self) -> FetchedFeeds {
        let (earthquakes, fault_lines) = rayon::join(
            || self.fetch_earthquakes(),
            || self.fetch_fault_lines(),
        );
        FetchedFeeds {
            earthquakes,
            fault_lines,
        }
    }

    pub fn fetch_earthquakes(&self) -> Result<EarthquakeCollection, AppError> {
        let body = self.get_text(&self.earthquake_url, "earthquake")?;
        let quakes = decode_earthquakes(&body)?;
        tracing::info!(
            url = %self.earthquake_url,
            features = quakes.features.len(),
            skipped = quakes.skipped,
            "fetched earthquake feed"
        );
        Ok(quakes)
    }

    pub fn fetch_fault_lines(&self) -> Result<FaultLineCollection, AppError> {
        let body = self.get_text(&self.fault_lines_url, "fault-line")?;
        let faults = decode_fault_lines(&body)?;
        tracing::info!(
            url = %self.fault_lines_url,
            features = faults.features.len(),
            skipped = faults.skipped,
            "fetched fault-line feed"
        );
        Ok(faults)
    }

    fn get_text(&self, url: &str, what: &str) -> Result<String, AppError> {
        tracing::debug!(%url, "requesting {what} feed");
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| AppError::network(format!("{what} request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::network(format!(
                "{what} request failed with status {}.",
                resp.status()
            )));
        }

        resp.text()
            .map_err(|e| AppError::network(format!("Failed to read {what} response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;
    use std::time::Instant;

    use super::*;
    use crate::domain::AccessToken;
    use crate::error::ErrorKind;

    const QUAKES: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"mag": 2.1, "place": "Near Ridgecrest", "time": 1700000000000},
         "geometry": {"type": "Point", "coordinates": [-117.5, 35.7, 8.0]}}
    ]}"#;

    fn config(earthquake_url: String, fault_lines_url: String, timeout: Duration) -> MapConfig {
        MapConfig {
            earthquake_url,
            fault_lines_url,
            window: FeedWindow::Day,
            access_token: AccessToken::new("pk.test"),
            timeout,
            top_n: 5,
        }
    }

    fn read_request(stream: &mut TcpStream) {
        let mut buf = [0u8; 4096];
        let mut seen = Vec::new();
        while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => return,
                Ok(n) => seen.extend_from_slice(&buf[..n]),
            }
        }
    }

    /// Serve a single response, then close the connection.
    fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                read_request(&mut stream);
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/feed.geojson")
    }

    /// Accept a connection and never answer.
    fn serve_nothing(hold: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                read_request(&mut stream);
                thread::sleep(hold);
            }
        });
        format!("http://{addr}/boundaries.json")
    }

    #[test]
    fn fetches_and_decodes_a_served_feed() {
        let quakes = serve_once("200 OK", QUAKES);
        let cfg = config(quakes, "http://127.0.0.1:9/unused".to_string(), Duration::from_secs(5));
        let client = FeedClient::new(&cfg).unwrap();

        let collection = client.fetch_earthquakes().unwrap();
        assert_eq!(collection.features.len(), 1);
        assert_eq!(collection.features[0].place, "Near Ridgecrest");
    }

    #[test]
    fn each_feed_fails_on_its_own_within_the_timeout() {
        let timeout = Duration::from_secs(1);
        let quakes = serve_once("503 Service Unavailable", "");
        let faults = serve_nothing(Duration::from_secs(10));
        let client = FeedClient::new(&config(quakes, faults, timeout)).unwrap();

        let started = Instant::now();
        let fetched = client.fetch_all();
        let elapsed = started.elapsed();

        let quake_err = fetched.earthquakes.unwrap_err();
        assert_eq!(quake_err.kind(), ErrorKind::Network);
        assert!(quake_err.message().contains("503"));

        let fault_err = fetched.fault_lines.unwrap_err();
        assert_eq!(fault_err.kind(), ErrorKind::Network);
        assert!(fault_err.message().contains("fault-line request failed"));

        assert!(elapsed >= timeout);
        assert!(elapsed < Duration::from_secs(8), "took {elapsed:?}");
    }

    #[test]
    fn feed_url_uses_window_slug() {
        assert_eq!(
            earthquake_feed_url(FeedWindow::Month),
            "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_month.geojson"
        );
        assert!(earthquake_feed_url(FeedWindow::Hour).ends_with("/all_hour.geojson"));
    }
}
