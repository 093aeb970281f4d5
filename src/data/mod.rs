//! Feed access: HTTP fetching and GeoJSON decoding.

pub mod feeds;
pub mod geojson;

pub use feeds::{DEFAULT_FAULT_LINES_URL, DEFAULT_TIMEOUT, FeedClient, FetchedFeeds, earthquake_feed_url};
pub use geojson::{decode_earthquakes, decode_fault_lines};
