//! GeoJSON decoding for the earthquake and plate-boundary documents.
//!
//! Only the fields the map needs are modelled. Records that can't be placed on
//! the map (no geometry, fewer than two coordinates, unexpected geometry type)
//! are counted as skipped rather than failing the whole document; a document
//! that isn't a `FeatureCollection` at all is `Malformed`.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::domain::{
    EarthquakeCollection, EarthquakeFeature, FaultLineCollection, FaultLineFeature, FeedMetadata,
    LonLat,
};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct RawCollection<P> {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    metadata: Option<RawMetadata>,
    #[serde(default = "Vec::new")]
    features: Vec<RawFeature<P>>,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    title: Option<String>,
    generated: Option<i64>,
    count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawFeature<P> {
    #[serde(default)]
    id: Option<String>,
    geometry: Option<RawGeometry>,
    properties: Option<P>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Point {
        coordinates: Vec<f64>,
    },
    LineString {
        coordinates: Vec<Vec<f64>>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Default, Deserialize)]
struct QuakeProperties {
    mag: Option<f64>,
    place: Option<String>,
    time: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct BoundaryProperties {
    #[serde(rename = "Name")]
    name: Option<String>,
}

fn parse_collection<P: DeserializeOwned>(body: &str, what: &str) -> Result<RawCollection<P>, AppError> {
    let raw: RawCollection<P> = serde_json::from_str(body)
        .map_err(|e| AppError::malformed(format!("Failed to parse {what} GeoJSON: {e}")))?;
    if raw.kind != "FeatureCollection" {
        return Err(AppError::malformed(format!(
            "Expected a {what} FeatureCollection, got type '{}'.",
            raw.kind
        )));
    }
    Ok(raw)
}

fn lon_lat(position: &[f64]) -> Option<LonLat> {
    match position {
        [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Some(LonLat { lon: *lon, lat: *lat }),
        _ => None,
    }
}

fn line(positions: &[Vec<f64>]) -> Option<Vec<LonLat>> {
    let vertices: Option<Vec<LonLat>> = positions.iter().map(|p| lon_lat(p)).collect();
    vertices.filter(|v| v.len() >= 2)
}

/// Decode the earthquake feed.
pub fn decode_earthquakes(body: &str) -> Result<EarthquakeCollection, AppError> {
    let raw: RawCollection<QuakeProperties> = parse_collection(body, "earthquake")?;

    let metadata = raw
        .metadata
        .map(|m| FeedMetadata {
            title: m.title,
            generated: m.generated,
            count: m.count,
        })
        .unwrap_or_default();

    let mut features = Vec::with_capacity(raw.features.len());
    let mut skipped = 0;
    for feature in raw.features {
        let coordinates = match &feature.geometry {
            Some(RawGeometry::Point { coordinates }) => lon_lat(coordinates),
            _ => None,
        };
        let Some(coordinates) = coordinates else {
            skipped += 1;
            continue;
        };
        let props = feature.properties.unwrap_or_default();
        features.push(EarthquakeFeature {
            id: feature.id,
            coordinates,
            magnitude: props.mag.filter(|m| m.is_finite()),
            place: props.place.unwrap_or_default(),
            time: props.time.unwrap_or(0),
        });
    }

    if skipped > 0 {
        tracing::debug!(skipped, "earthquake records without usable point geometry");
    }

    Ok(EarthquakeCollection {
        metadata,
        features,
        skipped,
    })
}

/// Decode the plate-boundary document.
///
/// A `MultiLineString` record becomes one feature per member line.
pub fn decode_fault_lines(body: &str) -> Result<FaultLineCollection, AppError> {
    let raw: RawCollection<BoundaryProperties> = parse_collection(body, "fault-line")?;

    let mut features = Vec::with_capacity(raw.features.len());
    let mut skipped = 0;
    for feature in raw.features {
        let name = feature.properties.and_then(|p| p.name);
        match feature.geometry {
            Some(RawGeometry::LineString { coordinates }) => match line(&coordinates) {
                Some(vertices) => features.push(FaultLineFeature { name, vertices }),
                None => skipped += 1,
            },
            Some(RawGeometry::MultiLineString { coordinates }) => {
                for part in &coordinates {
                    match line(part) {
                        Some(vertices) => features.push(FaultLineFeature {
                            name: name.clone(),
                            vertices,
                        }),
                        None => skipped += 1,
                    }
                }
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!(skipped, "fault-line records without usable line geometry");
    }

    Ok(FaultLineCollection { features, skipped })
}
