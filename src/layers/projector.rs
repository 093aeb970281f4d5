//! Per-feature projectors.
//!
//! A closed set of named functions, picked by [`Feature`] variant: points become
//! circle markers with a popup, lines become polylines.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{EarthquakeFeature, FaultLineFeature, Feature, LatLng};
use crate::style::{choose_color, marker_size};

use super::{CircleMarker, Graphic, PathStyle, Polyline};

const MARKER_FILL_OPACITY: f64 = 0.7;
const MARKER_STROKE_WEIGHT: f64 = 0.5;
const MARKER_STROKE_COLOR: &str = "black";

pub const FAULT_LINE_WEIGHT: f64 = 2.0;
pub const FAULT_LINE_COLOR: &str = "orange";

/// Stroke style every fault line is drawn with.
pub fn fault_line_style() -> PathStyle {
    PathStyle {
        color: FAULT_LINE_COLOR.to_string(),
        weight: FAULT_LINE_WEIGHT,
        fill_color: None,
        fill_opacity: None,
    }
}

/// Text shown when a marker is selected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub place: String,
    /// Milliseconds since the Unix epoch.
    pub time: i64,
    pub magnitude: Option<f64>,
}

impl Popup {
    /// Event time rendered in UTC, or the raw value if it is out of range.
    pub fn time_label(&self) -> String {
        match DateTime::<Utc>::from_timestamp_millis(self.time) {
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            None => format!("{} ms", self.time),
        }
    }

    pub fn magnitude_label(&self) -> String {
        match self.magnitude {
            Some(m) => m.to_string(),
            None => "unknown".to_string(),
        }
    }

    pub fn title(&self) -> &str {
        if self.place.is_empty() {
            "Unknown location"
        } else {
            &self.place
        }
    }

    /// Plain-text lines (title, time, magnitude).
    pub fn lines(&self) -> [String; 3] {
        [
            self.title().to_string(),
            format!("Time: {}", self.time_label()),
            format!("Magnitude: {}", self.magnitude_label()),
        ]
    }

    pub fn to_text(&self) -> String {
        self.lines().join("\n")
    }

    /// HTML fragment for browser popups. The place name is escaped.
    pub fn to_html(&self) -> String {
        format!(
            "<h3>{}</h3><hr><p><b>Time:</b> {}<br /><b>Magnitude:</b> {}</p>",
            escape_html(self.title()),
            self.time_label(),
            self.magnitude_label()
        )
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Popup for one earthquake.
pub fn bind_popup(feature: &EarthquakeFeature) -> Popup {
    Popup {
        place: feature.place.clone(),
        time: feature.time,
        magnitude: feature.magnitude,
    }
}

/// Circle marker for one earthquake, with its popup attached.
///
/// A missing magnitude is styled as magnitude 0.
pub fn project_point(feature: &EarthquakeFeature) -> CircleMarker {
    let magnitude = feature.magnitude.unwrap_or(0.0);
    CircleMarker {
        center: LatLng::from(feature.coordinates),
        radius: marker_size(magnitude),
        magnitude: feature.magnitude,
        style: PathStyle {
            color: MARKER_STROKE_COLOR.to_string(),
            weight: MARKER_STROKE_WEIGHT,
            fill_color: Some(choose_color(magnitude).to_string()),
            fill_opacity: Some(MARKER_FILL_OPACITY),
        },
        popup: bind_popup(feature),
    }
}

/// Polyline for one fault line, vertices swapped into map axis order.
pub fn project_line(feature: &FaultLineFeature) -> Polyline {
    Polyline {
        name: feature.name.clone(),
        vertices: feature.vertices.iter().copied().map(LatLng::from).collect(),
        style: fault_line_style(),
    }
}

/// Route a feature to its projector.
pub fn project(feature: &Feature) -> Graphic {
    match feature {
        Feature::Point(quake) => Graphic::Marker(project_point(quake)),
        Feature::Line(fault) => Graphic::Line(project_line(fault)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LonLat;

    fn quake(lon: f64, lat: f64, mag: Option<f64>) -> EarthquakeFeature {
        EarthquakeFeature {
            id: None,
            coordinates: LonLat { lon, lat },
            magnitude: mag,
            place: "10km N of Example".to_string(),
            time: 1_700_000_000_000,
        }
    }

    #[test]
    fn point_projector_swaps_axes_and_styles() {
        let marker = project_point(&quake(-122.4, 37.8, Some(4.2)));
        assert_eq!(marker.center.lat, 37.8);
        assert_eq!(marker.center.lng, -122.4);
        assert!((marker.radius - 12.6).abs() < 1e-9);
        assert_eq!(marker.style.color, "black");
        assert_eq!(marker.style.weight, 0.5);
        assert_eq!(marker.style.fill_opacity, Some(0.7));
        assert_eq!(marker.style.fill_color.as_deref(), Some("#F0A76B"));
    }

    #[test]
    fn popup_text_has_place_time_and_magnitude() {
        let popup = bind_popup(&quake(-122.4, 37.8, Some(4.2)));
        let text = popup.to_text();
        assert!(text.contains("10km N of Example"));
        assert!(text.contains("4.2"));
        assert!(text.contains("2023-11-14 22:13:20 UTC"), "{text}");
    }

    #[test]
    fn popup_html_escapes_place() {
        let mut feature = quake(0.0, 0.0, None);
        feature.place = "<b>Q&A</b>".to_string();
        let html = bind_popup(&feature).to_html();
        assert!(html.starts_with("<h3>&lt;b&gt;Q&amp;A&lt;/b&gt;</h3><hr>"));
        assert!(html.contains("<b>Magnitude:</b> unknown"));
    }

    #[test]
    fn missing_magnitude_styles_as_zero() {
        let marker = project_point(&quake(10.0, 20.0, None));
        assert_eq!(marker.radius, 0.0);
        assert_eq!(marker.style.fill_color.as_deref(), Some("#B7F34D"));
        assert_eq!(marker.magnitude, None);
    }

    #[test]
    fn line_projector_swaps_every_vertex() {
        let fault = FaultLineFeature {
            name: Some("NA-PA".to_string()),
            vertices: vec![LonLat { lon: -120.0, lat: 35.0 }, LonLat { lon: -121.0, lat: 36.5 }],
        };
        match project(&Feature::Line(fault)) {
            Graphic::Line(line) => {
                assert_eq!(line.vertices[0], LatLng { lat: 35.0, lng: -120.0 });
                assert_eq!(line.vertices[1], LatLng { lat: 36.5, lng: -121.0 });
                assert_eq!(line.style.weight, 2.0);
                assert_eq!(line.style.color, "orange");
            }
            other => panic!("expected a polyline, got {other:?}"),
        }
    }
}
