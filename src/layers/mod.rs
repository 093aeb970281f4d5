//! Map graphics and the layers built from the two feeds.
//!
//! Every graphic a layer owns is drawn and hidden together, so toggling a layer
//! in the layer control always affects all of its features.

use serde::Serialize;

use crate::domain::{EarthquakeCollection, FaultLineCollection, Feature, LatLng};

pub mod projector;

pub use projector::{Popup, bind_popup, escape_html, fault_line_style, project, project_line, project_point};

/// Stroke/fill style shared by markers and polylines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathStyle {
    pub color: String,
    pub weight: f64,
    pub fill_color: Option<String>,
    pub fill_opacity: Option<f64>,
}

/// A circle marker with its popup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircleMarker {
    pub center: LatLng,
    /// Radius in screen pixels.
    pub radius: f64,
    pub magnitude: Option<f64>,
    pub style: PathStyle,
    pub popup: Popup,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polyline {
    pub name: Option<String>,
    pub vertices: Vec<LatLng>,
    pub style: PathStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Graphic {
    Marker(CircleMarker),
    Line(Polyline),
}

/// A composite layer: a named group of graphics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub name: String,
    pub graphics: Vec<Graphic>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graphics: Vec::new(),
        }
    }

    pub fn markers(&self) -> impl Iterator<Item = &CircleMarker> {
        self.graphics.iter().filter_map(|g| match g {
            Graphic::Marker(m) => Some(m),
            Graphic::Line(_) => None,
        })
    }

    pub fn polylines(&self) -> impl Iterator<Item = &Polyline> {
        self.graphics.iter().filter_map(|g| match g {
            Graphic::Line(l) => Some(l),
            Graphic::Marker(_) => None,
        })
    }

    pub fn marker_count(&self) -> usize {
        self.markers().count()
    }

    pub fn polyline_count(&self) -> usize {
        self.polylines().count()
    }

    pub fn is_empty(&self) -> bool {
        self.graphics.is_empty()
    }

    /// Apply one style to every polyline in the layer.
    pub fn override_line_style(&mut self, style: &PathStyle) {
        for graphic in &mut self.graphics {
            if let Graphic::Line(line) = graphic {
                line.style = style.clone();
            }
        }
    }
}

pub const EARTHQUAKES_LAYER: &str = "Earthquakes";
pub const FAULT_LINES_LAYER: &str = "Fault Lines";

/// One marker (with popup) per earthquake.
pub fn build_earthquake_layer(collection: &EarthquakeCollection) -> Layer {
    let mut layer = Layer::new(EARTHQUAKES_LAYER);
    layer.graphics = collection
        .features
        .iter()
        .cloned()
        .map(|f| project(&Feature::Point(f)))
        .collect();
    tracing::debug!(markers = layer.graphics.len(), "built earthquake layer");
    layer
}

/// One polyline per fault line, all bound into the returned layer.
pub fn build_fault_line_layer(collection: &FaultLineCollection) -> Layer {
    let mut layer = Layer::new(FAULT_LINES_LAYER);
    layer.graphics = collection
        .features
        .iter()
        .cloned()
        .map(|f| project(&Feature::Line(f)))
        .collect();
    layer.override_line_style(&fault_line_style());
    tracing::debug!(polylines = layer.graphics.len(), "built fault-line layer");
    layer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EarthquakeFeature, FaultLineFeature, LonLat};

    fn quakes(mags: &[f64]) -> EarthquakeCollection {
        EarthquakeCollection {
            features: mags
                .iter()
                .enumerate()
                .map(|(i, &m)| EarthquakeFeature {
                    id: Some(format!("q{i}")),
                    coordinates: LonLat { lon: -100.0 + i as f64, lat: 30.0 },
                    magnitude: Some(m),
                    place: format!("place {i}"),
                    time: 0,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn earthquake_layer_has_one_marker_per_feature() {
        let layer = build_earthquake_layer(&quakes(&[1.5, 6.0]));
        assert_eq!(layer.name, "Earthquakes");
        assert_eq!(layer.marker_count(), 2);
        assert_eq!(layer.polyline_count(), 0);

        let radii: Vec<f64> = layer.markers().map(|m| m.radius).collect();
        assert_eq!(radii, [4.5, 18.0]);
        assert_eq!(
            layer.markers().last().and_then(|m| m.style.fill_color.clone()).as_deref(),
            Some("#F06B6B")
        );
    }

    #[test]
    fn fault_line_layer_binds_lines_with_uniform_style() {
        let faults = FaultLineCollection {
            features: vec![FaultLineFeature {
                name: None,
                vertices: vec![LonLat { lon: 0.0, lat: 0.0 }, LonLat { lon: 1.0, lat: 1.0 }],
            }],
            skipped: 0,
        };
        let layer = build_fault_line_layer(&faults);
        assert_eq!(layer.name, "Fault Lines");
        assert_eq!(layer.polyline_count(), 1);
        assert!(layer.polylines().all(|l| l.style == fault_line_style()));
    }

    #[test]
    fn empty_collections_give_empty_layers() {
        assert!(build_earthquake_layer(&EarthquakeCollection::default()).is_empty());
        assert!(build_fault_line_layer(&FaultLineCollection::default()).is_empty());
    }
}
