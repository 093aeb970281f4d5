//! Map assembly: view, base tile layers, overlays, layer control, legend.
//!
//! The result is a declarative [`MapModel`]. Presentation surfaces (terminal,
//! HTML) read it; only [`MapModel::select_base`] and
//! [`MapModel::toggle_overlay`] change it after assembly.

use serde::Serialize;

use crate::domain::{AccessToken, LatLng};
use crate::layers::{EARTHQUAKES_LAYER, FAULT_LINES_LAYER, Layer};
use crate::style::{LegendEntry, legend_entries};

const MAPBOX_STYLES_BASE: &str = "https://api.mapbox.com/styles/v1/mapbox";

pub const DEFAULT_CENTER: LatLng = LatLng { lat: 37.09, lng: -95.71 };
pub const DEFAULT_ZOOM: u8 = 4;
pub const MAP_CONTAINER_ID: &str = "map";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseLayerKind {
    Outdoors,
    Satellite,
    Dark,
}

impl BaseLayerKind {
    pub const ALL: [BaseLayerKind; 3] = [BaseLayerKind::Outdoors, BaseLayerKind::Satellite, BaseLayerKind::Dark];

    /// Name shown in the layer control.
    pub fn display_name(self) -> &'static str {
        match self {
            BaseLayerKind::Outdoors => "Outdoors",
            BaseLayerKind::Satellite => "Satellite",
            BaseLayerKind::Dark => "GrayScale",
        }
    }

    pub fn style_id(self) -> &'static str {
        match self {
            BaseLayerKind::Outdoors => "outdoors-v10",
            BaseLayerKind::Satellite => "satellite-v9",
            BaseLayerKind::Dark => "dark-v9",
        }
    }
}

/// A raster tile source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileLayer {
    pub kind: BaseLayerKind,
    pub name: &'static str,
    /// `{z}/{x}/{y}` template with the access token already filled in.
    pub url_template: String,
}

impl TileLayer {
    pub fn new(kind: BaseLayerKind, token: &AccessToken) -> Self {
        Self {
            kind,
            name: kind.display_name(),
            url_template: format!(
                "{MAPBOX_STYLES_BASE}/{}/tiles/256/{{z}}/{{x}}/{{y}}?access_token={}",
                kind.style_id(),
                token.as_str()
            ),
        }
    }

    /// Template with the token masked, for logs and reports.
    pub fn redacted_template(&self) -> String {
        match self.url_template.split_once("access_token=") {
            Some((head, _)) => format!("{head}access_token=***"),
            None => self.url_template.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    Earthquakes,
    FaultLines,
}

impl OverlayKind {
    pub fn display_name(self) -> &'static str {
        match self {
            OverlayKind::Earthquakes => EARTHQUAKES_LAYER,
            OverlayKind::FaultLines => FAULT_LINES_LAYER,
        }
    }
}

/// An independently togglable layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub kind: OverlayKind,
    pub name: &'static str,
    pub visible: bool,
    pub layer: Layer,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
    pub scroll_wheel_zoom: bool,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            scroll_wheel_zoom: false,
        }
    }
}

/// Control corner; serializes to Leaflet's spelling (`bottomright`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlPosition {
    TopRight,
    BottomRight,
}

/// Layer-switcher control listing base and overlay names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerControl {
    pub collapsed: bool,
    pub position: ControlPosition,
    pub base_names: Vec<&'static str>,
    pub overlay_names: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub position: ControlPosition,
    pub entries: Vec<LegendEntry>,
}

/// The assembled map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapModel {
    pub container: &'static str,
    pub view: MapView,
    pub base_layers: Vec<TileLayer>,
    pub active_base: usize,
    pub overlays: Vec<Overlay>,
    pub layer_control: LayerControl,
    pub legend: Legend,
}

impl MapModel {
    pub fn active_base(&self) -> &TileLayer {
        &self.base_layers[self.active_base]
    }

    /// Make `kind` the single active base layer. Returns `false` if not registered.
    pub fn select_base(&mut self, kind: BaseLayerKind) -> bool {
        match self.base_layers.iter().position(|b| b.kind == kind) {
            Some(idx) => {
                self.active_base = idx;
                true
            }
            None => false,
        }
    }

    /// Flip an overlay's visibility. Returns the new state, or `None` if the
    /// overlay isn't on the map (its feed failed).
    pub fn toggle_overlay(&mut self, kind: OverlayKind) -> Option<bool> {
        let overlay = self.overlays.iter_mut().find(|o| o.kind == kind)?;
        overlay.visible = !overlay.visible;
        Some(overlay.visible)
    }

    pub fn overlay(&self, kind: OverlayKind) -> Option<&Overlay> {
        self.overlays.iter().find(|o| o.kind == kind)
    }

    pub fn visible_overlays(&self) -> impl Iterator<Item = &Overlay> {
        self.overlays.iter().filter(|o| o.visible)
    }

    pub fn marker_count(&self) -> usize {
        self.overlays.iter().map(|o| o.layer.marker_count()).sum()
    }

    pub fn polyline_count(&self) -> usize {
        self.overlays.iter().map(|o| o.layer.polyline_count()).sum()
    }
}

/// Build the map from whichever layers are available.
///
/// Outdoors starts active, Earthquakes starts visible, Fault Lines starts hidden.
/// A `None` layer (failed feed) is left out of both the overlays and the control.
pub fn assemble_map(
    earthquakes: Option<Layer>,
    fault_lines: Option<Layer>,
    token: &AccessToken,
) -> MapModel {
    let base_layers: Vec<TileLayer> = BaseLayerKind::ALL
        .iter()
        .map(|&kind| TileLayer::new(kind, token))
        .collect();

    let mut overlays = Vec::with_capacity(2);
    if let Some(layer) = earthquakes {
        overlays.push(Overlay {
            kind: OverlayKind::Earthquakes,
            name: OverlayKind::Earthquakes.display_name(),
            visible: true,
            layer,
        });
    }
    if let Some(layer) = fault_lines {
        overlays.push(Overlay {
            kind: OverlayKind::FaultLines,
            name: OverlayKind::FaultLines.display_name(),
            visible: false,
            layer,
        });
    }

    let layer_control = LayerControl {
        collapsed: false,
        position: ControlPosition::TopRight,
        base_names: base_layers.iter().map(|b| b.name).collect(),
        overlay_names: overlays.iter().map(|o| o.name).collect(),
    };

    let map = MapModel {
        container: MAP_CONTAINER_ID,
        view: MapView::default(),
        base_layers,
        active_base: 0,
        overlays,
        layer_control,
        legend: Legend {
            position: ControlPosition::BottomRight,
            entries: legend_entries(),
        },
    };

    tracing::info!(
        base = map.active_base().name,
        overlays = map.overlays.len(),
        markers = map.marker_count(),
        polylines = map.polyline_count(),
        "assembled map"
    );
    map
}
