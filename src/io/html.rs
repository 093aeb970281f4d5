//! Standalone Leaflet page for an assembled map.
//!
//! The page embeds the serialized [`MapModel`] and a small script that turns
//! it into Leaflet layers, so the browser shows exactly what the model says:
//! the same view, base layers, overlays, control and legend.

use std::fs;
use std::path::Path;

use crate::error::AppError;
use crate::layers::Graphic;
use crate::map::MapModel;

const LEAFLET_VERSION: &str = "1.9.4";

const SCRIPT: &str = r#"
const model = JSON.parse(document.getElementById("map-model").textContent);
const map = L.map(model.container, {
  center: [model.view.center.lat, model.view.center.lng],
  zoom: model.view.zoom,
  scrollWheelZoom: model.view.scroll_wheel_zoom,
});
const baseMaps = {};
model.base_layers.forEach((base, idx) => {
  const tiles = L.tileLayer(base.url_template);
  baseMaps[base.name] = tiles;
  if (idx === model.active_base) tiles.addTo(map);
});
const pathOptions = (s) => ({
  color: s.color, weight: s.weight,
  fillColor: s.fill_color ?? undefined, fillOpacity: s.fill_opacity ?? undefined,
});
const overlayMaps = {};
model.overlays.forEach((overlay) => {
  const group = L.layerGroup();
  overlay.layer.graphics.forEach((g) => {
    if (g.kind === "marker") {
      L.circleMarker([g.center.lat, g.center.lng], { ...pathOptions(g.style), radius: g.radius })
        .bindPopup(g.popup_html).addTo(group);
    } else {
      L.polyline(g.vertices.map((v) => [v.lat, v.lng]), pathOptions(g.style)).addTo(group);
    }
  });
  overlayMaps[overlay.name] = group;
  if (overlay.visible) group.addTo(map);
});
L.control.layers(baseMaps, overlayMaps, {
  collapsed: model.layer_control.collapsed,
  position: model.layer_control.position,
}).addTo(map);
const legend = L.control({ position: model.legend.position });
legend.onAdd = () => {
  const div = L.DomUtil.create("div", "info legend");
  div.innerHTML = model.legend.entries
    .map((e) => `<i style="background:${e.color}"></i> ${e.label}`)
    .join("<br>");
  return div;
};
legend.addTo(map);
"#;

const STYLE: &str = r#"
html, body, #map { height: 100%; width: 100%; margin: 0; padding: 0; }
.legend { background: white; padding: 6px 8px; line-height: 18px; color: #555; border-radius: 4px; }
.legend i { width: 18px; height: 18px; float: left; margin-right: 8px; opacity: 0.9; }
"#;

/// Render the page as a string.
pub fn render_map_html(map: &MapModel) -> Result<String, AppError> {
    let payload = map_payload(map)?;
    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Earthquakes &amp; Plate Boundaries</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.css">
<style>{STYLE}</style>
</head>
<body>
<div id="{container}"></div>
<script id="map-model" type="application/json">{payload}</script>
<script src="https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.js"></script>
<script>{SCRIPT}</script>
</body>
</html>
"#,
        container = map.container,
    ))
}

/// Write the page to `path`.
pub fn write_map_html(path: &Path, map: &MapModel) -> Result<(), AppError> {
    let html = render_map_html(map)?;
    fs::write(path, html)
        .map_err(|e| AppError::io(format!("Failed to write HTML '{}': {e}", path.display())))?;
    tracing::info!(path = %path.display(), "wrote map page");
    Ok(())
}

/// Serialize the model, adding pre-rendered popup HTML to every marker.
fn map_payload(map: &MapModel) -> Result<String, AppError> {
    let mut value = serde_json::to_value(map)
        .map_err(|e| AppError::io(format!("Failed to serialize map: {e}")))?;

    if let Some(overlays) = value["overlays"].as_array_mut() {
        for (overlay, json) in map.overlays.iter().zip(overlays.iter_mut()) {
            let Some(graphics) = json["layer"]["graphics"].as_array_mut() else {
                continue;
            };
            for (graphic, slot) in overlay.layer.graphics.iter().zip(graphics.iter_mut()) {
                if let Graphic::Marker(marker) = graphic {
                    slot["popup_html"] = serde_json::Value::String(marker.popup.to_html());
                }
            }
        }
    }

    let json = serde_json::to_string(&value)
        .map_err(|e| AppError::io(format!("Failed to serialize map: {e}")))?;
    // Keep a popup containing "</script>" from closing the data block.
    Ok(json.replace("</", "<\\/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccessToken, EarthquakeCollection, EarthquakeFeature, LonLat};
    use crate::layers::build_earthquake_layer;
    use crate::map::assemble_map;

    fn sample_map() -> MapModel {
        let quakes = EarthquakeCollection {
            features: vec![EarthquakeFeature {
                id: Some("x".to_string()),
                coordinates: LonLat { lon: -122.4, lat: 37.8 },
                magnitude: Some(4.2),
                place: "</script><b>Bay</b>".to_string(),
                time: 1_700_000_000_000,
            }],
            ..Default::default()
        };
        assemble_map(Some(build_earthquake_layer(&quakes)), None, &AccessToken::new("pk.html"))
    }

    #[test]
    fn page_embeds_model_and_tiles() {
        let html = render_map_html(&sample_map()).unwrap();
        assert!(html.contains(r#"<div id="map"></div>"#));
        assert!(html.contains("outdoors-v10/tiles/256/{z}/{x}/{y}?access_token=pk.html"));
        assert!(html.contains(r#""position":"bottomright""#));
        assert!(html.contains("L.control.layers"));
    }

    #[test]
    fn popups_are_escaped_and_cannot_close_the_script() {
        let html = render_map_html(&sample_map()).unwrap();
        assert!(html.contains("&lt;/script&gt;&lt;b&gt;Bay&lt;/b&gt;"));
        assert!(html.contains(r#""place":"<\/script><b>Bay<\/b>""#));
        assert_eq!(html.matches("</script>").count(), 3);
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.html");
        write_map_html(&path, &sample_map()).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
    }
}
