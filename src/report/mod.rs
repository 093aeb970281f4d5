//! Plain-text reports of an assembled map.
//!
//! Formatting lives here so the pipeline stays presentation-free and output
//! changes stay local.

use crate::app::pipeline::MapRun;
use crate::domain::{EarthquakeFeature, MapConfig};
use crate::layers::bind_popup;
use crate::style::{STYLE_BUCKETS, bucket_index};

/// Number of events per legend bucket (same order as [`STYLE_BUCKETS`]).
pub fn bucket_counts(features: &[EarthquakeFeature]) -> [usize; STYLE_BUCKETS.len()] {
    let mut counts = [0; STYLE_BUCKETS.len()];
    for f in features {
        counts[bucket_index(f.magnitude.unwrap_or(0.0))] += 1;
    }
    counts
}

/// The `n` largest events, strongest first. Events without a magnitude are left out.
pub fn strongest(features: &[EarthquakeFeature], n: usize) -> Vec<&EarthquakeFeature> {
    let mut ranked: Vec<&EarthquakeFeature> = features.iter().filter(|f| f.magnitude.is_some()).collect();
    ranked.sort_by(|a, b| {
        b.magnitude
            .partial_cmp(&a.magnitude)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(n);
    ranked
}

/// Map summary: feed, view, layers, legend with per-bucket counts, issues.
pub fn format_map_summary(run: &MapRun, config: &MapConfig) -> String {
    let map = &run.map;
    let mut out = String::new();

    out.push_str("=== quake - earthquakes & plate boundaries ===\n");
    if let Some(title) = &run.metadata.title {
        out.push_str(&format!("Feed: {title}\n"));
    } else {
        out.push_str(&format!("Feed: {} ({})\n", config.earthquake_url, config.window.display_name()));
    }
    if let Some(details) = run.metadata.describe() {
        out.push_str(&format!("      {details}\n"));
    }
    out.push_str(&format!(
        "View: center=({:.2}, {:.2}) zoom={} scroll-wheel zoom={}\n",
        map.view.center.lat,
        map.view.center.lng,
        map.view.zoom,
        if map.view.scroll_wheel_zoom { "on" } else { "off" }
    ));
    out.push_str(&format!(
        "Graphics: {} markers | {} fault polylines\n",
        map.marker_count(),
        map.polyline_count()
    ));

    out.push_str("\nBase layers:\n");
    for (idx, base) in map.base_layers.iter().enumerate() {
        let mark = if idx == map.active_base { "(*)" } else { "( )" };
        out.push_str(&format!("  {mark} {:<10} {}\n", base.name, base.redacted_template()));
    }

    out.push_str("\nOverlays:\n");
    for overlay in &map.overlays {
        let mark = if overlay.visible { "[x]" } else { "[ ]" };
        out.push_str(&format!(
            "  {mark} {:<12} {} graphics\n",
            overlay.name,
            overlay.layer.graphics.len()
        ));
    }

    out.push_str("\nLegend (magnitude):\n");
    let counts = run
        .earthquakes
        .as_ref()
        .map(|q| bucket_counts(&q.features));
    for (idx, entry) in map.legend.entries.iter().enumerate() {
        match counts {
            Some(counts) => out.push_str(&format!("  {} {:<4} {:>6}\n", entry.color, entry.label, counts[idx])),
            None => out.push_str(&format!("  {} {:<4}\n", entry.color, entry.label)),
        }
    }

    if let Some(quakes) = &run.earthquakes {
        if quakes.skipped > 0 {
            out.push_str(&format!("\nSkipped {} earthquake records without a position.\n", quakes.skipped));
        }
    }

    if !run.issues.is_empty() {
        out.push_str("\nIssues:\n");
        for issue in &run.issues {
            out.push_str(&format!("  - {}: {}\n", issue.overlay.display_name(), issue.error));
        }
    }

    out
}

/// Popups of the strongest events.
pub fn format_strongest(run: &MapRun, n: usize) -> String {
    let Some(quakes) = &run.earthquakes else {
        return "No earthquake data.".to_string();
    };
    let top = strongest(&quakes.features, n);
    if top.is_empty() {
        return "No earthquakes with a magnitude in this feed.".to_string();
    }

    let mut out = format!("Strongest {} events:\n", top.len());
    for (rank, f) in top.iter().enumerate() {
        let popup = bind_popup(f);
        out.push_str(&format!(
            "{:>3}. M{:<5} {:<44} {}  ({:.2}, {:.2})\n",
            rank + 1,
            popup.magnitude_label(),
            popup.title(),
            popup.time_label(),
            f.coordinates.lat,
            f.coordinates.lon,
        ));
    }
    out
}
