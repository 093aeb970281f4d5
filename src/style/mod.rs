//! Magnitude → color/radius mapping.
//!
//! Marker coloring and the legend both read [`STYLE_BUCKETS`], so the two can't
//! drift apart.

/// One magnitude bucket: exclusive lower bound, fill color, legend label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleBucket {
    pub lower_bound: f64,
    pub color: &'static str,
    pub label: &'static str,
}

/// Buckets in strictly increasing order of `lower_bound`.
///
/// The first bucket's bound is never compared; it catches everything `<= 1`
/// (including NaN).
pub const STYLE_BUCKETS: [StyleBucket; 6] = [
    StyleBucket { lower_bound: f64::NEG_INFINITY, color: "#B7F34D", label: "0-1" },
    StyleBucket { lower_bound: 1.0, color: "#E2F350", label: "1-2" },
    StyleBucket { lower_bound: 2.0, color: "#F3DB4D", label: "2-3" },
    StyleBucket { lower_bound: 3.0, color: "#F3BA4D", label: "3-4" },
    StyleBucket { lower_bound: 4.0, color: "#F0A76B", label: "4-5" },
    StyleBucket { lower_bound: 5.0, color: "#F06B6B", label: "5+" },
];

/// Integer grades the legend is drawn for, one per bucket.
pub const LEGEND_GRADES: [u8; 6] = [0, 1, 2, 3, 4, 5];

const RADIUS_PER_MAGNITUDE: f64 = 3.0;

/// Index into [`STYLE_BUCKETS`] for a magnitude.
///
/// Thresholds are exclusive and evaluated high-to-low; anything that fails every
/// comparison (`<= 1`, NaN) lands in bucket 0.
pub fn bucket_index(magnitude: f64) -> usize {
    STYLE_BUCKETS
        .iter()
        .rposition(|bucket| magnitude > bucket.lower_bound)
        .unwrap_or(0)
}

/// Fill color for a magnitude.
pub fn choose_color(magnitude: f64) -> &'static str {
    STYLE_BUCKETS[bucket_index(magnitude)].color
}

/// Marker radius (pixels) for a magnitude: linear, factor 3.
///
/// Negative magnitudes (the feed has a few) produce a zero radius rather than a
/// negative one; renderers apply their own minimum visible size.
pub fn marker_size(magnitude: f64) -> f64 {
    (magnitude * RADIUS_PER_MAGNITUDE).max(0.0)
}

/// A legend row: swatch color next to a bucket label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct LegendEntry {
    pub label: &'static str,
    pub color: &'static str,
}

/// Legend rows for the six buckets.
///
/// The swatch is queried at `grade + 1`. Because thresholds are exclusive, the
/// magnitudes labelled "4-5" are the ones in `(4, 5]`, which `choose_color(5)`
/// colors; querying at `grade` would show the bucket below.
pub fn legend_entries() -> Vec<LegendEntry> {
    LEGEND_GRADES
        .iter()
        .zip(STYLE_BUCKETS.iter())
        .map(|(&grade, bucket)| LegendEntry {
            label: bucket.label,
            color: choose_color(f64::from(grade) + 1.0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_follow_exclusive_thresholds() {
        assert_eq!(choose_color(6.0), "#F06B6B");
        assert_eq!(choose_color(5.0), "#F0A76B");
        assert_eq!(choose_color(4.2), "#F0A76B");
        assert_eq!(choose_color(4.0), "#F3BA4D");
        assert_eq!(choose_color(3.5), "#F3BA4D");
        assert_eq!(choose_color(2.5), "#F3DB4D");
        assert_eq!(choose_color(1.5), "#E2F350");
        assert_eq!(choose_color(1.0), "#B7F34D");
        assert_eq!(choose_color(0.0), "#B7F34D");
        assert_eq!(choose_color(-1.2), "#B7F34D");
        assert_eq!(choose_color(f64::NAN), "#B7F34D");
    }

    #[test]
    fn bucket_index_never_decreases_with_magnitude() {
        let mut prev = 0;
        let mut m = -2.0;
        while m <= 9.0 {
            let idx = bucket_index(m);
            assert!(idx >= prev, "bucket went down at m={m}");
            assert!(STYLE_BUCKETS.iter().any(|b| b.color == choose_color(m)));
            prev = idx;
            m += 0.05;
        }
        assert_eq!(prev, STYLE_BUCKETS.len() - 1);
    }

    #[test]
    fn bucket_bounds_strictly_increase() {
        for pair in STYLE_BUCKETS.windows(2) {
            assert!(pair[0].lower_bound < pair[1].lower_bound);
        }
    }

    #[test]
    fn marker_size_is_three_times_magnitude() {
        assert_eq!(marker_size(0.0), 0.0);
        assert_eq!(marker_size(1.5), 4.5);
        assert_eq!(marker_size(6.0), 18.0);
        assert!(marker_size(2.1) < marker_size(2.2));
        assert_eq!(marker_size(-0.8), 0.0);
    }

    #[test]
    fn legend_swatch_for_four_to_five_matches_magnitude_five() {
        let legend = legend_entries();
        let labels: Vec<_> = legend.iter().map(|e| e.label).collect();
        assert_eq!(labels, ["0-1", "1-2", "2-3", "3-4", "4-5", "5+"]);

        let row = legend.iter().find(|e| e.label == "4-5").unwrap();
        assert_eq!(row.color, choose_color(5.0));
        assert_eq!(legend[0].color, choose_color(1.0));
        assert_eq!(legend[5].color, "#F06B6B");
    }
}
