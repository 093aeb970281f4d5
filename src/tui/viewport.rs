//! Mapping between the map view (center + web-map zoom) and canvas bounds.
//!
//! The terminal has no pixels, so a cell is treated as an 8x16 px glyph. That
//! keeps zoom levels and marker radii comparable to the browser page.

use crate::domain::LatLng;
use crate::map::MapView;

const TILE_SIZE: f64 = 256.0;
const CELL_WIDTH_PX: f64 = 8.0;
const CELL_HEIGHT_PX: f64 = 16.0;

pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 10;

/// Markers smaller than this (including magnitude <= 0) are drawn at this size.
pub const MIN_VISIBLE_RADIUS_PX: f64 = 2.0;

/// Fraction of the visible span moved per pan step.
const PAN_STEP: f64 = 0.125;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: u8,
}

impl Viewport {
    pub fn from_view(view: &MapView) -> Self {
        Self {
            center: view.center,
            zoom: view.zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    /// Degrees of longitude covered by one screen pixel.
    pub fn degrees_per_pixel(&self) -> f64 {
        360.0 / (TILE_SIZE * 2f64.powi(i32::from(self.zoom)))
    }

    /// `(lon, lat)` spans for an area of `cols` x `rows` cells.
    pub fn spans(&self, cols: u16, rows: u16) -> (f64, f64) {
        let dpp = self.degrees_per_pixel();
        let lon = (f64::from(cols) * CELL_WIDTH_PX * dpp).min(360.0);
        let lat = (f64::from(rows) * CELL_HEIGHT_PX * dpp).min(180.0);
        (lon, lat)
    }

    /// Canvas `x_bounds` (longitude) and `y_bounds` (latitude).
    pub fn bounds(&self, cols: u16, rows: u16) -> ([f64; 2], [f64; 2]) {
        let (lon_span, lat_span) = self.spans(cols, rows);
        let x = [self.center.lng - lon_span / 2.0, self.center.lng + lon_span / 2.0];
        let y = [self.center.lat - lat_span / 2.0, self.center.lat + lat_span / 2.0];
        (x, y)
    }

    /// Marker radius in degrees, floored at [`MIN_VISIBLE_RADIUS_PX`].
    pub fn radius_degrees(&self, radius_px: f64) -> f64 {
        radius_px.max(MIN_VISIBLE_RADIUS_PX) * self.degrees_per_pixel()
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = self.zoom.saturating_sub(1).max(MIN_ZOOM);
    }

    /// Move by `dx`/`dy` pan steps (positive = east/north).
    pub fn pan(&mut self, cols: u16, rows: u16, dx: i32, dy: i32) {
        let (lon_span, lat_span) = self.spans(cols, rows);
        let lng = self.center.lng + f64::from(dx) * lon_span * PAN_STEP;
        let lat = self.center.lat + f64::from(dy) * lat_span * PAN_STEP;
        self.center = LatLng {
            lat: lat.clamp(-85.0, 85.0),
            lng: wrap_longitude(lng),
        };
    }

    pub fn center_on(&mut self, point: LatLng) {
        self.center = point;
    }
}

fn wrap_longitude(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}
