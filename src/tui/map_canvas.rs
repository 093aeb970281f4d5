//! Canvas widget drawing the assembled map.
//!
//! The base layer is ratatui's built-in world outline, tinted per base style.
//! Overlays are drawn on top: fault lines first, then earthquake markers, so a
//! marker is never hidden under a boundary.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{
        Widget,
        canvas::{Canvas, Circle, Context, Line as CanvasLine, Map, MapResolution},
    },
};

use crate::layers::{CircleMarker, Graphic, Polyline};
use crate::map::{BaseLayerKind, MapModel};

use super::viewport::Viewport;

/// Terminal rendition of a base tile style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasePalette {
    pub background: Color,
    pub land: Color,
    pub resolution: MapResolution,
}

impl BasePalette {
    pub fn for_kind(kind: BaseLayerKind) -> Self {
        match kind {
            BaseLayerKind::Outdoors => Self {
                background: Color::Reset,
                land: Color::Rgb(120, 170, 100),
                resolution: MapResolution::High,
            },
            BaseLayerKind::Satellite => Self {
                background: Color::Rgb(10, 22, 48),
                land: Color::Rgb(70, 110, 60),
                resolution: MapResolution::High,
            },
            BaseLayerKind::Dark => Self {
                background: Color::Black,
                land: Color::DarkGray,
                resolution: MapResolution::Low,
            },
        }
    }
}

/// Parse a CSS color as used by the layer styles (`#RRGGBB` or a few names).
pub fn css_color(raw: &str) -> Color {
    if let Some(hex) = raw.strip_prefix('#') {
        if hex.len() == 6 && hex.is_ascii() {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            if let (Some(r), Some(g), Some(b)) = (channel(0), channel(2), channel(4)) {
                return Color::Rgb(r, g, b);
            }
        }
        return Color::White;
    }
    match raw {
        "black" => Color::Black,
        "orange" => Color::Rgb(255, 165, 0),
        "white" => Color::White,
        _ => Color::White,
    }
}

/// Render-only description of one frame of the map.
pub struct QuakeMapCanvas<'a> {
    pub map: &'a MapModel,
    pub viewport: &'a Viewport,
    pub selected: Option<&'a CircleMarker>,
}

impl<'a> Widget for QuakeMapCanvas<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 10 || area.height < 5 {
            buf.set_string(
                area.x,
                area.y,
                "Map area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let palette = BasePalette::for_kind(self.map.active_base().kind);
        let (x_bounds, y_bounds) = self.viewport.bounds(area.width, area.height);

        let lines: Vec<&Polyline> = self
            .map
            .visible_overlays()
            .flat_map(|o| o.layer.polylines())
            .collect();
        let markers: Vec<&CircleMarker> = self
            .map
            .visible_overlays()
            .flat_map(|o| o.layer.markers())
            .collect();
        let viewport = self.viewport;
        let selected = self.selected;

        Canvas::default()
            .background_color(palette.background)
            .marker(Marker::Braille)
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(move |ctx| {
                ctx.draw(&Map {
                    color: palette.land,
                    resolution: palette.resolution,
                });
                ctx.layer();

                for line in &lines {
                    draw_polyline(ctx, line);
                }
                ctx.layer();

                for marker in &markers {
                    let fill = marker.style.fill_color.as_deref().unwrap_or(&marker.style.color);
                    ctx.draw(&Circle {
                        x: marker.center.lng,
                        y: marker.center.lat,
                        radius: viewport.radius_degrees(marker.radius),
                        color: css_color(fill),
                    });
                }

                if let Some(sel) = selected {
                    ctx.layer();
                    ctx.print(
                        sel.center.lng,
                        sel.center.lat,
                        Span::styled(
                            "◉",
                            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                        ),
                    );
                }
            })
            .render(area, buf);
    }
}

/// Draw consecutive vertex pairs, skipping segments that jump across the
/// antimeridian (they would otherwise streak across the whole map).
fn draw_polyline(ctx: &mut Context<'_>, line: &Polyline) {
    let color = css_color(&line.style.color);
    for pair in line.vertices.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if (a.lng - b.lng).abs() > 180.0 {
            continue;
        }
        ctx.draw(&CanvasLine::new(a.lng, a.lat, b.lng, b.lat, color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_layer_colors() {
        assert_eq!(css_color("#F06B6B"), Color::Rgb(0xF0, 0x6B, 0x6B));
        assert_eq!(css_color("#b7f34d"), Color::Rgb(0xB7, 0xF3, 0x4D));
        assert_eq!(css_color("orange"), Color::Rgb(255, 165, 0));
        assert_eq!(css_color("black"), Color::Black);
        assert_eq!(css_color("#zzz"), Color::White);
        // six bytes, not all ASCII
        assert_eq!(css_color("#aééa"), Color::White);
    }

    #[test]
    fn each_base_layer_has_its_own_palette() {
        let outdoors = BasePalette::for_kind(BaseLayerKind::Outdoors);
        let satellite = BasePalette::for_kind(BaseLayerKind::Satellite);
        let dark = BasePalette::for_kind(BaseLayerKind::Dark);
        assert_ne!(outdoors, satellite);
        assert_ne!(satellite, dark);
    }
}
