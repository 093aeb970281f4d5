//! Ratatui-based terminal map.
//!
//! The screen mirrors the browser layout: the map fills the body, the layer
//! control sits at the top right (never collapsed), the legend at the bottom
//! right of the map, and the selected event's popup under the layer control.

use std::io;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::pipeline::{MapRun, run_map};
use crate::domain::MapConfig;
use crate::error::AppError;
use crate::layers::{CircleMarker, Graphic};
use crate::map::{BaseLayerKind, MapModel, OverlayKind};

mod map_canvas;
mod viewport;

use map_canvas::{QuakeMapCanvas, css_color};
use viewport::Viewport;

const SIDEBAR_WIDTH: u16 = 34;

/// Start the TUI.
pub fn run(config: MapConfig) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::terminal(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::terminal(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::terminal(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    config: MapConfig,
    run: Option<MapRun>,
    /// Set when the last fetch failed outright; cleared on success.
    error: Option<AppError>,
    /// A fetch was requested and not started yet.
    pending_fetch: bool,
    /// Result channel of the fetch running on the worker thread.
    in_flight: Option<Receiver<Result<MapRun, AppError>>>,
    viewport: Viewport,
    /// Marker indices into the earthquake layer, strongest first.
    ranked: Vec<usize>,
    /// Position in `ranked` of the marker whose popup is open.
    selected: Option<usize>,
    /// Size of the last drawn map area; pan steps depend on it.
    map_area: Rect,
    status: String,
}

impl App {
    fn new(config: MapConfig) -> Self {
        Self {
            config,
            run: None,
            error: None,
            pending_fetch: true,
            in_flight: None,
            viewport: Viewport::from_view(&crate::map::MapView::default()),
            ranked: Vec::new(),
            selected: None,
            map_area: Rect::new(0, 0, 80, 24),
            status: "Fetching feeds...".to_string(),
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::terminal(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if self.pending_fetch {
                self.start_fetch();
                needs_redraw = true;
            }
            if self.poll_fetch() {
                needs_redraw = true;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::terminal(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::terminal(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Run the pipeline on a worker thread; the event loop keeps drawing and
    /// reading keys until [`App::poll_fetch`] picks up the result.
    fn start_fetch(&mut self) {
        self.pending_fetch = false;
        let (tx, rx) = mpsc::channel();
        let config = self.config.clone();
        let spawned = thread::Builder::new()
            .name("quake-fetch".to_string())
            .spawn(move || {
                // The receiver is gone if the user quit meanwhile.
                let _ = tx.send(run_map(&config));
            });
        match spawned {
            Ok(_) => {
                tracing::debug!("feed fetch started");
                self.in_flight = Some(rx);
            }
            Err(e) => self.apply_run(Err(AppError::terminal(format!("Failed to start fetch: {e}")))),
        }
    }

    /// Returns `true` when a finished fetch was applied.
    fn poll_fetch(&mut self) -> bool {
        let Some(rx) = &self.in_flight else {
            return false;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => Err(AppError::network("feed fetch stopped without a result")),
        };
        self.in_flight = None;
        self.apply_run(result);
        true
    }

    fn apply_run(&mut self, result: Result<MapRun, AppError>) {
        match result {
            Ok(run) => {
                self.ranked = rank_markers(&run.map);
                self.selected = None;
                self.error = None;
                self.viewport = Viewport::from_view(&run.map.view);
                self.status = if run.issues.is_empty() {
                    format!(
                        "{} earthquakes, {} fault lines",
                        run.map.marker_count(),
                        run.map.polyline_count()
                    )
                } else {
                    let missing: Vec<String> = run
                        .issues
                        .iter()
                        .map(|i| format!("{} unavailable: {}", i.overlay.display_name(), i.error))
                        .collect();
                    missing.join(" | ")
                };
                self.run = Some(run);
            }
            Err(err) => {
                tracing::error!(%err, "map pipeline failed");
                self.status = format!("{err} | press r to retry");
                self.error = Some(err);
            }
        }
    }

    /// Returns `true` when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Esc => {
                if self.selected.take().is_none() {
                    return true;
                }
            }
            KeyCode::Char('r') => {
                if self.in_flight.is_some() {
                    self.status = "Already fetching feeds...".to_string();
                } else {
                    self.status = "Fetching feeds...".to_string();
                    self.pending_fetch = true;
                }
            }
            KeyCode::Char('1') => self.select_base(BaseLayerKind::Outdoors),
            KeyCode::Char('2') => self.select_base(BaseLayerKind::Satellite),
            KeyCode::Char('3') => self.select_base(BaseLayerKind::Dark),
            KeyCode::Char('e') => self.toggle_overlay(OverlayKind::Earthquakes),
            KeyCode::Char('f') => self.toggle_overlay(OverlayKind::FaultLines),
            KeyCode::Char('+') | KeyCode::Char('=') => self.viewport.zoom_in(),
            KeyCode::Char('-') => self.viewport.zoom_out(),
            KeyCode::Char('0') => {
                if let Some(run) = &self.run {
                    self.viewport = Viewport::from_view(&run.map.view);
                }
            }
            KeyCode::Left | KeyCode::Char('h') => self.pan(-1, 0),
            KeyCode::Right | KeyCode::Char('l') => self.pan(1, 0),
            KeyCode::Up | KeyCode::Char('k') => self.pan(0, 1),
            KeyCode::Down | KeyCode::Char('j') => self.pan(0, -1),
            KeyCode::Char('n') | KeyCode::Tab => self.step_selection(1),
            KeyCode::Char('p') | KeyCode::BackTab => self.step_selection(-1),
            _ => {}
        }
        false
    }

    fn select_base(&mut self, kind: BaseLayerKind) {
        if let Some(run) = &mut self.run {
            run.map.select_base(kind);
            self.status = format!("base layer: {}", kind.display_name());
        }
    }

    fn toggle_overlay(&mut self, kind: OverlayKind) {
        let Some(run) = &mut self.run else {
            return;
        };
        self.status = match run.map.toggle_overlay(kind) {
            Some(true) => format!("{} shown", kind.display_name()),
            Some(false) => format!("{} hidden", kind.display_name()),
            None => format!("{} layer is not available", kind.display_name()),
        };
    }

    fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport
            .pan(self.map_area.width, self.map_area.height, dx, dy);
    }

    fn step_selection(&mut self, delta: isize) {
        if self.ranked.is_empty() {
            self.status = "No earthquakes to select.".to_string();
            return;
        }
        let n = self.ranked.len() as isize;
        let next = match self.selected {
            None if delta >= 0 => 0,
            None => n - 1,
            Some(cur) => (cur as isize + delta).rem_euclid(n),
        };
        self.selected = Some(next as usize);
        if let Some(marker) = self.selected_marker() {
            let center = marker.center;
            self.viewport.center_on(center);
        }
    }

    fn selected_marker(&self) -> Option<&CircleMarker> {
        let run = self.run.as_ref()?;
        let idx = *self.ranked.get(self.selected?)?;
        match run.map.overlay(OverlayKind::Earthquakes)?.layer.graphics.get(idx)? {
            Graphic::Marker(m) => Some(m),
            Graphic::Line(_) => None,
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = self
            .run
            .as_ref()
            .and_then(|r| r.metadata.title.clone())
            .unwrap_or_else(|| format!("USGS earthquakes, {}", self.config.window.display_name()));
        let details = self
            .run
            .as_ref()
            .and_then(|r| r.metadata.describe())
            .map(|d| format!(" ({d})"))
            .unwrap_or_default();
        let base = self
            .run
            .as_ref()
            .map(|r| r.map.active_base().name)
            .unwrap_or("-");

        let line = Line::from(vec![
            Span::styled("quake", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" {title}{details}")),
            Span::styled(
                format!(
                    " | base: {base} | zoom: {} | center: ({:.2}, {:.2})",
                    self.viewport.zoom, self.viewport.center.lat, self.viewport.center.lng
                ),
                Style::default().fg(Color::Gray),
            ),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&mut self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(SIDEBAR_WIDTH)])
            .split(area);

        self.draw_map(frame, chunks[0]);

        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(10), Constraint::Min(0)])
            .split(chunks[1]);
        self.draw_layer_control(frame, side[0]);
        self.draw_popup(frame, side[1]);
    }

    fn draw_map(&mut self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Map").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.map_area = inner;

        let Some(run) = &self.run else {
            let (msg, color) = match &self.error {
                Some(err) => (format!("Could not load the map: {err}\n\nPress r to retry, q to quit."), Color::Red),
                None => ("Fetching earthquake and fault-line feeds...".to_string(), Color::Yellow),
            };
            let p = Paragraph::new(msg)
                .style(Style::default().fg(color))
                .wrap(Wrap { trim: true });
            frame.render_widget(p, inner);
            return;
        };

        let widget = QuakeMapCanvas {
            map: &run.map,
            viewport: &self.viewport,
            selected: self.selected_marker(),
        };
        frame.render_widget(widget, inner);

        draw_legend(frame, inner, &run.map);
    }

    fn draw_layer_control(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        if let Some(run) = &self.run {
            let map = &run.map;
            for (idx, base) in map.base_layers.iter().enumerate() {
                let mark = if idx == map.active_base { "(•)" } else { "( )" };
                lines.push(Line::from(format!("{} {mark} {}", idx + 1, base.name)));
            }
            lines.push(Line::from(""));
            for overlay in &map.overlays {
                let mark = if overlay.visible { "[x]" } else { "[ ]" };
                let key = match overlay.kind {
                    OverlayKind::Earthquakes => 'e',
                    OverlayKind::FaultLines => 'f',
                };
                lines.push(Line::from(format!("{key} {mark} {}", overlay.name)));
            }
        } else {
            lines.push(Line::from(Span::styled("-", Style::default().fg(Color::Gray))));
        }

        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title("Layers").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_popup(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Event").borders(Borders::ALL);
        let text = match self.selected_marker() {
            Some(marker) => {
                let [title, time, magnitude] = marker.popup.lines();
                let swatch = css_color(marker.style.fill_color.as_deref().unwrap_or("white"));
                Text::from(vec![
                    Line::from(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))),
                    Line::from(time),
                    Line::from(vec![Span::styled("██ ", Style::default().fg(swatch)), Span::raw(magnitude)]),
                    Line::from(Span::styled(
                        format!("({:.3}, {:.3})", marker.center.lat, marker.center.lng),
                        Style::default().fg(Color::Gray),
                    )),
                ])
            }
            None => Text::from(Span::styled(
                "n/p to step through events, strongest first",
                Style::default().fg(Color::Gray),
            )),
        };
        let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "1-3 base  e/f overlays  arrows pan  +/- zoom  0 reset  n/p event  r reload  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Legend box in the bottom-right corner of the map.
fn draw_legend(frame: &mut ratatui::Frame<'_>, map_area: Rect, map: &MapModel) {
    let height = map.legend.entries.len() as u16 + 2;
    let width = 12;
    if map_area.width < width + 2 || map_area.height < height + 1 {
        return;
    }
    let rect = Rect {
        x: map_area.x + map_area.width - width,
        y: map_area.y + map_area.height - height,
        width,
        height,
    };

    let lines: Vec<Line> = map
        .legend
        .entries
        .iter()
        .map(|entry| {
            Line::from(vec![
                Span::styled("██", Style::default().fg(css_color(entry.color))),
                Span::raw(format!(" {}", entry.label)),
            ])
        })
        .collect();

    frame.render_widget(Clear, rect);
    let p = Paragraph::new(Text::from(lines)).block(Block::default().title("Mag").borders(Borders::ALL));
    frame.render_widget(p, rect);
}

/// Earthquake marker indices ordered by magnitude, strongest first.
fn rank_markers(map: &MapModel) -> Vec<usize> {
    let Some(overlay) = map.overlay(OverlayKind::Earthquakes) else {
        return Vec::new();
    };
    let mut ranked: Vec<(usize, f64)> = overlay
        .layer
        .graphics
        .iter()
        .enumerate()
        .filter_map(|(idx, g)| match g {
            Graphic::Marker(m) => Some((idx, m.magnitude.unwrap_or(f64::NEG_INFINITY))),
            Graphic::Line(_) => None,
        })
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.into_iter().map(|(idx, _)| idx).collect()
}
