use glam::DVec2;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};

use crate::app::{App, DrawMode, RenderSnapshot, PANEL_COLS};
use crate::braille::BrailleCanvas;
use crate::map::{draw_circle, draw_dotted_line, draw_marker, draw_path, draw_vertex_handle};
use crate::shapes::{PixelGeometry, PixelShape};

/// Dots between grid dots on tile boundaries
const GRID_GAP: f64 = 4.0;

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map and panel
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    if app.panel_open() {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(3), Constraint::Length(PANEL_COLS)])
            .split(chunks[0]);
        render_map(frame, app, columns[0]);
        render_panel(frame, app, columns[1]);
    } else {
        render_map(frame, app, chunks[0]);
    }
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let title = match &app.draw {
        DrawMode::Drawing { kind, vertices } => format!(" {} | drawing {} ({}) ", app.store.layer_id(), kind.label(), vertices.len()),
        DrawMode::Off => format!(" {} ", app.store.layer_id()),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let snapshot = app.snapshot();
    let (w, h) = (inner.width as usize, inner.height as usize);
    let mut layers = MapLayers {
        grid: BrailleCanvas::new(w, h),
        shapes: BrailleCanvas::new(w, h),
        editing: BrailleCanvas::new(w, h),
        sketch: BrailleCanvas::new(w, h),
    };
    let scale = app.render_scale();
    draw_tile_grid(&mut layers.grid, &snapshot, scale);
    for shape in &snapshot.shapes {
        if !shape.bbox.intersects(&snapshot.viewport_bounds) {
            continue;
        }
        let canvas = if shape.editing { &mut layers.editing } else { &mut layers.shapes };
        draw_shape(canvas, shape, snapshot.pan, scale);
    }
    if let DrawMode::Drawing { vertices, .. } = &app.draw {
        let points: Vec<DVec2> = vertices
            .iter()
            .map(|v| app.viewport.geo_to_screen(*v) * scale)
            .collect();
        draw_path(&mut layers.sketch, &points, false);
        for p in &points {
            draw_marker(&mut layers.sketch, *p, 1);
        }
    }

    let cursor_pos = app.mouse_pos.and_then(|(col, row)| {
        let inside = col >= inner.x && row >= inner.y && col < inner.x + inner.width && row < inner.y + inner.height;
        inside.then(|| (col - inner.x, row - inner.y))
    });

    frame.render_widget(MapWidget { layers, cursor_pos }, inner);
}

/// Dotted top and left edges of every visible tile
fn draw_tile_grid(canvas: &mut BrailleCanvas, snapshot: &RenderSnapshot, scale: f64) {
    for tile in &snapshot.visible_tiles {
        let rect = snapshot.tile_range.tile_rect(*tile);
        let top_left = (rect.min + snapshot.pan) * scale;
        let top_right = (DVec2::new(rect.max.x, rect.min.y) + snapshot.pan) * scale;
        let bottom_left = (DVec2::new(rect.min.x, rect.max.y) + snapshot.pan) * scale;
        draw_dotted_line(canvas, top_left, top_right, GRID_GAP);
        draw_dotted_line(canvas, top_left, bottom_left, GRID_GAP);
    }
}

fn draw_shape(canvas: &mut BrailleCanvas, shape: &PixelShape, pan: DVec2, scale: f64) {
    let to_dots = |p: DVec2| (p + pan) * scale;
    match &shape.geometry {
        PixelGeometry::Point(p) => draw_circle(canvas, to_dots(*p), 1),
        PixelGeometry::Line(line) => {
            let points: Vec<DVec2> = line.iter().map(|p| to_dots(*p)).collect();
            draw_path(canvas, &points, false);
        }
        PixelGeometry::Polygon(rings) => {
            for ring in rings {
                let points: Vec<DVec2> = ring.iter().map(|p| to_dots(*p)).collect();
                draw_path(canvas, &points, true);
            }
        }
    }
    if shape.editing {
        for p in shape.geometry.points() {
            draw_vertex_handle(canvas, to_dots(p));
        }
    }
}

struct MapLayers {
    grid: BrailleCanvas,
    shapes: BrailleCanvas,
    editing: BrailleCanvas,
    sketch: BrailleCanvas,
}

/// Custom widget that stacks braille layers over the map area
struct MapWidget {
    layers: MapLayers,
    cursor_pos: Option<(u16, u16)>,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(&self, canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (row_idx, row_str) in canvas.rows().enumerate().take(area.height as usize) {
            let y = area.y + row_idx as u16;
            for (col_idx, ch) in row_str.chars().enumerate().take(area.width as usize) {
                // Empty cells keep whatever a lower layer drew
                if ch == '\u{2800}' {
                    continue;
                }
                let x = area.x + col_idx as u16;
                buf[(x, y)].set_char(ch).set_fg(color);
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.render_layer(&self.layers.grid, Color::DarkGray, area, buf);
        self.render_layer(&self.layers.shapes, Color::Cyan, area, buf);
        self.render_layer(&self.layers.editing, Color::Yellow, area, buf);
        self.render_layer(&self.layers.sketch, Color::Magenta, area, buf);

        if let Some((cx, cy)) = self.cursor_pos {
            let x = area.x + cx;
            let y = area.y + cy;
            if x < area.x + area.width && y < area.y + area.height {
                buf[(x, y)].set_char('╋').set_fg(Color::Red);
            }
        }
    }
}

fn render_panel(frame: &mut Frame, app: &App, area: Rect) {
    let Some(id) = app.selection.selected() else {
        return;
    };
    let kind = app.store.get(id).map_or("shape", |s| s.kind().label());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {kind} "),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));

    let dim = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(Span::styled(id.to_string(), dim)),
        Line::default(),
    ];
    if app.selection.draft().is_empty() {
        lines.push(Line::from(Span::styled("no attributes", dim)));
    }
    for (key, value) in app.selection.draft() {
        lines.push(Line::from(vec![
            Span::styled(format!("{key}: "), Style::default().fg(Color::Cyan)),
            Span::raw(value.to_string()),
        ]));
    }
    lines.push(Line::default());

    if let Some(input) = &app.input {
        lines.push(Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Yellow)),
            Span::raw(input.clone()),
        ]));
    }

    let actions = app.selection.actions();
    let mut keys = Vec::new();
    if actions.save {
        keys.push(Span::styled("a:attr/-key s:save ", Style::default().fg(Color::Green)));
    }
    keys.push(Span::styled(format!("c:{}", actions.dismiss_label), Style::default().fg(Color::Green)));
    lines.push(Line::from(keys));

    if let Some(err) = app.selection.error() {
        lines.push(Line::from(Span::styled(err.to_string(), Style::default().fg(Color::Red))));
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{} shapes", app.store.len()), Style::default().fg(Color::Magenta)),
    ];
    if !app.selection.can_write() {
        spans.push(Span::styled(" [read-only]", Style::default().fg(Color::DarkGray)));
    }
    match app.notice() {
        Some(notice) => spans.push(Span::styled(format!(" | {notice}"), Style::default().fg(Color::Red))),
        None => {
            if let Some(url) = app.center_tile_url() {
                spans.push(Span::styled(format!(" | {url}"), Style::default().fg(Color::DarkGray)));
            }
        }
    }
    spans.push(Span::styled(
        " | drag:pan +/-:zoom p/l/g:draw n:layer q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
