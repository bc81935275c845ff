use glam::DVec2;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::MapConfig;
use crate::error::ShapeError;
use crate::map::{GeoPoint, PixelRect, TileCoord, TileRange, TileSource, Viewport};
use crate::persist::ShapeBackend;
use crate::selection::{EditTransition, SelectionCoordinator};
use crate::shapes::{hit_test, AttrValue, PixelShape, ShapeKind, ShapeStore};

/// Width of the attribute side panel in terminal columns
pub const PANEL_COLS: u16 = 36;

/// Click tolerance around shapes, in braille dots
const HIT_TOLERANCE_DOTS: f64 = 3.0;

/// Everything the renderer needs for one frame
#[derive(Debug, Clone)]
pub struct RenderSnapshot {
    pub visible_tiles: Vec<TileCoord>,
    /// Visible area in raster pixel space
    pub viewport_bounds: PixelRect,
    pub shapes: Vec<PixelShape>,
    pub tile_range: TileRange,
    pub pan: DVec2,
    pub zoom: u8,
}

/// In-progress drawing gesture
#[derive(Debug, Clone, PartialEq)]
pub enum DrawMode {
    Off,
    Drawing { kind: ShapeKind, vertices: Vec<GeoPoint> },
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub store: ShapeStore,
    pub selection: SelectionCoordinator,
    backend: Box<dyn ShapeBackend>,
    tiles: TileSource,
    layers: Vec<String>,
    pub draw: DrawMode,
    /// Last surfaced error, shown in the status bar
    notice: Option<String>,
    /// Terminal braille dots per map pixel
    render_scale: f64,
    /// Full map host size in pixels, side panel included
    host_size: DVec2,
    panel_width: f64,
    /// Center on the extent once the first real measurement arrives
    center_pending: bool,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    /// Attribute input line (`key=value`) while open
    pub input: Option<String>,
}

impl App {
    pub fn new(config: &MapConfig, backend: Box<dyn ShapeBackend>, layers: Vec<String>, can_write: bool) -> Self {
        let config = config.clone().normalized();
        let mut layers = layers;
        if !layers.contains(&config.layer_id) {
            layers.insert(0, config.layer_id.clone());
        }

        let mut app = Self {
            viewport: config.viewport(),
            store: ShapeStore::new(),
            selection: SelectionCoordinator::new(can_write),
            backend,
            tiles: TileSource::new(config.tile_url.clone()),
            layers,
            draw: DrawMode::Off,
            notice: None,
            render_scale: config.render_scale,
            host_size: DVec2::ZERO,
            panel_width: f64::from(PANEL_COLS) * 2.0 / config.render_scale,
            center_pending: config.initial_pan_offset.is_none(),
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            input: None,
        };
        app.set_active_layer(&config.layer_id);
        app
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn render_scale(&self) -> f64 {
        self.render_scale
    }

    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    pub fn panel_open(&self) -> bool {
        self.selection.selected().is_some()
    }

    /// Log an error and show it to the user unless it is a silent rejection
    fn surface(&mut self, err: &ShapeError) {
        if err.is_user_visible() {
            warn!(error = %err, "operation failed");
            self.notice = Some(err.to_string());
        } else {
            debug!(error = %err, "edit rejected locally");
        }
    }

    /// Report the current host size in map pixels
    pub fn measure(&mut self, width: f64, height: f64) {
        self.host_size = DVec2::new(width, height);
        self.relayout(false);

        if self.center_pending && self.viewport.is_measured() {
            let e = self.viewport.extent();
            let mid = GeoPoint::new(
                (e.top_left.lon + e.bottom_right.lon) / 2.0,
                (e.top_left.lat + e.bottom_right.lat) / 2.0,
            );
            self.viewport.center_at(mid);
            self.viewport.settle();
            self.center_pending = false;
        }
    }

    /// Update terminal size (in cells) the way the map host sees it
    pub fn resize(&mut self, width: u16, height: u16) {
        // 2 columns of border, 2 rows of border plus the status bar
        let dots = DVec2::new(
            f64::from(width.saturating_sub(2)) * 2.0,
            f64::from(height.saturating_sub(3)) * 4.0,
        );
        let px = dots / self.render_scale;
        self.measure(px.x, px.y);
    }

    /// Give the viewport the drawable width left beside the side panel
    fn relayout(&mut self, settle: bool) {
        let panel = if self.panel_open() { self.panel_width } else { 0.0 };
        let width = (self.host_size.x - panel).max(0.0);
        self.viewport.set_size(width, self.host_size.y);
        if settle {
            self.viewport.settle();
        }
    }

    /// Selection changed: panel may have opened or closed
    fn apply_transitions(&mut self, was_open: bool, transitions: &[EditTransition]) {
        for t in transitions {
            debug!(transition = ?t, "edit mode");
        }
        if was_open != self.panel_open() {
            self.relayout(true);
        }
    }

    pub fn on_mouse_down(&mut self) {
        self.viewport.mouse_down();
    }

    pub fn on_mouse_move(&mut self, dx: f64, dy: f64) {
        self.viewport.mouse_move(dx, dy);
    }

    pub fn on_mouse_up(&mut self) {
        self.viewport.mouse_up();
    }

    /// Scroll never zooms
    pub fn on_wheel(&mut self, delta: f64) {
        self.viewport.wheel(delta);
    }

    pub fn on_zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn on_zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    pub fn center_at(&mut self, point: GeoPoint) -> bool {
        self.viewport.center_at(point)
    }

    /// Persist a finished drawing and open it in the panel
    pub fn on_draw_complete(&mut self, kind: ShapeKind, rings: Vec<Vec<GeoPoint>>) -> Option<Uuid> {
        if !self.selection.can_write() {
            self.surface(&ShapeError::ReadOnly);
            return None;
        }
        let result = self
            .store
            .create_from_draw(kind, rings)
            .and_then(|pending| self.store.commit(pending, self.backend.as_mut()));
        match result {
            Ok(id) => {
                self.notice = None;
                self.on_shape_click(id);
                Some(id)
            }
            Err(e) => {
                self.surface(&e);
                None
            }
        }
    }

    pub fn on_shape_click(&mut self, id: Uuid) {
        let was_open = self.panel_open();
        match self.selection.select(id, &mut self.store) {
            Ok(transitions) => self.apply_transitions(was_open, &transitions),
            Err(e) => self.surface(&e),
        }
    }

    /// Geometry edits need write access and the shape's edit mode
    fn check_editable(&self, id: Uuid) -> Result<(), ShapeError> {
        if !self.selection.can_write() {
            return Err(ShapeError::ReadOnly);
        }
        if self.store.get(id).is_none() {
            return Err(ShapeError::NotFound(id));
        }
        if !self.store.handles().is_editing(id) {
            return Err(ShapeError::NotEditing(id));
        }
        Ok(())
    }

    pub fn on_vertex_edit(&mut self, id: Uuid, rings: Vec<Vec<GeoPoint>>) {
        let result = self
            .check_editable(id)
            .and_then(|()| self.store.update_vertices(id, rings))
            .and_then(|pending| self.store.commit(pending, self.backend.as_mut()));
        if let Err(e) = result {
            self.surface(&e);
        }
    }

    pub fn on_point_drag(&mut self, id: Uuid, position: GeoPoint) {
        let result = self
            .check_editable(id)
            .and_then(|()| self.store.update_position(id, position))
            .and_then(|pending| self.store.commit(pending, self.backend.as_mut()));
        if let Err(e) = result {
            self.surface(&e);
        }
    }

    pub fn on_shape_delete(&mut self, id: Uuid) {
        if !self.selection.can_write() {
            self.surface(&ShapeError::ReadOnly);
            return;
        }
        let was_open = self.panel_open();
        let result = self
            .store
            .delete_shape(id)
            .and_then(|pending| self.store.commit(pending, self.backend.as_mut()));
        match result {
            Ok(_) => {
                self.selection.forget_missing(&self.store);
                self.apply_transitions(was_open, &[]);
            }
            Err(e) => {
                // The re-inserted shape has a new handle; restore its edit mode
                let transitions = self.selection.reattach(&mut self.store);
                self.apply_transitions(was_open, &transitions);
                self.surface(&e);
            }
        }
    }

    /// Stage `key=value` typed into the panel; `-key` drops the key
    pub fn stage_attribute(&mut self, line: &str) -> bool {
        if let Some(key) = line.trim().strip_prefix('-') {
            return self.selection.remove_draft(key.trim());
        }
        let Some((key, value)) = line.split_once('=') else {
            return false;
        };
        let key = key.trim();
        if key.is_empty() {
            return false;
        }
        self.selection.set_draft(key, AttrValue::parse(value))
    }

    pub fn save_panel(&mut self) {
        let was_open = self.panel_open();
        match self.selection.save(&mut self.store, self.backend.as_mut()) {
            Ok(transitions) => {
                self.notice = None;
                self.apply_transitions(was_open, &transitions);
            }
            Err(e) => self.surface(&e),
        }
    }

    pub fn cancel_panel(&mut self) {
        let was_open = self.panel_open();
        let transitions = self.selection.cancel(&mut self.store);
        self.apply_transitions(was_open, &transitions);
    }

    /// Load another layer's shapes; a failed load keeps the current layer
    pub fn set_active_layer(&mut self, layer_id: &str) {
        match self.backend.load_shapes_for_layer(layer_id) {
            Ok(shapes) => {
                self.cancel_panel();
                self.draw = DrawMode::Off;
                self.store.replace_all(layer_id, shapes);
                if !self.layers.iter().any(|l| l == layer_id) {
                    self.layers.push(layer_id.to_string());
                }
                info!(layer = layer_id, "active layer changed");
            }
            Err(e) => self.surface(&e.into()),
        }
    }

    pub fn next_layer(&mut self) {
        if self.layers.is_empty() {
            return;
        }
        let current = self.layers.iter().position(|l| l == self.store.layer_id());
        let next = current.map_or(0, |i| (i + 1) % self.layers.len());
        let layer = self.layers[next].clone();
        self.set_active_layer(&layer);
    }

    pub fn begin_draw(&mut self, kind: ShapeKind) {
        if self.selection.can_write() {
            self.draw = DrawMode::Drawing { kind, vertices: Vec::new() };
        }
    }

    /// Add a vertex at a viewport pixel position. Points complete immediately.
    pub fn add_vertex(&mut self, screen: DVec2) {
        let geo = self.viewport.screen_to_geo(screen);
        let finished = match &mut self.draw {
            DrawMode::Drawing { kind: ShapeKind::Point, .. } => true,
            DrawMode::Drawing { vertices, .. } => {
                vertices.push(geo);
                false
            }
            DrawMode::Off => return,
        };
        if finished {
            self.draw = DrawMode::Off;
            self.on_draw_complete(ShapeKind::Point, vec![vec![geo]]);
        }
    }

    pub fn finish_draw(&mut self) {
        if let DrawMode::Drawing { kind, vertices } = std::mem::replace(&mut self.draw, DrawMode::Off) {
            self.on_draw_complete(kind, vec![vertices]);
        }
    }

    pub fn abort_draw(&mut self) {
        self.draw = DrawMode::Off;
    }

    /// Move the selected point shape to a viewport pixel position
    pub fn move_selected_to(&mut self, screen: DVec2) {
        let Some(id) = self.selection.selected() else {
            self.surface(&ShapeError::NothingSelected);
            return;
        };
        let geo = self.viewport.screen_to_geo(screen);
        self.on_point_drag(id, geo);
    }

    pub fn delete_selected(&mut self) {
        match self.selection.selected() {
            Some(id) => self.on_shape_delete(id),
            None => self.surface(&ShapeError::NothingSelected),
        }
    }

    /// Shape under a viewport pixel position
    pub fn shape_at(&self, screen: DVec2) -> Option<Uuid> {
        let snapshot = self.snapshot();
        let raster = screen - snapshot.pan;
        hit_test(&snapshot.shapes, raster, HIT_TOLERANCE_DOTS / self.render_scale)
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        let tile_range = self.viewport.tile_range();
        RenderSnapshot {
            visible_tiles: self.viewport.visible_tiles().collect(),
            viewport_bounds: self.viewport.pixel_bounds(),
            shapes: self.store.project_all(self.viewport.zoom(), tile_range.origin()),
            tile_range,
            pan: self.viewport.pan_offset(),
            zoom: self.viewport.zoom(),
        }
    }

    /// True if a terminal cell lies inside the drawable map area, which
    /// excludes the border and the side panel
    pub fn cell_on_map(&self, col: u16, row: u16) -> bool {
        if col == 0 || row == 0 {
            return false;
        }
        let px = self.cell_to_px(col, row);
        let size = self.viewport.size();
        px.x < size.x && px.y < size.y
    }

    /// Terminal cell inside the map border to viewport pixels
    pub fn cell_to_px(&self, col: u16, row: u16) -> DVec2 {
        let dots = DVec2::new(
            f64::from(col.saturating_sub(1)) * 2.0,
            f64::from(row.saturating_sub(1)) * 4.0,
        );
        dots / self.render_scale
    }

    /// Handle mouse drag in terminal cells
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_col, last_row)) = self.last_mouse {
            let delta = self.cell_to_px(col, row) - self.cell_to_px(last_col, last_row);
            self.on_mouse_move(delta.x, delta.y);
        }
        self.last_mouse = Some((col, row));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
        self.on_mouse_up();
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn zoom_level(&self) -> String {
        let (min, max) = self.viewport.zoom_bounds();
        format!("z{} [{min}-{max}]", self.viewport.zoom())
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        match self.viewport.center_geo() {
            Some(c) => format!(
                "{:.4}°{}, {:.4}°{}",
                c.lat.abs(),
                if c.lat >= 0.0 { "N" } else { "S" },
                c.lon.abs(),
                if c.lon >= 0.0 { "E" } else { "W" }
            ),
            None => "unmeasured".to_string(),
        }
    }

    /// URL of the tile under viewport center
    pub fn center_tile_url(&self) -> Option<String> {
        let center = self.viewport.size() / 2.0 - self.viewport.pan_offset();
        let range = self.viewport.tile_range();
        let bounds = PixelRect::new(center, center + DVec2::ONE);
        crate::map::visible_tiles(range, bounds).next().map(|t| self.tiles.url(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryBackend;
    use crate::shapes::{Geometry, Shape};

    fn app_with(backend: MemoryBackend, can_write: bool) -> App {
        let config = MapConfig {
            layer_id: "wells".into(),
            render_scale: 1.0,
            ..MapConfig::default()
        };
        let mut app = App::new(&config, Box::new(backend), vec!["wells".into(), "roads".into()], can_write);
        app.measure(800.0, 600.0);
        app
    }

    fn point_at(lon: f64, lat: f64) -> Vec<Vec<GeoPoint>> {
        vec![vec![GeoPoint::new(lon, lat)]]
    }

    #[test]
    fn test_initial_view_centered_on_extent() {
        let app = app_with(MemoryBackend::new("wells"), true);
        let c = app.viewport.center_geo().unwrap();
        assert!((c.lon - -70.65).abs() < 1e-6);
        assert!((c.lat - -33.55).abs() < 1e-3);
    }

    #[test]
    fn test_draw_complete_selects_new_shape() {
        let mut app = app_with(MemoryBackend::new("wells"), true);
        let id = app.on_draw_complete(ShapeKind::Point, point_at(-70.65, -33.55)).unwrap();
        assert_eq!(app.selection.selected(), Some(id));
        assert!(app.store.handles().is_editing(id));
        assert_eq!(app.store.get(id).unwrap().layer_id, "wells");
        assert!(app.panel_open());
    }

    #[test]
    fn test_failed_create_surfaces_error() {
        let mut app = app_with(MemoryBackend::new("wells"), true);
        let mut backend = MemoryBackend::new("wells");
        backend.fail_next("quota exceeded");
        app.backend = Box::new(backend);
        assert!(app.on_draw_complete(ShapeKind::Point, point_at(-70.65, -33.55)).is_none());
        assert!(app.store.is_empty());
        assert!(app.notice().unwrap().contains("quota exceeded"));
    }

    #[test]
    fn test_degenerate_polygon_is_silent() {
        let mut app = app_with(MemoryBackend::new("wells"), true);
        let rings = vec![vec![GeoPoint::new(-70.66, -33.55), GeoPoint::new(-70.64, -33.55)]];
        assert!(app.on_draw_complete(ShapeKind::Polygon, rings).is_none());
        assert!(app.notice().is_none());
        assert!(app.store.is_empty());
    }

    #[test]
    fn test_panel_close_reclamps() {
        let mut app = app_with(MemoryBackend::new("wells"), true);
        let id = app.on_draw_complete(ShapeKind::Point, point_at(-70.65, -33.55)).unwrap();
        let narrow = app.viewport.size().x;
        assert_eq!(narrow, 800.0 - f64::from(PANEL_COLS) * 2.0);

        // Drag to the far right edge of the raster with the panel open
        app.on_mouse_down();
        app.on_mouse_move(-10_000.0, 0.0);
        app.on_mouse_up();
        let content = app.viewport.tile_range().content_size().x;
        assert_eq!(app.viewport.pan_offset().x, narrow - content);

        app.cancel_panel();
        assert_eq!(app.selection.selected(), None);
        assert!(!app.store.handles().is_editing(id));
        assert_eq!(app.viewport.size().x, 800.0);
        assert_eq!(app.viewport.pan_offset().x, 800.0 - content);
    }

    #[test]
    fn test_delete_failure_restores_selection_edit_mode() {
        let mut app = app_with(MemoryBackend::new("wells"), true);
        let id = app.on_draw_complete(ShapeKind::Point, point_at(-70.65, -33.55)).unwrap();
        let old = app.store.handles().get(id).unwrap();

        let mut failing = MemoryBackend::new("wells");
        failing.fail_next("locked");
        app.backend = Box::new(failing);
        app.delete_selected();

        assert!(app.store.get(id).is_some());
        let fresh = app.store.handles().get(id).unwrap();
        assert_ne!(fresh, old);
        assert!(app.store.handles().is_editing(id));
        assert_eq!(app.selection.selected(), Some(id));
        assert!(app.notice().unwrap().contains("locked"));
    }

    #[test]
    fn test_delete_closes_panel() {
        let mut app = app_with(MemoryBackend::new("wells"), true);
        let id = app.on_draw_complete(ShapeKind::Point, point_at(-70.65, -33.55)).unwrap();
        app.on_shape_delete(id);
        assert!(app.store.is_empty());
        assert!(!app.panel_open());
        assert_eq!(app.viewport.size().x, 800.0);
    }

    #[test]
    fn test_layer_switch_loads_and_clears_selection() {
        let mut road = Shape::draft(Geometry::Line(vec![
            GeoPoint::new(-70.69, -33.51),
            GeoPoint::new(-70.61, -33.59),
        ]));
        road.layer_id = "roads".into();
        let mut app = app_with(MemoryBackend::new("wells").with_shapes([road.clone()]), true);
        assert!(app.store.is_empty());

        let id = app.on_draw_complete(ShapeKind::Point, point_at(-70.65, -33.55)).unwrap();
        app.next_layer();
        assert_eq!(app.store.layer_id(), "roads");
        assert_eq!(app.store.shapes(), &[road]);
        assert_eq!(app.selection.selected(), None);
        assert!(app.store.get(id).is_none());
    }

    #[test]
    fn test_click_selects_hit_shape() {
        let mut app = app_with(MemoryBackend::new("wells"), true);
        let id = app.on_draw_complete(ShapeKind::Point, point_at(-70.65, -33.55)).unwrap();
        app.cancel_panel();

        let snap = app.snapshot();
        let crate::shapes::PixelGeometry::Point(p) = &snap.shapes[0].geometry else {
            panic!("expected a point");
        };
        let screen = *p + snap.pan;
        assert_eq!(app.shape_at(screen + DVec2::new(1.0, 1.0)), Some(id));
        assert_eq!(app.shape_at(screen + DVec2::new(40.0, 0.0)), None);
    }

    #[test]
    fn test_line_drawn_through_clicks() {
        let mut app = app_with(MemoryBackend::new("wells"), true);
        app.begin_draw(ShapeKind::Line);
        app.add_vertex(DVec2::new(100.0, 100.0));
        app.add_vertex(DVec2::new(300.0, 120.0));
        app.finish_draw();
        assert_eq!(app.draw, DrawMode::Off);
        assert_eq!(app.store.len(), 1);
        assert_eq!(app.store.shapes()[0].kind(), ShapeKind::Line);
    }

    #[test]
    fn test_attribute_line_saved() {
        let mut app = app_with(MemoryBackend::new("wells"), true);
        let id = app.on_draw_complete(ShapeKind::Point, point_at(-70.65, -33.55)).unwrap();
        assert!(app.stage_attribute("depth = 120"));
        assert!(!app.stage_attribute("no equals sign"));
        app.save_panel();
        assert!(!app.panel_open());
        assert_eq!(
            app.store.get(id).unwrap().attributes.get("depth"),
            Some(&AttrValue::Number(120.0))
        );
    }

    #[test]
    fn test_read_only_blocks_edits() {
        let mut app = app_with(MemoryBackend::new("wells"), false);
        app.begin_draw(ShapeKind::Point);
        assert_eq!(app.draw, DrawMode::Off);
        assert!(app.on_draw_complete(ShapeKind::Point, point_at(-70.65, -33.55)).is_none());
        assert_eq!(app.notice(), Some("map is read-only"));
    }

    #[test]
    fn test_wheel_changes_nothing() {
        let mut app = app_with(MemoryBackend::new("wells"), true);
        let (zoom, pan) = (app.viewport.zoom(), app.viewport.pan_offset());
        app.on_wheel(1.0);
        app.on_wheel(-1.0);
        assert_eq!((app.viewport.zoom(), app.viewport.pan_offset()), (zoom, pan));
    }

    #[test]
    fn test_center_tile_url() {
        let app = app_with(MemoryBackend::new("wells"), true);
        let url = app.center_tile_url().unwrap();
        assert!(url.contains("/14/"));
    }

    #[test]
    fn test_read_only_move_refused() {
        let mut well = Shape::draft(Geometry::Point(GeoPoint::new(-70.65, -33.55)));
        well.layer_id = "wells".into();
        let mut app = app_with(MemoryBackend::new("wells").with_shapes([well.clone()]), false);

        app.on_shape_click(well.id);
        assert_eq!(app.selection.selected(), Some(well.id));
        app.move_selected_to(DVec2::new(10.0, 10.0));
        assert_eq!(app.store.get(well.id).unwrap().geometry, well.geometry);
        assert_eq!(app.notice(), Some("map is read-only"));
    }

    #[test]
    fn test_edit_requires_edit_mode() {
        let mut app = app_with(MemoryBackend::new("wells"), true);
        let a = app.on_draw_complete(ShapeKind::Point, point_at(-70.65, -33.55)).unwrap();
        let b = app.on_draw_complete(ShapeKind::Point, point_at(-70.60, -33.52)).unwrap();
        assert!(!app.store.handles().is_editing(a));

        let before = app.store.get(a).unwrap().geometry.clone();
        app.on_point_drag(a, GeoPoint::new(-70.70, -33.50));
        assert_eq!(app.store.get(a).unwrap().geometry, before);
        assert!(app.notice().unwrap().contains("not open for editing"));

        app.on_point_drag(b, GeoPoint::new(-70.70, -33.50));
        assert_eq!(
            app.store.get(b).unwrap().geometry,
            Geometry::Point(GeoPoint::new(-70.70, -33.50))
        );
    }

    #[test]
    fn test_minus_line_removes_saved_attribute() {
        let mut app = app_with(MemoryBackend::new("wells"), true);
        let id = app.on_draw_complete(ShapeKind::Point, point_at(-70.65, -33.55)).unwrap();
        app.stage_attribute("status=dry");
        app.save_panel();

        app.on_shape_click(id);
        assert!(app.stage_attribute("-status"));
        assert!(!app.stage_attribute("-missing"));
        app.save_panel();
        assert!(app.store.get(id).unwrap().attributes.is_empty());
    }

    #[test]
    fn test_panel_columns_are_off_map() {
        let mut app = app_with(MemoryBackend::new("wells"), true);
        // 800 px at scale 1 is 400 columns inside the border
        assert!(app.cell_on_map(1, 1));
        assert!(app.cell_on_map(400, 1));
        assert!(!app.cell_on_map(401, 1));
        assert!(!app.cell_on_map(0, 1));

        app.on_draw_complete(ShapeKind::Point, point_at(-70.65, -33.55)).unwrap();
        let map_cols = 400 - PANEL_COLS;
        assert!(app.cell_on_map(map_cols, 1));
        assert!(!app.cell_on_map(map_cols + 1, 1));
    }
}
