use glam::DVec2;
use tracing::debug;

use crate::map::projection::{geo_to_tile_frac, tile_frac_to_geo, GeoPoint, TILE_SIZE, MAX_SUPPORTED_ZOOM};
use crate::map::tiles::{bounding_tile_range, visible_tiles, GeoBox, PixelRect, TileRange};
use crate::map::TileCoord;

/// Pointer gesture mode of the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging,
}

/// Pannable, zoomable window over the tile raster covering a fixed extent.
///
/// `pan` is the pixel translation of the raster's top-left corner relative
/// to the viewport's top-left corner, so it is never positive once settled.
#[derive(Debug, Clone)]
pub struct Viewport {
    extent: GeoBox,
    zoom: u8,
    min_zoom: u8,
    max_zoom: u8,
    pan: DVec2,
    /// Measured viewport size in pixels; zero until the host reports one
    size: DVec2,
    range: TileRange,
    drag: DragState,
}

impl Viewport {
    /// Build a viewport over `extent`. Zoom values are clamped, never rejected.
    pub fn new(extent: GeoBox, zoom: u8, min_zoom: u8, max_zoom: u8, pan: Option<DVec2>) -> Self {
        let max_zoom = max_zoom.min(MAX_SUPPORTED_ZOOM);
        let min_zoom = min_zoom.min(max_zoom);
        let zoom = zoom.clamp(min_zoom, max_zoom);
        let extent = extent.normalized();

        Self {
            extent,
            zoom,
            min_zoom,
            max_zoom,
            pan: pan.unwrap_or(DVec2::ZERO),
            size: DVec2::ZERO,
            range: bounding_tile_range(&extent, zoom),
            drag: DragState::Idle,
        }
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn zoom_bounds(&self) -> (u8, u8) {
        (self.min_zoom, self.max_zoom)
    }

    pub fn pan_offset(&self) -> DVec2 {
        self.pan
    }

    pub fn size(&self) -> DVec2 {
        self.size
    }

    pub fn extent(&self) -> &GeoBox {
        &self.extent
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    /// Tile raster at the current zoom
    pub fn tile_range(&self) -> TileRange {
        self.range
    }

    /// Whether the host has reported a non-empty size
    pub fn is_measured(&self) -> bool {
        self.size.x > 0.0 && self.size.y > 0.0
    }

    /// Record the host's current pixel size. Does not re-clamp on its own.
    pub fn set_size(&mut self, width: f64, height: f64) {
        let size = DVec2::new(width.max(0.0), height.max(0.0));
        if size != self.size {
            debug!(width = size.x, height = size.y, "viewport measured");
            self.size = size;
        }
    }

    pub fn mouse_down(&mut self) {
        self.drag = DragState::Dragging;
    }

    /// Move the raster with the pointer. Unclamped until the drag settles.
    pub fn mouse_move(&mut self, dx: f64, dy: f64) -> bool {
        if self.drag != DragState::Dragging {
            return false;
        }
        self.pan += DVec2::new(dx, dy);
        true
    }

    /// Finish a drag and pull the raster back inside the extent
    pub fn mouse_up(&mut self) {
        if self.drag == DragState::Dragging {
            self.drag = DragState::Idle;
            self.settle();
        }
    }

    /// Scroll input never zooms or pans; zoom is button-driven only.
    pub fn wheel(&mut self, _delta: f64) -> bool {
        false
    }

    pub fn zoom_in(&mut self) -> bool {
        match self.zoom.checked_add(1) {
            Some(z) if z <= self.max_zoom => self.zoom_to(z, 2.0),
            _ => false,
        }
    }

    pub fn zoom_out(&mut self) -> bool {
        match self.zoom.checked_sub(1) {
            Some(z) if z >= self.min_zoom => self.zoom_to(z, 0.5),
            _ => false,
        }
    }

    /// Step to `zoom`, keeping the geographic point at viewport center in place.
    /// Tile coordinates scale by exactly `factor` between adjacent levels.
    fn zoom_to(&mut self, zoom: u8, factor: f64) -> bool {
        if self.drag == DragState::Dragging {
            return false;
        }
        let half = self.size / 2.0;
        let center = (-self.pan + half) / TILE_SIZE + self.range.origin();
        let scaled = center * factor;

        self.zoom = zoom;
        self.range = bounding_tile_range(&self.extent, zoom);
        self.pan = -((scaled - self.range.origin()) * TILE_SIZE - half);
        self.settle();

        debug!(zoom, pan_x = self.pan.x, pan_y = self.pan.y, "zoom settled");
        true
    }

    /// Put `point` at viewport center without changing the drag mode.
    /// No-op until the viewport has been measured.
    pub fn center_at(&mut self, point: GeoPoint) -> bool {
        if !self.is_measured() {
            return false;
        }
        let frac = geo_to_tile_frac(point.lon, point.lat, self.zoom);
        self.pan = -((frac - self.range.origin()) * TILE_SIZE - self.size / 2.0);
        true
    }

    /// Geographic point currently at viewport center
    pub fn center_geo(&self) -> Option<GeoPoint> {
        if !self.is_measured() {
            return None;
        }
        Some(self.screen_to_geo(self.size / 2.0))
    }

    /// Clamp `pan` so the viewport never shows space outside the raster.
    /// Per axis the valid interval is `[min(0, size - content), 0]`.
    pub fn settle(&mut self) {
        let content = self.range.content_size();
        let lo = (self.size - content).min(DVec2::ZERO);
        self.pan = DVec2::new(self.pan.x.clamp(lo.x, 0.0), self.pan.y.clamp(lo.y, 0.0));
    }

    /// Visible area in raster pixel space
    pub fn pixel_bounds(&self) -> PixelRect {
        PixelRect::new(-self.pan, -self.pan + self.size)
    }

    pub fn visible_tiles(&self) -> impl Iterator<Item = TileCoord> {
        visible_tiles(self.range, self.pixel_bounds())
    }

    /// Raster pixel position to viewport pixel position
    pub fn raster_to_screen(&self, p: DVec2) -> DVec2 {
        p + self.pan
    }

    pub fn geo_to_screen(&self, point: GeoPoint) -> DVec2 {
        let frac = geo_to_tile_frac(point.lon, point.lat, self.zoom);
        self.raster_to_screen((frac - self.range.origin()) * TILE_SIZE)
    }

    /// Unproject a viewport pixel position back to a geographic coordinate
    pub fn screen_to_geo(&self, screen: DVec2) -> GeoPoint {
        let frac = (screen - self.pan) / TILE_SIZE + self.range.origin();
        tile_frac_to_geo(frac, self.zoom)
    }
}
