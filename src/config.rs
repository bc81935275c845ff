//! Map configuration loaded from a JSON file.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::map::{GeoBox, GeoPoint, Viewport, MAX_SUPPORTED_ZOOM};

pub const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub top_left: GeoPoint,
    pub bottom_right: GeoPoint,
    pub initial_zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Starting pan in pixels; centered on the extent when absent
    pub initial_pan_offset: Option<[f64; 2]>,
    pub tile_url: String,
    /// Terminal braille dots per map pixel
    pub render_scale: f64,
    pub layer_id: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            top_left: GeoPoint::new(-70.70, -33.50),
            bottom_right: GeoPoint::new(-70.60, -33.60),
            initial_zoom: 14,
            min_zoom: 12,
            max_zoom: 18,
            initial_pan_offset: None,
            tile_url: DEFAULT_TILE_URL.to_string(),
            render_scale: 0.25,
            layer_id: "default".to_string(),
        }
    }
}

impl MapConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str::<Self>(&text)?.normalized())
    }

    /// Clamp every out-of-range value instead of rejecting it
    pub fn normalized(mut self) -> Self {
        if self.min_zoom > self.max_zoom {
            std::mem::swap(&mut self.min_zoom, &mut self.max_zoom);
        }
        self.max_zoom = self.max_zoom.min(MAX_SUPPORTED_ZOOM);
        self.min_zoom = self.min_zoom.min(self.max_zoom);
        self.initial_zoom = self.initial_zoom.clamp(self.min_zoom, self.max_zoom);

        let extent = self.extent();
        self.top_left = extent.top_left;
        self.bottom_right = extent.bottom_right;

        if !(self.render_scale.is_finite() && self.render_scale > 0.0) {
            self.render_scale = Self::default().render_scale;
        }
        if self.layer_id.trim().is_empty() {
            self.layer_id = Self::default().layer_id;
        }
        self
    }

    pub fn extent(&self) -> GeoBox {
        GeoBox::new(self.top_left, self.bottom_right).normalized()
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(
            self.extent(),
            self.initial_zoom,
            self.min_zoom,
            self.max_zoom,
            self.initial_pan_offset.map(DVec2::from),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let cfg: MapConfig = serde_json::from_str(r#"{"initial_zoom": 30, "layer_id": "wells"}"#).unwrap();
        let cfg = cfg.normalized();
        assert_eq!(cfg.initial_zoom, 18);
        assert_eq!(cfg.layer_id, "wells");
        assert_eq!(cfg.tile_url, DEFAULT_TILE_URL);
    }

    #[test]
    fn test_normalize_swaps_and_caps() {
        let cfg = MapConfig {
            min_zoom: 22,
            max_zoom: 10,
            initial_zoom: 2,
            top_left: GeoPoint::new(-70.60, -33.60),
            bottom_right: GeoPoint::new(-70.70, -33.50),
            render_scale: -1.0,
            ..MapConfig::default()
        }
        .normalized();
        assert_eq!((cfg.min_zoom, cfg.max_zoom), (10, 20));
        assert_eq!(cfg.initial_zoom, 10);
        assert_eq!(cfg.top_left, GeoPoint::new(-70.70, -33.50));
        assert_eq!(cfg.render_scale, 0.25);
    }

    #[test]
    fn test_viewport_uses_initial_pan() {
        let cfg = MapConfig {
            initial_pan_offset: Some([-12.0, -34.0]),
            ..MapConfig::default()
        };
        let vp = cfg.viewport();
        assert_eq!(vp.pan_offset(), DVec2::new(-12.0, -34.0));
        assert_eq!(vp.zoom(), 14);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = MapConfig::load(Path::new("/nonexistent/map.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/map.json"));
    }
}
