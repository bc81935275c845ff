use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::map::projection::{geo_to_tile, GeoPoint, TileCoord, TILE_SIZE};

/// Geographic extent given by its north-west and south-east corners
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBox {
    pub top_left: GeoPoint,
    pub bottom_right: GeoPoint,
}

impl GeoBox {
    pub fn new(top_left: GeoPoint, bottom_right: GeoPoint) -> Self {
        Self { top_left, bottom_right }
    }

    /// Reorder corners so that `top_left` really is the north-west one
    pub fn normalized(&self) -> Self {
        let (a, b) = (self.top_left, self.bottom_right);
        Self {
            top_left: GeoPoint::new(a.lon.min(b.lon), a.lat.max(b.lat)),
            bottom_right: GeoPoint::new(a.lon.max(b.lon), a.lat.min(b.lat)),
        }
    }
}

/// Axis-aligned rectangle in pixel space (min inclusive, max exclusive)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub min: DVec2,
    pub max: DVec2,
}

impl PixelRect {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Bounding box of a point set. Empty input yields a degenerate rect at the origin.
    pub fn around(points: impl IntoIterator<Item = DVec2>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::new(DVec2::ZERO, DVec2::ZERO);
        };
        iter.fold(Self::new(first, first), |r, p| Self::new(r.min.min(p), r.max.max(p)))
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn intersects(&self, other: &PixelRect) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }
}

/// Inclusive rectangle of tile indices at one zoom level.
/// This is the fixed raster the viewport pans over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    pub zoom: u8,
}

impl TileRange {
    pub fn x_span(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn y_span(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Tile-space origin of the raster (its top-left tile)
    pub fn origin(&self) -> DVec2 {
        DVec2::new(f64::from(self.min_x), f64::from(self.min_y))
    }

    /// Raster size in pixels
    pub fn content_size(&self) -> DVec2 {
        DVec2::new(f64::from(self.x_span()), f64::from(self.y_span())) * TILE_SIZE
    }

    pub fn contains(&self, tile: TileCoord) -> bool {
        tile.z == self.zoom
            && (self.min_x..=self.max_x).contains(&tile.x)
            && (self.min_y..=self.max_y).contains(&tile.y)
    }

    /// Pixel footprint of a tile relative to the raster origin
    pub fn tile_rect(&self, tile: TileCoord) -> PixelRect {
        let min = DVec2::new(
            f64::from(tile.x) - f64::from(self.min_x),
            f64::from(tile.y) - f64::from(self.min_y),
        ) * TILE_SIZE;
        PixelRect::new(min, min + DVec2::splat(TILE_SIZE))
    }
}

/// Integer tile range covering a geographic box at `zoom`
pub fn bounding_tile_range(bounds: &GeoBox, zoom: u8) -> TileRange {
    let b = bounds.normalized();
    let a = geo_to_tile(b.top_left.lon, b.top_left.lat, zoom);
    let c = geo_to_tile(b.bottom_right.lon, b.bottom_right.lat, zoom);
    TileRange {
        min_x: a.x.min(c.x),
        min_y: a.y.min(c.y),
        max_x: a.x.max(c.x),
        max_y: a.y.max(c.y),
        zoom: a.z,
    }
}

/// Tiles of `range` whose footprint intersects `bounds`.
/// `bounds` is in raster pixel space, i.e. relative to the range origin.
pub fn visible_tiles(range: TileRange, bounds: PixelRect) -> impl Iterator<Item = TileCoord> {
    let cols = axis_span(range.min_x, range.max_x, bounds.min.x, bounds.max.x);
    let rows = axis_span(range.min_y, range.max_y, bounds.min.y, bounds.max.y);
    let zoom = range.zoom;

    rows.flat_map(move |y| cols.clone().map(move |x| TileCoord { x, y, z: zoom }))
}

/// Tile indices along one axis touched by the pixel interval `[lo, hi)`
fn axis_span(min: u32, max: u32, lo: f64, hi: f64) -> std::ops::Range<u32> {
    if !(hi > lo) || hi <= 0.0 {
        return 0..0;
    }
    let span = f64::from(max - min + 1);
    let first = (lo / TILE_SIZE).floor().max(0.0);
    let last = ((hi / TILE_SIZE).ceil()).min(span);
    if first >= last {
        return 0..0;
    }
    (min + first as u32)..(min + last as u32)
}

/// Renders tile URLs from a `{z}/{x}/{y}` template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSource {
    pub template: String,
    pub subdomains: Vec<String>,
}

impl TileSource {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            subdomains: vec!["a".into(), "b".into(), "c".into()],
        }
    }

    pub fn url(&self, tile: TileCoord) -> String {
        let mut url = self
            .template
            .replace("{z}", &tile.z.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string());
        if !self.subdomains.is_empty() {
            let idx = (tile.x as usize + tile.y as usize) % self.subdomains.len();
            url = url.replace("{s}", &self.subdomains[idx]);
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn santiago() -> GeoBox {
        GeoBox::new(GeoPoint::new(-70.70, -33.50), GeoPoint::new(-70.60, -33.60))
    }

    #[test]
    fn test_bounding_range_is_stable() {
        let a = bounding_tile_range(&santiago(), 14);
        let b = bounding_tile_range(&santiago(), 14);
        assert_eq!(a, b);
        assert_eq!((a.min_x, a.max_x), (4974, 4978));
        assert_eq!((a.min_y, a.max_y), (9811, 9817));
        assert_eq!((a.x_span(), a.y_span()), (5, 7));
        assert_eq!(a.content_size(), DVec2::new(1280.0, 1792.0));
    }

    #[test]
    fn test_inverted_corners_give_same_range() {
        let b = santiago();
        let flipped = GeoBox::new(b.bottom_right, b.top_left);
        assert_eq!(bounding_tile_range(&b, 13), bounding_tile_range(&flipped, 13));
    }

    #[test]
    fn test_visible_tiles_window() {
        let range = bounding_tile_range(&santiago(), 14);
        // Straddles the first two columns and the second row
        let bounds = PixelRect::new(DVec2::new(100.0, 300.0), DVec2::new(400.0, 500.0));
        let tiles: Vec<_> = visible_tiles(range, bounds).collect();
        assert_eq!(
            tiles,
            vec![
                TileCoord { x: 4974, y: 9812, z: 14 },
                TileCoord { x: 4975, y: 9812, z: 14 },
            ]
        );
    }

    #[test]
    fn test_visible_tiles_edges_exclusive() {
        let range = bounding_tile_range(&santiago(), 14);
        let bounds = PixelRect::new(DVec2::ZERO, DVec2::new(256.0, 256.0));
        assert_eq!(visible_tiles(range, bounds).count(), 1);
    }

    #[test]
    fn test_visible_tiles_clipped_to_range() {
        let range = bounding_tile_range(&santiago(), 14);
        let bounds = PixelRect::new(DVec2::new(-1000.0, -1000.0), DVec2::new(10_000.0, 10_000.0));
        let tiles: Vec<_> = visible_tiles(range, bounds).collect();
        assert_eq!(tiles.len(), 35);
        assert!(tiles.iter().all(|t| range.contains(*t)));
    }

    #[test]
    fn test_visible_tiles_outside_raster() {
        let range = bounding_tile_range(&santiago(), 14);
        let bounds = PixelRect::new(DVec2::new(-500.0, 0.0), DVec2::new(-10.0, 200.0));
        assert_eq!(visible_tiles(range, bounds).count(), 0);
        let empty = PixelRect::new(DVec2::new(10.0, 10.0), DVec2::new(10.0, 10.0));
        assert_eq!(visible_tiles(range, empty).count(), 0);
    }

    #[test]
    fn test_tile_url() {
        let src = TileSource::new("https://{s}.tile.example.org/{z}/{x}/{y}.png");
        let url = src.url(TileCoord { x: 4974, y: 9811, z: 14 });
        // (4974 + 9811) % 3 == 1
        assert_eq!(url, "https://b.tile.example.org/14/4974/9811.png");
    }
}
