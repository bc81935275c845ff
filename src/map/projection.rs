use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Edge length of one raster tile in pixels
pub const TILE_SIZE: f64 = 256.0;

/// Highest zoom level the tile grid supports
pub const MAX_SUPPORTED_ZOOM: u8 = 20;

/// A WGS84 position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

/// Integer tile address. `x` and `y` are always inside `0..2^z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

/// Continuous tile-grid position, x grows east and y grows south
pub type TileFrac = DVec2;

/// Number of tiles along one axis at `zoom`
#[inline(always)]
pub fn tiles_at(zoom: u8) -> f64 {
    f64::from(1u32 << zoom.min(MAX_SUPPORTED_ZOOM))
}

#[inline(always)]
pub fn lon_to_x(lon: f64) -> f64 {
    lon.to_radians()
}

/// Mercator northing for a latitude in degrees
#[inline(always)]
pub fn lat_to_y(lat: f64) -> f64 {
    (PI / 4.0 + lat.to_radians() / 2.0).tan().ln()
}

/// Project a geographic coordinate to fractional tile coordinates at `zoom`
pub fn geo_to_tile_frac(lon: f64, lat: f64, zoom: u8) -> TileFrac {
    let tiles = tiles_at(zoom);
    DVec2::new(
        (lon_to_x(lon) + PI) * tiles / (2.0 * PI),
        (PI - lat_to_y(lat)) * tiles / (2.0 * PI),
    )
}

/// Tile containing a geographic coordinate, clamped onto the grid.
/// Total: poles and NaN inputs land on an edge tile instead of failing.
pub fn geo_to_tile(lon: f64, lat: f64, zoom: u8) -> TileCoord {
    let zoom = zoom.min(MAX_SUPPORTED_ZOOM);
    let frac = geo_to_tile_frac(lon, lat, zoom);
    let max = tiles_at(zoom) - 1.0;

    // NaN survives clamp but casts to 0
    TileCoord {
        x: frac.x.floor().clamp(0.0, max) as u32,
        y: frac.y.floor().clamp(0.0, max) as u32,
        z: zoom,
    }
}

/// Inverse of [`geo_to_tile_frac`]
pub fn tile_frac_to_geo(frac: TileFrac, zoom: u8) -> GeoPoint {
    let tiles = tiles_at(zoom);
    let x = frac.x * 2.0 * PI / tiles - PI;
    let y = PI - frac.y * 2.0 * PI / tiles;
    GeoPoint {
        lon: x.to_degrees(),
        lat: y.sinh().atan().to_degrees(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn test_origin_is_grid_center() {
        let f = geo_to_tile_frac(0.0, 0.0, 0);
        assert!(close(f.x, 0.5, 1e-12));
        assert!(close(f.y, 0.5, 1e-12));
        assert_eq!(geo_to_tile(0.0, 0.0, 1), TileCoord { x: 1, y: 1, z: 1 });
    }

    #[test]
    fn test_tile_always_on_grid() {
        let lons = [-180.0, -179.99, -70.7, 0.0, 45.5, 179.99, 180.0];
        let lats = [-90.0, -85.06, -33.5, 0.0, 51.5, 85.06, 90.0, f64::NAN];
        for zoom in 0..=MAX_SUPPORTED_ZOOM {
            let tiles = 1u64 << zoom;
            for &lon in &lons {
                for &lat in &lats {
                    let t = geo_to_tile(lon, lat, zoom);
                    assert!(u64::from(t.x) < tiles, "x {} at z{}", t.x, zoom);
                    assert!(u64::from(t.y) < tiles, "y {} at z{}", t.y, zoom);
                    assert_eq!(t.z, zoom);
                }
            }
        }
    }

    #[test]
    fn test_zoom_step_doubles_fraction() {
        for zoom in 0..MAX_SUPPORTED_ZOOM {
            let a = geo_to_tile_frac(-70.65, -33.55, zoom);
            let b = geo_to_tile_frac(-70.65, -33.55, zoom + 1);
            assert!(close(b.x, a.x * 2.0, 1e-6 * b.x.abs().max(1.0)));
            assert!(close(b.y, a.y * 2.0, 1e-6 * b.y.abs().max(1.0)));
        }
    }

    #[test]
    fn test_inverse_round_trip() {
        let p = GeoPoint::new(-70.65, -33.55);
        let back = tile_frac_to_geo(geo_to_tile_frac(p.lon, p.lat, 14), 14);
        assert!(close(back.lon, p.lon, 1e-9));
        assert!(close(back.lat, p.lat, 1e-9));
    }

    #[test]
    fn test_santiago_tile() {
        // x = 4974.36, y = 9811.74 at z14
        let t = geo_to_tile(-70.70, -33.50, 14);
        assert_eq!((t.x, t.y), (4974, 9811));
    }
}
