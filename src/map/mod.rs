mod geometry;
mod projection;
mod tiles;
mod viewport;

pub use geometry::{draw_circle, draw_dotted_line, draw_line, draw_marker, draw_path, draw_vertex_handle};
pub use projection::{
    geo_to_tile, geo_to_tile_frac, tile_frac_to_geo, tiles_at, GeoPoint, TileCoord, TileFrac, MAX_SUPPORTED_ZOOM,
    TILE_SIZE,
};
pub use tiles::{bounding_tile_range, visible_tiles, GeoBox, PixelRect, TileRange, TileSource};
pub use viewport::{DragState, Viewport};
