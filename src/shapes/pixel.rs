use glam::DVec2;
use uuid::Uuid;

use crate::map::{geo_to_tile_frac, GeoPoint, PixelRect, TILE_SIZE};
use crate::shapes::{Geometry, RendererHandle, Shape, ShapeKind};

/// Shape geometry in raster pixel space
#[derive(Debug, Clone, PartialEq)]
pub enum PixelGeometry {
    Point(DVec2),
    Line(Vec<DVec2>),
    Polygon(Vec<Vec<DVec2>>),
}

impl PixelGeometry {
    pub fn points(&self) -> Box<dyn Iterator<Item = DVec2> + '_> {
        match self {
            PixelGeometry::Point(p) => Box::new(std::iter::once(*p)),
            PixelGeometry::Line(line) => Box::new(line.iter().copied()),
            PixelGeometry::Polygon(rings) => Box::new(rings.iter().flatten().copied()),
        }
    }

    pub fn bbox(&self) -> PixelRect {
        PixelRect::around(self.points())
    }
}

/// Render-ready view of one shape
#[derive(Debug, Clone, PartialEq)]
pub struct PixelShape {
    pub id: Uuid,
    pub kind: ShapeKind,
    pub handle: RendererHandle,
    pub editing: bool,
    pub geometry: PixelGeometry,
    /// Used to place hover labels
    pub bbox: PixelRect,
}

#[inline(always)]
fn to_pixel(p: &GeoPoint, zoom: u8, origin: DVec2) -> DVec2 {
    (geo_to_tile_frac(p.lon, p.lat, zoom) - origin) * TILE_SIZE
}

/// Project a shape into pixels relative to the tile raster whose top-left tile is `origin`
pub fn project_shape(shape: &Shape, zoom: u8, origin: DVec2) -> PixelGeometry {
    match &shape.geometry {
        Geometry::Point(p) => PixelGeometry::Point(to_pixel(p, zoom, origin)),
        Geometry::Line(line) => PixelGeometry::Line(line.iter().map(|p| to_pixel(p, zoom, origin)).collect()),
        Geometry::Polygon(rings) => PixelGeometry::Polygon(
            rings
                .iter()
                .map(|ring| ring.iter().map(|p| to_pixel(p, zoom, origin)).collect())
                .collect(),
        ),
    }
}

/// Topmost shape under `p` (raster pixels), within `tolerance` pixels
pub fn hit_test(shapes: &[PixelShape], p: DVec2, tolerance: f64) -> Option<Uuid> {
    shapes
        .iter()
        .rev()
        .find(|shape| hits(&shape.geometry, p, tolerance))
        .map(|shape| shape.id)
}

fn hits(geometry: &PixelGeometry, p: DVec2, tolerance: f64) -> bool {
    match geometry {
        PixelGeometry::Point(q) => q.distance(p) <= tolerance,
        PixelGeometry::Line(line) => line
            .windows(2)
            .any(|w| segment_distance(p, w[0], w[1]) <= tolerance),
        PixelGeometry::Polygon(rings) => {
            contains(rings, p)
                || rings.iter().any(|ring| {
                    closed_segments(ring).any(|(a, b)| segment_distance(p, a, b) <= tolerance)
                })
        }
    }
}

fn closed_segments(ring: &[DVec2]) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
    let n = ring.len();
    (0..n).map(move |i| (ring[i], ring[(i + 1) % n]))
}

/// Even-odd containment over all rings, so holes are excluded
fn contains(rings: &[Vec<DVec2>], p: DVec2) -> bool {
    let mut inside = false;
    for ring in rings {
        for (a, b) in closed_segments(ring) {
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if p.x < x {
                    inside = !inside;
                }
            }
        }
    }
    inside
}

fn segment_distance(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
