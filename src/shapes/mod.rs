//! Vector shapes drawn over the map and the store that owns them.

mod feature;
mod handles;
mod pixel;
mod store;

pub use feature::{feature_collection, feature_from_shape, shape_from_feature, LAYER_KEY};
pub use handles::{HandleArena, RendererHandle};
pub use pixel::{hit_test, project_shape, PixelGeometry, PixelShape};
pub use store::{Mutation, PendingMutation, ShapeStore};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::error::ShapeError;
use crate::map::GeoPoint;

/// Scalar attribute value attached to a shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Null,
}

impl AttrValue {
    /// Interpret free text typed into the side panel
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw {
            "" | "null" => AttrValue::Null,
            "true" => AttrValue::Bool(true),
            "false" => AttrValue::Bool(false),
            _ => raw
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map_or_else(|| AttrValue::Text(raw.to_string()), AttrValue::Number),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Number(n) => write!(f, "{n}"),
            AttrValue::Text(s) => f.write_str(s),
            AttrValue::Null => f.write_str("-"),
        }
    }
}

pub type Attributes = BTreeMap<String, AttrValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Point,
    Line,
    Polygon,
}

impl ShapeKind {
    pub fn label(self) -> &'static str {
        match self {
            ShapeKind::Point => "point",
            ShapeKind::Line => "line",
            ShapeKind::Polygon => "polygon",
        }
    }
}

/// Geographic coordinates of a shape. Polygon rings are open or closed;
/// the first ring is the outer boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(GeoPoint),
    Line(Vec<GeoPoint>),
    Polygon(Vec<Vec<GeoPoint>>),
}

impl Geometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Geometry::Point(_) => ShapeKind::Point,
            Geometry::Line(_) => ShapeKind::Line,
            Geometry::Polygon(_) => ShapeKind::Polygon,
        }
    }

    /// Build a geometry of `kind` from the vertex rings a drawing tool reports
    pub fn from_rings(kind: ShapeKind, mut rings: Vec<Vec<GeoPoint>>) -> Result<Self, ShapeError> {
        let geometry = match kind {
            ShapeKind::Point => {
                let point = rings
                    .first()
                    .and_then(|r| r.first())
                    .copied()
                    .ok_or_else(|| ShapeError::Validation("point needs a coordinate".into()))?;
                Geometry::Point(point)
            }
            ShapeKind::Line => {
                if rings.len() != 1 {
                    return Err(ShapeError::Validation(format!(
                        "line needs exactly one vertex list, got {}",
                        rings.len()
                    )));
                }
                Geometry::Line(rings.remove(0))
            }
            ShapeKind::Polygon => Geometry::Polygon(rings),
        };
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn validate(&self) -> Result<(), ShapeError> {
        match self {
            Geometry::Point(p) => check_finite(std::slice::from_ref(p)),
            Geometry::Line(line) => {
                check_finite(line)?;
                if line.len() < 2 {
                    return Err(ShapeError::Validation(format!(
                        "line needs at least 2 vertices, got {}",
                        line.len()
                    )));
                }
                Ok(())
            }
            Geometry::Polygon(rings) => {
                if rings.is_empty() {
                    return Err(ShapeError::Validation("polygon has no rings".into()));
                }
                for (i, ring) in rings.iter().enumerate() {
                    check_finite(ring)?;
                    let distinct = distinct_vertices(ring);
                    if distinct < 3 {
                        return Err(ShapeError::Validation(format!(
                            "polygon ring {i} has {distinct} distinct vertices, needs 3"
                        )));
                    }
                }
                Ok(())
            }
        }
    }
}

fn check_finite(points: &[GeoPoint]) -> Result<(), ShapeError> {
    match points.iter().find(|p| !p.is_finite()) {
        Some(p) => Err(ShapeError::Validation(format!(
            "non-finite coordinate ({}, {})",
            p.lon, p.lat
        ))),
        None => Ok(()),
    }
}

fn distinct_vertices(ring: &[GeoPoint]) -> usize {
    let mut seen: Vec<&GeoPoint> = Vec::with_capacity(ring.len());
    for p in ring {
        if !seen.contains(&p) {
            seen.push(p);
        }
    }
    seen.len()
}

/// A point, line or polygon on one map layer
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub id: Uuid,
    /// Owning layer; empty until the backend assigns one
    pub layer_id: String,
    pub geometry: Geometry,
    pub attributes: Attributes,
}

impl Shape {
    /// Fresh client-side shape awaiting persistence
    pub fn draft(geometry: Geometry) -> Self {
        Self {
            id: Uuid::new_v4(),
            layer_id: String::new(),
            geometry,
            attributes: Attributes::new(),
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }
}
