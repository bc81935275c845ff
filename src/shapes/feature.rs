use geojson::{feature::Id, Feature, FeatureCollection, JsonObject, JsonValue, Value};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::map::GeoPoint;
use crate::shapes::{AttrValue, Attributes, Geometry, Shape};

/// Reserved property holding the owning layer
pub const LAYER_KEY: &str = "layer_id";

fn position(p: &GeoPoint) -> Vec<f64> {
    vec![p.lon, p.lat]
}

fn ring(points: &[GeoPoint]) -> Vec<Vec<f64>> {
    points.iter().map(position).collect()
}

fn attr_to_json(value: &AttrValue) -> JsonValue {
    match value {
        AttrValue::Bool(b) => JsonValue::Bool(*b),
        AttrValue::Number(n) => serde_json::Number::from_f64(*n).map_or(JsonValue::Null, JsonValue::Number),
        AttrValue::Text(s) => JsonValue::String(s.clone()),
        AttrValue::Null => JsonValue::Null,
    }
}

fn attr_from_json(value: &JsonValue) -> AttrValue {
    match value {
        JsonValue::Bool(b) => AttrValue::Bool(*b),
        JsonValue::Number(n) => n.as_f64().map_or(AttrValue::Null, AttrValue::Number),
        JsonValue::String(s) => AttrValue::Text(s.clone()),
        JsonValue::Null => AttrValue::Null,
        // Nested values are flattened to their JSON text
        other => AttrValue::Text(other.to_string()),
    }
}

pub fn feature_from_shape(shape: &Shape) -> Feature {
    let value = match &shape.geometry {
        Geometry::Point(p) => Value::Point(position(p)),
        Geometry::Line(line) => Value::LineString(ring(line)),
        Geometry::Polygon(rings) => Value::Polygon(rings.iter().map(|r| ring(r)).collect()),
    };

    let mut properties: JsonObject = shape
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), attr_to_json(v)))
        .collect();
    properties.insert(LAYER_KEY.to_string(), JsonValue::String(shape.layer_id.clone()));

    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(value)),
        id: Some(Id::String(shape.id.to_string())),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn point(coords: &[f64]) -> Result<GeoPoint, PersistenceError> {
    match coords {
        [lon, lat, ..] => Ok(GeoPoint::new(*lon, *lat)),
        _ => Err(PersistenceError::Codec(format!("position has {} values", coords.len()))),
    }
}

fn points(coords: &[Vec<f64>]) -> Result<Vec<GeoPoint>, PersistenceError> {
    coords.iter().map(|c| point(c)).collect()
}

pub fn shape_from_feature(feature: &Feature) -> Result<Shape, PersistenceError> {
    let id = match &feature.id {
        Some(Id::String(s)) => {
            Uuid::parse_str(s).map_err(|e| PersistenceError::Codec(format!("feature id {s:?}: {e}")))?
        }
        Some(Id::Number(n)) => return Err(PersistenceError::Codec(format!("numeric feature id {n}"))),
        None => return Err(PersistenceError::Codec("feature without id".into())),
    };

    let geometry = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Point(c)) => Geometry::Point(point(c)?),
        Some(Value::LineString(c)) => Geometry::Line(points(c)?),
        Some(Value::Polygon(rings)) => {
            Geometry::Polygon(rings.iter().map(|r| points(r)).collect::<Result<_, _>>()?)
        }
        Some(_) => return Err(PersistenceError::Codec(format!("feature {id}: unsupported geometry type"))),
        None => return Err(PersistenceError::Codec(format!("feature {id}: missing geometry"))),
    };
    geometry
        .validate()
        .map_err(|e| PersistenceError::Codec(format!("feature {id}: {e}")))?;

    let mut layer_id = String::new();
    let mut attributes = Attributes::new();
    for (key, value) in feature.properties.iter().flatten() {
        if key == LAYER_KEY {
            layer_id = value.as_str().unwrap_or_default().to_string();
        } else {
            attributes.insert(key.clone(), attr_from_json(value));
        }
    }

    Ok(Shape {
        id,
        layer_id,
        geometry,
        attributes,
    })
}

pub fn feature_collection<'a>(shapes: impl IntoIterator<Item = &'a Shape>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: shapes.into_iter().map(feature_from_shape).collect(),
        foreign_members: None,
    }
}
