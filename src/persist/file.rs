use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use geojson::FeatureCollection;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::persist::ShapeBackend;
use crate::shapes::{feature_collection, shape_from_feature, Shape};

/// Shapes of every layer kept in one GeoJSON FeatureCollection file.
/// The file is rewritten after each successful mutation.
pub struct GeoJsonBackend {
    path: PathBuf,
    layer_id: String,
    shapes: Vec<Shape>,
}

impl GeoJsonBackend {
    /// Open `path`; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>, layer_id: impl Into<String>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let shapes = if path.exists() { read_shapes(&path)? } else { Vec::new() };
        info!(path = %path.display(), count = shapes.len(), "shape file opened");
        Ok(Self {
            path,
            layer_id: layer_id.into(),
            shapes,
        })
    }

    /// Every layer that has at least one shape, sorted
    pub fn layers(&self) -> Vec<String> {
        self.shapes
            .iter()
            .map(|s| s.layer_id.clone())
            .filter(|l| !l.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn flush(&self) -> Result<(), PersistenceError> {
        let collection = feature_collection(&self.shapes);
        let json = serde_json::to_string_pretty(&collection).map_err(|e| PersistenceError::Codec(e.to_string()))?;
        // Write-then-rename so a crash never leaves a truncated file
        let tmp = self.path.with_extension("geojson.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply `change`, persist, and undo it if the write fails
    fn write_through(&mut self, change: impl FnOnce(&mut Vec<Shape>)) -> Result<(), PersistenceError> {
        let before = self.shapes.clone();
        change(&mut self.shapes);
        if let Err(e) = self.flush() {
            self.shapes = before;
            return Err(e);
        }
        Ok(())
    }
}

fn read_shapes(path: &Path) -> Result<Vec<Shape>, PersistenceError> {
    let mut bytes = fs::read(path)?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let collection: FeatureCollection =
        simd_json::serde::from_slice(&mut bytes).map_err(|e| PersistenceError::Codec(e.to_string()))?;

    let mut shapes = Vec::with_capacity(collection.features.len());
    for feature in &collection.features {
        match shape_from_feature(feature) {
            Ok(shape) => shapes.push(shape),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping feature"),
        }
    }
    Ok(shapes)
}

impl ShapeBackend for GeoJsonBackend {
    fn create_shape(&mut self, shape: &Shape) -> Result<Shape, PersistenceError> {
        if self.shapes.iter().any(|s| s.id == shape.id) {
            return Err(PersistenceError::Rejected(format!("shape {} already exists", shape.id)));
        }
        let mut stored = shape.clone();
        stored.layer_id = self.layer_id.clone();
        let copy = stored.clone();
        self.write_through(|shapes| shapes.push(copy))?;
        Ok(stored)
    }

    fn update_shape(&mut self, shape: &Shape) -> Result<Shape, PersistenceError> {
        let index = self
            .shapes
            .iter()
            .position(|s| s.id == shape.id)
            .ok_or(PersistenceError::NotFound(shape.id))?;
        let copy = shape.clone();
        self.write_through(|shapes| shapes[index] = copy)?;
        Ok(shape.clone())
    }

    fn delete_shape(&mut self, id: Uuid) -> Result<(), PersistenceError> {
        let index = self
            .shapes
            .iter()
            .position(|s| s.id == id)
            .ok_or(PersistenceError::NotFound(id))?;
        self.write_through(|shapes| {
            shapes.remove(index);
        })
    }

    fn load_shapes_for_layer(&mut self, layer_id: &str) -> Result<Vec<Shape>, PersistenceError> {
        self.layer_id = layer_id.to_string();
        Ok(self
            .shapes
            .iter()
            .filter(|s| s.layer_id == layer_id)
            .cloned()
            .collect())
    }
}
