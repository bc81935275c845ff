//! Persistence collaborators for shapes.

mod file;

pub use file::GeoJsonBackend;

use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::shapes::Shape;

/// Server-side store of shapes. Results are authoritative: the store
/// replaces its optimistic copy with whatever comes back.
pub trait ShapeBackend {
    /// Persist a new shape; the backend assigns its layer (and maybe its id)
    fn create_shape(&mut self, shape: &Shape) -> Result<Shape, PersistenceError>;

    fn update_shape(&mut self, shape: &Shape) -> Result<Shape, PersistenceError>;

    fn delete_shape(&mut self, id: Uuid) -> Result<(), PersistenceError>;

    /// Load every shape of a layer and make it the layer new shapes go to
    fn load_shapes_for_layer(&mut self, layer_id: &str) -> Result<Vec<Shape>, PersistenceError>;
}

/// One recorded backend request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Create(Uuid),
    Update(Uuid),
    Delete(Uuid),
    Load(String),
}

/// In-process backend. Also the test double: it journals requests and can
/// be armed to fail the next one.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    layer_id: String,
    shapes: HashMap<Uuid, (usize, Shape)>,
    next_seq: usize,
    assign_ids: bool,
    fail_next: Option<String>,
    calls: Vec<BackendCall>,
}

impl MemoryBackend {
    pub fn new(layer_id: impl Into<String>) -> Self {
        Self {
            layer_id: layer_id.into(),
            ..Self::default()
        }
    }

    /// Seed shapes as if they were already stored
    pub fn with_shapes(mut self, shapes: impl IntoIterator<Item = Shape>) -> Self {
        for shape in shapes {
            self.store(shape);
        }
        self
    }

    /// Make the backend replace client ids on create
    pub fn assign_ids(&mut self, assign: bool) {
        self.assign_ids = assign;
    }

    /// Fail the next request with `reason`
    pub fn fail_next(&mut self, reason: impl Into<String>) {
        self.fail_next = Some(reason.into());
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    fn store(&mut self, shape: Shape) {
        let seq = match self.shapes.get(&shape.id) {
            Some((seq, _)) => *seq,
            None => {
                self.next_seq += 1;
                self.next_seq
            }
        };
        self.shapes.insert(shape.id, (seq, shape));
    }

    fn check(&mut self, call: BackendCall) -> Result<(), PersistenceError> {
        debug!(?call, "memory backend request");
        self.calls.push(call);
        match self.fail_next.take() {
            Some(reason) => Err(PersistenceError::Rejected(reason)),
            None => Ok(()),
        }
    }
}

impl ShapeBackend for MemoryBackend {
    fn create_shape(&mut self, shape: &Shape) -> Result<Shape, PersistenceError> {
        self.check(BackendCall::Create(shape.id))?;
        let mut stored = shape.clone();
        stored.layer_id = self.layer_id.clone();
        if self.assign_ids {
            stored.id = Uuid::new_v4();
        }
        self.store(stored.clone());
        Ok(stored)
    }

    fn update_shape(&mut self, shape: &Shape) -> Result<Shape, PersistenceError> {
        self.check(BackendCall::Update(shape.id))?;
        if !self.shapes.contains_key(&shape.id) {
            return Err(PersistenceError::NotFound(shape.id));
        }
        self.store(shape.clone());
        Ok(shape.clone())
    }

    fn delete_shape(&mut self, id: Uuid) -> Result<(), PersistenceError> {
        self.check(BackendCall::Delete(id))?;
        self.shapes
            .remove(&id)
            .map(|_| ())
            .ok_or(PersistenceError::NotFound(id))
    }

    fn load_shapes_for_layer(&mut self, layer_id: &str) -> Result<Vec<Shape>, PersistenceError> {
        self.check(BackendCall::Load(layer_id.to_string()))?;
        self.layer_id = layer_id.to_string();
        let mut shapes: Vec<_> = self
            .shapes
            .values()
            .filter(|(_, s)| s.layer_id == layer_id)
            .collect();
        // Creation order, like a server listing
        shapes.sort_by_key(|(seq, _)| *seq);
        Ok(shapes.into_iter().map(|(_, s)| s.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::GeoPoint;
    use crate::shapes::Geometry;

    fn point(lon: f64, layer: &str) -> Shape {
        let mut s = Shape::draft(Geometry::Point(GeoPoint::new(lon, 0.0)));
        s.layer_id = layer.into();
        s
    }

    #[test]
    fn test_load_filters_by_layer_in_creation_order() {
        let a = point(1.0, "wells");
        let b = point(2.0, "roads");
        let c = point(3.0, "wells");
        let mut backend = MemoryBackend::new("wells").with_shapes([a.clone(), b, c.clone()]);
        let loaded = backend.load_shapes_for_layer("wells").unwrap();
        assert_eq!(loaded, vec![a, c]);
    }

    #[test]
    fn test_create_assigns_active_layer() {
        let mut backend = MemoryBackend::new("wells");
        backend.load_shapes_for_layer("roads").unwrap();
        let created = backend.create_shape(&point(1.0, "")).unwrap();
        assert_eq!(created.layer_id, "roads");
    }

    #[test]
    fn test_fail_next_fires_once() {
        let mut backend = MemoryBackend::new("wells");
        backend.fail_next("offline");
        assert_eq!(
            backend.load_shapes_for_layer("wells"),
            Err(PersistenceError::Rejected("offline".into()))
        );
        assert!(backend.load_shapes_for_layer("wells").is_ok());
        assert_eq!(backend.calls().len(), 2);
    }

    #[test]
    fn test_update_unknown_shape() {
        let mut backend = MemoryBackend::new("wells");
        let ghost = point(1.0, "wells");
        assert_eq!(backend.update_shape(&ghost), Err(PersistenceError::NotFound(ghost.id)));
        assert_eq!(backend.delete_shape(ghost.id), Err(PersistenceError::NotFound(ghost.id)));
    }
}
