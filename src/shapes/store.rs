use std::collections::{BTreeSet, HashSet};

use glam::DVec2;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{PersistenceError, ShapeError};
use crate::map::GeoPoint;
use crate::persist::ShapeBackend;
use crate::shapes::{
    project_shape, Attributes, Geometry, HandleArena, PixelShape, Shape, ShapeKind,
};

/// Request a pending mutation sends to the backend
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create(Shape),
    Update(Shape),
    Delete(Uuid),
}

/// How to undo an optimistic change
#[derive(Debug, Clone)]
enum Revert {
    Remove,
    Restore(Shape),
    Reinsert { index: usize, shape: Shape },
}

/// An optimistic change already visible in the store, awaiting the backend.
/// Must be handed back to [`ShapeStore::settle`] or [`ShapeStore::commit`];
/// until then the shape refuses further mutations.
#[must_use = "a pending mutation keeps its shape locked until settled"]
#[derive(Debug)]
pub struct PendingMutation {
    shape_id: Uuid,
    epoch: u64,
    mutation: Mutation,
    revert: Revert,
}

impl PendingMutation {
    pub fn shape_id(&self) -> Uuid {
        self.shape_id
    }

    pub fn mutation(&self) -> &Mutation {
        &self.mutation
    }

    /// Issue the request. `None` means the backend returned no shape (delete).
    pub fn send<B: ShapeBackend + ?Sized>(&self, backend: &mut B) -> Result<Option<Shape>, PersistenceError> {
        match &self.mutation {
            Mutation::Create(shape) => backend.create_shape(shape).map(Some),
            Mutation::Update(shape) => backend.update_shape(shape).map(Some),
            Mutation::Delete(id) => backend.delete_shape(*id).map(|()| None),
        }
    }
}

/// Authoritative in-memory shapes of the active layer.
///
/// Every mutation is optimistic: it is applied immediately, the shape id is
/// marked in flight, and the backend outcome either reconciles the shape with
/// the server copy or reverts the change. The store puts no limit on how many
/// shapes are being edited; single-editor rules live in the selection layer.
#[derive(Debug, Default)]
pub struct ShapeStore {
    layer_id: String,
    shapes: Vec<Shape>,
    handles: HandleArena,
    in_flight: HashSet<Uuid>,
    /// Bumped on every layer swap so late outcomes for the old layer are dropped
    epoch: u64,
}

impl ShapeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in the shapes of another layer. Every renderer handle is re-issued.
    pub fn replace_all(&mut self, layer_id: impl Into<String>, shapes: Vec<Shape>) {
        self.layer_id = layer_id.into();
        self.handles.clear();
        for shape in &shapes {
            self.handles.issue(shape.id);
        }
        self.shapes = shapes;
        self.epoch += 1;
        info!(layer = %self.layer_id, count = self.shapes.len(), "layer loaded");
    }

    pub fn layer_id(&self) -> &str {
        &self.layer_id
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn get(&self, id: Uuid) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn handles(&self) -> &HandleArena {
        &self.handles
    }

    pub fn is_in_flight(&self, id: Uuid) -> bool {
        self.in_flight.contains(&id)
    }

    pub fn set_editing(&mut self, id: Uuid, editing: bool) -> bool {
        self.handles.set_editing(id, editing)
    }

    fn index_of(&self, id: Uuid) -> Result<usize, ShapeError> {
        self.shapes
            .iter()
            .position(|s| s.id == id)
            .ok_or(ShapeError::NotFound(id))
    }

    /// Shared optimistic protocol: gate on the in-flight flag, apply the
    /// change, and lock the shape until the outcome is settled.
    fn optimistic(
        &mut self,
        id: Uuid,
        apply: impl FnOnce(&mut Self) -> Result<(Mutation, Revert), ShapeError>,
    ) -> Result<PendingMutation, ShapeError> {
        if self.in_flight.contains(&id) {
            return Err(ShapeError::Busy(id));
        }
        let (mutation, revert) = apply(self)?;
        self.in_flight.insert(id);
        Ok(PendingMutation {
            shape_id: id,
            epoch: self.epoch,
            mutation,
            revert,
        })
    }

    /// Add a freshly drawn shape. It is visible before the backend confirms it.
    pub fn create_from_draw(
        &mut self,
        kind: ShapeKind,
        rings: Vec<Vec<GeoPoint>>,
    ) -> Result<PendingMutation, ShapeError> {
        let geometry = Geometry::from_rings(kind, rings)?;
        let shape = Shape::draft(geometry);
        let id = shape.id;
        self.optimistic(id, move |store| {
            store.handles.issue(id);
            store.shapes.push(shape.clone());
            debug!(%id, kind = kind.label(), "optimistic create");
            Ok((Mutation::Create(shape), Revert::Remove))
        })
    }

    /// Move a point shape
    pub fn update_position(&mut self, id: Uuid, position: GeoPoint) -> Result<PendingMutation, ShapeError> {
        self.optimistic(id, |store| {
            let index = store.index_of(id)?;
            if store.shapes[index].kind() != ShapeKind::Point {
                return Err(ShapeError::Validation(format!("shape {id} is not a point")));
            }
            let geometry = Geometry::Point(position);
            geometry.validate()?;
            Ok(store.replace_geometry(index, geometry))
        })
    }

    /// Replace the vertex rings of a line or polygon. Invalid rings leave the
    /// previous geometry untouched and never reach the backend.
    pub fn update_vertices(&mut self, id: Uuid, rings: Vec<Vec<GeoPoint>>) -> Result<PendingMutation, ShapeError> {
        self.optimistic(id, |store| {
            let index = store.index_of(id)?;
            let kind = store.shapes[index].kind();
            if kind == ShapeKind::Point {
                return Err(ShapeError::Validation(format!("shape {id} is a point")));
            }
            let geometry = Geometry::from_rings(kind, rings)?;
            Ok(store.replace_geometry(index, geometry))
        })
    }

    /// Merge `attributes` into the shape's attribute map and drop the `removed` keys
    pub fn update_attributes(
        &mut self,
        id: Uuid,
        attributes: Attributes,
        removed: &BTreeSet<String>,
    ) -> Result<PendingMutation, ShapeError> {
        self.optimistic(id, |store| {
            let index = store.index_of(id)?;
            let previous = store.shapes[index].clone();
            let target = &mut store.shapes[index].attributes;
            target.retain(|key, _| !removed.contains(key));
            target.extend(attributes);
            Ok((Mutation::Update(store.shapes[index].clone()), Revert::Restore(previous)))
        })
    }

    fn replace_geometry(&mut self, index: usize, geometry: Geometry) -> (Mutation, Revert) {
        let previous = self.shapes[index].clone();
        self.shapes[index].geometry = geometry;
        (Mutation::Update(self.shapes[index].clone()), Revert::Restore(previous))
    }

    /// Remove a shape. Its renderer handle dies immediately, even if the
    /// backend later refuses and the shape comes back.
    pub fn delete_shape(&mut self, id: Uuid) -> Result<PendingMutation, ShapeError> {
        self.optimistic(id, |store| {
            let index = store.index_of(id)?;
            let shape = store.shapes.remove(index);
            store.handles.release(id);
            debug!(%id, "optimistic delete");
            Ok((Mutation::Delete(id), Revert::Reinsert { index, shape }))
        })
    }

    /// Apply the backend outcome for `pending`. Returns the confirmed shape id,
    /// which differs from the optimistic one if the backend assigned its own.
    /// On failure the optimistic change is reverted before the error is returned.
    pub fn settle(
        &mut self,
        pending: PendingMutation,
        outcome: Result<Option<Shape>, PersistenceError>,
    ) -> Result<Uuid, ShapeError> {
        let PendingMutation {
            shape_id,
            epoch,
            mutation,
            revert,
        } = pending;
        self.in_flight.remove(&shape_id);

        if epoch != self.epoch {
            debug!(%shape_id, "outcome for a previous layer ignored");
            return outcome.map(|s| s.map_or(shape_id, |s| s.id)).map_err(ShapeError::from);
        }

        match outcome {
            Ok(confirmed) => {
                let id = self.reconcile(shape_id, confirmed);
                info!(%id, op = mutation_label(&mutation), "mutation confirmed");
                Ok(id)
            }
            Err(err) => {
                self.revert(shape_id, revert);
                warn!(%shape_id, op = mutation_label(&mutation), error = %err, "mutation rolled back");
                Err(err.into())
            }
        }
    }

    /// Send `pending` to `backend` and settle the outcome
    pub fn commit<B: ShapeBackend + ?Sized>(
        &mut self,
        pending: PendingMutation,
        backend: &mut B,
    ) -> Result<Uuid, ShapeError> {
        let outcome = pending.send(backend);
        self.settle(pending, outcome)
    }

    fn reconcile(&mut self, shape_id: Uuid, confirmed: Option<Shape>) -> Uuid {
        let Some(confirmed) = confirmed else {
            return shape_id;
        };
        let id = confirmed.id;
        match self.shapes.iter().position(|s| s.id == shape_id) {
            Some(index) => {
                self.handles.rekey(shape_id, id);
                self.shapes[index] = confirmed;
            }
            None => {
                self.handles.issue(id);
                self.shapes.push(confirmed);
            }
        }
        id
    }

    fn revert(&mut self, shape_id: Uuid, revert: Revert) {
        match revert {
            Revert::Remove => {
                self.shapes.retain(|s| s.id != shape_id);
                self.handles.release(shape_id);
            }
            Revert::Restore(previous) => {
                if let Some(slot) = self.shapes.iter_mut().find(|s| s.id == shape_id) {
                    *slot = previous;
                }
            }
            Revert::Reinsert { index, shape } => {
                let index = index.min(self.shapes.len());
                self.handles.issue(shape.id);
                self.shapes.insert(index, shape);
            }
        }
    }

    /// Shapes in raster pixel space for the given zoom and raster origin
    pub fn project_all(&self, zoom: u8, origin: DVec2) -> Vec<PixelShape> {
        self.shapes
            .iter()
            .filter_map(|shape| {
                let handle = self.handles.get(shape.id)?;
                let geometry = project_shape(shape, zoom, origin);
                Some(PixelShape {
                    id: shape.id,
                    kind: shape.kind(),
                    handle,
                    editing: self.handles.is_editing(shape.id),
                    bbox: geometry.bbox(),
                    geometry,
                })
            })
            .collect()
    }
}

fn mutation_label(mutation: &Mutation) -> &'static str {
    match mutation {
        Mutation::Create(_) => "create",
        Mutation::Update(_) => "update",
        Mutation::Delete(_) => "delete",
    }
}
