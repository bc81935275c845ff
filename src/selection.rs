//! Side-panel selection: which shape is open for attribute editing and
//! which single shape has vertex-edit mode enabled.

use std::collections::BTreeSet;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{PersistenceError, ShapeError};
use crate::persist::ShapeBackend;
use crate::shapes::{AttrValue, Attributes, PendingMutation, Shape, ShapeStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Selected(Uuid),
}

/// Edit-mode change applied to a shape's renderer handle, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTransition {
    Disable(Uuid),
    Enable(Uuid),
}

/// Buttons the side panel offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelActions {
    pub save: bool,
    pub dismiss_label: &'static str,
}

#[derive(Debug, Default)]
pub struct SelectionCoordinator {
    selection: Selection,
    can_write: bool,
    /// Unsaved attribute edits shown in the panel
    draft: Attributes,
    /// Keys the shape already has that the draft drops
    removed: BTreeSet<String>,
    error: Option<String>,
}

impl SelectionCoordinator {
    pub fn new(can_write: bool) -> Self {
        Self {
            can_write,
            ..Self::default()
        }
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn selected(&self) -> Option<Uuid> {
        match self.selection {
            Selection::Selected(id) => Some(id),
            Selection::None => None,
        }
    }

    pub fn can_write(&self) -> bool {
        self.can_write
    }

    pub fn actions(&self) -> PanelActions {
        if self.can_write {
            PanelActions { save: true, dismiss_label: "cancel" }
        } else {
            PanelActions { save: false, dismiss_label: "close" }
        }
    }

    pub fn draft(&self) -> &Attributes {
        &self.draft
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Open `id` in the panel. The previous shape's edit mode is always
    /// switched off before the new one is switched on.
    pub fn select(&mut self, id: Uuid, store: &mut ShapeStore) -> Result<Vec<EditTransition>, ShapeError> {
        let shape = store.get(id).ok_or(ShapeError::NotFound(id))?;
        if self.selected() == Some(id) {
            return Ok(Vec::new());
        }
        let attributes = shape.attributes.clone();

        let mut transitions = self.release(store);
        if self.can_write && store.set_editing(id, true) {
            transitions.push(EditTransition::Enable(id));
        }
        self.selection = Selection::Selected(id);
        self.draft = attributes;
        self.removed.clear();
        self.error = None;
        debug!(%id, "shape selected");
        Ok(transitions)
    }

    /// Disable edit mode on the current selection and clear it
    fn release(&mut self, store: &mut ShapeStore) -> Vec<EditTransition> {
        let mut transitions = Vec::new();
        if let Some(prev) = self.selected() {
            if store.handles().is_editing(prev) && store.set_editing(prev, false) {
                transitions.push(EditTransition::Disable(prev));
            }
        }
        self.selection = Selection::None;
        transitions
    }

    /// Stage an attribute edit in the panel
    pub fn set_draft(&mut self, key: impl Into<String>, value: AttrValue) -> bool {
        if self.selected().is_none() {
            return false;
        }
        let key = key.into();
        self.removed.remove(&key);
        self.draft.insert(key, value);
        true
    }

    /// Drop a key from the draft; saving then removes it from the shape
    pub fn remove_draft(&mut self, key: &str) -> bool {
        if self.draft.remove(key).is_none() {
            return false;
        }
        self.removed.insert(key.to_string());
        true
    }

    /// Apply the draft optimistically and return the request to send
    pub fn begin_save(&mut self, store: &mut ShapeStore) -> Result<PendingMutation, ShapeError> {
        if !self.can_write {
            return Err(ShapeError::ReadOnly);
        }
        let id = self.selected().ok_or(ShapeError::NothingSelected)?;
        store.update_attributes(id, self.draft.clone(), &self.removed).inspect_err(|e| {
            self.error = Some(e.to_string());
        })
    }

    /// Close the panel once the save is confirmed; on failure stay open with
    /// the draft intact so the user can retry.
    pub fn finish_save(
        &mut self,
        store: &mut ShapeStore,
        pending: PendingMutation,
        outcome: Result<Option<Shape>, PersistenceError>,
    ) -> Result<Vec<EditTransition>, ShapeError> {
        match store.settle(pending, outcome) {
            Ok(_) => {
                self.draft.clear();
                self.removed.clear();
                self.error = None;
                Ok(self.release(store))
            }
            Err(e) => {
                warn!(error = %e, "attribute save failed");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Merge the draft into the selected shape and persist it
    pub fn save<B: ShapeBackend + ?Sized>(
        &mut self,
        store: &mut ShapeStore,
        backend: &mut B,
    ) -> Result<Vec<EditTransition>, ShapeError> {
        let pending = self.begin_save(store)?;
        let outcome = pending.send(backend);
        self.finish_save(store, pending, outcome)
    }

    /// Discard the draft and close the panel
    pub fn cancel(&mut self, store: &mut ShapeStore) -> Vec<EditTransition> {
        self.draft.clear();
        self.removed.clear();
        self.error = None;
        self.release(store)
    }

    /// Re-enable edit mode when the selected shape came back with a new handle
    pub fn reattach(&mut self, store: &mut ShapeStore) -> Vec<EditTransition> {
        match self.selected() {
            Some(id) if self.can_write && !store.handles().is_editing(id) && store.set_editing(id, true) => {
                vec![EditTransition::Enable(id)]
            }
            _ => Vec::new(),
        }
    }

    /// Drop the selection if its shape no longer exists (deleted or layer swapped)
    pub fn forget_missing(&mut self, store: &ShapeStore) -> bool {
        match self.selected() {
            Some(id) if store.get(id).is_none() => {
                self.selection = Selection::None;
                self.draft.clear();
                self.removed.clear();
                true
            }
            _ => false,
        }
    }
}
