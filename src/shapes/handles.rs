use std::collections::HashMap;
use uuid::Uuid;

/// Opaque token the renderer uses for a shape's drawable/editable layer.
/// A released handle is dead forever; a re-inserted shape gets a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RendererHandle {
    slot: u32,
    generation: u32,
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    handle: RendererHandle,
    editing: bool,
}

/// Generational arena of renderer handles keyed by shape id
#[derive(Debug, Default)]
pub struct HandleArena {
    generations: Vec<u32>,
    occupied: Vec<bool>,
    free: Vec<u32>,
    bound: HashMap<Uuid, Binding>,
}

impl HandleArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a fresh handle to `id`, killing any handle it held before
    pub fn issue(&mut self, id: Uuid) -> RendererHandle {
        self.release(id);

        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.generations.push(0);
                self.occupied.push(false);
                (self.generations.len() - 1) as u32
            }
        };
        self.occupied[slot as usize] = true;
        let handle = RendererHandle {
            slot,
            generation: self.generations[slot as usize],
        };
        self.bound.insert(id, Binding { handle, editing: false });
        handle
    }

    /// Detach `id`. Its handle becomes invalid.
    pub fn release(&mut self, id: Uuid) -> Option<RendererHandle> {
        let binding = self.bound.remove(&id)?;
        let slot = binding.handle.slot as usize;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.occupied[slot] = false;
        self.free.push(binding.handle.slot);
        Some(binding.handle)
    }

    /// Move a live binding to a new id (server confirmed a different id)
    pub fn rekey(&mut self, from: Uuid, to: Uuid) {
        if from == to {
            return;
        }
        if let Some(binding) = self.bound.remove(&from) {
            self.release(to);
            self.bound.insert(to, binding);
        }
    }

    pub fn get(&self, id: Uuid) -> Option<RendererHandle> {
        self.bound.get(&id).map(|b| b.handle)
    }

    pub fn is_live(&self, handle: RendererHandle) -> bool {
        let slot = handle.slot as usize;
        self.occupied.get(slot).copied().unwrap_or(false) && self.generations[slot] == handle.generation
    }

    /// Toggle vertex-edit mode on a bound handle. Returns false for unknown ids.
    pub fn set_editing(&mut self, id: Uuid, editing: bool) -> bool {
        match self.bound.get_mut(&id) {
            Some(binding) => {
                binding.editing = editing;
                true
            }
            None => false,
        }
    }

    pub fn is_editing(&self, id: Uuid) -> bool {
        self.bound.get(&id).is_some_and(|b| b.editing)
    }

    pub fn editing_count(&self) -> usize {
        self.bound.values().filter(|b| b.editing).count()
    }

    pub fn clear(&mut self) {
        let ids: Vec<Uuid> = self.bound.keys().copied().collect();
        for id in ids {
            self.release(id);
        }
    }
}
