//! A set of asset slots ticked together.

use crate::backend::{DrawSink, RenderBackend};
use crate::loader::AssetSlot;

#[derive(Debug, Default)]
pub struct Scene {
    slots: Vec<AssetSlot>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slot, returning its index.
    pub fn add(&mut self, slot: AssetSlot) -> usize {
        self.slots.push(slot);
        self.slots.len() - 1
    }

    /// Remove a slot. A pending import is abandoned.
    pub fn remove(&mut self, index: usize) -> Option<AssetSlot> {
        (index < self.slots.len()).then(|| self.slots.remove(index))
    }

    pub fn slot(&self, index: usize) -> Option<&AssetSlot> {
        self.slots.get(index)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut AssetSlot> {
        self.slots.get_mut(index)
    }

    pub fn slots(&self) -> &[AssetSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn ready_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_ready()).count()
    }

    /// True once no slot is still loading.
    pub fn is_settled(&self) -> bool {
        self.slots
            .iter()
            .all(|slot| slot.is_ready() || slot.is_failed())
    }

    /// Poll pending imports, then run one frame of every ready asset in
    /// insertion order.
    pub fn tick<B>(&mut self, delta_ms: f32, backend: &mut B)
    where
        B: RenderBackend + DrawSink,
    {
        for slot in &mut self.slots {
            slot.poll(backend);
            slot.tick(delta_ms, backend);
        }
    }
}
