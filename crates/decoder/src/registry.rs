//! Buffer Registry — output slots detected as ready but not yet pulled.
//!
//! Between the poll cycle that dequeues an output slot and the `get_frame`
//! call that copies it out, the slot is held by the decoder. The registry
//! records which slots those are together with the [`BufferInfo`] the codec
//! returned for them. The bytes themselves stay in codec-owned storage; the
//! registry only ever holds indices and metadata.
//!
//! The registry is bounded. When it is full the decoder stops dequeuing
//! further output slots, leaving them with the codec, so a consumer that
//! never pulls cannot make the decoder hoard the whole output pool.

use std::collections::HashMap;

use tracing::warn;

use cs_common::{BufferInfo, SlotIndex};

/// Bounded map from held output slot to its retrieved metadata.
///
/// # Thread safety
///
/// The registry is `Send` but **not** `Sync`. It is owned by a single
/// decoder; share the decoder, not the registry.
pub struct BufferRegistry {
    entries: HashMap<SlotIndex, BufferInfo>,
    capacity: usize,
}

impl BufferRegistry {
    /// Create a registry that holds up to `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self {
            entries: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a retrieved output slot.
    ///
    /// A slot that is already present is overwritten (the codec reported it
    /// twice); the previous metadata is returned.
    pub fn insert(&mut self, slot: SlotIndex, info: BufferInfo) -> Option<BufferInfo> {
        let previous = self.entries.insert(slot, info);
        if previous.is_some() {
            warn!(%slot, "Output slot reported ready twice");
        }
        previous
    }

    /// Remove a slot, returning its metadata.
    pub fn take(&mut self, slot: SlotIndex) -> Option<BufferInfo> {
        self.entries.remove(&slot)
    }

    pub fn get(&self, slot: SlotIndex) -> Option<&BufferInfo> {
        self.entries.get(&slot)
    }

    pub fn contains(&self, slot: SlotIndex) -> bool {
        self.entries.contains_key(&slot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether no further output slot may be taken from the codec.
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Remove every entry, returning the held slots in index order.
    pub fn drain_slots(&mut self) -> Vec<SlotIndex> {
        let mut slots: Vec<SlotIndex> = self.entries.drain().map(|(slot, _)| slot).collect();
        slots.sort_unstable();
        slots
    }
}

impl std::fmt::Debug for BufferRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferRegistry")
            .field("held", &self.entries.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

// ── Tests ────────────────────────────────────────────────────────────
