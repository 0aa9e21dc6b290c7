//! Slot storage and per-buffer metadata shared with codec engines.
//!
//! A codec engine owns two pools of fixed-capacity [`SlotBuffer`]s (input and
//! output). Producers never hold on to a slot: they address it by
//! [`SlotIndex`](crate::types::SlotIndex), fill or read it inside a single
//! call, and hand it back through the engine's submit / release primitives.

use bitflags::bitflags;

use crate::error::CodecError;
use crate::types::Timestamp;

bitflags! {
    /// Flags attached to a submitted or retrieved buffer.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct BufferFlags: u32 {
        /// The buffer holds a sync (key) frame.
        const KEY_FRAME = 1;
        /// The buffer holds codec-specific configuration, not media.
        const CODEC_CONFIG = 2;
        /// No further payload follows on this track.
        const END_OF_STREAM = 4;
        /// The buffer holds part of a frame; more follows.
        const PARTIAL_FRAME = 8;
    }
}

impl BufferFlags {
    pub fn is_end_of_stream(self) -> bool {
        self.contains(Self::END_OF_STREAM)
    }
}

/// Metadata of a buffer returned by the codec's output side.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BufferInfo {
    /// Start of the payload inside the slot.
    pub offset: usize,
    /// Payload byte count.
    pub size: usize,
    /// Sample time reported by the engine.
    pub pts: Timestamp,
    pub flags: BufferFlags,
}

impl BufferInfo {
    pub fn new(offset: usize, size: usize, pts: Timestamp, flags: BufferFlags) -> Self {
        Self {
            offset,
            size,
            pts,
            flags,
        }
    }

    /// Byte range of the payload within its slot, or `None` if
    /// `offset + size` overflows.
    pub fn range(&self) -> Option<std::ops::Range<usize>> {
        let end = self.offset.checked_add(self.size)?;
        Some(self.offset..end)
    }
}

/// A fixed-capacity byte slot owned by a codec engine.
///
/// Capacity is set at allocation and never grows; writes that do not fit
/// are rejected rather than reallocating.
#[derive(Clone, PartialEq, Eq)]
pub struct SlotBuffer {
    data: Vec<u8>,
    capacity: usize,
}

impl SlotBuffer {
    /// Allocate an empty slot that can hold `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Allocate a slot pre-filled with `bytes`; capacity equals their length.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec(),
            capacity: bytes.len(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Replace the slot contents with `bytes`.
    ///
    /// # Errors
    /// Returns `CodecError::SlotOverflow` if `bytes` exceeds the capacity;
    /// the previous contents are left untouched in that case.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        if bytes.len() > self.capacity {
            return Err(CodecError::SlotOverflow {
                size: bytes.len(),
                capacity: self.capacity,
            });
        }
        self.data.clear();
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl std::fmt::Debug for SlotBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotBuffer")
            .field("len", &self.data.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
