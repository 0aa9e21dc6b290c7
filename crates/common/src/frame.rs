//! Media frames: input to the codec on `push`, output of `get_frame`.

use crate::buffer::BufferFlags;
use crate::types::{SlotIndex, Timestamp, TrackId};

/// A unit of media payload plus its buffer metadata.
///
/// Input frames are built by the producer; output frames are built by the
/// decoder from a retrieved codec slot. Either way the frame owns a copy of
/// the bytes and never the slot storage itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    /// Payload bytes (may be empty).
    pub payload: Vec<u8>,
    /// Slot the payload came from, or a pre-acquired input slot.
    pub buffer_index: Option<SlotIndex>,
    /// Presentation / sample time.
    pub pts: Timestamp,
    pub flags: BufferFlags,
    pub track_id: TrackId,
}

impl Frame {
    /// Build an input frame from payload bytes and a presentation time.
    pub fn new(payload: impl Into<Vec<u8>>, pts: Timestamp) -> Self {
        Self {
            payload: payload.into(),
            pts,
            ..Self::default()
        }
    }

    /// The sentinel frame returned when no output is available:
    /// empty payload, no slot, zero flags, track 0.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Target a slot previously acquired from the codec instead of
    /// letting the decoder acquire one.
    pub fn with_buffer_index(mut self, index: SlotIndex) -> Self {
        self.buffer_index = Some(index);
        self
    }

    pub fn with_flags(mut self, flags: BufferFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_track_id(mut self, track_id: TrackId) -> Self {
        self.track_id = track_id;
        self
    }

    /// Payload byte count.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// `true` for frames without payload, the sentinel included.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// `true` only for the all-zero sentinel frame.
    pub fn is_sentinel(&self) -> bool {
        *self == Self::empty()
    }

    /// Slot index as a plain number, 0 when the frame carries none.
    pub fn buffer_index_or_zero(&self) -> usize {
        self.buffer_index.map_or(0, SlotIndex::get)
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.flags.is_end_of_stream()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Take ownership of the payload bytes.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}
