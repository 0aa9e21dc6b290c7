//! Codec engine abstraction.
//!
//! The scheduler programs against [`MediaCodec`], never against a concrete
//! engine. Engines process buffers asynchronously through an index-based
//! handshake:
//!
//! ```text
//! dequeue_input_buffer --> input_buffers()[i] filled --> queue_input_buffer(i, ..)
//!                                                            |
//!                                                       (engine works)
//!                                                            v
//! release_output_buffer(j) <-- output_buffers()[j] read <-- dequeue_output_buffer
//! ```
//!
//! Acquiring an input slot grants exclusive write access until it is queued.
//! Dequeuing an output slot grants exclusive read access until it is
//! released. The engine keeps ownership of the storage throughout.

use std::time::Duration;

use crate::buffer::{BufferFlags, BufferInfo, SlotBuffer};
use crate::error::CodecError;
use crate::types::{SlotIndex, Timestamp};

/// Index-based codec engine capability.
pub trait MediaCodec: Send {
    /// Acquire a free input slot, waiting at most `timeout`.
    ///
    /// `None` means no slot freed up in time; it is not an error.
    fn dequeue_input_buffer(&mut self, timeout: Duration) -> Option<SlotIndex>;

    /// Writable view of the input slot pool, indexed by `SlotIndex`.
    fn input_buffers(&mut self) -> &mut [SlotBuffer];

    /// Submit `size` bytes at `offset` of an acquired input slot.
    fn queue_input_buffer(
        &mut self,
        index: SlotIndex,
        offset: usize,
        size: usize,
        pts: Timestamp,
        flags: BufferFlags,
    ) -> Result<(), CodecError>;

    /// Retrieve a ready output slot, waiting at most `timeout`.
    ///
    /// The returned [`BufferInfo`] carries the payload range, the output
    /// sample time and the flags of that slot.
    fn dequeue_output_buffer(&mut self, timeout: Duration) -> Option<(SlotIndex, BufferInfo)>;

    /// Readable view of the output slot pool, indexed by `SlotIndex`.
    fn output_buffers(&self) -> &[SlotBuffer];

    /// Hand a dequeued output slot back to the engine.
    fn release_output_buffer(&mut self, index: SlotIndex) -> Result<(), CodecError>;

    /// Engine name for logging.
    fn name(&self) -> &str {
        "codec"
    }
}

impl<C: MediaCodec + ?Sized> MediaCodec for Box<C> {
    fn dequeue_input_buffer(&mut self, timeout: Duration) -> Option<SlotIndex> {
        (**self).dequeue_input_buffer(timeout)
    }

    fn input_buffers(&mut self) -> &mut [SlotBuffer] {
        (**self).input_buffers()
    }

    fn queue_input_buffer(
        &mut self,
        index: SlotIndex,
        offset: usize,
        size: usize,
        pts: Timestamp,
        flags: BufferFlags,
    ) -> Result<(), CodecError> {
        (**self).queue_input_buffer(index, offset, size, pts, flags)
    }

    fn dequeue_output_buffer(&mut self, timeout: Duration) -> Option<(SlotIndex, BufferInfo)> {
        (**self).dequeue_output_buffer(timeout)
    }

    fn output_buffers(&self) -> &[SlotBuffer] {
        (**self).output_buffers()
    }

    fn release_output_buffer(&mut self, index: SlotIndex) -> Result<(), CodecError> {
        (**self).release_output_buffer(index)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
