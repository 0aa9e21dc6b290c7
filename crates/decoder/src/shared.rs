//! Shared decoder handle for a producer thread and a consumer thread.
//!
//! The scheduler itself has no internal locking. `SharedDecoder` puts one
//! `parking_lot::Mutex` around it so a producer calling `push` and a
//! consumer calling `get_frame` can hold clones of the same handle. Each
//! forwarded method takes the lock for exactly one call; use
//! [`SharedDecoder::lock`] when several calls must happen back to back.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use cs_common::{DecodeResult, Frame, MediaCodec, PluginState, SlotIndex};

use crate::decoder::{Decoder, DecoderStats, PushOutcome};

/// Cloneable, lock-protected handle to a [`Decoder`].
pub struct SharedDecoder<C: MediaCodec> {
    inner: Arc<Mutex<Decoder<C>>>,
}

impl<C: MediaCodec> Clone for SharedDecoder<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: MediaCodec> std::fmt::Debug for SharedDecoder<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedDecoder")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish()
    }
}

impl<C: MediaCodec> SharedDecoder<C> {
    pub fn new(decoder: Decoder<C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(decoder)),
        }
    }

    /// Exclusive access for a sequence of calls.
    pub fn lock(&self) -> MutexGuard<'_, Decoder<C>> {
        self.inner.lock()
    }

    pub fn start(&self) -> DecodeResult<()> {
        self.inner.lock().start()
    }

    pub fn push(&self, frame: &Frame) -> DecodeResult<PushOutcome> {
        self.inner.lock().push(frame)
    }

    pub fn drain(&self, input_slot: SlotIndex) -> DecodeResult<()> {
        self.inner.lock().drain(input_slot)
    }

    pub fn get_frame(&self) -> DecodeResult<Frame> {
        self.inner.lock().get_frame()
    }

    pub fn fill_command_queues(&self) -> Option<SlotIndex> {
        self.inner.lock().fill_command_queues()
    }

    pub fn find_free_frame(&self) -> Option<Frame> {
        self.inner.lock().find_free_frame()
    }

    pub fn state(&self) -> PluginState {
        self.inner.lock().state()
    }

    pub fn stats(&self) -> DecoderStats {
        self.inner.lock().stats()
    }

    pub fn stop(&self) -> DecodeResult<()> {
        self.inner.lock().stop()
    }
}
