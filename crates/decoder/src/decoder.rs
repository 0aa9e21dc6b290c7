//! Slot scheduler — push/pull over an asynchronous codec engine.
//!
//! `Decoder` drives a [`MediaCodec`] through its index-based handshake and
//! exposes a synchronous contract to the pipeline:
//!
//! - [`Decoder::push`] acquires an input slot (unless the frame already
//!   carries one), copies the payload in, submits it, then runs one poll
//!   cycle for a ready output slot.
//! - [`Decoder::get_frame`] pops the oldest readiness event, copies the
//!   payload out of its output slot, releases the slot and returns the frame.
//!
//! ## Slot Lifecycle
//!
//! An output slot detected by a poll cycle is held by the decoder (recorded
//! in the [`BufferRegistry`], announced in the [`CommandQueue`]) until one
//! `get_frame` call copies it out. The copy happens before the release, so
//! the returned [`Frame`] never refers to codec storage.
//!
//! Frames come out in the order the codec reported them ready, not the order
//! inputs went in. The decoder relays that order; it never reorders.
//!
//! ## Back-pressure
//!
//! Nothing here blocks beyond the configured timeouts. No free input slot
//! means [`PushOutcome::Backpressure`]; nothing ready means the sentinel
//! frame. When `max_pending_outputs` slots are already held, poll cycles are
//! skipped so the remaining outputs stay with the codec until the consumer
//! catches up.

use tracing::{debug, info, warn};

use cs_common::{
    BufferFlags, BufferInfo, CodecError, DecodeError, DecodeResult, DecoderConfig, Frame,
    MediaCodec, PluginState, SlotBuffer, SlotIndex, Timestamp,
};

use crate::command::{CommandQueue, ReadinessEvent};
use crate::registry::BufferRegistry;

// ---------------------------------------------------------------------------
// Outcomes and statistics
// ---------------------------------------------------------------------------

/// Result of a successful [`Decoder::push`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PushOutcome {
    /// The frame was submitted through this input slot.
    Submitted(SlotIndex),
    /// No input slot was free within the timeout; nothing was submitted.
    /// Retry the same frame later.
    Backpressure,
}

impl PushOutcome {
    pub fn is_submitted(self) -> bool {
        matches!(self, Self::Submitted(_))
    }
}

/// Statistics from a decoder.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Frames submitted to the codec through `push` (`drain` excluded).
    pub frames_submitted: u64,
    /// Frames returned by `get_frame` (sentinels excluded).
    pub frames_retrieved: u64,
    /// Pushes that found no free input slot.
    pub backpressure_events: u64,
    /// Poll cycles skipped because the registry was full.
    pub polls_deferred: u64,
    /// Output slots currently held, waiting for `get_frame`.
    pub outputs_pending: usize,
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Scheduler between a frame producer and an index-based codec engine.
///
/// Not designed for concurrent use: every operation takes `&mut self`.
/// Wrap it in a [`SharedDecoder`](crate::shared::SharedDecoder) when a
/// producer thread and a consumer thread share one decoder.
///
/// ```ignore
/// let mut decoder = Decoder::new(codec, DecoderConfig::new(VideoCodec::H264))?;
/// decoder.start()?;
///
/// for frame in frames {
///     while decoder.push(&frame)? == PushOutcome::Backpressure {
///         consume(decoder.get_frame()?);
///     }
/// }
///
/// decoder.drain(eos_slot)?;
/// while !decoder.is_drained() {
///     decoder.fill_command_queues();
///     consume(decoder.get_frame()?);
/// }
/// ```
pub struct Decoder<C: MediaCodec> {
    codec: C,
    config: DecoderConfig,
    state: PluginState,
    command_queue: CommandQueue,
    registry: BufferRegistry,
    /// Input slot acquired by a failed push; reused before asking the codec.
    spare_input: Option<SlotIndex>,
    stats: DecoderStats,
}

impl<C: MediaCodec> std::fmt::Debug for Decoder<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("engine", &self.codec.name())
            .field("codec", &self.config.codec)
            .field("state", &self.state)
            .field("pending_events", &self.command_queue.len())
            .field("held_outputs", &self.registry.len())
            .field("spare_input", &self.spare_input)
            .finish()
    }
}

impl<C: MediaCodec> Decoder<C> {
    /// Create a decoder driving `codec`.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidConfig` if `config` fails validation.
    pub fn new(codec: C, config: DecoderConfig) -> DecodeResult<Self> {
        config.validate()?;
        Ok(Self::build(codec, config))
    }

    /// Create a decoder with [`DecoderConfig::default`].
    pub fn with_defaults(codec: C) -> Self {
        Self::build(codec, DecoderConfig::default())
    }

    fn build(codec: C, config: DecoderConfig) -> Self {
        info!(
            engine = codec.name(),
            codec = config.codec.display_name(),
            mime = config.codec.mime_type(),
            max_pending_outputs = config.max_pending_outputs,
            "Decoder created"
        );

        Self {
            registry: BufferRegistry::new(config.max_pending_outputs),
            codec,
            config,
            state: PluginState::Created,
            command_queue: CommandQueue::new(),
            spare_input: None,
            stats: DecoderStats::default(),
        }
    }

    // -- Accessors --

    pub fn state(&self) -> PluginState {
        self.state
    }

    pub fn is_drained(&self) -> bool {
        self.state == PluginState::Drained
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// The codec engine being driven.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Read-only view of pending readiness events.
    pub fn output_command_queue(&self) -> &CommandQueue {
        &self.command_queue
    }

    pub fn stats(&self) -> DecoderStats {
        DecoderStats {
            outputs_pending: self.registry.len(),
            ..self.stats.clone()
        }
    }

    // -- Lifecycle --

    /// Move from `Created` to `Started`.
    ///
    /// Calling it again while `Started` is a no-op.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidState` once draining, drained or stopped.
    pub fn start(&mut self) -> DecodeResult<()> {
        match self.state {
            PluginState::Created => {
                self.state = PluginState::Started;
                info!(engine = self.codec.name(), "Decoder started");
                Ok(())
            }
            PluginState::Started => Ok(()),
            state => Err(DecodeError::InvalidState {
                operation: "start",
                state,
            }),
        }
    }

    /// Submit one frame and run one poll cycle.
    ///
    /// # Errors
    /// - `DecodeError::InvalidState` if the decoder is draining, drained or
    ///   stopped. No codec call is made.
    /// - `DecodeError::PayloadTooLarge` if the payload does not fit the slot.
    /// - `DecodeError::Codec` if the engine rejects the slot.
    ///
    /// An input slot acquired by a failed push is reused by the next `push`
    /// or [`find_free_frame`](Self::find_free_frame).
    pub fn push(&mut self, frame: &Frame) -> DecodeResult<PushOutcome> {
        self.ensure_accepts_input("push")?;

        let (slot, acquired) = match frame.buffer_index {
            Some(slot) => (slot, false),
            None => match self.acquire_input() {
                Some(slot) => (slot, true),
                None => {
                    self.stats.backpressure_events += 1;
                    debug!(pts = %frame.pts, "No free input slot, push deferred");
                    return Ok(PushOutcome::Backpressure);
                }
            },
        };

        if let Err(e) = self.submit_input(slot, frame) {
            // Keep a slot acquired here for the next push. Caller-supplied
            // slots stay with the caller; unknown indices are dropped.
            let bogus = matches!(e, DecodeError::Codec(CodecError::InvalidSlot(_)));
            if acquired && !bogus {
                debug!(%slot, error = %e, "Push failed, keeping acquired input slot");
                self.spare_input = Some(slot);
            }
            return Err(e);
        }
        self.stats.frames_submitted += 1;

        debug!(
            %slot,
            size = frame.len(),
            pts = %frame.pts,
            flags = frame.flags.bits(),
            "Input submitted"
        );

        self.fill_command_queues();
        Ok(PushOutcome::Submitted(slot))
    }

    /// Submit end of stream through `input_slot` and start draining.
    ///
    /// The slot is not acquired here; the caller supplies one it holds.
    /// After this call `push` is rejected. Outputs still in the codec are
    /// collected with [`fill_command_queues`](Self::fill_command_queues) and
    /// pulled with [`get_frame`](Self::get_frame) until the end-of-stream
    /// output arrives and the state becomes `Drained`.
    pub fn drain(&mut self, input_slot: SlotIndex) -> DecodeResult<()> {
        self.ensure_accepts_input("drain")?;

        self.codec.queue_input_buffer(
            input_slot,
            0,
            0,
            Timestamp::ZERO,
            BufferFlags::END_OF_STREAM,
        )?;
        self.state = PluginState::Draining;

        info!(
            slot = %input_slot,
            submitted = self.stats.frames_submitted,
            "End of stream submitted, decoder draining"
        );
        Ok(())
    }

    /// Pull the oldest ready frame.
    ///
    /// Returns the sentinel [`Frame::empty`] when no output is pending.
    ///
    /// # Errors
    /// - `DecodeError::MissingOutput` if a queued event has no registered slot.
    /// - `DecodeError::Codec` if the payload range is invalid or the engine
    ///   refuses the release.
    pub fn get_frame(&mut self) -> DecodeResult<Frame> {
        let Some(event) = self.command_queue.dequeue() else {
            return Ok(Frame::empty());
        };
        let slot = event.slot;
        let info = self
            .registry
            .take(slot)
            .ok_or(DecodeError::MissingOutput(slot))?;

        // Copy out first, release regardless, then report a bad range.
        let payload = copy_output(self.codec.output_buffers(), slot, &info);
        self.codec.release_output_buffer(slot)?;
        let payload = payload?;

        let frame = Frame {
            payload,
            buffer_index: Some(slot),
            pts: info.pts,
            flags: info.flags,
            track_id: self.config.track_id,
        };
        self.stats.frames_retrieved += 1;

        debug!(
            %slot,
            size = frame.len(),
            pts = %frame.pts,
            remaining = self.command_queue.len(),
            "Frame pulled"
        );

        if frame.is_end_of_stream() && self.state == PluginState::Draining {
            self.state = PluginState::Drained;
            info!(
                retrieved = self.stats.frames_retrieved,
                "End of stream pulled, decoder drained"
            );
        }

        Ok(frame)
    }

    /// Run one poll cycle: dequeue at most one ready output slot.
    ///
    /// Returns the slot that was recorded, or `None` when nothing was ready,
    /// the registry is full, or the decoder is stopped.
    pub fn fill_command_queues(&mut self) -> Option<SlotIndex> {
        if self.state == PluginState::Stopped {
            return None;
        }
        if self.registry.is_full() {
            self.stats.polls_deferred += 1;
            debug!(
                held = self.registry.len(),
                "Output backlog full, leaving ready slots with the codec"
            );
            return None;
        }

        let (slot, info) = self
            .codec
            .dequeue_output_buffer(self.config.output_timeout)?;

        self.registry.insert(slot, info);
        self.command_queue.enqueue(ReadinessEvent::new(slot));

        debug!(
            %slot,
            size = info.size,
            pts = %info.pts,
            pending = self.command_queue.len(),
            "Output slot ready"
        );
        Some(slot)
    }

    /// Acquire a free input slot without submitting anything.
    ///
    /// The returned frame carries the slot in `buffer_index` and reserves
    /// the slot's capacity; fill its payload and hand it to
    /// [`push`](Self::push). Returns `None` when no slot is free or the
    /// decoder no longer accepts input.
    pub fn find_free_frame(&mut self) -> Option<Frame> {
        if !self.state.accepts_input() {
            return None;
        }

        let slot = self.acquire_input()?;
        let capacity = self
            .codec
            .input_buffers()
            .get(slot.get())
            .map_or(0, SlotBuffer::capacity);

        Some(Frame {
            payload: Vec::with_capacity(capacity),
            buffer_index: Some(slot),
            ..Frame::default()
        })
    }

    /// Release every held output slot back to the codec and forget all
    /// pending readiness events. Returns the number of slots released.
    ///
    /// Every slot is attempted; the first engine error is returned.
    pub fn release_all_outputs(&mut self) -> DecodeResult<usize> {
        self.command_queue.clear();
        let slots = self.registry.drain_slots();

        let mut first_err: Option<CodecError> = None;
        for &slot in &slots {
            if let Err(e) = self.codec.release_output_buffer(slot) {
                warn!(%slot, error = %e, "Failed to release output slot");
                first_err.get_or_insert(e);
            }
        }

        if !slots.is_empty() {
            debug!(count = slots.len(), "Released held output slots");
        }

        match first_err {
            Some(e) => Err(e.into()),
            None => Ok(slots.len()),
        }
    }

    /// Release all held outputs and enter the terminal `Stopped` state.
    pub fn stop(&mut self) -> DecodeResult<()> {
        if self.state == PluginState::Stopped {
            return Ok(());
        }
        let released = self.release_all_outputs();
        self.spare_input = None;
        self.state = PluginState::Stopped;
        info!(
            submitted = self.stats.frames_submitted,
            retrieved = self.stats.frames_retrieved,
            "Decoder stopped"
        );
        released.map(|_| ())
    }

    /// Reuse the spare input slot, or ask the codec for a free one.
    fn acquire_input(&mut self) -> Option<SlotIndex> {
        self.spare_input
            .take()
            .or_else(|| self.codec.dequeue_input_buffer(self.config.input_timeout))
    }

    /// Copy `frame` into input slot `slot` and queue it.
    fn submit_input(&mut self, slot: SlotIndex, frame: &Frame) -> DecodeResult<()> {
        let buffer = input_slot_mut(self.codec.input_buffers(), slot)?;
        if frame.len() > buffer.capacity() {
            return Err(DecodeError::PayloadTooLarge {
                slot,
                size: frame.len(),
                capacity: buffer.capacity(),
            });
        }
        buffer.write(frame.payload())?;

        self.codec
            .queue_input_buffer(slot, 0, frame.len(), frame.pts, frame.flags)?;
        Ok(())
    }

    fn ensure_accepts_input(&self, operation: &'static str) -> DecodeResult<()> {
        if self.state.accepts_input() {
            Ok(())
        } else {
            Err(DecodeError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }
}

impl<C: MediaCodec> Drop for Decoder<C> {
    fn drop(&mut self) {
        if self.registry.is_empty() {
            return;
        }
        warn!(
            count = self.registry.len(),
            "Dropping decoder with output slots never pulled, releasing them"
        );
        let _ = self.release_all_outputs();
    }
}

fn input_slot_mut(
    buffers: &mut [SlotBuffer],
    slot: SlotIndex,
) -> Result<&mut SlotBuffer, CodecError> {
    buffers
        .get_mut(slot.get())
        .ok_or(CodecError::InvalidSlot(slot))
}

fn copy_output(
    buffers: &[SlotBuffer],
    slot: SlotIndex,
    info: &BufferInfo,
) -> Result<Vec<u8>, CodecError> {
    let buffer = buffers.get(slot.get()).ok_or(CodecError::InvalidSlot(slot))?;
    info.range()
        .and_then(|range| buffer.as_slice().get(range))
        .map(<[u8]>::to_vec)
        .ok_or(CodecError::SlotOverflow {
            size: info.offset.saturating_add(info.size),
            capacity: buffer.len(),
        })
}
