//! In-memory loopback codec engine (software fallback).
//!
//! [`LoopbackCodec`] implements the [`MediaCodec`] capability entirely on the
//! CPU. It performs **no** bitstream decoding: every submitted input is
//! copied byte-for-byte into an output slot. What it does model faithfully is
//! the handshake a hardware engine imposes:
//!
//! - fixed pools of input and output slots addressed by index,
//! - exclusive ownership of a slot between acquire and submit / dequeue and
//!   release,
//! - decode latency: an output only becomes dequeuable after `latency`
//!   further inputs have been submitted (or end of stream flushes it),
//! - back-pressure: when every output slot is held, submitted payloads wait
//!   in a staging queue until a slot is released.
//!
//! # When to use this
//!
//! - Driving the scheduler end-to-end without a hardware engine (tests, CI)
//! - As a reference implementation of the capability contract when writing a
//!   new engine binding
//!
//! None of the timeouts are honored: the engine is synchronous, so an
//! answer is always available immediately.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::debug;

use cs_common::{
    BufferFlags, BufferInfo, CodecError, MediaCodec, SlotBuffer, SlotIndex, Timestamp,
};

/// A submitted input waiting for a free output slot.
#[derive(Debug)]
struct Staged {
    payload: Vec<u8>,
    pts: Timestamp,
    flags: BufferFlags,
}

/// Counters exposed for tests and logging.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoopbackStats {
    /// Inputs accepted by `queue_input_buffer`.
    pub inputs_queued: u64,
    /// Outputs handed out by `dequeue_output_buffer`.
    pub outputs_dequeued: u64,
    /// Outputs handed back by `release_output_buffer`.
    pub outputs_released: u64,
}

/// CPU codec engine that loops input payloads back as outputs.
pub struct LoopbackCodec {
    input_slots: Vec<SlotBuffer>,
    output_slots: Vec<SlotBuffer>,
    free_inputs: VecDeque<SlotIndex>,
    free_outputs: VecDeque<SlotIndex>,
    /// Output slots currently dequeued by the caller.
    output_held: Vec<bool>,
    /// Submitted inputs that have no output slot yet.
    staged: VecDeque<Staged>,
    /// Filled output slots still "being decoded".
    in_flight: VecDeque<(SlotIndex, BufferInfo)>,
    /// Filled output slots ready to be dequeued.
    ready: VecDeque<(SlotIndex, BufferInfo)>,
    latency: usize,
    /// Set once end of stream is submitted; flushes `in_flight`.
    flushing: bool,
    stats: LoopbackStats,
}

impl std::fmt::Debug for LoopbackCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackCodec")
            .field("input_slots", &self.input_slots.len())
            .field("output_slots", &self.output_slots.len())
            .field("free_inputs", &self.free_inputs.len())
            .field("free_outputs", &self.free_outputs.len())
            .field("staged", &self.staged.len())
            .field("in_flight", &self.in_flight.len())
            .field("ready", &self.ready.len())
            .field("latency", &self.latency)
            .finish()
    }
}

impl LoopbackCodec {
    /// Create an engine with `inputs` input slots and `outputs` output slots,
    /// each holding up to `slot_capacity` bytes, with zero latency.
    ///
    /// # Panics
    ///
    /// Panics if either pool size is zero.
    pub fn new(inputs: usize, outputs: usize, slot_capacity: usize) -> Self {
        assert!(inputs > 0, "inputs must be > 0");
        assert!(outputs > 0, "outputs must be > 0");
        Self {
            input_slots: vec![SlotBuffer::with_capacity(slot_capacity); inputs],
            output_slots: vec![SlotBuffer::with_capacity(slot_capacity); outputs],
            free_inputs: (0..inputs).map(SlotIndex).collect(),
            free_outputs: (0..outputs).map(SlotIndex).collect(),
            output_held: vec![false; outputs],
            staged: VecDeque::new(),
            in_flight: VecDeque::new(),
            ready: VecDeque::new(),
            latency: 0,
            flushing: false,
            stats: LoopbackStats::default(),
        }
    }

    /// Hold each output back until `latency` further inputs are submitted.
    pub fn with_latency(mut self, latency: usize) -> Self {
        self.latency = latency;
        self
    }

    pub fn stats(&self) -> LoopbackStats {
        self.stats.clone()
    }

    /// Outputs that can be dequeued right now.
    pub fn ready_count(&self) -> usize {
        self.ready.len()
    }

    /// Submitted inputs not yet dequeuable (staged or in flight).
    pub fn pending_count(&self) -> usize {
        self.staged.len() + self.in_flight.len()
    }

    pub fn free_input_count(&self) -> usize {
        self.free_inputs.len()
    }

    pub fn free_output_count(&self) -> usize {
        self.free_outputs.len()
    }

    /// Move staged payloads into free output slots, then surface outputs
    /// whose latency has elapsed.
    fn advance(&mut self) {
        while !self.staged.is_empty() {
            let Some(slot) = self.free_outputs.pop_front() else {
                break;
            };
            let Some(staged) = self.staged.pop_front() else {
                break;
            };

            let buffer = &mut self.output_slots[slot.get()];
            // Output and input slots share one capacity, so this cannot overflow.
            if buffer.write(&staged.payload).is_err() {
                buffer.clear();
            }
            if staged.flags.is_end_of_stream() {
                self.flushing = true;
            }
            let info = BufferInfo::new(0, buffer.len(), staged.pts, staged.flags);
            self.in_flight.push_back((slot, info));
        }

        while self.in_flight.len() > self.latency || (self.flushing && !self.in_flight.is_empty())
        {
            if let Some(done) = self.in_flight.pop_front() {
                self.ready.push_back(done);
            }
        }
    }
}

impl MediaCodec for LoopbackCodec {
    fn dequeue_input_buffer(&mut self, _timeout: Duration) -> Option<SlotIndex> {
        self.free_inputs.pop_front()
    }

    fn input_buffers(&mut self) -> &mut [SlotBuffer] {
        &mut self.input_slots
    }

    fn queue_input_buffer(
        &mut self,
        index: SlotIndex,
        offset: usize,
        size: usize,
        pts: Timestamp,
        flags: BufferFlags,
    ) -> Result<(), CodecError> {
        let buffer = self
            .input_slots
            .get_mut(index.get())
            .ok_or(CodecError::InvalidSlot(index))?;

        let payload = buffer
            .as_slice()
            .get(offset..offset + size)
            .ok_or(CodecError::SlotOverflow {
                size: offset + size,
                capacity: buffer.len(),
            })?
            .to_vec();
        buffer.clear();

        // Slots submitted without being acquired first are still in the
        // free list; only acquired ones go back.
        if !self.free_inputs.contains(&index) {
            self.free_inputs.push_back(index);
        }

        self.stats.inputs_queued += 1;
        debug!(slot = %index, size, pts = %pts, flags = flags.bits(), "Loopback input queued");

        self.staged.push_back(Staged {
            payload,
            pts,
            flags,
        });
        self.advance();
        Ok(())
    }

    fn dequeue_output_buffer(&mut self, _timeout: Duration) -> Option<(SlotIndex, BufferInfo)> {
        let (slot, info) = self.ready.pop_front()?;
        self.output_held[slot.get()] = true;
        self.stats.outputs_dequeued += 1;
        Some((slot, info))
    }

    fn output_buffers(&self) -> &[SlotBuffer] {
        &self.output_slots
    }

    fn release_output_buffer(&mut self, index: SlotIndex) -> Result<(), CodecError> {
        let held = self
            .output_held
            .get_mut(index.get())
            .ok_or(CodecError::InvalidSlot(index))?;
        if !*held {
            return Err(CodecError::SlotNotOwned(index));
        }
        *held = false;

        self.output_slots[index.get()].clear();
        self.free_outputs.push_back(index);
        self.stats.outputs_released += 1;
        self.advance();
        Ok(())
    }

    fn name(&self) -> &str {
        "loopback"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_WAIT: Duration = Duration::ZERO;

    /// Acquire, fill and submit one input; returns the input slot used.
    fn submit(codec: &mut LoopbackCodec, bytes: &[u8], pts: i64) -> SlotIndex {
        let slot = codec.dequeue_input_buffer(NO_WAIT).unwrap();
        codec.input_buffers()[slot.get()].write(bytes).unwrap();
        codec
            .queue_input_buffer(slot, 0, bytes.len(), Timestamp(pts), BufferFlags::empty())
            .unwrap();
        slot
    }

    #[test]
    #[should_panic(expected = "inputs must be > 0")]
    fn zero_inputs_panics() {
        let _ = LoopbackCodec::new(0, 1, 16);
    }

    #[test]
    fn input_slots_cycle() {
        let mut codec = LoopbackCodec::new(2, 4, 16);
        assert_eq!(codec.dequeue_input_buffer(NO_WAIT), Some(SlotIndex(0)));
        assert_eq!(codec.dequeue_input_buffer(NO_WAIT), Some(SlotIndex(1)));
        assert_eq!(codec.dequeue_input_buffer(NO_WAIT), None);
        assert_eq!(codec.input_buffers().len(), 2);
    }

    #[test]
    fn zero_latency_loops_back_immediately() {
        let mut codec = LoopbackCodec::new(2, 2, 16);
        submit(&mut codec, &[1, 2, 3], 100);

        let (slot, info) = codec.dequeue_output_buffer(NO_WAIT).unwrap();
        assert_eq!(info.size, 3);
        assert_eq!(info.pts, Timestamp(100));
        let range = info.range().unwrap();
        assert_eq!(&codec.output_buffers()[slot.get()].as_slice()[range], &[1, 2, 3]);
        assert!(codec.dequeue_output_buffer(NO_WAIT).is_none());
    }

    #[test]
    fn latency_holds_outputs_back() {
        let mut codec = LoopbackCodec::new(4, 4, 16).with_latency(2);
        submit(&mut codec, &[1], 1);
        submit(&mut codec, &[2], 2);
        assert!(codec.dequeue_output_buffer(NO_WAIT).is_none());
        assert_eq!(codec.pending_count(), 2);

        submit(&mut codec, &[3], 3);
        let (_, info) = codec.dequeue_output_buffer(NO_WAIT).unwrap();
        assert_eq!(info.pts, Timestamp(1));
    }

    #[test]
    fn end_of_stream_flushes_in_flight() {
        let mut codec = LoopbackCodec::new(4, 4, 16).with_latency(3);
        submit(&mut codec, &[1], 1);
        submit(&mut codec, &[2], 2);

        let eos = codec.dequeue_input_buffer(NO_WAIT).unwrap();
        codec
            .queue_input_buffer(eos, 0, 0, Timestamp::ZERO, BufferFlags::END_OF_STREAM)
            .unwrap();

        assert_eq!(codec.ready_count(), 3);
        let infos: Vec<BufferInfo> = (0..3)
            .map(|_| codec.dequeue_output_buffer(NO_WAIT).unwrap().1)
            .collect();
        assert!(!infos[0].flags.is_end_of_stream());
        assert!(infos[2].flags.is_end_of_stream());
        assert_eq!(infos[2].size, 0);
    }

    #[test]
    fn held_outputs_apply_backpressure() {
        let mut codec = LoopbackCodec::new(4, 1, 16);
        submit(&mut codec, &[1], 1);
        submit(&mut codec, &[2], 2);

        let (slot, _) = codec.dequeue_output_buffer(NO_WAIT).unwrap();
        // The second payload waits for the only output slot.
        assert!(codec.dequeue_output_buffer(NO_WAIT).is_none());
        assert_eq!(codec.pending_count(), 1);

        codec.release_output_buffer(slot).unwrap();
        let (again, info) = codec.dequeue_output_buffer(NO_WAIT).unwrap();
        assert_eq!(again, slot);
        assert_eq!(codec.output_buffers()[again.get()].as_slice(), &[2]);
        assert_eq!(info.pts, Timestamp(2));
    }

    #[test]
    fn release_requires_ownership() {
        let mut codec = LoopbackCodec::new(1, 1, 16);
        assert_eq!(
            codec.release_output_buffer(SlotIndex(0)),
            Err(CodecError::SlotNotOwned(SlotIndex(0)))
        );
        assert_eq!(
            codec.release_output_buffer(SlotIndex(5)),
            Err(CodecError::InvalidSlot(SlotIndex(5)))
        );
    }

    #[test]
    fn queue_rejects_out_of_range() {
        let mut codec = LoopbackCodec::new(1, 1, 4);
        let err = codec
            .queue_input_buffer(SlotIndex(3), 0, 0, Timestamp::ZERO, BufferFlags::empty())
            .unwrap_err();
        assert_eq!(err, CodecError::InvalidSlot(SlotIndex(3)));

        let slot = codec.dequeue_input_buffer(NO_WAIT).unwrap();
        codec.input_buffers()[slot.get()].write(&[1, 2]).unwrap();
        let err = codec
            .queue_input_buffer(slot, 0, 3, Timestamp::ZERO, BufferFlags::empty())
            .unwrap_err();
        assert!(matches!(err, CodecError::SlotOverflow { size: 3, capacity: 2 }));
    }

    #[test]
    fn stats_track_traffic() {
        let mut codec = LoopbackCodec::new(2, 2, 8);
        submit(&mut codec, &[9], 0);
        let (slot, _) = codec.dequeue_output_buffer(NO_WAIT).unwrap();
        codec.release_output_buffer(slot).unwrap();

        assert_eq!(
            codec.stats(),
            LoopbackStats {
                inputs_queued: 1,
                outputs_dequeued: 1,
                outputs_released: 1,
            }
        );
        assert_eq!(codec.free_input_count(), 2);
        assert_eq!(codec.free_output_count(), 2);
    }
}
