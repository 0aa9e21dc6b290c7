//! `cs-decoder` — Slot scheduling between a frame producer and a codec engine.
//!
//! Codec engines (hardware decoders, software codecs) process buffers
//! asynchronously through an index-based handshake. This crate turns that
//! handshake into a synchronous push/pull contract without ever losing or
//! duplicating a slot.
//!
//! # Architecture
//!
//! ```text
//! push(frame) --> acquire input slot --> copy payload --> queue_input_buffer
//!                                                             |
//!                     poll (bounded timeout) <----------------+
//!                            |
//!              ready slot --> BufferRegistry + CommandQueue
//!                                                             |
//! get_frame() <-- release slot <-- copy payload <-- oldest event
//! ```
//!
//! ## Module Overview
//!
//! - [`decoder`] — `Decoder`, the scheduler and its state machine
//! - [`command`] — `CommandQueue` of readiness events (FIFO, detection order)
//! - [`registry`] — `BufferRegistry` of output slots held until pulled
//! - [`shared`] — `SharedDecoder`, a lock-protected handle for two threads
//! - [`software`] — `LoopbackCodec`, an in-memory codec engine
//!
//! ## Usage
//!
//! ```ignore
//! use cs_common::{DecoderConfig, Frame, SlotIndex, Timestamp, VideoCodec};
//! use cs_decoder::{Decoder, LoopbackCodec};
//!
//! let codec = LoopbackCodec::new(4, 4, 1 << 20);
//! let mut decoder = Decoder::new(codec, DecoderConfig::new(VideoCodec::H264))?;
//! decoder.start()?;
//!
//! decoder.push(&Frame::new(access_unit, Timestamp::from_micros(0)))?;
//! let frame = decoder.get_frame()?;
//! if !frame.is_sentinel() {
//!     // frame.payload() now owns the bytes; the codec slot is released.
//! }
//! ```

pub mod command;
pub mod decoder;
pub mod registry;
pub mod shared;
pub mod software;

pub use command::{Command, CommandQueue, ReadinessEvent};
pub use decoder::{Decoder, DecoderStats, PushOutcome};
pub use registry::BufferRegistry;
pub use shared::SharedDecoder;
pub use software::{LoopbackCodec, LoopbackStats};
