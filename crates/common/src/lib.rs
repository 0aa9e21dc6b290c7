//! `cs-common` — Shared types, traits, and errors for the codec scheduling core.
//!
//! This crate is the foundation the scheduler crates depend on.
//! It defines the core abstractions:
//!
//! - **Types**: `SlotIndex`, `TrackId`, `Timestamp` (newtypes for safety)
//! - **Buffers**: `SlotBuffer`, `BufferInfo`, `BufferFlags` (slot storage and metadata)
//! - **Codec Traits**: `MediaCodec` (the index-based codec engine capability)
//! - **Frames**: `Frame` (payload plus buffer metadata, sentinel included)
//! - **State**: `PluginState` (scheduler lifecycle)
//! - **Errors**: `DecodeError`, `CodecError` (thiserror-based)
//! - **Config**: `DecoderConfig`

pub mod buffer;
pub mod codec;
pub mod codec_traits;
pub mod config;
pub mod error;
pub mod frame;
pub mod state;
pub mod types;

// Re-export commonly used items at crate root
pub use buffer::{BufferFlags, BufferInfo, SlotBuffer};
pub use codec::VideoCodec;
pub use codec_traits::MediaCodec;
pub use config::DecoderConfig;
pub use error::{CodecError, DecodeError, DecodeResult};
pub use frame::Frame;
pub use state::PluginState;
pub use types::{SlotIndex, Timestamp, TrackId};
