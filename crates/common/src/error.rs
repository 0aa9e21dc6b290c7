//! Central error types (thiserror-based).
//!
//! "Nothing available right now" is never an error here: an empty input
//! pool, an output slot that is not ready yet, or an empty command queue are
//! reported through `Option`s, outcome enums and the sentinel frame.

use thiserror::Error;

use crate::state::PluginState;
use crate::types::SlotIndex;

/// Failures reported by a codec engine through the `MediaCodec` capability.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Slot {0} does not exist")]
    InvalidSlot(SlotIndex),

    #[error("Payload of {size} bytes exceeds slot capacity of {capacity} bytes")]
    SlotOverflow { size: usize, capacity: usize },

    #[error("Slot {0} is not held by the caller")]
    SlotNotOwned(SlotIndex),

    #[error("Codec engine failure: {0}")]
    Engine(String),
}

/// Scheduler errors.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The operation is not legal in the decoder's current state.
    ///
    /// This is a programming error in the caller and is never retried.
    #[error("Cannot {operation} while decoder is {state}")]
    InvalidState {
        operation: &'static str,
        state: PluginState,
    },

    #[error("Frame of {size} bytes does not fit input slot {slot} ({capacity} bytes)")]
    PayloadTooLarge {
        slot: SlotIndex,
        size: usize,
        capacity: usize,
    },

    #[error("Output slot {0} was signalled ready but has no registered payload")]
    MissingOutput(SlotIndex),

    #[error("Invalid decoder config: {0}")]
    InvalidConfig(String),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl DecodeError {
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }
}

/// Convenience Result type for scheduler operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_display() {
        let err = DecodeError::InvalidState {
            operation: "push",
            state: PluginState::Draining,
        };
        assert_eq!(err.to_string(), "Cannot push while decoder is Draining");
        assert!(err.is_invalid_state());
    }

    #[test]
    fn payload_too_large_display() {
        let err = DecodeError::PayloadTooLarge {
            slot: SlotIndex(3),
            size: 4096,
            capacity: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("4096"));
        assert!(msg.contains("#3"));
        assert!(msg.contains("1024"));
        assert!(!err.is_invalid_state());
    }

    #[test]
    fn decode_error_from_codec() {
        let err = DecodeError::from(CodecError::InvalidSlot(SlotIndex(9)));
        assert!(matches!(err, DecodeError::Codec(CodecError::InvalidSlot(SlotIndex(9)))));
        assert!(err.to_string().contains("#9"));
    }

    #[test]
    fn codec_error_engine_message() {
        let err = CodecError::Engine("device lost".to_string());
        assert!(err.to_string().contains("device lost"));
    }
}
