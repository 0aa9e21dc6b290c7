//! Decoder scheduling configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::VideoCodec;
use crate::error::DecodeError;
use crate::types::TrackId;

/// Default wait for a free input slot.
pub const DEFAULT_INPUT_TIMEOUT: Duration = Duration::from_millis(10);

/// Default wait for a ready output slot (non-blocking poll).
pub const DEFAULT_OUTPUT_TIMEOUT: Duration = Duration::ZERO;

/// Default bound on output slots held between detection and `get_frame`.
pub const DEFAULT_MAX_PENDING_OUTPUTS: usize = 8;

/// Decoder scheduling configuration.
///
/// Every codec poll the scheduler performs is bounded by one of the two
/// timeouts; an expired timeout means "nothing available yet".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub codec: VideoCodec,
    /// Wait for a free input slot when the frame does not carry one.
    pub input_timeout: Duration,
    /// Wait for a ready output slot during a poll cycle.
    pub output_timeout: Duration,
    /// Output slots the decoder may hold before it stops polling for more.
    pub max_pending_outputs: usize,
    /// Track stamped on every frame returned by `get_frame`.
    pub track_id: TrackId,
}

impl DecoderConfig {
    pub fn new(codec: VideoCodec) -> Self {
        Self {
            codec,
            ..Self::default()
        }
    }

    pub fn with_max_pending_outputs(mut self, max: usize) -> Self {
        self.max_pending_outputs = max;
        self
    }

    pub fn with_track_id(mut self, track_id: TrackId) -> Self {
        self.track_id = track_id;
        self
    }

    /// Check the config before a decoder is built from it.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidConfig` if `max_pending_outputs` is zero,
    /// which would leave the decoder unable to ever detect an output.
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.max_pending_outputs == 0 {
            return Err(DecodeError::InvalidConfig(
                "max_pending_outputs must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            codec: VideoCodec::default(),
            input_timeout: DEFAULT_INPUT_TIMEOUT,
            output_timeout: DEFAULT_OUTPUT_TIMEOUT,
            max_pending_outputs: DEFAULT_MAX_PENDING_OUTPUTS,
            track_id: TrackId::UNSET,
        }
    }
}
