//! Audio frame types
//!
//! Frames carry interleaved 16-bit little-endian PCM, which is what the
//! audio emitter forwards downstream as raw bytes.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bytes per PCM sample (16-bit)
pub const BYTES_PER_SAMPLE: usize = 2;

/// A chunk of interleaved PCM audio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFrame {
    /// Raw little-endian i16 samples
    pub data: Vec<u8>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub num_channels: u16,
    /// Samples per channel contained in `data`
    pub samples_per_channel: u32,
}

impl AudioFrame {
    /// Create a frame from raw PCM bytes
    pub fn new(
        data: Vec<u8>,
        sample_rate: u32,
        num_channels: u16,
        samples_per_channel: u32,
    ) -> Self {
        Self {
            data,
            sample_rate,
            num_channels,
            samples_per_channel,
        }
    }

    /// Create a frame from interleaved i16 samples
    pub fn from_samples(samples: &[i16], sample_rate: u32, num_channels: u16) -> Self {
        let channels = num_channels.max(1);
        let data = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self {
            data,
            sample_rate,
            num_channels: channels,
            samples_per_channel: (samples.len() / channels as usize) as u32,
        }
    }

    /// Create a silent frame of the given length
    pub fn silence(duration: Duration, sample_rate: u32, num_channels: u16) -> Self {
        let channels = num_channels.max(1);
        let samples_per_channel = (duration.as_secs_f64() * sample_rate as f64).round() as u32;
        let len = samples_per_channel as usize * channels as usize * BYTES_PER_SAMPLE;
        Self {
            data: vec![0u8; len],
            sample_rate,
            num_channels: channels,
            samples_per_channel,
        }
    }

    /// Playback length in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples_per_channel as f64 / self.sample_rate as f64
    }

    /// Raw PCM bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// One unit of output from a TTS backend
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    /// Backend request id
    pub request_id: String,
    /// The audio
    pub frame: AudioFrame,
    /// Last frame for this synthesis call?
    pub is_final: bool,
}

impl SynthesizedAudio {
    pub fn new(request_id: impl Into<String>, frame: AudioFrame, is_final: bool) -> Self {
        Self {
            request_id: request_id.into(),
            frame,
            is_final,
        }
    }
}
