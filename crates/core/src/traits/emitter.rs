//! Audio output sink

use std::time::Duration;

use crate::{Result, TimedString};

/// Parameters fixed for the lifetime of one synthesis request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitterOptions {
    pub request_id: String,
    pub sample_rate: u32,
    pub num_channels: u16,
    pub mime_type: String,
    /// Audio arrives incrementally
    pub stream: bool,
}

/// Sink for synthesized audio and timed transcript
///
/// Methods take `&self`; implementations are shared between the
/// synthesis loop and the pacer, which only reads playback progress.
pub trait AudioEmitter: Send + Sync {
    /// Called exactly once per request before anything else
    fn initialize(&self, options: EmitterOptions) -> Result<()>;

    /// Open a new audio segment
    fn start_segment(&self, segment_id: &str) -> Result<()>;

    /// Append raw PCM to the current segment
    fn push(&self, data: &[u8]) -> Result<()>;

    fn push_timed_transcript(&self, transcript: TimedString) -> Result<()>;

    /// Release buffered audio of the current segment downstream
    fn flush(&self) -> Result<()>;

    /// Close the current segment
    fn end_segment(&self) -> Result<()>;

    /// Total audio pushed so far in this request
    fn pushed_duration(&self) -> Duration;

    /// Time since the first audio of this request was pushed
    ///
    /// Playback cannot start before that push. `None` when nothing was
    /// pushed yet or the emitter does not track it.
    fn since_first_push(&self) -> Option<Duration> {
        None
    }
}
