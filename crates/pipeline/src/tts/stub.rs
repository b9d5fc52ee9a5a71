//! Silence backend
//!
//! Stands in for a real TTS engine when no model is loaded: every request
//! yields silent 16-bit PCM whose length scales with the input text.

use futures::stream;
use std::time::Duration;

use speechflow_core::{
    short_id, AudioFrame, AudioStream, ConnectOptions, Result, SynthesizedAudio, TtsBackend,
};

/// Stub backend (returns silence)
#[derive(Debug, Clone)]
pub struct SilenceTtsBackend {
    sample_rate: u32,
    num_channels: u16,
    per_char: Duration,
    frame: Duration,
}

impl SilenceTtsBackend {
    pub fn new(sample_rate: u32) -> Self {
        tracing::warn!("Using silence TTS backend - audio output will be silence");
        Self {
            sample_rate,
            num_channels: 1,
            per_char: Duration::from_millis(50),
            frame: Duration::from_millis(100),
        }
    }

    pub fn with_channels(mut self, num_channels: u16) -> Self {
        self.num_channels = num_channels.max(1);
        self
    }

    /// Audio produced per input character and the length of each frame
    pub fn with_timing(mut self, per_char: Duration, frame: Duration) -> Self {
        self.per_char = per_char;
        self.frame = frame;
        self
    }

    fn frames(&self, text: &str) -> Vec<AudioFrame> {
        let total = self.per_char * text.chars().count() as u32;
        let frame = if self.frame.is_zero() { total } else { self.frame };

        let mut frames = Vec::new();
        let mut remaining = total;
        while !remaining.is_zero() {
            let len = remaining.min(frame);
            frames.push(AudioFrame::silence(len, self.sample_rate, self.num_channels));
            remaining -= len;
        }
        frames
    }
}

#[async_trait::async_trait]
impl TtsBackend for SilenceTtsBackend {
    async fn synthesize(&self, text: &str, _conn_options: &ConnectOptions) -> Result<AudioStream> {
        let request_id = short_id("");
        let frames = self.frames(text);
        let last = frames.len().saturating_sub(1);

        let items: Vec<Result<SynthesizedAudio>> = frames
            .into_iter()
            .enumerate()
            .map(|(i, frame)| Ok(SynthesizedAudio::new(request_id.clone(), frame, i == last)))
            .collect();

        Ok(Box::pin(stream::iter(items)))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn num_channels(&self) -> u16 {
        self.num_channels
    }

    fn label(&self) -> &str {
        "silence"
    }
}
