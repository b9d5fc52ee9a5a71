//! Streaming synthesis configuration

use serde::{Deserialize, Serialize};
use speechflow_core::ConnectOptions;
use std::time::Duration;

use crate::constants::{audio, pacing, sentence, tags};

/// Stream adapter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamAdapterConfig {
    /// Sentence segmentation
    #[serde(default)]
    pub sentence: SentenceTokenizerConfig,

    /// Playback pacing
    #[serde(default)]
    pub pacer: PacerConfig,

    /// Directive timing
    #[serde(default)]
    pub tags: TagTimingConfig,

    /// Capacity of the per-request input channel
    #[serde(default = "default_input_buffer")]
    pub input_buffer: usize,

    /// MIME type announced to the audio emitter
    #[serde(default = "default_mime_type")]
    pub mime_type: String,

    /// Connection options handed to the wrapped backend
    #[serde(default)]
    pub connect: ConnectOptions,
}

fn default_input_buffer() -> usize {
    audio::INPUT_BUFFER
}
fn default_mime_type() -> String {
    audio::MIME_TYPE_PCM.to_string()
}

impl Default for StreamAdapterConfig {
    fn default() -> Self {
        Self {
            sentence: SentenceTokenizerConfig::default(),
            pacer: PacerConfig::default(),
            tags: TagTimingConfig::default(),
            input_buffer: default_input_buffer(),
            mime_type: default_mime_type(),
            connect: ConnectOptions::default(),
        }
    }
}

/// Sentence tokenizer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceTokenizerConfig {
    /// Minimum sentence length in characters
    #[serde(default = "default_min_sentence_len")]
    pub min_sentence_len: usize,

    /// Characters buffered before segmentation is attempted
    #[serde(default = "default_stream_context_len")]
    pub stream_context_len: usize,

    /// Treat line breaks as boundaries and keep whitespace verbatim
    #[serde(default = "default_retain_format")]
    pub retain_format: bool,
}

fn default_min_sentence_len() -> usize {
    sentence::MIN_SENTENCE_LEN
}
fn default_stream_context_len() -> usize {
    sentence::STREAM_CONTEXT_LEN
}
fn default_retain_format() -> bool {
    sentence::RETAIN_FORMAT
}

impl Default for SentenceTokenizerConfig {
    fn default() -> Self {
        Self {
            min_sentence_len: default_min_sentence_len(),
            stream_context_len: default_stream_context_len(),
            retain_format: default_retain_format(),
        }
    }
}

/// Stream pacer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacerConfig {
    /// Pacing on/off (off = pass-through)
    #[serde(default)]
    pub enabled: bool,

    /// Audio allowed ahead of real-time playback (ms)
    #[serde(default = "default_lookahead_ms")]
    pub lookahead_ms: u64,

    /// Longest single wait before re-checking progress (ms)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_lookahead_ms() -> u64 {
    pacing::LOOKAHEAD_MS
}
fn default_poll_interval_ms() -> u64 {
    pacing::POLL_INTERVAL_MS
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            lookahead_ms: default_lookahead_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl PacerConfig {
    pub fn lookahead(&self) -> Duration {
        Duration::from_millis(self.lookahead_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Directive timing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagTimingConfig {
    /// Speaking rate used to place directives between words
    #[serde(default = "default_words_per_sec")]
    pub words_per_sec: f64,

    /// Guard pulled off the elapsed baseline before a token's last directive (ms)
    #[serde(default = "default_last_tag_guard_ms")]
    pub last_tag_guard_ms: u64,

    /// Literal prefix identifying pause directives
    #[serde(default = "default_pause_tag_prefix")]
    pub pause_tag_prefix: String,
}

fn default_words_per_sec() -> f64 {
    tags::WORDS_PER_SEC
}
fn default_last_tag_guard_ms() -> u64 {
    tags::LAST_TAG_GUARD_MS
}
fn default_pause_tag_prefix() -> String {
    tags::PAUSE_TAG_PREFIX.to_string()
}

impl Default for TagTimingConfig {
    fn default() -> Self {
        Self {
            words_per_sec: default_words_per_sec(),
            last_tag_guard_ms: default_last_tag_guard_ms(),
            pause_tag_prefix: default_pause_tag_prefix(),
        }
    }
}

impl TagTimingConfig {
    /// Guard interval in seconds
    pub fn last_tag_guard(&self) -> f64 {
        self.last_tag_guard_ms as f64 / 1000.0
    }
}
