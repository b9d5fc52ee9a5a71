//! Text-to-speech backend capability

use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;

use crate::{Result, SynthesizedAudio};

/// Audio output of a single synthesis call
pub type AudioStream = Pin<Box<dyn Stream<Item = Result<SynthesizedAudio>> + Send>>;

/// Connection policy handed to a backend
///
/// Retries and timeouts are the backend's responsibility; callers only
/// describe the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOptions {
    /// Retry attempts after the first failure
    #[serde(default = "default_max_retry")]
    pub max_retry: u32,
    /// Delay between attempts (ms)
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    /// Per-attempt timeout (ms)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_max_retry() -> u32 {
    3
}
fn default_retry_interval_ms() -> u64 {
    2000
}
fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            max_retry: default_max_retry(),
            retry_interval_ms: default_retry_interval_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ConnectOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Same options with the retry budget set to zero
    pub fn without_retries(self) -> Self {
        Self {
            max_retry: 0,
            ..self
        }
    }
}

/// What a TTS implementation can do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TtsCapabilities {
    /// Accepts incremental text input
    pub streaming: bool,
    /// Produces a transcript aligned to the audio
    pub aligned_transcript: bool,
}

/// TTS backend trait
#[async_trait::async_trait]
pub trait TtsBackend: Send + Sync {
    /// Synthesize text in one shot; audio arrives as a stream of frames
    async fn synthesize(&self, text: &str, conn_options: &ConnectOptions) -> Result<AudioStream>;

    /// Get sample rate
    fn sample_rate(&self) -> u32;

    /// Get channel count
    fn num_channels(&self) -> u16;

    fn capabilities(&self) -> TtsCapabilities {
        TtsCapabilities::default()
    }

    /// Label used in metrics
    fn label(&self) -> &str {
        "tts"
    }

    /// Warm up connections or models ahead of the first request
    fn prewarm(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_options_default() {
        let options = ConnectOptions::default();
        assert_eq!(options.max_retry, 3);
        assert_eq!(options.timeout(), Duration::from_secs(10));
        assert_eq!(options.retry_interval_ms, 2000);
    }

    #[test]
    fn test_without_retries_keeps_timeout() {
        let options = ConnectOptions {
            max_retry: 5,
            retry_interval_ms: 10,
            timeout_ms: 1234,
        }
        .without_retries();
        assert_eq!(options.max_retry, 0);
        assert_eq!(options.timeout_ms, 1234);
    }

    #[test]
    fn test_connect_options_serde_defaults() {
        let options: ConnectOptions = serde_json::from_str(r#"{"timeout_ms": 500}"#).unwrap();
        assert_eq!(options.max_retry, 3);
        assert_eq!(options.timeout_ms, 500);
    }
}
