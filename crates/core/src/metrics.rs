//! Synthesis metrics and the observer they are reported to

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metrics for one call into a TTS backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsMetrics {
    /// Backend label (e.g. "silence", "piper")
    pub label: String,
    pub request_id: String,
    /// Audio segment the synthesized audio was pushed into
    pub segment_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Time to first audio frame, seconds
    pub ttfb: f64,
    /// Wall time of the whole call, seconds
    pub duration: f64,
    /// Audio produced, seconds
    pub audio_duration: f64,
    pub cancelled: bool,
    pub characters_count: usize,
    pub streamed: bool,
}

impl TtsMetrics {
    /// Real-time factor (wall time per second of audio)
    pub fn real_time_factor(&self) -> f64 {
        if self.audio_duration > 0.0 {
            self.duration / self.audio_duration
        } else {
            0.0
        }
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Receives metrics as synthesis progresses
///
/// Owned by the stream adapter; replaces event-bus style forwarding.
pub trait MetricsObserver: Send + Sync {
    fn on_tts_metrics(&self, metrics: &TtsMetrics);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TtsMetrics {
        TtsMetrics {
            label: "silence".to_string(),
            request_id: "REQ_1".to_string(),
            segment_id: Some("SEG_1".to_string()),
            timestamp: Utc::now(),
            ttfb: 0.05,
            duration: 0.5,
            audio_duration: 2.0,
            cancelled: false,
            characters_count: 12,
            streamed: false,
        }
    }

    #[test]
    fn test_real_time_factor() {
        assert!((sample().real_time_factor() - 0.25).abs() < 1e-9);

        let mut empty = sample();
        empty.audio_duration = 0.0;
        assert_eq!(empty.real_time_factor(), 0.0);
    }

    #[test]
    fn test_json_contains_segment() {
        let json = sample().to_json().unwrap();
        assert!(json.contains("\"segment_id\":\"SEG_1\""));
    }
}
