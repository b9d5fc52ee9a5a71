//! Timed transcript fragments

use serde::{Deserialize, Serialize};

/// Text anchored to a playback offset (seconds from request start)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedString {
    pub text: String,
    pub start_time: f64,
}

impl TimedString {
    pub fn new(text: impl Into<String>, start_time: f64) -> Self {
        Self {
            text: text.into(),
            start_time,
        }
    }
}
