//! Centralized defaults
//!
//! Single source of truth for the default values used by the serde
//! configuration structs.

/// Sentence segmentation
pub mod sentence {
    /// Fragments are merged until a sentence exceeds this many characters
    pub const MIN_SENTENCE_LEN: usize = 20;

    /// Characters buffered before a stream attempts segmentation
    pub const STREAM_CONTEXT_LEN: usize = 10;

    /// Keep line breaks as sentence boundaries
    pub const RETAIN_FORMAT: bool = true;
}

/// Directive timing
pub mod tags {
    /// Assumed speaking rate for trigger time estimation
    pub const WORDS_PER_SEC: f64 = 2.5;

    /// Pulled off the elapsed baseline before the last directive of a token (ms)
    pub const LAST_TAG_GUARD_MS: u64 = 100;

    /// Literal prefix of a pause directive
    pub const PAUSE_TAG_PREFIX: &str = "<trl-break";
}

/// Playback pacing
pub mod pacing {
    /// Maximum audio buffered ahead of real-time playback (ms)
    pub const LOOKAHEAD_MS: u64 = 5000;

    /// Upper bound for a single backpressure wait (ms)
    pub const POLL_INTERVAL_MS: u64 = 100;
}

/// Audio output
pub mod audio {
    pub const MIME_TYPE_PCM: &str = "audio/pcm";

    /// Buffered input items per synthesis request
    pub const INPUT_BUFFER: usize = 64;
}
