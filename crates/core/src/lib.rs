//! Core types for streaming speech synthesis
//!
//! Shared by every crate in the workspace:
//! - Audio frames and synthesized audio
//! - Timed transcript fragments
//! - Capability traits for TTS backends, audio emitters and tag resolvers
//! - Metrics and the observer they are reported to
//! - Error types

pub mod audio;
pub mod error;
pub mod id;
pub mod metrics;
pub mod traits;
pub mod transcript;

pub use audio::{AudioFrame, SynthesizedAudio, BYTES_PER_SAMPLE};
pub use error::{Error, PipelineError, Result};
pub use id::short_id;
pub use metrics::{MetricsObserver, TtsMetrics};
pub use traits::{
    AudioEmitter, AudioStream, ConnectOptions, EmitterOptions, FnTagResolver, NoopTagResolver,
    TagResolver, TtsBackend, TtsCapabilities,
};
pub use transcript::TimedString;
