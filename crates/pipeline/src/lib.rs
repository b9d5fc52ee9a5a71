//! Streaming text-to-speech pipeline
//!
//! Turns incrementally arriving text into timed synthesized audio on top of
//! a one-shot TTS backend:
//! - Sentence streaming with optional playback pacing
//! - Inline directive timing (pauses, callback-triggered side effects)
//! - Concurrent input forwarding and synthesis with scoped cleanup

pub mod emitter;
pub mod tts;

pub use emitter::{BufferedAudioEmitter, EmittedSegment};
pub use tts::{
    AdapterState, Directive, ResolvedToken, SentenceStreamPacer, SilenceTtsBackend,
    StreamAdapter, StreamInput, StreamInputSender, StreamOptions, SynthesizeStream,
    TagTimingEngine, TokenStream,
};

pub use speechflow_core::{Error, PipelineError, Result};
