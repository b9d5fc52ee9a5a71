//! Streaming Text-to-Speech
//!
//! Features:
//! - Stream adapter turning one-shot backends into streaming ones
//! - Directive timing (pauses, side-effect triggers)
//! - Optional playback pacing of the sentence stream
//! - Silence backend for running without a model

mod pacer;
mod stream_adapter;
mod stub;
mod tags;

pub use pacer::{buffered_ahead, SentenceStreamPacer, TokenStream};
pub use stream_adapter::{
    AdapterState, StreamAdapter, StreamInput, StreamInputSender, StreamOptions, SynthesizeStream,
};
pub use stub::SilenceTtsBackend;
pub use tags::{Directive, ResolvedToken, TagTimingEngine};
