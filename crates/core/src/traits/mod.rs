//! Capability traits implemented outside the synthesis pipeline

mod emitter;
mod resolver;
mod tts;

pub use emitter::{AudioEmitter, EmitterOptions};
pub use resolver::{FnTagResolver, NoopTagResolver, TagResolver};
pub use tts::{AudioStream, ConnectOptions, TtsBackend, TtsCapabilities};
