//! Configuration for streaming speech synthesis
//!
//! Layered loading (defaults, files, environment) through the `config`
//! crate, plus the tuning constants every component defaults to.

pub mod constants;
pub mod pipeline;
pub mod settings;

pub use pipeline::{PacerConfig, SentenceTokenizerConfig, StreamAdapterConfig, TagTimingConfig};
pub use settings::{load_settings, load_settings_from, Settings, ENV_PREFIX};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

impl From<ConfigError> for speechflow_core::Error {
    fn from(err: ConfigError) -> Self {
        speechflow_core::Error::Config(err.to_string())
    }
}
