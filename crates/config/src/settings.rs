//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{ConfigError, StreamAdapterConfig};

/// Environment variable prefix (`SPEECHFLOW__STREAM_ADAPTER__PACER__ENABLED=true`)
pub const ENV_PREFIX: &str = "SPEECHFLOW";

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Streaming synthesis configuration
    #[serde(default)]
    pub stream_adapter: StreamAdapterConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        let adapter = &self.stream_adapter;

        if !(adapter.tags.words_per_sec.is_finite() && adapter.tags.words_per_sec > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "stream_adapter.tags.words_per_sec".to_string(),
                message: "Speaking rate must be a positive number".to_string(),
            });
        }

        if adapter.tags.pause_tag_prefix.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "stream_adapter.tags.pause_tag_prefix".to_string(),
                message: "Pause prefix cannot be empty".to_string(),
            });
        }

        if adapter.input_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                field: "stream_adapter.input_buffer".to_string(),
                message: "Input buffer must hold at least one message".to_string(),
            });
        }

        if adapter.pacer.enabled {
            if adapter.pacer.lookahead_ms == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "stream_adapter.pacer.lookahead_ms".to_string(),
                    message: "Lookahead must be greater than zero when pacing is enabled"
                        .to_string(),
                });
            }
            if adapter.pacer.poll_interval_ms == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "stream_adapter.pacer.poll_interval_ms".to_string(),
                    message: "Poll interval must be greater than zero when pacing is enabled"
                        .to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Load settings from `config/` relative to the working directory
///
/// Priority (highest to lowest):
/// 1. Environment variables (SPEECHFLOW prefix, `__` separator)
/// 2. config/{env}.{yaml,toml,json} (if env specified)
/// 3. config/default.{yaml,toml,json}
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from("config", env)
}

/// Load settings from an explicit config directory
pub fn load_settings_from(
    dir: impl AsRef<Path>,
    env: Option<&str>,
) -> Result<Settings, ConfigError> {
    let dir = dir.as_ref();
    let mut builder = Config::builder();

    builder = builder.add_source(File::from(dir.join("default")).required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::from(dir.join(env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    tracing::debug!(
        dir = %dir.display(),
        env = env.unwrap_or("default"),
        pacing = settings.stream_adapter.pacer.enabled,
        "Loaded settings"
    );

    Ok(settings)
}
