//! Error types for streaming synthesis

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    // Pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Pipeline processing errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Wrapped TTS backend failed (after its own retries)
    #[error("TTS error: {0}")]
    Tts(String),

    /// The injected tag resolver failed
    #[error("Tag resolution error: {0}")]
    TagResolution(String),

    /// The audio emitter rejected an operation
    #[error("Audio emitter error: {0}")]
    Emitter(String),

    /// Sentence stream used after it was closed
    #[error("Sentence stream closed")]
    StreamClosed,

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Not initialized")]
    NotInitialized,
}

impl Error {
    /// Create a generic error from a string
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a tag resolution error
    pub fn tag_resolution<S: Into<String>>(msg: S) -> Self {
        Error::Pipeline(PipelineError::TagResolution(msg.into()))
    }

    /// Create a TTS error
    pub fn tts<S: Into<String>>(msg: S) -> Self {
        Error::Pipeline(PipelineError::Tts(msg.into()))
    }

    /// Returns the pipeline error, if this is one
    pub fn as_pipeline(&self) -> Option<&PipelineError> {
        match self {
            Error::Pipeline(err) => Some(err),
            _ => None,
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_conversion() {
        let err: Error = PipelineError::StreamClosed.into();
        assert_eq!(err.as_pipeline(), Some(&PipelineError::StreamClosed));
        assert_eq!(err.to_string(), "Pipeline error: Sentence stream closed");
    }

    #[test]
    fn test_helpers() {
        assert!(matches!(
            Error::tag_resolution("boom"),
            Error::Pipeline(PipelineError::TagResolution(msg)) if msg == "boom"
        ));
        assert!(Error::config("bad").as_pipeline().is_none());
    }
}
