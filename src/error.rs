//! Error types for the render queue

use thiserror::Error;

/// Result type alias for queue and host operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while sequencing renders
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A batch was requested with no scenes in it
    #[error("No scenes selected")]
    EmptySelection,

    /// A batch was submitted while another one is still rendering
    #[error("A render batch is already running")]
    AlreadyRunning,

    /// The host does not know the requested scene
    #[error("Unknown scene: {0}")]
    UnknownScene(String),

    /// A render from an abandoned batch has not finished yet
    #[error("A previous render is still in flight")]
    RenderInFlight,

    /// The shared render-result image does not exist
    #[error("Render result image is missing")]
    RenderResultMissing,

    /// The host refused or failed a command
    #[error("Host error: {0}")]
    Host(String),

    /// No completion signal arrived in time
    #[error("Render of scene '{scene}' stalled after {elapsed_ms}ms")]
    Stalled { scene: String, elapsed_ms: u64 },

    /// The batch was cancelled before it finished
    #[error("Render batch cancelled")]
    Cancelled,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The background sequencer worker went away
    #[error("Worker error: {0}")]
    Worker(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stalled_message_names_scene() {
        let err = Error::Stalled {
            scene: "Shot_010".to_string(),
            elapsed_ms: 1500,
        };
        assert_eq!(err.to_string(), "Render of scene 'Shot_010' stalled after 1500ms");
    }

    #[test]
    fn json_errors_become_config_errors() {
        let err: Error = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, Error::Config(_)));
    }
}
