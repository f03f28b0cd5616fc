//! Errors raised while configuring or running the HTTP server.

use std::path::PathBuf;

/// Web server errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server is already listening.
    #[error("server is already running")]
    AlreadyRunning,

    /// The server was not listening.
    #[error("server is not running")]
    NotRunning,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The serving task panicked or was cancelled.
    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Preset file could not be read.
    #[error("failed to read preset file '{path}': {source}")]
    ReadPreset {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Preset file is not valid TOML for the preset schema.
    #[error("invalid preset: {0}")]
    ParsePreset(#[from] toml::de::Error),

    /// A preset entry was rejected by the engine.
    #[error("invalid engine configuration: {0}")]
    Engine(#[from] mock_gcm_core::Error),
}

/// Result type for the web crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let io: Error = std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use").into();
        assert!(io.to_string().contains("IO error"));

        let engine: Error = mock_gcm_core::Error::invalid_status_code(42).into();
        assert!(engine.to_string().contains("42"));

        assert_eq!(Error::NotRunning.to_string(), "server is not running");
    }
}
