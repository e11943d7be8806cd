//! Error types for the gesture light control library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O or thread spawn failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Camera capture operation failed
    #[error("Camera error: {0}")]
    Camera(String),

    /// Microphone read operation failed
    #[error("Audio error: {0}")]
    Audio(String),

    /// Hand landmark model invocation failed
    #[error("Landmark detection error: {0}")]
    Landmark(String),

    /// Clap detection collaborator failed
    #[error("Clap detection error: {0}")]
    ClapDetection(String),

    /// A light rejected or failed to receive a command
    #[error("Actuator error ({label}): {message}")]
    Actuator {
        /// Label of the light that failed
        label: String,
        /// Description of the failure
        message: String,
    },

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The other end of a queue is gone
    #[error("Queue closed: {0}")]
    QueueClosed(String),

    /// The calling stage was asked to stop while waiting
    #[error("Shutdown requested")]
    ShutdownRequested,

    /// A worker thread panicked before it could be joined
    #[error("Worker thread '{0}' panicked")]
    WorkerPanicked(String),
}

impl Error {
    /// Build an actuator error for the given light
    pub fn actuator(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Actuator {
            label: label.into(),
            message: message.into(),
        }
    }
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
