//! Error types for opendata-glance.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for opendata-glance operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpenDataError {
    /// Credential errors (unreadable or malformed token file).
    #[error("Auth error: {0}")]
    Auth(String),

    /// Failures reported by the remote query engine, passed through verbatim.
    #[error("{message}")]
    Engine {
        /// HTTP status, if the engine answered at all.
        status: Option<u16>,
        /// The engine's own diagnostic message.
        message: String,
        /// Per-error reason tags (e.g. "invalidQuery", "accessDenied").
        reasons: Vec<String>,
    },

    /// Raw cells that could not be decoded into their declared type.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Configuration errors (invalid config file, bad CLI input, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OpenDataError {
    /// Creates an auth error with the given message.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Creates an engine error without status or reasons (transport failures).
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine {
            status: None,
            message: msg.into(),
            reasons: Vec::new(),
        }
    }

    /// Creates an engine error carrying the engine's status and reason tags.
    pub fn engine_with_status(
        status: u16,
        msg: impl Into<String>,
        reasons: Vec<String>,
    ) -> Self {
        Self::Engine {
            status: Some(status),
            message: msg.into(),
            reasons,
        }
    }

    /// Creates a decode error with the given message.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the message text without the category prefix.
    ///
    /// For engine failures this is exactly what the engine reported.
    pub fn message(&self) -> &str {
        match self {
            Self::Engine { message, .. } => message,
            Self::Auth(msg)
            | Self::Decode(msg)
            | Self::Config(msg)
            | Self::Internal(msg) => msg,
        }
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Auth(_) => "Auth Error",
            Self::Engine { .. } => "Engine Error",
            Self::Decode(_) => "Decode Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using OpenDataError.
pub type Result<T> = std::result::Result<T, OpenDataError>;
