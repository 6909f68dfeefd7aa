//! Error type definitions
//!
//! Defines the error taxonomy shared by the session state, the signer and
//! the transport. Response classification errors keep the full response so
//! callers can inspect status, headers and body before deciding what to do.

use crate::types::IgResponse;
use thiserror::Error;

/// Main error type for the emulation engine
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure (connection, TLS, timeout, body read)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The account was flagged for spammy behaviour
    #[error("Action spam: {}", .0.summary())]
    ActionSpam(Box<IgResponse>),

    /// The endpoint answered with HTTP 404
    #[error("Not found: {}", .0.summary())]
    NotFound(Box<IgResponse>),

    /// A checkpoint challenge must be resolved before continuing
    #[error("Checkpoint required: {}", .0.summary())]
    CheckpointRequired(Box<IgResponse>),

    /// The session is no longer authenticated
    #[error("Login required: {}", .0.summary())]
    LoginRequired(Box<IgResponse>),

    /// The target user is private
    #[error("Private user: {}", .0.summary())]
    PrivateUser(Box<IgResponse>),

    /// The request was blocked by the vendor's abuse systems
    #[error("Sentry block: {}", .0.summary())]
    SentryBlock(Box<IgResponse>),

    /// Any other non-ok response
    #[error("Response error: {}", .0.summary())]
    Response(Box<IgResponse>),

    /// Cookie lookup failed
    #[error("Cookie \"{name}\" not found")]
    CookieNotFound { name: String },

    /// No checkpoint payload has been stored
    #[error("No checkpoint data available")]
    NoCheckpoint,

    /// Neither the cookie jar nor the challenge state carries a user id
    #[error("Could not extract user id from cookies or challenge state")]
    UserIdNotFound,

    /// Hardware descriptor string does not have the expected shape
    #[error("Invalid device descriptor \"{descriptor}\": {reason}")]
    DeviceDescriptor { descriptor: String, reason: String },

    /// Malformed Set-Cookie header
    #[error("Cookie parse error: {0}")]
    CookieParse(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL composition errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse category of an [`Error`], for callers that only need to branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Network,
    ActionSpam,
    NotFound,
    CheckpointRequired,
    LoginRequired,
    PrivateUser,
    SentryBlock,
    Response,
    CookieNotFound,
    NoCheckpoint,
    UserIdNotFound,
    Configuration,
    Decode,
    Internal,
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a cookie-not-found error
    pub fn cookie_not_found(name: impl Into<String>) -> Self {
        Self::CookieNotFound { name: name.into() }
    }

    /// Create a device descriptor error
    pub fn device_descriptor(descriptor: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DeviceDescriptor {
            descriptor: descriptor.into(),
            reason: reason.into(),
        }
    }

    /// Create a cookie parse error
    pub fn cookie_parse(msg: impl Into<String>) -> Self {
        Self::CookieParse(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The response that triggered a classification error, if any
    pub fn response(&self) -> Option<&IgResponse> {
        match self {
            Self::ActionSpam(r)
            | Self::NotFound(r)
            | Self::CheckpointRequired(r)
            | Self::LoginRequired(r)
            | Self::PrivateUser(r)
            | Self::SentryBlock(r)
            | Self::Response(r) => Some(r),
            _ => None,
        }
    }

    /// Category tag of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Network(_) => ErrorCategory::Network,
            Self::ActionSpam(_) => ErrorCategory::ActionSpam,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::CheckpointRequired(_) => ErrorCategory::CheckpointRequired,
            Self::LoginRequired(_) => ErrorCategory::LoginRequired,
            Self::PrivateUser(_) => ErrorCategory::PrivateUser,
            Self::SentryBlock(_) => ErrorCategory::SentryBlock,
            Self::Response(_) => ErrorCategory::Response,
            Self::CookieNotFound { .. } => ErrorCategory::CookieNotFound,
            Self::NoCheckpoint => ErrorCategory::NoCheckpoint,
            Self::UserIdNotFound => ErrorCategory::UserIdNotFound,
            Self::DeviceDescriptor { .. } | Self::Config(_) | Self::Url(_) => {
                ErrorCategory::Configuration
            }
            Self::CookieParse(_) | Self::Json(_) => ErrorCategory::Decode,
            Self::Io(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Whether the failure happened below the HTTP layer
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
