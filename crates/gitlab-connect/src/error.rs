use std::fmt;

use thiserror::Error;

use crate::api::ApiError;

/// Failure kinds surfaced by connection resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidProjectUrl,
    UnknownProject,
    AuthenticationFailure,
    TransportFailure,
    UnexpectedFailure,
    Config,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidProjectUrl => "invalid_project_url",
            Self::UnknownProject => "unknown_project",
            Self::AuthenticationFailure => "authentication_failure",
            Self::TransportFailure => "transport_failure",
            Self::UnexpectedFailure => "unexpected_failure",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid project URL: {0}")]
    InvalidProjectUrl(String),

    /// Authentication succeeded but nothing exists at the resolved path
    #[error("Unknown project: {0}")]
    UnknownProject(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailure(String),

    #[error("Transport error: {0}")]
    TransportFailure(String),

    #[error("Unexpected error: {0}")]
    UnexpectedFailure(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn invalid_url(msg: impl Into<String>) -> Self {
        Self::InvalidProjectUrl(msg.into())
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidProjectUrl(_) => ErrorKind::InvalidProjectUrl,
            Self::UnknownProject(_) => ErrorKind::UnknownProject,
            Self::AuthenticationFailure(_) => ErrorKind::AuthenticationFailure,
            Self::TransportFailure(_) => ErrorKind::TransportFailure,
            Self::UnexpectedFailure(_) => ErrorKind::UnexpectedFailure,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    #[must_use]
    pub const fn is_invalid_url(&self) -> bool {
        matches!(self, Self::InvalidProjectUrl(_))
    }

    #[must_use]
    pub const fn is_unknown_project(&self) -> bool {
        matches!(self, Self::UnknownProject(_))
    }

    #[must_use]
    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::AuthenticationFailure(_))
    }

    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::TransportFailure(_))
    }

    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        matches!(self, Self::UnexpectedFailure(_))
    }

    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized { .. } => Self::AuthenticationFailure(err.to_string()),
            ApiError::Transport(msg) => Self::TransportFailure(msg),
            ApiError::InvalidHost(msg) => Self::InvalidProjectUrl(msg),
            ApiError::Status { .. } | ApiError::Decode(_) => {
                Self::UnexpectedFailure(err.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
