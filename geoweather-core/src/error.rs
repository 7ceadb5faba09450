use std::{fmt, time::Duration};

use thiserror::Error;

/// Every failure kind the workflow can end a run with.
///
/// Used as the `kind` field on log records and as the payload of
/// [`WorkflowState::Failed`](crate::workflow::WorkflowState::Failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    LocationDisabled,
    PermissionDenied,
    LocationUnavailable,
    TransportError,
    BadRequest,
    NotFound,
    UpstreamError,
    DeserializationError,
    CacheCorrupt,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::LocationDisabled => "location_disabled",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::LocationUnavailable => "location_unavailable",
            ErrorKind::TransportError => "transport_error",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::NotFound => "not_found",
            ErrorKind::UpstreamError => "upstream_error",
            ErrorKind::DeserializationError => "deserialization_error",
            ErrorKind::CacheCorrupt => "cache_corrupt",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures while obtaining a location fix.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("No location provider is enabled")]
    Disabled,

    #[error("Timed out after {0:?} waiting for a location fix")]
    Timeout(Duration),

    #[error("Location unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

impl LocationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LocationError::Disabled => ErrorKind::LocationDisabled,
            LocationError::Timeout(_)
            | LocationError::Unavailable(_)
            | LocationError::InvalidCoordinate { .. } => ErrorKind::LocationUnavailable,
        }
    }
}

/// Failures of a single weather request. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Weather API rejected the request (400 Bad Request)")]
    BadRequest,

    #[error("Weather API returned 404 Not Found")]
    NotFound,

    #[error("Weather API failed with status {status}")]
    Upstream { status: u16 },

    #[error("Failed to deserialize weather response: {0}")]
    Deserialization(String),
}

impl FetchError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => FetchError::BadRequest,
            404 => FetchError::NotFound,
            status => FetchError::Upstream { status },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Transport(_) => ErrorKind::TransportError,
            FetchError::BadRequest => ErrorKind::BadRequest,
            FetchError::NotFound => ErrorKind::NotFound,
            FetchError::Upstream { .. } => ErrorKind::UpstreamError,
            FetchError::Deserialization(_) => ErrorKind::DeserializationError,
        }
    }
}

// The request URL carries the API key in its query string.
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.without_url().to_string())
    }
}

/// Failures while persisting the cached snapshot.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}
