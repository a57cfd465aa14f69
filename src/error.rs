use thiserror::Error;

/// Failures surfaced by the collaborator HTTP services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {0}")]
    Status(reqwest::StatusCode),

    /// The backend answered 200 but reported `success: false`.
    #[error("backend rejected the request: {0}")]
    Backend(String),
}

/// Error taxonomy for the capture/persist/align core.
///
/// Every variant terminates as a user-facing notice. None are retried here;
/// retries, if any, belong to the transport collaborator.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Bad input shape before any network call (empty text, etc).
    #[error("{0}")]
    InvalidInput(String),

    /// File too large or wrong MIME type. Checked before anything is sent.
    #[error("{0}")]
    Validation(String),

    /// Microphone access denied or no input device available.
    #[error("microphone unavailable: {0}")]
    Permission(String),

    /// Alignment requested without saved audio / entered text.
    #[error("{0}")]
    Precondition(String),

    #[error("failed to generate audio: {0}")]
    Synthesis(#[source] ServiceError),

    #[error("failed to persist audio: {0}")]
    Persistence(#[source] ServiceError),

    #[error("failed to get timestamps: {0}")]
    Alignment(#[source] ServiceError),
}
