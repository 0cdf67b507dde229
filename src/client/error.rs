use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a call made through the API gateway.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not signed in, or the session is no longer valid")]
    Unauthorized,

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("A submission is already in flight")]
    AlreadyInFlight,

    #[error("Could not decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Maps a non-success status and the server's message onto the taxonomy.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST | StatusCode::PAYLOAD_TOO_LARGE => ApiError::Validation(message),
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::FORBIDDEN => ApiError::Forbidden(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::CONFLICT => ApiError::Conflict(message),
            _ => ApiError::Server {
                status: status.as_u16(),
                message,
            },
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict(_))
    }
}
