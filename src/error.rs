//! Errors surfaced by the marketplace managers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        ServiceError::Forbidden(message.into())
    }

    pub fn conflict<S: Into<String>>(message: S) -> Self {
        ServiceError::Conflict(message.into())
    }
}
