use thiserror::Error;

/// Failures reported by the document and blob stores.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Rejected: {0}")]
    Rejected(String),
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Failures reported by the auth provider. Each carries the provider code
/// used to look up the user-facing message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Auth error (auth/email-already-in-use)")]
    EmailAlreadyInUse,
    #[error("Auth error (auth/user-not-found)")]
    UserNotFound,
    #[error("Auth error (auth/wrong-password)")]
    WrongPassword,
    #[error("Auth error (auth/invalid-email)")]
    InvalidEmail,
    #[error("Auth error (auth/weak-password)")]
    WeakPassword,
    #[error("Auth provider unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::EmailAlreadyInUse => "auth/email-already-in-use",
            AuthError::UserNotFound => "auth/user-not-found",
            AuthError::WrongPassword => "auth/wrong-password",
            AuthError::InvalidEmail => "auth/invalid-email",
            AuthError::WeakPassword => "auth/weak-password",
            AuthError::Unavailable(_) => "auth/network-request-failed",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    AuthRequired,
    #[error("Bad Request: {0}")]
    Validation(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

pub type BackendResult<T> = Result<T, BackendError>;
