//! Error type shared by every authentication operation

use thiserror::Error;

/// Failures surfaced by the session manager and its collaborators
#[derive(Error, Debug)]
pub enum AuthError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// Missing, expired or tampered session token
    #[error("Unauthorized")]
    Unauthorized,

    /// Password does not match the stored hash
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No matching account
    #[error("{0}")]
    NotFound(String),

    /// The resource already exists
    #[error("{0}")]
    Conflict(String),

    /// OAuth signup could not create the account
    #[error("problem in account creation")]
    AccountCreation,

    /// The token endpoint answered without an identity token
    #[error("Auth error")]
    MissingIdToken,

    /// The identity provider could not be reached or answered garbage
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Internal(err.to_string())
    }
}

/// Type alias for authentication results
pub type AuthResult<T> = Result<T, AuthError>;
