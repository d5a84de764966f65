/// Errors returned by ledger operations
///
/// Each variant maps onto one HTTP status at the API boundary; see the
/// API crate's `ApiError`.

use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::authorization::AuthzError;
use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The addressed record does not exist
    #[error("{0}")]
    NotFound(String),

    /// The Access Guard refused the caller
    #[error(transparent)]
    Forbidden(AuthzError),

    /// Credentials were wrong
    #[error("{0}")]
    Unauthenticated(String),

    /// A uniqueness rule would be broken
    #[error("{0}")]
    Conflict(String),

    /// Input failed a single-field rule
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Input failed derive-based validation
    #[error("Validation failed: {0}")]
    InvalidFields(#[from] ValidationErrors),

    #[error(transparent)]
    Storage(StoreError),

    /// Hashing or token signing failed
    #[error("{0}")]
    Internal(String),
}

/// Result alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        LedgerError::NotFound(format!("{} {} not found", entity, id))
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<AuthzError> for LedgerError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Store(store) => LedgerError::Storage(store),
            denied => LedgerError::Forbidden(denied),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(constraint) => {
                LedgerError::Conflict(format!("Duplicate record ({})", constraint))
            }
            other => LedgerError::Storage(other),
        }
    }
}

impl From<PasswordError> for LedgerError {
    fn from(err: PasswordError) -> Self {
        LedgerError::Internal(err.to_string())
    }
}

impl From<JwtError> for LedgerError {
    fn from(err: JwtError) -> Self {
        LedgerError::Internal(err.to_string())
    }
}
