//! Unified error handling for the gRPC boundary.
//!
//! Every failure of the service is an `AppError`. Each variant belongs to one
//! `ErrorKind`, and `ErrorKind` is the single table that decides the gRPC
//! status code and the stable machine-readable code sent to clients in the
//! `x-error-code` metadata entry.

use domain::DomainError;
use thiserror::Error;
use tonic::{metadata::MetadataValue, Code, Status};

/// Metadata key carrying the stable error code on failed calls.
pub const ERROR_CODE_METADATA_KEY: &str = "x-error-code";

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication & Authorization
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Access denied")]
    Forbidden,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Token expired")]
    TokenExpired,

    // Resource errors
    #[error("Resource not found")]
    NotFound,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("User is not active")]
    InactiveUser,

    #[error("Resource was modified concurrently, retry the operation")]
    ConcurrentModification,

    // Validation
    #[error("{0}")]
    Validation(String),

    // External service errors
    #[cfg(feature = "database")]
    #[error("Storage error")]
    Storage(#[from] sea_orm::DbErr),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

/// Client-visible classification of an `AppError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthenticated,
    Forbidden,
    InvalidCredentials,
    TokenInvalid,
    TokenExpired,
    NotFound,
    EmailAlreadyExists,
    InactiveUser,
    ConcurrentModification,
    Validation,
    StorageFailure,
    Internal,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 12] = [
        ErrorKind::Unauthenticated,
        ErrorKind::Forbidden,
        ErrorKind::InvalidCredentials,
        ErrorKind::TokenInvalid,
        ErrorKind::TokenExpired,
        ErrorKind::NotFound,
        ErrorKind::EmailAlreadyExists,
        ErrorKind::InactiveUser,
        ErrorKind::ConcurrentModification,
        ErrorKind::Validation,
        ErrorKind::StorageFailure,
        ErrorKind::Internal,
    ];

    /// Stable error code for clients
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Unauthenticated => "UNAUTHENTICATED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorKind::TokenInvalid => "TOKEN_INVALID",
            ErrorKind::TokenExpired => "TOKEN_EXPIRED",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            ErrorKind::InactiveUser => "INACTIVE_USER",
            ErrorKind::ConcurrentModification => "CONCURRENT_MODIFICATION",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::StorageFailure => "STORAGE_FAILURE",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    /// gRPC status code
    pub fn grpc_code(self) -> Code {
        match self {
            ErrorKind::Unauthenticated
            | ErrorKind::InvalidCredentials
            | ErrorKind::TokenInvalid
            | ErrorKind::TokenExpired => Code::Unauthenticated,
            ErrorKind::Forbidden => Code::PermissionDenied,
            ErrorKind::NotFound => Code::NotFound,
            ErrorKind::EmailAlreadyExists => Code::AlreadyExists,
            ErrorKind::InactiveUser => Code::FailedPrecondition,
            ErrorKind::ConcurrentModification => Code::Aborted,
            ErrorKind::Validation => Code::InvalidArgument,
            ErrorKind::StorageFailure => Code::Unavailable,
            ErrorKind::Internal => Code::Internal,
        }
    }

    /// Reverse lookup of `code()`
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Read the error kind a server attached to a failed call.
    pub fn from_status(status: &Status) -> Option<Self> {
        status
            .metadata()
            .get(ERROR_CODE_METADATA_KEY)
            .and_then(|value| value.to_str().ok())
            .and_then(Self::from_code)
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Unauthenticated => ErrorKind::Unauthenticated,
            AppError::Forbidden => ErrorKind::Forbidden,
            AppError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AppError::TokenInvalid => ErrorKind::TokenInvalid,
            AppError::TokenExpired => ErrorKind::TokenExpired,
            AppError::NotFound => ErrorKind::NotFound,
            AppError::EmailAlreadyExists => ErrorKind::EmailAlreadyExists,
            AppError::InactiveUser => ErrorKind::InactiveUser,
            AppError::ConcurrentModification => ErrorKind::ConcurrentModification,
            AppError::Validation(_) => ErrorKind::Validation,
            #[cfg(feature = "database")]
            AppError::Storage(_) => ErrorKind::StorageFailure,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Get error code for client
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            // Show full message for client errors
            AppError::Validation(msg) => msg.clone(),

            // Hide details for internal errors
            #[cfg(feature = "database")]
            AppError::Storage(e) => {
                tracing::error!("Storage error: {:?}", e);
                "A storage error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }

            // Use default message for others
            _ => self.to_string(),
        }
    }
}

// =============================================================================
// gRPC Status (Tonic)
// =============================================================================

impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        let kind = err.kind();
        let mut status = Status::new(kind.grpc_code(), err.user_message());
        status.metadata_mut().insert(
            ERROR_CODE_METADATA_KEY,
            MetadataValue::from_static(kind.code()),
        );
        status
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => AppError::Validation(msg),
            DomainError::Password(msg) => AppError::Internal(msg),
            DomainError::InactiveUser => AppError::InactiveUser,
        }
    }
}

#[cfg(feature = "jwt")]
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::TokenInvalid,
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }
}

/// Convenience constructors
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_error_codes_are_unique() {
        let codes: HashSet<_> = ErrorKind::ALL.iter().map(|k| k.code()).collect();
        assert_eq!(codes.len(), ErrorKind::ALL.len());
    }

    #[test]
    fn test_from_code_round_trips_every_kind() {
        for kind in ErrorKind::ALL {
            assert_eq!(ErrorKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(ErrorKind::from_code("NOPE"), None);
    }

    #[test]
    fn test_status_carries_code_and_kind() {
        let status = Status::from(AppError::EmailAlreadyExists);

        assert_eq!(status.code(), Code::AlreadyExists);
        assert_eq!(
            ErrorKind::from_status(&status),
            Some(ErrorKind::EmailAlreadyExists)
        );
    }

    #[test]
    fn test_status_codes_per_kind() {
        let cases = [
            (AppError::validation("bad"), Code::InvalidArgument),
            (AppError::NotFound, Code::NotFound),
            (AppError::Forbidden, Code::PermissionDenied),
            (AppError::InactiveUser, Code::FailedPrecondition),
            (AppError::InvalidCredentials, Code::Unauthenticated),
            (AppError::TokenExpired, Code::Unauthenticated),
            (AppError::ConcurrentModification, Code::Aborted),
            (AppError::internal("boom"), Code::Internal),
        ];

        for (err, code) in cases {
            assert_eq!(Status::from(err).code(), code);
        }
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let status = Status::from(AppError::internal("connection string leaked"));

        assert!(!status.message().contains("connection string"));
        assert_eq!(ErrorKind::from_status(&status), Some(ErrorKind::Internal));
    }

    #[test]
    fn test_validation_message_is_shown() {
        let status = Status::from(AppError::validation("email is not valid"));
        assert_eq!(status.message(), "email is not valid");
    }

    #[test]
    fn test_domain_errors_keep_their_kind() {
        assert!(matches!(
            AppError::from(DomainError::InactiveUser),
            AppError::InactiveUser
        ));
        assert!(matches!(
            AppError::from(DomainError::validation("name is required")),
            AppError::Validation(msg) if msg == "name is required"
        ));
        assert!(matches!(
            AppError::from(DomainError::password("verification failed")),
            AppError::Internal(_)
        ));
    }
}
