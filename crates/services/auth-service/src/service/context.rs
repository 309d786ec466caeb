//! Typed per-call context.
//!
//! The middleware stack stores `RequestId` and `AuthenticatedUser` in the
//! request extensions; handlers lift them into a `CallContext` that is passed
//! explicitly to every use case.

use std::fmt;

use tonic::Request;
use uuid::Uuid;

use common::{AppError, AppResult};

/// Correlation id of one inbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity proven by a valid bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Everything a use case needs to know about the call it serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    request_id: RequestId,
    user: Option<AuthenticatedUser>,
}

impl CallContext {
    /// Context for an unauthenticated call.
    pub fn anonymous(request_id: RequestId) -> Self {
        Self {
            request_id,
            user: None,
        }
    }

    /// Context for a call made on behalf of `user_id`.
    pub fn authenticated(request_id: RequestId, user_id: Uuid) -> Self {
        Self {
            request_id,
            user: Some(AuthenticatedUser { user_id }),
        }
    }

    /// Build from the extensions the middleware stack attached.
    ///
    /// A missing request id (handler invoked without the stack) gets a fresh one.
    pub fn from_request<T>(request: &Request<T>) -> Self {
        let extensions = request.extensions();
        Self {
            request_id: extensions.get::<RequestId>().copied().unwrap_or_default(),
            user: extensions.get::<AuthenticatedUser>().copied(),
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn user(&self) -> Option<AuthenticatedUser> {
        self.user
    }

    /// The caller's user id, failing closed when the call is anonymous.
    pub fn authenticated_user_id(&self) -> AppResult<Uuid> {
        self.user
            .map(|user| user.user_id)
            .ok_or(AppError::Unauthenticated)
    }
}
