//! Bearer token gate.

use std::sync::Arc;
use std::task::{Context, Poll};

use http::{header::AUTHORIZATION, HeaderMap, Request, Response};
use tonic::body::BoxBody;
use tonic::codegen::BoxFuture;
use tonic::Status;
use tower::{Layer, Service};
use tracing::warn;

use common::{AppError, AppResult};
use domain::BEARER_TOKEN_PREFIX;

use crate::service::{AuthenticatedUser, TokenService};

/// Methods callable without a token.
pub const PUBLIC_METHODS: [&str; 2] = [
    "/auth.UserService/CreateUser",
    "/auth.UserService/Login",
];

/// Rejects calls to non-public methods that lack a valid bearer token.
///
/// On success the token's subject is attached to the request extensions as
/// `AuthenticatedUser`; the handler never runs for a rejected call.
#[derive(Clone)]
pub struct AuthGateLayer {
    tokens: Arc<dyn TokenService>,
}

impl AuthGateLayer {
    pub fn new(tokens: Arc<dyn TokenService>) -> Self {
        Self { tokens }
    }
}

impl<S> Layer<S> for AuthGateLayer {
    type Service = AuthGate<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthGate {
            inner,
            tokens: self.tokens.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthGate<S> {
    inner: S,
    tokens: Arc<dyn TokenService>,
}

impl<S, ReqBody> Service<Request<ReqBody>> for AuthGate<S>
where
    S: Service<Request<ReqBody>, Response = Response<BoxBody>>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response<BoxBody>;
    type Error = S::Error;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        if PUBLIC_METHODS.contains(&req.uri().path()) {
            return Box::pin(self.inner.call(req));
        }

        match authenticate(self.tokens.as_ref(), req.headers()) {
            Ok(user) => {
                req.extensions_mut().insert(user);
                Box::pin(self.inner.call(req))
            }
            Err(err) => {
                warn!(method = %req.uri().path(), error = %err, "Access denied");
                let response = Status::from(err).into_http();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}

fn authenticate(tokens: &dyn TokenService, headers: &HeaderMap) -> AppResult<AuthenticatedUser> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_TOKEN_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthenticated)?;

    let claims = tokens.validate_token(token)?;
    Ok(AuthenticatedUser {
        user_id: claims.user_id(),
    })
}
