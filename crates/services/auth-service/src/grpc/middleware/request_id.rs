//! Request correlation middleware.

use std::task::{Context, Poll};

use http::{HeaderValue, Request, Response};
use tonic::codegen::BoxFuture;
use tower::{Layer, Service};
use tracing::{info, info_span, Instrument};

use crate::service::RequestId;

/// Response header echoing the id assigned to the call.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Assigns every inbound call a fresh `RequestId`.
///
/// The id is stored in the request extensions, echoed back in the
/// `x-request-id` response header and recorded on a span that wraps the whole
/// call, so every log line emitted while serving it carries the id.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdLayer;

impl RequestIdLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestIdService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let request_id = RequestId::new();
        req.extensions_mut().insert(request_id);

        let span = info_span!(
            "grpc_call",
            request_id = %request_id,
            method = %req.uri().path()
        );
        let future = {
            let _entered = span.enter();
            info!("New call");
            self.inner.call(req)
        };

        Box::pin(
            async move {
                let mut response = future.await?;
                if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                    response.headers_mut().insert(REQUEST_ID_HEADER, value);
                }
                Ok(response)
            }
            .instrument(span),
        )
    }
}
