//! Tower middleware wrapped around the gRPC server, outermost first:
//! request correlation, then the bearer token gate.

mod auth;
mod request_id;

pub use auth::{AuthGate, AuthGateLayer, PUBLIC_METHODS};
pub use request_id::{RequestIdLayer, RequestIdService, REQUEST_ID_HEADER};
