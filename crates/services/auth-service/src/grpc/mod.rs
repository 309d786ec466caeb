//! gRPC layer - handlers and the middleware stack in front of them.

pub mod middleware;
mod user_grpc;

pub use user_grpc::UserGrpcService;
