//! gRPC protocol buffer definitions.
//!
//! Generated from `proto/auth.proto`: the `auth.UserService` with user
//! registration, lookup, update, soft delete and login.

/// Auth package definitions.
pub mod auth {
    tonic::include_proto!("auth");
}

// Re-export commonly used items
pub use auth::user_service_client::UserServiceClient;
pub use auth::user_service_server::{UserService, UserServiceServer};
