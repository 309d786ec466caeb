//! Common utilities shared across the workspace.
//!
//! This crate provides:
//! - Unified error handling with a stable error-kind to gRPC status mapping
//! - Configuration structures

pub mod config;
pub mod error;

pub use config::*;
pub use error::{AppError, AppResult, ErrorKind, OptionExt, ERROR_CODE_METADATA_KEY};
