//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! the `User` aggregate, its self-validating value objects and the password
//! hashing service the aggregate relies on.

pub mod constants;
pub mod error;
pub mod password;
pub mod user;
pub mod value_objects;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use password::{Argon2Hasher, Password, PasswordHasher};
pub use user::{AccountStatus, User, UserSnapshot};
pub use value_objects::{Email, Name};
