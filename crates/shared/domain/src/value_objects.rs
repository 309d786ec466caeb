//! Self-validating value objects of the user aggregate.
//!
//! Both types can only be obtained through their validating constructor, so a
//! `Name` or `Email` in hand is always well-formed.

use std::fmt;

use validator::ValidateEmail;

use crate::constants::{MAX_EMAIL_LENGTH, MAX_NAME_LENGTH};
use crate::error::{DomainError, DomainResult};

/// Display name of a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name(String);

impl Name {
    /// Validate and wrap a display name. Surrounding whitespace is dropped.
    pub fn new(value: &str) -> DomainResult<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        if value.chars().count() > MAX_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "name must be at most {} characters",
                MAX_NAME_LENGTH
            )));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Email address, the login key of an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Validate and wrap an email address. Surrounding whitespace is dropped.
    pub fn new(value: &str) -> DomainResult<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(DomainError::validation("email is required"));
        }
        if value.len() > MAX_EMAIL_LENGTH {
            return Err(DomainError::validation(format!(
                "email must be at most {} characters",
                MAX_EMAIL_LENGTH
            )));
        }
        if !value.validate_email() {
            return Err(DomainError::validation("email is not valid"));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
