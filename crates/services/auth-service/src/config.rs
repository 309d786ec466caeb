//! Auth service configuration.

use std::env;
use std::str::FromStr;

use thiserror::Error;

use common::{DatabaseConfig, JwtConfig, ServiceConfig};
use domain::MIN_JWT_SECRET_LENGTH;

/// Errors raised while loading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("JWT_SECRET must be at least {0} characters")]
    SecretTooShort(usize),
}

/// Auth service configuration.
#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    /// Accept an empty password on registration (logged as a warning)
    pub allow_blank_password: bool,
}

impl AuthServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let service_defaults = ServiceConfig::default();
        let db_defaults = DatabaseConfig::default();

        let service = ServiceConfig {
            service_name: service_defaults.service_name,
            host: lookup("AUTH_SERVICE_HOST").unwrap_or(service_defaults.host),
            port: parse_or(&lookup, "AUTH_SERVICE_PORT", service_defaults.port)?,
            environment: lookup("APP_ENV").unwrap_or(service_defaults.environment),
            request_timeout_secs: parse_or(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                service_defaults.request_timeout_secs,
            )?,
        };

        let database = DatabaseConfig {
            url: lookup("AUTH_SERVICE_DATABASE_URL")
                .or_else(|| lookup("DATABASE_URL"))
                .unwrap_or(db_defaults.url),
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", db_defaults.max_connections)?,
            min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", db_defaults.min_connections)?,
            acquire_timeout_secs: parse_or(
                &lookup,
                "DB_ACQUIRE_TIMEOUT_SECS",
                db_defaults.acquire_timeout_secs,
            )?,
            idle_timeout_secs: parse_or(
                &lookup,
                "DB_IDLE_TIMEOUT_SECS",
                db_defaults.idle_timeout_secs,
            )?,
            max_lifetime_secs: parse_or(
                &lookup,
                "DB_MAX_LIFETIME_SECS",
                db_defaults.max_lifetime_secs,
            )?,
        };
        if service.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "REQUEST_TIMEOUT_SECS",
                value: service.request_timeout_secs.to_string(),
            });
        }
        if database.min_connections > database.max_connections {
            return Err(ConfigError::Invalid {
                key: "DB_MIN_CONNECTIONS",
                value: database.min_connections.to_string(),
            });
        }

        let secret = lookup("JWT_SECRET")
            .or_else(|| lookup("AUTH_SERVICE_JWT_SECRET"))
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::SecretTooShort(MIN_JWT_SECRET_LENGTH));
        }
        let expiration_hours = parse_or(
            &lookup,
            "JWT_EXPIRATION_HOURS",
            JwtConfig::default().expiration_hours,
        )?;
        if expiration_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "JWT_EXPIRATION_HOURS",
                value: expiration_hours.to_string(),
            });
        }

        Ok(Self {
            service,
            database,
            jwt: JwtConfig {
                secret,
                expiration_hours,
            },
            allow_blank_password: parse_or(&lookup, "ALLOW_BLANK_PASSWORD", true)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
