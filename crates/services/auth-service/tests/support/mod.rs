//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Duration;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use auth_service_lib::infra::{Migrator, Persistence};
use auth_service_lib::service::{
    CallContext, JwtTokenService, RequestId, TokenService, UserManager, UserServiceOptions,
};
use domain::{DomainResult, Email, Name, Password, PasswordHasher, User};

pub const SECRET: &[u8] = b"integration-test-secret-0123456789abcdef";

/// Fresh in-memory SQLite database with all migrations applied.
///
/// In-memory SQLite is per connection, so the pool holds exactly one.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("failed to open sqlite");
    Migrator::up(&db, None).await.expect("failed to migrate");
    db
}

/// Hasher that tags the plaintext instead of hashing it. Argon2 is too slow
/// for most tests.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, plaintext: &[u8]) -> DomainResult<Vec<u8>> {
        Ok([b"plain:".as_slice(), plaintext].concat())
    }

    fn verify(&self, hash: &[u8], plaintext: &[u8]) -> DomainResult<bool> {
        Ok(hash == [b"plain:".as_slice(), plaintext].concat().as_slice())
    }
}

pub fn token_service() -> Arc<dyn TokenService> {
    Arc::new(JwtTokenService::new(SECRET, Duration::hours(1)))
}

pub fn user_manager(
    db: &DatabaseConnection,
    hasher: Arc<dyn PasswordHasher>,
    options: UserServiceOptions,
) -> UserManager<Persistence> {
    UserManager::new(
        Arc::new(Persistence::new(db.clone())),
        hasher,
        token_service(),
        options,
    )
}

pub fn fast_manager(db: &DatabaseConnection) -> UserManager<Persistence> {
    user_manager(db, Arc::new(PlainHasher), UserServiceOptions::default())
}

pub fn anonymous() -> CallContext {
    CallContext::anonymous(RequestId::new())
}

pub fn as_user(user_id: uuid::Uuid) -> CallContext {
    CallContext::authenticated(RequestId::new(), user_id)
}

pub fn new_user(name: &str, email: &str) -> User {
    User::create(
        Name::new(name).unwrap(),
        Email::new(email).unwrap(),
        Password::from_hash(format!("plain:{}-password", name)).unwrap(),
    )
}
