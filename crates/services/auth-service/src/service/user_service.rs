//! User service - registration, profile management and login.
//!
//! Every use case except login runs inside one unit of work. Password hashing
//! is CPU bound and runs on the blocking pool, before any transaction opens.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{Email, Name, Password, PasswordHasher, User};

use super::context::CallContext;
use super::token_service::TokenService;
use crate::infra::UnitOfWork;

/// Well-formed Argon2id hash that matches no password. Verified against when
/// the login email is unknown so both paths cost the same.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Requested profile changes. Absent or empty fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Behaviour switches for `UserManager`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserServiceOptions {
    /// Accept a blank password on registration or password change, logging a
    /// warning. When false, either call fails with a validation error instead.
    pub allow_blank_password: bool,
}

impl Default for UserServiceOptions {
    fn default() -> Self {
        Self {
            allow_blank_password: true,
        }
    }
}

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Register a new active account and return its id
    async fn create_user(
        &self,
        ctx: &CallContext,
        name: String,
        email: String,
        password: String,
    ) -> AppResult<Uuid>;

    /// Get a user by id, active or deleted
    async fn get_user(&self, ctx: &CallContext, id: Uuid) -> AppResult<User>;

    /// List every user, active or deleted
    async fn list_users(&self, ctx: &CallContext) -> AppResult<Vec<User>>;

    /// Update the caller's own profile
    async fn update_user(&self, ctx: &CallContext, id: Uuid, changes: UserChanges)
        -> AppResult<()>;

    /// Soft delete the caller's own account
    async fn delete_user(&self, ctx: &CallContext, id: Uuid) -> AppResult<()>;

    /// Check credentials and issue a bearer token
    async fn login(&self, ctx: &CallContext, email: String, password: String)
        -> AppResult<String>;
}

/// Concrete implementation of UserService.
pub struct UserManager<U> {
    uow: Arc<U>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    options: UserServiceOptions,
}

impl<U: UnitOfWork> UserManager<U> {
    pub fn new(
        uow: Arc<U>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
        options: UserServiceOptions,
    ) -> Self {
        Self {
            uow,
            hasher,
            tokens,
            options,
        }
    }

    async fn hash_password(&self, plaintext: String) -> AppResult<Password> {
        let hasher = self.hasher.clone();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(plaintext.as_bytes()))
            .await
            .map_err(|e| AppError::internal(format!("password hashing task failed: {}", e)))??;

        Ok(Password::from_hash(hash)?)
    }

    async fn verify_password(&self, hash: Vec<u8>, plaintext: String) -> AppResult<bool> {
        let hasher = self.hasher.clone();
        let matches =
            tokio::task::spawn_blocking(move || hasher.verify(&hash, plaintext.as_bytes()))
                .await
                .map_err(|e| {
                    AppError::internal(format!("password verification task failed: {}", e))
                })??;

        Ok(matches)
    }

    /// Whitespace-only passwords follow `allow_blank_password` on both
    /// registration and update.
    fn check_blank_password(&self, ctx: &CallContext, password: &str) -> AppResult<()> {
        if !password.trim().is_empty() {
            return Ok(());
        }
        if !self.options.allow_blank_password {
            return Err(AppError::validation("password is required"));
        }
        warn!(request_id = %ctx.request_id(), "Accepting a blank password");
        Ok(())
    }

    /// Ownership rule for mutations: callers may only change their own account.
    fn ensure_owner(ctx: &CallContext, id: Uuid) -> AppResult<()> {
        let caller = ctx.authenticated_user_id()?;
        if caller != id {
            warn!(
                request_id = %ctx.request_id(),
                caller = %caller,
                target = %id,
                "Caller does not own the target account"
            );
            return Err(AppError::Forbidden);
        }
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn create_user(
        &self,
        ctx: &CallContext,
        name: String,
        email: String,
        password: String,
    ) -> AppResult<Uuid> {
        info!(request_id = %ctx.request_id(), "Creating user");

        let name = Name::new(&name)?;
        let email = Email::new(&email)?;
        self.check_blank_password(ctx, &password)?;

        // Checked before hashing; the transactional check and the unique
        // index still settle races
        if self.uow.reader().exists_by_email(&email).await? {
            return Err(AppError::EmailAlreadyExists);
        }

        let password = self.hash_password(password).await?;
        let mut user = User::create(name, email, password);
        let id = user.id();

        self.uow
            .execute(move |repo| {
                Box::pin(async move {
                    if repo.exists_by_email(user.email()).await? {
                        return Err(AppError::EmailAlreadyExists);
                    }
                    repo.save(&mut user).await
                })
            })
            .await?;

        info!(request_id = %ctx.request_id(), user_id = %id, "User created");
        Ok(id)
    }

    async fn get_user(&self, ctx: &CallContext, id: Uuid) -> AppResult<User> {
        info!(request_id = %ctx.request_id(), user_id = %id, "Getting user");

        self.uow
            .execute(move |repo| Box::pin(async move { repo.get(id).await }))
            .await
    }

    async fn list_users(&self, ctx: &CallContext) -> AppResult<Vec<User>> {
        let users = self
            .uow
            .execute(|repo| Box::pin(async move { repo.get_all().await }))
            .await?;

        info!(request_id = %ctx.request_id(), count = users.len(), "Listed users");
        Ok(users)
    }

    async fn update_user(
        &self,
        ctx: &CallContext,
        id: Uuid,
        changes: UserChanges,
    ) -> AppResult<()> {
        Self::ensure_owner(ctx, id)?;
        info!(request_id = %ctx.request_id(), user_id = %id, "Updating user");

        let name = non_empty(changes.name);
        let email = non_empty(changes.email);
        let password = match non_empty(changes.password) {
            Some(plaintext) => {
                self.check_blank_password(ctx, &plaintext)?;
                Some(self.hash_password(plaintext).await?)
            }
            None => None,
        };

        self.uow
            .execute(move |repo| {
                Box::pin(async move {
                    let mut user = repo.get(id).await?;
                    if !user.is_active() {
                        return Err(AppError::InactiveUser);
                    }

                    if let Some(name) = name {
                        user.update_name(Name::new(&name)?)?;
                    }
                    if let Some(email) = email {
                        let email = Email::new(&email)?;
                        if &email != user.email() {
                            if repo.exists_by_email(&email).await? {
                                return Err(AppError::EmailAlreadyExists);
                            }
                            user.update_email(email)?;
                        }
                    }
                    if let Some(password) = password {
                        user.update_password(password)?;
                    }

                    repo.save(&mut user).await
                })
            })
            .await?;

        info!(request_id = %ctx.request_id(), user_id = %id, "User updated");
        Ok(())
    }

    async fn delete_user(&self, ctx: &CallContext, id: Uuid) -> AppResult<()> {
        Self::ensure_owner(ctx, id)?;

        self.uow
            .execute(move |repo| {
                Box::pin(async move {
                    let mut user = repo.get(id).await?;
                    user.delete()?;
                    repo.save(&mut user).await
                })
            })
            .await?;

        info!(request_id = %ctx.request_id(), user_id = %id, "User deleted");
        Ok(())
    }

    async fn login(&self, ctx: &CallContext, email: String, password: String) -> AppResult<String> {
        let candidate = match Email::new(&email) {
            Ok(email) => match self.uow.reader().get_by_email(&email).await {
                Ok(user) if user.is_active() => Some(user),
                Ok(_) | Err(AppError::NotFound) => None,
                Err(e) => return Err(e),
            },
            Err(_) => None,
        };

        let Some(user) = candidate else {
            let _ = self
                .verify_password(DUMMY_PASSWORD_HASH.as_bytes().to_vec(), password)
                .await;
            warn!(request_id = %ctx.request_id(), "Login failed");
            return Err(AppError::InvalidCredentials);
        };

        if !self
            .verify_password(user.password().hash().to_vec(), password)
            .await?
        {
            warn!(request_id = %ctx.request_id(), "Login failed");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.tokens.generate_token(user.id())?;
        info!(request_id = %ctx.request_id(), user_id = %user.id(), "User logged in");
        Ok(token)
    }
}
