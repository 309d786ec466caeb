//! User repository backed by SeaORM.

use async_trait::async_trait;
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use tracing::warn;
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use common::{AppError, AppResult, OptionExt};
use domain::{Email, User};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Storage contract for the user aggregate.
///
/// Inside a unit of work every call runs in the same transaction.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user or overwrite the mutable state of an existing one.
    ///
    /// Fails with `ConcurrentModification` if the row changed since `user`
    /// was loaded, and with `EmailAlreadyExists` if another active account
    /// holds the email. On success `user` carries the version now stored.
    async fn save(&self, user: &mut User) -> AppResult<()>;

    /// Find a user (active or deleted) by id
    async fn get(&self, id: Uuid) -> AppResult<User>;

    /// Find a user by email, preferring the active account
    async fn get_by_email(&self, email: &Email) -> AppResult<User>;

    /// All users, active and deleted, oldest first
    async fn get_all(&self) -> AppResult<Vec<User>>;

    /// Whether an active account holds this email
    async fn exists_by_email(&self, email: &Email) -> AppResult<bool>;
}

/// SeaORM implementation of `UserRepository`.
///
/// Generic over the connection so the same code serves the pool and an open
/// transaction.
pub struct UserStore<C = DatabaseConnection> {
    conn: C,
}

impl<C: ConnectionTrait> UserStore<C> {
    /// Create new repository instance
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    /// Give back the underlying connection (or transaction).
    pub fn into_inner(self) -> C {
        self.conn
    }

    async fn update_existing(&self, user: &User, password_hash: String) -> AppResult<u64> {
        let changes = ActiveModel {
            id: NotSet,
            name: Set(user.name().as_str().to_string()),
            email: Set(user.email().as_str().to_string()),
            password_hash: Set(password_hash),
            is_active: Set(user.is_active()),
            created_at: NotSet,
            updated_at: Set(user.updated_at()),
            version: Set(user.version() + 1),
        };

        let result = UserEntity::update_many()
            .set(changes)
            .filter(user::Column::Id.eq(user.id()))
            .filter(user::Column::Version.eq(user.version()))
            .exec(&self.conn)
            .await
            .map_err(map_write_error)?;

        Ok(result.rows_affected)
    }

    async fn insert_new(&self, user: &User, password_hash: String) -> AppResult<()> {
        let row = ActiveModel {
            id: Set(user.id()),
            name: Set(user.name().as_str().to_string()),
            email: Set(user.email().as_str().to_string()),
            password_hash: Set(password_hash),
            is_active: Set(user.is_active()),
            created_at: Set(user.created_at()),
            updated_at: Set(user.updated_at()),
            version: Set(user.version()),
        };

        UserEntity::insert(row)
            .exec_without_returning(&self.conn)
            .await
            .map_err(map_write_error)?;
        Ok(())
    }
}

#[async_trait]
impl<C> UserRepository for UserStore<C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn save(&self, user: &mut User) -> AppResult<()> {
        let password_hash = String::from_utf8(user.password().hash().to_vec())
            .map_err(|_| AppError::internal("password hash is not valid UTF-8"))?;

        if self.update_existing(user, password_hash.clone()).await? > 0 {
            user.mark_saved(user.version() + 1);
            return Ok(());
        }

        // Nothing matched at the loaded version: either a new user or a stale copy
        let exists = UserEntity::find_by_id(user.id())
            .one(&self.conn)
            .await?
            .is_some();
        if exists {
            warn!(user_id = %user.id(), version = user.version(), "Stale user save rejected");
            return Err(AppError::ConcurrentModification);
        }

        self.insert_new(user, password_hash).await
    }

    async fn get(&self, id: Uuid) -> AppResult<User> {
        let model = UserEntity::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_not_found()?;

        to_domain(model)
    }

    async fn get_by_email(&self, email: &Email) -> AppResult<User> {
        let model = UserEntity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .order_by_desc(user::Column::IsActive)
            .order_by_desc(user::Column::UpdatedAt)
            .one(&self.conn)
            .await?
            .ok_or_not_found()?;

        to_domain(model)
    }

    async fn get_all(&self) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .all(&self.conn)
            .await?;

        let mut users = Vec::with_capacity(models.len());
        for model in models {
            let id = model.id;
            match User::try_from(model) {
                Ok(user) => users.push(user),
                Err(e) => warn!(user_id = %id, error = %e, "Skipping unreadable user row"),
            }
        }
        Ok(users)
    }

    async fn exists_by_email(&self, email: &Email) -> AppResult<bool> {
        let count = UserEntity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .filter(user::Column::IsActive.eq(true))
            .count(&self.conn)
            .await?;

        Ok(count > 0)
    }
}

/// Rows that no longer satisfy the domain rules are a server fault, not a
/// client one.
fn to_domain(model: user::Model) -> AppResult<User> {
    let id = model.id;
    User::try_from(model)
        .map_err(|e| AppError::internal(format!("user row {} is unreadable: {}", id, e)))
}

fn map_write_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::EmailAlreadyExists,
        _ => AppError::from(err),
    }
}
