//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::{AccountStatus, DomainError, Email, Name, Password, User, UserSnapshot};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    /// Unique among active rows only (partial index)
    pub email: String,
    /// PHC-formatted hash
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub version: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Rebuild the aggregate from a row, re-running every domain check.
impl TryFrom<Model> for User {
    type Error = DomainError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        User::try_from(UserSnapshot {
            id: model.id,
            name: Name::new(&model.name)?,
            email: Email::new(&model.email)?,
            password: Password::from_hash(model.password_hash.into_bytes())?,
            status: AccountStatus::from_active_flag(model.is_active),
            created_at: model.created_at,
            updated_at: model.updated_at,
            version: model.version,
        })
    }
}
