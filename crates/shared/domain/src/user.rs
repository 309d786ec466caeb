//! User aggregate root.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::password::Password;
use crate::value_objects::{Email, Name};

/// Account lifecycle state.
///
/// Deletion is a soft transition: a deleted account stays in storage but can
/// no longer be mutated, and its email may be registered again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountStatus {
    Active,
    Deleted,
}

impl AccountStatus {
    pub fn is_active(self) -> bool {
        matches!(self, AccountStatus::Active)
    }

    /// Map the persisted `is_active` flag to a status.
    pub fn from_active_flag(active: bool) -> Self {
        if active {
            AccountStatus::Active
        } else {
            AccountStatus::Deleted
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "active"),
            AccountStatus::Deleted => write!(f, "deleted"),
        }
    }
}

/// User aggregate.
///
/// Fields are private; every mutation goes through a method that checks the
/// lifecycle state and refreshes `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: Uuid,
    name: Name,
    email: Email,
    password: Password,
    status: AccountStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Optimistic concurrency token, the storage version this aggregate was
    /// loaded at (0 for a brand new user)
    version: i64,
}

/// Raw state used to rebuild a `User` from storage.
#[derive(Debug, Clone)]
pub struct UserSnapshot {
    pub id: Uuid,
    pub name: Name,
    pub email: Email,
    pub password: Password,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl User {
    /// Register a brand new, active user with a fresh id.
    pub fn create(name: Name, email: Email, password: Password) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password,
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password(&self) -> &Password {
        &self.password
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    /// Record the storage version written by a successful save, so the same
    /// instance can keep being mutated and saved.
    pub fn mark_saved(&mut self, version: i64) {
        self.version = version;
    }

    /// Change the display name.
    pub fn update_name(&mut self, name: Name) -> DomainResult<()> {
        self.ensure_active()?;
        self.name = name;
        self.touch();
        Ok(())
    }

    /// Change the login email.
    pub fn update_email(&mut self, email: Email) -> DomainResult<()> {
        self.ensure_active()?;
        self.email = email;
        self.touch();
        Ok(())
    }

    /// Replace the stored password hash.
    pub fn update_password(&mut self, password: Password) -> DomainResult<()> {
        self.ensure_active()?;
        self.password = password;
        self.touch();
        Ok(())
    }

    /// Soft delete: Active -> Deleted.
    pub fn delete(&mut self) -> DomainResult<()> {
        self.ensure_active()?;
        self.status = AccountStatus::Deleted;
        self.touch();
        Ok(())
    }

    fn ensure_active(&self) -> DomainResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(DomainError::InactiveUser)
        }
    }

    // updated_at never goes backwards and never precedes created_at, even
    // if the wall clock does
    fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = now.max(self.updated_at).max(self.created_at);
    }
}

impl TryFrom<UserSnapshot> for User {
    type Error = DomainError;

    fn try_from(snapshot: UserSnapshot) -> DomainResult<Self> {
        if snapshot.updated_at < snapshot.created_at {
            return Err(DomainError::validation(
                "updated_at must not precede created_at",
            ));
        }
        if snapshot.version < 0 {
            return Err(DomainError::validation("version must not be negative"));
        }
        Ok(Self {
            id: snapshot.id,
            name: snapshot.name,
            email: snapshot.email,
            password: snapshot.password,
            status: snapshot.status,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            version: snapshot.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_user() -> User {
        User::create(
            Name::new("Ann").unwrap(),
            Email::new("ann@x.com").unwrap(),
            Password::from_hash("hash-1").unwrap(),
        )
    }

    fn snapshot(created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> UserSnapshot {
        UserSnapshot {
            id: Uuid::new_v4(),
            name: Name::new("Ann").unwrap(),
            email: Email::new("ann@x.com").unwrap(),
            password: Password::from_hash("hash-1").unwrap(),
            status: AccountStatus::Active,
            created_at,
            updated_at,
            version: 3,
        }
    }

    #[test]
    fn test_create_sets_active_and_timestamps() {
        let user = new_user();

        assert!(user.is_active());
        assert_eq!(user.status(), AccountStatus::Active);
        assert_eq!(user.created_at(), user.updated_at());
        assert_eq!(user.version(), 0);
        assert_ne!(user.id(), Uuid::nil());
    }

    #[test]
    fn test_create_assigns_distinct_ids() {
        assert_ne!(new_user().id(), new_user().id());
    }

    #[test]
    fn test_updates_refresh_updated_at_and_keep_id() {
        let mut user = new_user();
        let id = user.id();
        let created_at = user.created_at();

        user.update_name(Name::new("Anna").unwrap()).unwrap();
        user.update_email(Email::new("anna@x.com").unwrap()).unwrap();
        user.update_password(Password::from_hash("hash-2").unwrap())
            .unwrap();

        assert_eq!(user.id(), id);
        assert_eq!(user.created_at(), created_at);
        assert!(user.updated_at() >= created_at);
        assert_eq!(user.name().as_str(), "Anna");
        assert_eq!(user.email().as_str(), "anna@x.com");
        assert_eq!(user.password().hash(), b"hash-2");
    }

    #[test]
    fn test_delete_is_soft_transition() {
        let mut user = new_user();
        user.delete().unwrap();

        assert!(!user.is_active());
        assert_eq!(user.status(), AccountStatus::Deleted);
        assert!(user.updated_at() >= user.created_at());
    }

    #[test]
    fn test_deleted_user_refuses_mutation() {
        let mut user = new_user();
        user.delete().unwrap();

        assert_eq!(user.delete(), Err(DomainError::InactiveUser));
        assert_eq!(
            user.update_name(Name::new("Bob").unwrap()),
            Err(DomainError::InactiveUser)
        );
        assert_eq!(user.name().as_str(), "Ann");
    }

    #[test]
    fn test_touch_never_precedes_created_at() {
        let future = Utc::now() + Duration::hours(1);
        let mut user = User::try_from(snapshot(future, future)).unwrap();

        user.update_name(Name::new("Later").unwrap()).unwrap();

        assert!(user.updated_at() >= user.created_at());
    }

    #[test]
    fn test_reconstitute_rejects_inconsistent_timestamps() {
        let now = Utc::now();
        let result = User::try_from(snapshot(now, now - Duration::seconds(1)));

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_reconstitute_keeps_version_and_status() {
        let now = Utc::now();
        let mut raw = snapshot(now, now);
        raw.status = AccountStatus::from_active_flag(false);
        let user = User::try_from(raw).unwrap();

        assert_eq!(user.version(), 3);
        assert!(!user.is_active());
    }
}
