//! Unit of Work pattern implementation.
//!
//! One `execute` call is one database transaction. The closure gets a
//! repository bound to that transaction; the transaction commits when the
//! closure returns `Ok` and rolls back otherwise. If the calling future is
//! dropped mid-flight (client cancelled, deadline hit) the open transaction is
//! dropped with it and the driver rolls it back.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseBackend, DatabaseConnection, IsolationLevel,
    TransactionTrait,
};
use tracing::{debug, warn};

use crate::repository::{UserRepository, UserStore};
use common::{AppError, AppResult};

tokio::task_local! {
    static IN_UNIT_OF_WORK: ();
}

/// Boxed future returned by unit-of-work closures.
pub type WorkFuture<'a, T> = Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>;

/// Transaction boundary for application use cases.
///
/// Not object safe because of the generic `execute`; services take it as a
/// type parameter instead.
#[async_trait]
pub trait UnitOfWork: Send + Sync + 'static {
    /// Run `f` inside a single transaction.
    ///
    /// Nesting is a usage error and fails with `Internal` without opening a
    /// second transaction.
    async fn execute<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(&'a dyn UserRepository) -> WorkFuture<'a, T> + Send,
        T: Send;

    /// Repository for reads that need no transaction.
    fn reader(&self) -> Arc<dyn UserRepository>;
}

/// SeaORM implementation of `UnitOfWork`.
pub struct Persistence {
    db: DatabaseConnection,
    reader: Arc<UserStore>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection) -> Self {
        let reader = Arc::new(UserStore::new(db.clone()));
        Self { db, reader }
    }

    async fn run_in_transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(&'a dyn UserRepository) -> WorkFuture<'a, T> + Send,
        T: Send,
    {
        // SQLite has no isolation levels to set
        let (isolation, access) = match self.db.get_database_backend() {
            DatabaseBackend::Postgres => (
                Some(IsolationLevel::ReadCommitted),
                Some(AccessMode::ReadWrite),
            ),
            _ => (None, None),
        };
        let txn = self.db.begin_with_config(isolation, access).await?;

        let repo = UserStore::new(txn);
        let outcome = f(&repo).await;
        let txn = repo.into_inner();

        match outcome {
            Ok(value) => {
                txn.commit().await?;
                debug!("Transaction committed");
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(error = %rollback_err, "Transaction rollback failed");
                } else {
                    debug!(error = %e, "Transaction rolled back");
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    async fn execute<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(&'a dyn UserRepository) -> WorkFuture<'a, T> + Send,
        T: Send,
    {
        if IN_UNIT_OF_WORK.try_with(|_| ()).is_ok() {
            return Err(AppError::internal(
                "nested unit of work: execute called inside an open transaction",
            ));
        }

        IN_UNIT_OF_WORK.scope((), self.run_in_transaction(f)).await
    }

    fn reader(&self) -> Arc<dyn UserRepository> {
        self.reader.clone()
    }
}
