//! Transaction boundary tests against SQLite.

mod support;

use std::sync::Arc;
use std::time::Duration;

use auth_service_lib::infra::{Persistence, UnitOfWork};
use auth_service_lib::repository::{UserRepository, UserStore};
use common::AppError;
use domain::Name;
use support::{new_user, setup_db};

#[tokio::test]
async fn test_ok_commits() {
    let db = setup_db().await;
    let uow = Persistence::new(db.clone());
    let mut user = new_user("Ann", "ann@x.com");
    let id = user.id();

    uow.execute(move |repo| Box::pin(async move { repo.save(&mut user).await }))
        .await
        .unwrap();

    let stored = UserStore::new(db).get(id).await.unwrap();
    assert_eq!(stored.name().as_str(), "Ann");
}

#[tokio::test]
async fn test_error_after_write_rolls_back() {
    let db = setup_db().await;
    let store = UserStore::new(db.clone());
    let mut user = new_user("Ann", "ann@x.com");
    let id = user.id();
    store.save(&mut user).await.unwrap();
    let uow = Persistence::new(db);

    let result: Result<(), _> = uow
        .execute(move |repo| {
            Box::pin(async move {
                let mut user = repo.get(id).await?;
                user.update_name(Name::new("Changed")?)?;
                repo.save(&mut user).await?;
                repo.save(&mut new_user("Bob", "bob@x.com")).await?;
                Err(AppError::validation("abort after writing"))
            })
        })
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    let stored = store.get(id).await.unwrap();
    assert_eq!(stored.name().as_str(), "Ann");
    assert_eq!(stored.version(), 0);
    assert_eq!(store.get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_nested_execute_is_internal_error() {
    let db = setup_db().await;
    let uow = Arc::new(Persistence::new(db.clone()));
    let inner = uow.clone();
    let mut user = new_user("Ann", "ann@x.com");
    let id = user.id();

    let result = uow
        .execute(move |repo| {
            Box::pin(async move {
                repo.save(&mut user).await?;
                inner
                    .execute(|_| Box::pin(async { Ok(()) }))
                    .await
            })
        })
        .await;

    assert!(matches!(result, Err(AppError::Internal(_))));
    // The outer transaction failed, so its write is gone too
    assert!(matches!(
        UserStore::new(db).get(id).await,
        Err(AppError::NotFound)
    ));
}

#[tokio::test]
async fn test_sequential_executes_are_independent() {
    let db = setup_db().await;
    let uow = Persistence::new(db.clone());
    let mut ann = new_user("Ann", "ann@x.com");
    let mut bob = new_user("Bob", "bob@x.com");

    uow.execute(move |repo| Box::pin(async move { repo.save(&mut ann).await }))
        .await
        .unwrap();
    uow.execute(move |repo| Box::pin(async move { repo.save(&mut bob).await }))
        .await
        .unwrap();

    assert_eq!(UserStore::new(db).get_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_cancelled_work_is_rolled_back() {
    let db = setup_db().await;
    let uow = Persistence::new(db.clone());
    let mut user = new_user("Ann", "ann@x.com");
    let id = user.id();

    let outcome = tokio::time::timeout(
        Duration::from_millis(200),
        uow.execute(move |repo| {
            Box::pin(async move {
                repo.save(&mut user).await?;
                std::future::pending::<()>().await;
                Ok(())
            })
        }),
    )
    .await;

    assert!(outcome.is_err(), "work should have been cancelled");
    assert!(matches!(
        UserStore::new(db).get(id).await,
        Err(AppError::NotFound)
    ));
}

#[tokio::test]
async fn test_reader_sees_committed_data() {
    let db = setup_db().await;
    let uow = Persistence::new(db);
    let mut user = new_user("Ann", "ann@x.com");
    let id = user.id();

    uow.execute(move |repo| Box::pin(async move { repo.save(&mut user).await }))
        .await
        .unwrap();

    assert_eq!(uow.reader().get(id).await.unwrap().id(), id);
}
