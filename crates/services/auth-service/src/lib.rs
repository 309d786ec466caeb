//! Auth Service Library
//!
//! User registration, profile management and bearer-token login over gRPC,
//! backed by a SeaORM database.

pub mod config;
pub mod grpc;
pub mod infra;
pub mod repository;
pub mod service;

use std::net::SocketAddr;
use std::sync::Arc;

use tonic::transport::Server;
use tower::ServiceBuilder;
use tracing::info;

use common::DatabaseConfig;
use domain::Argon2Hasher;

use crate::config::AuthServiceConfig;
use crate::grpc::middleware::{AuthGateLayer, RequestIdLayer};
use crate::grpc::UserGrpcService;
use crate::infra::{Database, Persistence};
use crate::service::{JwtTokenService, TokenService, UserManager, UserServiceOptions};

/// Run migrations (for CLI commands).
pub async fn run_migrations(
    config: &DatabaseConfig,
    action: MigrateAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect_without_migrations(config).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    db.close().await?;
    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Build the dependency graph and serve until SIGINT/SIGTERM.
pub async fn run_server_with_config(
    config: AuthServiceConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect(&config.database).await?;

    let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::from_config(&config.jwt));
    let uow = Arc::new(Persistence::new(db.get_connection()));
    let user_service = Arc::new(UserManager::new(
        uow,
        Arc::new(Argon2Hasher::new()),
        tokens.clone(),
        UserServiceOptions {
            allow_blank_password: config.allow_blank_password,
        },
    ));
    let grpc_service = UserGrpcService::new(user_service);

    let middleware = ServiceBuilder::new()
        .layer(RequestIdLayer::new())
        .layer(AuthGateLayer::new(tokens));

    let addr: SocketAddr = format!("{}:{}", config.service.host, config.service.port).parse()?;
    info!(
        service = %config.service.service_name,
        token_ttl_hours = config.jwt.expiration_hours,
        "Auth service listening on {}",
        addr
    );

    Server::builder()
        .timeout(config.service.request_timeout())
        .layer(middleware)
        .add_service(proto::UserServiceServer::new(grpc_service))
        .serve_with_shutdown(addr, shutdown_signal())
        .await?;

    db.close().await?;
    info!("Auth service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
