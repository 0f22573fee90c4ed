use std::net::SocketAddr;
use std::sync::Arc;

use rbac_service::{
    build_router, config::RbacConfig, db, repository::PgPermissionGraph, AppState,
};
use service_core::cache::RedisCache;
use service_core::grpc::GrpcServerBuilder;
use service_core::observability::{init_metrics, init_tracing};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    let config = RbacConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )?;
    init_metrics()?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting RBAC service"
    );

    let pool = db::create_pool(&config.database)
        .await
        .map_err(|e| service_core::error::AppError::DatabaseError(e.into()))?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| service_core::error::AppError::DatabaseError(e.into()))?;

    let cache = RedisCache::connect(&config.redis.url).await?;
    tracing::info!(
        ttl_seconds = config.enriched_role_ttl_seconds,
        "Role cache connected"
    );

    let (_health_handle, health_reporter) = GrpcServerBuilder::new(config.service_name.clone())
        .spawn_health_server(config.grpc_health_port)
        .await;
    health_reporter.set_serving().await;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    let state = AppState::new(
        config,
        Arc::new(cache),
        Arc::new(PgPermissionGraph::new(pool)),
    );
    let app = build_router(state);

    tracing::info!(address = %addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    health_reporter.set_not_serving().await;
    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
