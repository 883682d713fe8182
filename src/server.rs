//! HTTP server initialization and runtime setup.
//!
//! Handles store selection, service wiring, and Axum server lifecycle.

use crate::application::services::{LinkService, RateLimiter};
use crate::config::{Config, mask_connection_string};
use crate::domain::repositories::{MappingRepository, QuotaRepository};
use crate::infrastructure::store::{InMemoryStore, RedisStore};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

/// Builds the application state on top of the configured store.
///
/// With a Redis URL the store must be reachable at startup; without one an
/// [`InMemoryStore`] is used and quotas are local to this process.
///
/// # Errors
///
/// Returns an error if Redis is configured but cannot be reached.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let (quotas, mappings) = if let Some(redis_url) = &config.redis_url {
        let store = RedisStore::connect(redis_url, config.store_timeout())
            .await
            .with_context(|| format!("Failed to connect to {}", mask_connection_string(redis_url)))?;
        tracing::info!("Store: Redis");
        shared(Arc::new(store))
    } else {
        tracing::warn!(
            "REDIS_URL not set, using in-memory store; quotas are not shared between instances"
        );
        shared(Arc::new(InMemoryStore::new()))
    };

    let rate_limiter = Arc::new(RateLimiter::new(quotas, config.quota_policy()));
    let link_service = Arc::new(LinkService::new(
        mappings,
        rate_limiter,
        config.link_settings(),
    ));

    Ok(AppState::new(link_service, config.behind_proxy))
}

/// Hands out one store under both trait objects.
fn shared<S>(store: Arc<S>) -> (Arc<dyn QuotaRepository>, Arc<dyn MappingRepository>)
where
    S: QuotaRepository + MappingRepository + 'static,
{
    (store.clone(), store)
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Redis store (or in-memory fallback)
/// - Rate limiter and link service
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Redis is configured but unreachable
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let state = build_state(&config).await?;

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
