//! Application startup and lifecycle management.

use crate::config::Config;
use crate::handlers;
use crate::services::{CacheInvalidator, Database, NoopInvalidator, RedisInvalidator};
use axum::{
    routing::{delete, get, post},
    Router,
};
use facturo_core::error::AppError;
use secrecy::ExposeSecret;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub invalidator: Arc<dyn CacheInvalidator>,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let db = Database::new(
            config.database.url.expose_secret(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to PostgreSQL: {}", e);
            AppError::from(e)
        })?;

        db.run_migrations().await.map_err(|e| {
            tracing::error!("Failed to run database migrations: {}", e);
            AppError::from(e)
        })?;

        let invalidator: Arc<dyn CacheInvalidator> = match &config.redis.url {
            Some(url) => {
                let client = redis::Client::open(url.expose_secret().as_str()).map_err(|e| {
                    tracing::error!("Failed to create Redis client: {}", e);
                    AppError::ConfigError(e.into())
                })?;
                tracing::info!("Redis cache invalidation enabled");
                Arc::new(RedisInvalidator::new(client))
            }
            None => {
                tracing::warn!("No Redis configured, cache invalidation signals are dropped");
                Arc::new(NoopInvalidator)
            }
        };

        let state = AppState {
            config: config.clone(),
            db,
            invalidator,
        };

        // Port 0 binds a random port for testing.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("facturo-service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let app = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/metrics", get(handlers::metrics_endpoint))
            .route(
                "/documents/:kind",
                post(handlers::create_document).get(handlers::list_documents),
            )
            .route(
                "/documents/:kind/:id",
                get(handlers::get_document)
                    .put(handlers::update_document)
                    .delete(handlers::delete_document),
            )
            .route("/documents/:kind/:id/status", post(handlers::change_status))
            .route(
                "/invoices/:id/payments",
                post(handlers::apply_payment).get(handlers::list_invoice_payments),
            )
            .route("/payments/:id", delete(handlers::remove_payment))
            .route("/quotes/:id/convert", post(handlers::convert_quote))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state);

        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

/// Resolve on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
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
