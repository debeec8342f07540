use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod db;
mod error;
mod models;
mod services;

use config::AppConfig;

/// Named background jobs sharing one cancellation token
struct BackgroundTasks {
    handles: Vec<(&'static str, JoinHandle<()>)>,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    fn new() -> Self {
        Self {
            handles: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    fn token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    fn spawn<F>(&mut self, name: &'static str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        self.handles.push((name, handle));
    }

    async fn shutdown(self) {
        self.shutdown.cancel();

        for (name, handle) in self.handles {
            match tokio::time::timeout(Duration::from_secs(10), handle).await {
                Ok(Ok(())) => tracing::debug!("Task {} stopped", name),
                Ok(Err(e)) => tracing::warn!("Task {} aborted: {}", name, e),
                Err(_) => tracing::warn!("Task {} still running after 10s, abandoning", name),
            }
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM. A handler that cannot be installed never fires.
async fn shutdown_signal() {
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "Ctrl+C",
            Err(e) => {
                tracing::error!("Ctrl+C handler unavailable: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                tracing::error!("SIGTERM handler unavailable: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&str>();

    let received = tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    };
    tracing::info!("Received {}, draining connections", received);
}

pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub config: AppConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tv_catalog=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::load();

    config.paths.ensure_dirs().await?;

    config.log_config();

    let database_url = config.database_url();
    tracing::debug!("Database URL: {}", database_url);

    let connect_options = SqliteConnectOptions::from_str(&database_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                use sqlx::Executor;
                // 16MB page cache per connection (negative = KB)
                conn.execute("PRAGMA cache_size = -16000").await?;
                conn.execute("PRAGMA temp_store = MEMORY").await?;
                Ok(())
            })
        })
        .connect_with(connect_options)
        .await?;

    tracing::info!(
        "SQLite configured: WAL mode, pool of {} connections",
        config.database.max_connections
    );

    db::migrate(&pool).await?;

    let state = std::sync::Arc::new(AppState {
        db: pool.clone(),
        config: config.clone(),
    });

    let mut bg_tasks = BackgroundTasks::new();

    // Populate an empty catalog from the configured seed file
    if let Some(seed_file) = config.seed_file.clone() {
        let seed_pool = pool.clone();
        let cancel = bg_tasks.token();
        bg_tasks.spawn("seed-import", async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Seed import received shutdown signal");
                }
                result = services::import::seed_if_empty(&seed_pool, &seed_file) => {
                    if let Err(e) = result {
                        tracing::error!("Seed import failed: {:#}", e);
                    }
                }
            }
        });
    }

    let app = api::system::routes()
        .merge(api::routes(state.clone()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let ip = config.bind_address.parse::<std::net::IpAddr>().unwrap_or_else(|e| {
        tracing::warn!(
            "Invalid bind address '{}' ({}), falling back to 0.0.0.0",
            config.bind_address,
            e
        );
        std::net::IpAddr::from([0, 0, 0, 0])
    });
    let addr = SocketAddr::new(ip, config.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    bg_tasks.shutdown().await;
    pool.close().await;

    tracing::info!("Server shutdown complete");
    Ok(())
}
