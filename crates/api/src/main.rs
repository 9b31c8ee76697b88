use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use reelforge_db::PgJobStore;
use reelforge_pipeline::{BatchReconciler, RefreshService, SubmissionService};
use reelforge_provider::{GenerationGateway, HttpProvider, StatusProber};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelforge_api::config::ServerConfig;
use reelforge_api::router::build_app_router;
use reelforge_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelforge_api=debug,reelforge_pipeline=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = reelforge_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    reelforge_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    reelforge_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let store = Arc::new(PgJobStore::new(pool));

    // --- Provider ---
    let provider = Arc::new(
        HttpProvider::new(config.provider.clone()).context("Failed to build provider client")?,
    );
    if config.provider.api_token.is_empty() {
        tracing::warn!("PROVIDER_API_TOKEN is not set; submissions will be refused");
    }
    tracing::info!(
        base_url = %config.provider.base_url,
        sync_wait_secs = config.provider.sync_wait.as_secs(),
        "Provider client ready",
    );

    let gateway = GenerationGateway::new(provider.clone())
        .with_retry(config.provider.retry.clone())
        .with_max_concurrent(config.provider.max_concurrent_submissions);
    let reconciler = BatchReconciler::new(StatusProber::new(provider));

    // --- App state ---
    let state = AppState {
        store: store.clone(),
        submission: Arc::new(SubmissionService::new(store.clone(), Arc::new(gateway))),
        refresh: Arc::new(RefreshService::new(store, reconciler)),
        config: Arc::new(config.clone()),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let host: IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST address '{}'", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
