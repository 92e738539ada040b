//! SafeNet server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use safenet_api::{AppState, app};
use safenet_common::{Config, LocalStorage};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Interval between expired-session and rate-limiter sweeps.
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(600);

/// Room for form fields around the attachments in a submission.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "safenet=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Periodically drop expired sessions and stale rate limit windows.
fn spawn_maintenance(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(MAINTENANCE_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = state.account_service.purge_expired_sessions().await {
                tracing::warn!(error = %e, "Session purge failed");
            }
            let limiter = &state.rate_limiter;
            limiter.limiter.cleanup(limiter.max_window_secs()).await;
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("failed to load configuration")?;
    init_tracing(config.logging.json);

    info!("Starting safenet server...");

    let db = safenet_db::init(&config)
        .await
        .context("failed to connect to database")?;
    info!("Connected to database");

    info!("Running database migrations...");
    safenet_db::migrate(&db)
        .await
        .context("failed to run migrations")?;
    info!("Migrations completed");

    tokio::fs::create_dir_all(&config.uploads.base_path)
        .await
        .context("failed to create upload directory")?;
    let storage = Arc::new(LocalStorage::new(
        config.uploads.base_path.clone(),
        config.uploads.base_url.clone(),
    ));

    let config = Arc::new(config);
    let state = AppState::new(Arc::new(db), Arc::clone(&config), storage);

    if let Some(bootstrap) = &config.bootstrap {
        if let Some(admin) = state.account_service.bootstrap_admin(bootstrap).await? {
            info!(user_id = admin.id, username = %admin.username, "Administrator ready");
        }
    }

    spawn_maintenance(state.clone());

    let body_limit = config.uploads.request_body_limit(FORM_OVERHEAD_BYTES);

    let app = app(state)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server host or port")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shutdown complete");
    Ok(())
}
