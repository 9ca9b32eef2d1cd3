/// Route weather risk service entry point
mod cache;
mod clients;
mod config;
mod domain;
mod errors;
mod handlers;
mod registry;
mod routes;
mod services;
mod utils;

use crate::cache::ForecastCache;
use crate::clients::OpenMeteoClient;
use crate::config::AppConfig;
use crate::handlers::AppState;
use crate::registry::RouteRegistry;
use crate::routes::build_router;
use crate::services::StatusService;
use crate::utils::SystemClock;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load configuration
    let config = AppConfig::from_env()?;
    info!(
        tz = %config.reference_tz,
        ttl_s = config.cache.ttl_seconds,
        "Configuration loaded successfully"
    );

    // Route table; a bad default route is fatal
    let registry = Arc::new(RouteRegistry::builtin(&config.default_route)?);
    info!(
        routes = registry.routes().count(),
        default = %config.default_route,
        "Route registry initialized"
    );

    // Initialize upstream client and cache
    let client = OpenMeteoClient::new(
        config.open_meteo_url.clone(),
        config.reference_tz,
        config.cache.fetch_timeout(),
    )?;
    let clock = Arc::new(SystemClock);
    let cache = ForecastCache::new(
        &registry,
        Arc::new(client),
        clock.clone(),
        config.cache.ttl(),
    );

    // Initialize services
    let status_service = Arc::new(StatusService::new(
        registry,
        cache,
        clock,
        config.reference_tz,
    ));

    let state = AppState { status_service };

    // Build router
    let app = build_router(state);

    // Start server
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("route_weather service listening on {}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("route_weather service stopped");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Ctrl-C handler failed: {:?}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("SIGTERM handler failed: {:?}", e);
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
