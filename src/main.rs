// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use searchrs::config::settings::Settings;
use searchrs::domain::search::bang::BangParser;
use searchrs::domain::services::search_service::SearchService;
use searchrs::engines::circuit_breaker::{CircuitBreakerRegistry, CircuitConfig};
use searchrs::infrastructure::cache::search_cache::{SearchCache, SearchCacheConfig};
use searchrs::infrastructure::search::engine_manager::EngineManager;
use searchrs::infrastructure::search::scrape_adapter::ScrapeAdapter;
use searchrs::presentation::routes;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use searchrs::utils::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_telemetry();
    info!("Starting searchrs...");

    let settings = Settings::new()?;
    info!("Configuration loaded");

    searchrs::infrastructure::metrics::init_metrics(&settings.metrics);

    let bangs = Arc::new(BangParser::with_extra(settings.extra_bangs()));
    let breakers = Arc::new(CircuitBreakerRegistry::new(CircuitConfig::from(
        &settings.circuit_breaker,
    )));
    let cache = Arc::new(SearchCache::new(SearchCacheConfig::from(&settings.cache)));
    let sweeper = cache.spawn_sweeper();

    let mut manager = EngineManager::new(settings.engine_manager_config(), bangs, breakers, cache);
    for definition in &settings.adapters {
        match ScrapeAdapter::new(definition) {
            Ok(adapter) => manager.register_adapter(Arc::new(adapter)),
            Err(e) => warn!(engine = %definition.name, error = %e, "Skipping invalid adapter definition"),
        }
    }
    if manager.adapters().is_empty() {
        warn!("No search adapters configured; every search will return 503");
    }
    info!(adapters = manager.adapters().len(), "Engine manager initialized");

    let app = routes::app(SearchService::new(Arc::new(manager)));

    let addr = settings.server.address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
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
                warn!(error = %e, "Failed to listen for SIGTERM");
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
