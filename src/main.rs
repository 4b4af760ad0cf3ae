//! Neuro Research - literature-grounded research assistant API
//!
//! Streams answers from a research backend, enriched with paper search
//! results, and keeps each conversation, its references and user feedback
//! in a local SQLite store.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod conversation;
mod core;
mod export;
mod identity;
mod monitor;
mod providers;
mod routes;

use config::{Config, ModelCatalog};
use core::{MemoryStore, OfflineResponder, ResearchPipeline};
use monitor::ConnectivityMonitor;
use providers::{HttpBackend, ResearchBackend};
use routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "neuro_research=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let settings = config.load_settings()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let memory = Arc::new(MemoryStore::new(&config.data_dir.join("neuro.db")).await?);

    let backend_url = config.backend_url(&settings).to_string();
    let backend: Arc<dyn ResearchBackend> = Arc::new(HttpBackend::new(
        backend_url.as_str(),
        settings.backend.request_timeout(),
    )?);
    tracing::info!("📡 Research backend at {}", backend_url);

    let connectivity = ConnectivityMonitor::spawn(backend.clone(), settings.backend.probe_interval());
    let offline = OfflineResponder::from_settings(&settings.offline);
    let catalog = ModelCatalog::new(settings.models, config.model.clone());
    tracing::info!("📚 {} model(s) available, default {}", catalog.entries().len(), catalog.default_id());

    let pipeline = Arc::new(ResearchPipeline::new(
        backend,
        memory,
        connectivity,
        catalog,
        offline,
    ));
    let state = AppState::new(pipeline);

    let app = Router::new()
        .merge(routes::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("🔬 Neuro research API running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
