//! Conversion Simulator — Binary Entrypoint
//! Boots the Axum HTTP server: config, fatal model load, routes, static UI.

use std::sync::Arc;

use anyhow::Context;
use tower_http::services::ServeDir;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use conversion_simulator::api::{self, AppState};
use conversion_simulator::config::AppConfig;
use conversion_simulator::metrics::Metrics;
use conversion_simulator::model::{ModelArtifact, ModelGateway};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("conversion_simulator=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op elsewhere. This enables
    // SIMULATOR_CONFIG_PATH / SIMULATOR_THRESHOLD from .env.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::load()?;

    // The model artifact is the one process-wide resource. Failing to load
    // it halts the whole application before the server ever binds; scoring
    // is never offered without a model.
    let artifact = ModelArtifact::load(&config.model.path)
        .context("failed to load model artifact; refusing to start")?;
    info!(
        path = %config.model.path.display(),
        features = artifact.schema.len(),
        "model artifact loaded"
    );

    let metrics = Metrics::init(artifact.schema.len());
    let gateway = Arc::new(ModelGateway::new(artifact));
    let state = AppState::new(gateway, &config);

    let app = api::router(state)
        .merge(metrics.router())
        .fallback_service(ServeDir::new("static"));

    let listener = tokio::net::TcpListener::bind(config.server.bind.as_str())
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    info!(bind = %config.server.bind, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
