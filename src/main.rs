// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{routing::get, Router};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use aqm_chart::application::chart_service::ChartService;
use aqm_chart::application::mark_persister::MarkPersister;
use aqm_chart::application::sensor_repository::SensorRepository;
use aqm_chart::infrastructure::config::{load_app_config, SourceSettings};
use aqm_chart::infrastructure::file_repository::FileRepository;
use aqm_chart::infrastructure::http_repository::HttpRepository;
use aqm_chart::presentation::app_state::AppState;
use aqm_chart::presentation::handlers::{
    chart_series, get_marks_bin, get_marks_txt, health_check, put_marks_bin, put_marks_txt, samples_bin,
    samples_csv,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let conf = load_app_config()?;

    // Create repository (infrastructure layer)
    let repository: Arc<dyn SensorRepository> = match conf.source.clone() {
        SourceSettings::File { samples_path, marks_path } => {
            tracing::info!("Reading samples from {}", samples_path.display());
            Arc::new(FileRepository::new(samples_path, marks_path))
        }
        SourceSettings::Http { samples_url, marks_url } => {
            tracing::info!("Proxying samples from {}", samples_url);
            Arc::new(HttpRepository::new(samples_url, marks_url))
        }
    };

    // Create services (application layer)
    let chart_service = ChartService::new(repository.clone(), conf.marks.palette(), conf.marks.storage_bytes);
    let persister = MarkPersister::spawn(repository.clone(), conf.persist.policy());
    let state = Arc::new(AppState::load(&chart_service, repository, persister).await);

    // Build router (presentation layer)
    // Binary feeds negotiate brotli themselves; only text routes get CompressionLayer
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/data/samples.bin", get(samples_bin))
        .route("/data/samples.csv", get(samples_csv).layer(CompressionLayer::new()))
        .route("/data/marks.bin", get(get_marks_bin).put(put_marks_bin))
        .route("/data/marks.txt", get(get_marks_txt).put(put_marks_txt))
        .route("/chart/series", get(chart_series).layer(CompressionLayer::new()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = conf
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", conf.server.bind))?;
    tracing::info!("Starting aqm-chart service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
