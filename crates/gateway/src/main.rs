//! CoachTree API Gateway
//!
//! Loads a coach population once at startup and serves:
//! - Influence rankings, overall or per sport
//! - Coach lookups, upserts and lineage tree projections
//! - Ranking snapshots written to disk
//! - Observability (logging, metrics)

mod handlers;
mod middleware;

use axum::{
    routing::{get, post},
    Router,
};
use coachtree_common::{config::AppConfig, metrics};
use coachtree_lineage::{
    population, InfluenceScorer, LineageGraph, RelationshipInferrer, ScoreCache, ScoringConfig,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::RwLock;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Current population; writers swap in a new graph under the write lock
    pub graph: Arc<RwLock<Arc<LineageGraph>>>,
    pub scores: Arc<ScoreCache>,
}

impl AppState {
    pub fn new(config: AppConfig, graph: LineageGraph) -> Self {
        let scorer = InfluenceScorer::new(ScoringConfig::from_settings(&config.scoring));
        Self {
            config: Arc::new(config),
            graph: Arc::new(RwLock::new(Arc::new(graph))),
            scores: Arc::new(ScoreCache::new(scorer)),
        }
    }

    /// The population as of now; later writes do not affect it
    pub async fn graph(&self) -> Arc<LineageGraph> {
        self.graph.read().await.clone()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration, from an explicit file when one is named
    let config = match std::env::var("APP_CONFIG_FILE") {
        Ok(path) => AppConfig::from_file(&path)?,
        Err(_) => AppConfig::load()?,
    };

    init_tracing(&config);

    info!(
        service = %config.observability.service_name,
        "Starting CoachTree API Gateway v{}",
        coachtree_common::VERSION
    );

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .set_buckets(metrics::COMPUTE_BUCKETS)?
            .install()?;
        info!(%addr, "Prometheus exporter listening");
    }

    // Load the population
    let loaded = population::load_population(&config.data.population_path)?;
    let mut graph = loaded.graph;
    if config.data.infer_relationships {
        let current_year = config.scoring.current_year.unwrap_or_else(coachtree_lineage::current_year);
        RelationshipInferrer::new(current_year).link(&mut graph);
    }

    let state = AppState::new(config, graph);
    let addr = state.config.bind_address();

    // Build the router
    let app = create_router(state);

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Install the global subscriber; `RUST_LOG` overrides the configured level
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.observability.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Ranking endpoints
        .route("/rankings", get(handlers::rankings::list_rankings))
        .route("/rankings/snapshot", post(handlers::rankings::create_snapshot))

        // Coach endpoints
        .route("/coaches", post(handlers::coaches::upsert_coach))
        .route("/coaches/{id}", get(handlers::coaches::get_coach))
        .route("/coaches/{id}/tree", get(handlers::coaches::get_tree));

    // Compose the app
    Router::new()
        .nest("/v1", api_routes)
        .layer(axum::middleware::from_fn(middleware::metrics::track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
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
            Ok(mut stream) => {
                stream.recv().await;
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
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
