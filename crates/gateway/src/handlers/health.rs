//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub population: PopulationCheck,
    pub score_cache: CacheCheck,
}

#[derive(Serialize)]
pub struct CacheCheck {
    pub tables: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Serialize)]
pub struct PopulationCheck {
    pub status: String,
    pub coaches: usize,
    pub relationships: usize,
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: coachtree_common::VERSION.to_string(),
    })
}

/// Readiness probe - ready once a non-empty population is loaded
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let graph = state.graph().await;
    let loaded = !graph.is_empty();
    let cache = state.scores.stats();

    Json(ReadyResponse {
        status: if loaded { "ready" } else { "not_ready" }.to_string(),
        checks: HealthChecks {
            population: PopulationCheck {
                status: if loaded { "up" } else { "empty" }.to_string(),
                coaches: graph.node_count(),
                relationships: graph.edge_count(),
            },
            score_cache: CacheCheck {
                tables: cache.entries,
                hits: cache.hits,
                misses: cache.misses,
            },
        },
    })
}
