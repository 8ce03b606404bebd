//! Influence ranking handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{population_tag, score_table};
use crate::AppState;
use coachtree_common::errors::{AppError, Result};
use coachtree_lineage::population::{save_snapshot, RankingSnapshot};
use coachtree_lineage::{InfluenceScore, PopulationTag};

#[derive(Debug, Deserialize)]
pub struct RankingsQuery {
    pub sport: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize { 25 }

#[derive(Serialize)]
pub struct RankingsResponse {
    pub population: PopulationTag,
    pub total: usize,
    pub rankings: Vec<InfluenceScore>,
}

#[derive(Debug, Deserialize)]
pub struct SnapshotQuery {
    pub sport: Option<String>,
}

#[derive(Serialize)]
pub struct SnapshotResponse {
    pub id: Uuid,
    pub population: PopulationTag,
    pub generated_at: DateTime<Utc>,
    pub coaches: usize,
    pub path: String,
}

/// Ranked influence scores for all coaches or one sport
pub async fn list_rankings(
    State(state): State<AppState>,
    Query(query): Query<RankingsQuery>,
) -> Result<Json<RankingsResponse>> {
    let tag = population_tag(query.sport.as_deref())?;
    let scores = score_table(&state, state.graph().await, tag).await?;

    Ok(Json(RankingsResponse {
        population: tag,
        total: scores.len(),
        rankings: scores.iter().take(query.limit).cloned().collect(),
    }))
}

/// Persist the current ranking of a population to the rankings directory
pub async fn create_snapshot(
    State(state): State<AppState>,
    Query(query): Query<SnapshotQuery>,
) -> Result<(StatusCode, Json<SnapshotResponse>)> {
    let tag = population_tag(query.sport.as_deref())?;
    let scores = score_table(&state, state.graph().await, tag).await?;
    let snapshot = RankingSnapshot::new(tag, scores.as_ref().clone());

    let dir = state.config.data.rankings_dir.clone();
    let (snapshot, path) = tokio::task::spawn_blocking(move || {
        save_snapshot(&dir, &snapshot).map(|path| (snapshot, path))
    })
    .await
    .map_err(|e| AppError::Internal {
        message: format!("snapshot task failed: {}", e),
    })??;

    tracing::info!(
        snapshot_id = %snapshot.id,
        population = %tag,
        "Ranking snapshot created"
    );

    Ok((
        StatusCode::CREATED,
        Json(SnapshotResponse {
            id: snapshot.id,
            population: snapshot.population,
            generated_at: snapshot.generated_at,
            coaches: snapshot.scores.len(),
            path: path.display().to_string(),
        }),
    ))
}
