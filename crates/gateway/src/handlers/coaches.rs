//! Coach lookup, upsert and lineage tree handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::score_table;
use crate::AppState;
use coachtree_common::errors::{AppError, Result};
use coachtree_lineage::population::save_population;
use coachtree_lineage::{CoachRecord, InfluenceScore, PopulationTag, ProjectedNode, TreeProjector};

/// A coach with mirrored relationships and scores in two populations
#[derive(Serialize)]
pub struct CoachResponse {
    #[serde(flatten)]
    pub record: CoachRecord,
    pub mentor_count: usize,
    pub disciple_count: usize,
    /// Score among every coach
    pub overall: Option<InfluenceScore>,
    /// Score among coaches of the same sport
    pub within_sport: Option<InfluenceScore>,
}

/// Result of adding or replacing a coach
#[derive(Serialize)]
pub struct UpsertResponse {
    pub created: bool,
    pub edges_added: usize,
    pub coaches: usize,
    pub relationships: usize,
    pub coach: CoachRecord,
}

#[derive(Debug, Deserialize)]
pub struct TreeQuery {
    pub ancestors: Option<usize>,
    pub descendants: Option<usize>,
}

#[derive(Serialize)]
pub struct TreeResponse {
    pub ancestors: usize,
    pub descendants: usize,
    pub nodes: usize,
    pub tree: ProjectedNode,
}

/// Get one coach by id
pub async fn get_coach(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CoachResponse>> {
    let graph = state.graph().await;
    let record = graph
        .record(&id)
        .ok_or_else(|| AppError::CoachNotFound { id: id.clone() })?;

    let mentor_count = graph.mentor_count(&id);
    let disciple_count = graph.disciple_count(&id);

    let scores = state.scores.clone();
    let sport = record.coach.sport;
    let (overall, within_sport) = tokio::task::spawn_blocking(move || {
        (
            scores.score_of(&graph, PopulationTag::All, &id),
            scores.score_of(&graph, sport.into(), &id),
        )
    })
    .await
    .map_err(|e| AppError::Internal {
        message: format!("scoring task failed: {}", e),
    })?;

    Ok(Json(CoachResponse {
        record,
        mentor_count,
        disciple_count,
        overall,
        within_sport,
    }))
}

/// Add a coach, or replace one with the same id, along with listed edges.
///
/// Responds 201 for a new coach and 200 for a replacement. Readers holding
/// the previous graph keep it; score tables follow the new fingerprint.
pub async fn upsert_coach(
    State(state): State<AppState>,
    Json(record): Json<CoachRecord>,
) -> Result<(StatusCode, Json<UpsertResponse>)> {
    record.validate()?;
    let id = record.coach.id.clone();

    let mut current = state.graph.write().await;
    let mut next = (**current).clone();
    let applied = next.apply_record(record)?;
    let next = Arc::new(next);

    if state.config.data.persist_writes {
        let path = state.config.data.population_path.clone();
        let graph = next.clone();
        tokio::task::spawn_blocking(move || save_population(&path, &graph))
            .await
            .map_err(|e| AppError::Internal {
                message: format!("population write task failed: {}", e),
            })??;
    }

    *current = next.clone();
    drop(current);

    info!(
        coach = %id,
        created = applied.created,
        edges_added = applied.edges_added,
        "Coach upserted"
    );

    let coach = next.record(id.as_str()).ok_or_else(|| AppError::Internal {
        message: format!("coach {} missing after upsert", id),
    })?;
    let status = if applied.created { StatusCode::CREATED } else { StatusCode::OK };

    Ok((
        status,
        Json(UpsertResponse {
            created: applied.created,
            edges_added: applied.edges_added,
            coaches: next.node_count(),
            relationships: next.edge_count(),
            coach,
        }),
    ))
}

/// Project the lineage tree around one coach
pub async fn get_tree(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TreeQuery>,
) -> Result<Json<TreeResponse>> {
    let projection = &state.config.projection;
    let ancestors = state
        .config
        .clamp_generations(query.ancestors.unwrap_or(projection.default_ancestors));
    let descendants = state
        .config
        .clamp_generations(query.descendants.unwrap_or(projection.default_descendants));

    let graph = state.graph().await;
    let scores = score_table(&state, graph.clone(), PopulationTag::All).await?;
    let tree = TreeProjector::new(&graph)
        .with_scores(&scores)
        .project(&id, ancestors, descendants)
        .ok_or(AppError::CoachNotFound { id })?;

    Ok(Json(TreeResponse {
        ancestors,
        descendants,
        nodes: tree.size(),
        tree,
    }))
}
