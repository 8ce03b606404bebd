//! API handlers module

pub mod coaches;
pub mod health;
pub mod rankings;

use std::sync::Arc;

use crate::AppState;
use coachtree_common::errors::{AppError, Result};
use coachtree_lineage::{InfluenceScore, LineageGraph, PopulationTag};

/// Population named by an optional `sport` query parameter; absent means all
pub(crate) fn population_tag(sport: Option<&str>) -> Result<PopulationTag> {
    match sport {
        Some(sport) if !sport.trim().is_empty() => sport.parse(),
        _ => Ok(PopulationTag::All),
    }
}

/// Score table of `tag`'s population within `graph`.
///
/// A cache miss ranks the whole population, so the lookup runs on the
/// blocking pool rather than an async worker.
pub(crate) async fn score_table(
    state: &AppState,
    graph: Arc<LineageGraph>,
    tag: PopulationTag,
) -> Result<Arc<Vec<InfluenceScore>>> {
    let scores = state.scores.clone();
    tokio::task::spawn_blocking(move || scores.scores(&graph, tag))
        .await
        .map_err(|e| AppError::Internal {
            message: format!("scoring task failed: {}", e),
        })
}
