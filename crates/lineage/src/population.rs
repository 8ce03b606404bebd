//! Persisted populations and ranking snapshots
//!
//! A population file is a JSON object keyed by sport, each value an array of
//! coach records. Records are validated one at a time; a malformed record is
//! rejected and logged without failing the rest of the load.

use crate::graph::LineageGraph;
use crate::influence::{InfluenceScore, PopulationTag};
use crate::model::{CoachRecord, Sport};
use chrono::{DateTime, Utc};
use coachtree_common::errors::{AppError, Result};
use coachtree_common::metrics;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// A record that failed load-time validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRecord {
    /// Record id when one could be read
    pub id: Option<String>,
    pub reason: String,
    /// Offending field for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Result of loading a population: the graph plus anything turned away
#[derive(Debug)]
pub struct LoadedPopulation {
    pub graph: LineageGraph,
    pub rejected: Vec<RejectedRecord>,
}

/// Read and validate a population file
pub fn load_population(path: impl AsRef<Path>) -> Result<LoadedPopulation> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| AppError::Storage {
        message: format!("failed to read population {}: {}", path.display(), e),
    })?;

    let loaded = parse_population(&contents)?;
    info!(
        path = %path.display(),
        coaches = loaded.graph.node_count(),
        edges = loaded.graph.edge_count(),
        rejected = loaded.rejected.len(),
        "Population loaded"
    );
    Ok(loaded)
}

/// Parse and validate a population document.
///
/// Only a document that is not a sport-keyed object of arrays is an error;
/// individual records are rejected instead.
pub fn parse_population(json: &str) -> Result<LoadedPopulation> {
    let groups: BTreeMap<String, Vec<serde_json::Value>> = serde_json::from_str(json)?;

    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    let mut seen = HashSet::new();

    for (key, values) in groups {
        let sport = key.parse::<Sport>().ok();

        for value in values {
            let id = value.get("id").and_then(|v| v.as_str()).map(str::to_string);
            let mut reject = |reason: String, field: Option<String>| {
                warn!(id = ?id, sport = %key, reason = %reason, field = ?field, "Rejected coach record");
                rejected.push(RejectedRecord { id: id.clone(), reason, field });
            };

            let Some(sport) = sport else {
                reject(format!("unknown sport group '{}'", key), None);
                continue;
            };

            let record: CoachRecord = match serde_json::from_value(value) {
                Ok(record) => record,
                Err(e) => {
                    reject(format!("malformed record: {}", e), None);
                    continue;
                }
            };

            if let Err(e) = record.validate() {
                let err = AppError::from(e);
                let field = match &err {
                    AppError::Validation { field, .. } => field.clone(),
                    _ => None,
                };
                reject(err.to_string(), field);
                continue;
            }

            if record.coach.sport != sport {
                reject(format!("filed under {} but sport is {}", sport, record.coach.sport), None);
                continue;
            }

            if !seen.insert(record.coach.id.clone()) {
                reject("duplicate coach id".to_string(), None);
                continue;
            }

            accepted.push(record);
        }
    }

    if !rejected.is_empty() {
        metrics::record_rejections(rejected.len());
    }

    Ok(LoadedPopulation {
        graph: LineageGraph::from_records(accepted),
        rejected,
    })
}

/// Serialize a graph into the sport-keyed population shape
pub fn population_json(graph: &LineageGraph) -> Result<String> {
    let mut groups: BTreeMap<Sport, Vec<CoachRecord>> = BTreeMap::new();
    for record in graph.to_records() {
        groups.entry(record.coach.sport).or_default().push(record);
    }
    Ok(serde_json::to_string_pretty(&groups)?)
}

/// Write a graph, edges included, as a population file
pub fn save_population(path: impl AsRef<Path>, graph: &LineageGraph) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, population_json(graph)?)?;
    info!(path = %path.display(), coaches = graph.node_count(), "Population saved");
    Ok(())
}

/// Ranked scores for one population at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingSnapshot {
    pub id: Uuid,
    pub population: PopulationTag,
    pub generated_at: DateTime<Utc>,
    pub scores: Vec<InfluenceScore>,
}

impl RankingSnapshot {
    pub fn new(population: PopulationTag, scores: Vec<InfluenceScore>) -> Self {
        Self {
            id: Uuid::new_v4(),
            population,
            generated_at: Utc::now(),
            scores,
        }
    }

    /// File name the snapshot is stored under: `rankings_<tag>.json`
    pub fn file_name(&self) -> String {
        snapshot_file_name(self.population)
    }
}

pub fn snapshot_file_name(population: PopulationTag) -> String {
    format!("rankings_{}.json", population)
}

/// Write a snapshot into `dir`, replacing any earlier one for the same population
pub fn save_snapshot(dir: impl AsRef<Path>, snapshot: &RankingSnapshot) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let path = dir.join(snapshot.file_name());
    fs::write(&path, serde_json::to_string_pretty(snapshot)?)?;

    info!(
        snapshot_id = %snapshot.id,
        population = %snapshot.population,
        coaches = snapshot.scores.len(),
        path = %path.display(),
        "Ranking snapshot saved"
    );
    Ok(path)
}

pub fn load_snapshot(path: impl AsRef<Path>) -> Result<RankingSnapshot> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => AppError::SnapshotNotFound {
            path: path.display().to_string(),
        },
        _ => AppError::from(e),
    })?;
    Ok(serde_json::from_str(&contents)?)
}
