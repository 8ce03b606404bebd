//! CoachTree lineage core
//!
//! Models mentor -> disciple lineages between coaches and ranks them:
//! - `model`: coaches, tenures and relationship edges
//! - `graph`: the lineage graph store
//! - `traversal`: cycle-safe walks over disciple edges
//! - `inference`: edges inferred from overlapping tenures
//! - `influence`: composite influence scoring and ranking
//! - `projection`: bounded ancestor/descendant trees for display
//! - `population`: load-time validation and persisted ranking snapshots
//!
//! Everything except `population` is synchronous and pure over an
//! in-memory snapshot of the graph.

pub mod graph;
pub mod inference;
pub mod influence;
pub mod model;
pub mod population;
pub mod projection;
pub mod traversal;

pub use graph::{AppliedRecord, LineageGraph};
pub use inference::RelationshipInferrer;
pub use influence::{InfluenceScore, InfluenceScorer, PopulationTag, ScoreCache, ScoringConfig};
pub use model::{Coach, CoachId, CoachRecord, RelationshipEdge, Sport, Tenure, YearSpan};
pub use population::{LoadedPopulation, RankingSnapshot};
pub use projection::{ProjectedNode, TreeProjector};

use chrono::Datelike;

/// Calendar year open-ended tenures resolve to by default
pub fn current_year() -> i32 {
    chrono::Utc::now().year()
}
