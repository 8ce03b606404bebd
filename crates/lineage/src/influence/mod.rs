//! Influence scoring
//!
//! Scores are relative to the population they were computed over: ranking
//! all coaches and ranking one sport give different numbers for the same
//! coach. [`ScoreCache`] memoizes a score table per population fingerprint
//! and current year.

pub mod components;
mod scorer;

pub use scorer::{ComponentWeights, InfluenceScorer, ScoringConfig, UNIFORM_SCORE};

use crate::graph::LineageGraph;
use crate::model::{CoachId, Sport};
use coachtree_common::cache::{keys, CacheConfig, CacheStats, MemoryCache};
use coachtree_common::errors::AppError;
use coachtree_common::{metrics, ALL_SPORTS_TAG};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

/// Component values before population normalization
#[derive(Debug, Clone, PartialEq)]
pub struct RawScores {
    pub coach_id: CoachId,
    pub direct_success: f64,
    pub disciple_success: f64,
    pub tree_depth: f64,
    pub tree_breadth: f64,
    pub longevity: f64,
}

/// Normalized scores and rank of one coach within a population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceScore {
    pub coach_id: CoachId,
    pub name: String,
    pub sport: Sport,
    pub direct_success: f64,
    pub disciple_success: f64,
    pub tree_depth: f64,
    pub tree_breadth: f64,
    pub longevity: f64,
    pub composite: f64,
    /// 1-based position by descending composite
    pub rank: usize,
}

/// Which coaches a score table was computed over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PopulationTag {
    #[default]
    All,
    Sport(Sport),
}

impl PopulationTag {
    /// The population this tag names, borrowed when it is the whole graph
    pub fn select<'a>(&self, graph: &'a LineageGraph) -> Cow<'a, LineageGraph> {
        match self {
            PopulationTag::All => Cow::Borrowed(graph),
            PopulationTag::Sport(sport) => Cow::Owned(graph.for_sport(*sport)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PopulationTag::All => ALL_SPORTS_TAG,
            PopulationTag::Sport(sport) => sport.as_str(),
        }
    }
}

impl fmt::Display for PopulationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PopulationTag {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(ALL_SPORTS_TAG) {
            return Ok(PopulationTag::All);
        }
        s.parse().map(PopulationTag::Sport)
    }
}

impl From<Sport> for PopulationTag {
    fn from(sport: Sport) -> Self {
        PopulationTag::Sport(sport)
    }
}

impl From<PopulationTag> for String {
    fn from(tag: PopulationTag) -> Self {
        tag.as_str().to_string()
    }
}

impl TryFrom<String> for PopulationTag {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Score tables memoized by population fingerprint and current year
pub struct ScoreCache {
    scorer: InfluenceScorer,
    tables: MemoryCache<Vec<InfluenceScore>>,
}

impl ScoreCache {
    pub fn new(scorer: InfluenceScorer) -> Self {
        Self {
            scorer,
            tables: MemoryCache::new(CacheConfig {
                max_entries: 16,
                key_prefix: "influence".to_string(),
            }),
        }
    }

    pub fn scorer(&self) -> &InfluenceScorer {
        &self.scorer
    }

    /// Ranked scores for `tag`'s population, computed at most once per
    /// distinct population
    pub fn scores(&self, graph: &LineageGraph, tag: PopulationTag) -> Arc<Vec<InfluenceScore>> {
        let population = tag.select(graph);
        let key = keys::scores(&population.fingerprint(), self.scorer.config().current_year);

        self.tables.get_or_load(&key, || {
            let started = Instant::now();
            let scores = self.scorer.rank(&population);
            metrics::record_scoring(started.elapsed().as_secs_f64(), tag.as_str(), scores.len());
            scores
        })
    }

    /// Score of one coach within `tag`'s population
    pub fn score_of(&self, graph: &LineageGraph, tag: PopulationTag, id: &str) -> Option<InfluenceScore> {
        self.scores(graph, tag)
            .iter()
            .find(|score| score.coach_id.as_str() == id)
            .cloned()
    }

    /// Hit/miss counters of the table cache
    pub fn stats(&self) -> CacheStats {
        self.tables.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Achievements, Coach, YearSpan};

    fn graph() -> LineageGraph {
        let coach = |name: &str, sport: Sport, championships: u32| {
            Coach::new(name, sport, YearSpan::closed(2000, 2010)).with_achievements(Achievements {
                championships,
                ..Default::default()
            })
        };
        LineageGraph::from_coaches([
            coach("a", Sport::Football, 3),
            coach("b", Sport::Football, 1),
            coach("c", Sport::Soccer, 4),
        ])
    }

    fn cache() -> ScoreCache {
        ScoreCache::new(InfluenceScorer::new(ScoringConfig::default().with_current_year(2024)))
    }

    #[test]
    fn test_population_tag_parsing() {
        assert_eq!("all".parse::<PopulationTag>().unwrap(), PopulationTag::All);
        assert_eq!("ALL".parse::<PopulationTag>().unwrap(), PopulationTag::All);
        assert_eq!(
            "hockey".parse::<PopulationTag>().unwrap(),
            PopulationTag::Sport(Sport::Hockey)
        );
        assert!(matches!(
            "curling".parse::<PopulationTag>(),
            Err(AppError::UnknownSport { .. })
        ));
        assert_eq!(PopulationTag::Sport(Sport::Soccer).to_string(), "soccer");
    }

    #[test]
    fn test_population_tag_serde() {
        let json = serde_json::to_string(&PopulationTag::Sport(Sport::Baseball)).unwrap();
        assert_eq!(json, "\"baseball\"");
        let tag: PopulationTag = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(tag, PopulationTag::All);
        assert!(serde_json::from_str::<PopulationTag>("\"cricket\"").is_err());
    }

    #[test]
    fn test_select_filters_by_sport() {
        let graph = graph();
        assert_eq!(PopulationTag::All.select(&graph).node_count(), 3);
        assert_eq!(PopulationTag::Sport(Sport::Football).select(&graph).node_count(), 2);
        assert_eq!(PopulationTag::Sport(Sport::Hockey).select(&graph).node_count(), 0);
    }

    #[test]
    fn test_cache_returns_same_table() {
        let graph = graph();
        let cache = cache();

        let first = cache.scores(&graph, PopulationTag::All);
        let second = cache.scores(&graph, PopulationTag::All);
        assert!(Arc::ptr_eq(&first, &second));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
    }

    #[test]
    fn test_cache_separates_populations() {
        let graph = graph();
        let cache = cache();

        let all = cache.score_of(&graph, PopulationTag::All, "a").unwrap();
        let football = cache.score_of(&graph, Sport::Football.into(), "a").unwrap();
        assert_eq!(all.rank, 2);
        assert_eq!(football.rank, 1);
        assert!(cache.score_of(&graph, Sport::Football.into(), "c").is_none());
    }

    #[test]
    fn test_cache_tracks_graph_changes() {
        let mut graph = graph();
        let cache = cache();
        let before = cache.scores(&graph, PopulationTag::All);

        graph.insert_coach(Coach::new("d", Sport::Hockey, YearSpan::closed(2000, 2010)));
        let after = cache.scores(&graph, PopulationTag::All);
        assert_eq!(before.len(), 3);
        assert_eq!(after.len(), 4);
    }
}
