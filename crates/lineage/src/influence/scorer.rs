//! Composite influence scoring
//!
//! Computes five raw components per coach, min-max normalizes each across
//! the population passed in, and combines them into a weighted composite.

use super::components;
use super::{InfluenceScore, RawScores};
use crate::graph::LineageGraph;
use coachtree_common::config::ScoringSettings;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Instant;
use tracing::debug;

/// Score given to every coach when a component is uniform across the population
pub const UNIFORM_SCORE: f64 = 50.0;

/// Composite weights; they sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentWeights {
    pub direct_success: f64,
    pub disciple_success: f64,
    pub tree_depth: f64,
    pub tree_breadth: f64,
    pub longevity: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            direct_success: 0.20,
            disciple_success: 0.35,
            tree_depth: 0.15,
            tree_breadth: 0.20,
            longevity: 0.10,
        }
    }
}

/// Scoring configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Per-generation decay for disciple success (typically 0.7)
    pub decay: f64,

    /// Deepest generation contributing to disciple success
    pub max_generation: usize,

    /// Composite weights
    pub weights: ComponentWeights,

    /// Year open-ended spans resolve to
    pub current_year: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            decay: 0.7,
            max_generation: 5,
            weights: ComponentWeights::default(),
            current_year: crate::current_year(),
        }
    }
}

impl ScoringConfig {
    pub fn from_settings(settings: &ScoringSettings) -> Self {
        Self {
            decay: settings.decay,
            max_generation: settings.max_generation,
            weights: ComponentWeights::default(),
            current_year: settings.current_year.unwrap_or_else(crate::current_year),
        }
    }

    pub fn with_current_year(mut self, current_year: i32) -> Self {
        self.current_year = current_year;
        self
    }
}

/// Influence scorer for coaches
#[derive(Debug, Clone)]
pub struct InfluenceScorer {
    config: ScoringConfig,
}

impl InfluenceScorer {
    /// Create a new scorer
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Pre-normalization component values, in graph order
    pub fn raw_scores(&self, graph: &LineageGraph) -> Vec<RawScores> {
        let direct: Vec<f64> = graph
            .coaches()
            .iter()
            .map(|coach| components::direct_success(&coach.achievements))
            .collect();

        graph
            .coaches()
            .iter()
            .enumerate()
            .map(|(position, coach)| RawScores {
                coach_id: coach.id.clone(),
                direct_success: direct[position],
                disciple_success: components::disciple_success(
                    graph,
                    position,
                    &direct,
                    self.config.decay,
                    self.config.max_generation,
                ),
                tree_depth: components::tree_depth(graph, position),
                tree_breadth: components::tree_breadth(graph, position),
                longevity: components::longevity(coach, self.config.current_year),
            })
            .collect()
    }

    /// Score and rank every coach in the population.
    ///
    /// Rank is the 1-based position after a stable descending sort on the
    /// composite, so equal composites get adjacent, distinct ranks.
    pub fn rank(&self, graph: &LineageGraph) -> Vec<InfluenceScore> {
        let started = Instant::now();
        let raw = self.raw_scores(graph);
        if raw.is_empty() {
            return Vec::new();
        }

        let column = |pick: fn(&RawScores) -> f64| -> Vec<f64> {
            normalize(&raw.iter().map(pick).collect::<Vec<_>>())
        };
        let direct = column(|r| r.direct_success);
        let disciple = column(|r| r.disciple_success);
        let depth = column(|r| r.tree_depth);
        let breadth = column(|r| r.tree_breadth);
        let longevity = column(|r| r.longevity);

        let weights = self.config.weights;
        let mut scores: Vec<InfluenceScore> = graph
            .coaches()
            .iter()
            .enumerate()
            .map(|(i, coach)| {
                let composite = direct[i] * weights.direct_success
                    + disciple[i] * weights.disciple_success
                    + depth[i] * weights.tree_depth
                    + breadth[i] * weights.tree_breadth
                    + longevity[i] * weights.longevity;

                InfluenceScore {
                    coach_id: coach.id.clone(),
                    name: coach.name.clone(),
                    sport: coach.sport,
                    direct_success: round1(direct[i]),
                    disciple_success: round1(disciple[i]),
                    tree_depth: round1(depth[i]),
                    tree_breadth: round1(breadth[i]),
                    longevity: round1(longevity[i]),
                    composite: round1(composite),
                    rank: 0,
                }
            })
            .collect();

        // Sort by composite descending
        scores.sort_by(|a, b| {
            b.composite.partial_cmp(&a.composite).unwrap_or(Ordering::Equal)
        });
        for (position, score) in scores.iter_mut().enumerate() {
            score.rank = position + 1;
        }

        debug!(
            coaches = scores.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Influence scores computed"
        );

        scores
    }

    /// Highest-ranked `limit` coaches
    pub fn top(&self, graph: &LineageGraph, limit: usize) -> Vec<InfluenceScore> {
        let mut scores = self.rank(graph);
        scores.truncate(limit);
        scores
    }
}

/// Min-max rescale to [0, 100]; a uniform column maps to [`UNIFORM_SCORE`]
fn normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range < 1e-9 {
        return vec![UNIFORM_SCORE; values.len()];
    }

    values.iter().map(|v| (v - min) / range * 100.0).collect()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Achievements, ClosedSpan, Coach, CoachId, RelationshipEdge, RelationshipRole, Sport, YearSpan};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const YEAR: i32 = 2024;

    fn scorer() -> InfluenceScorer {
        InfluenceScorer::new(ScoringConfig::default().with_current_year(YEAR))
    }

    fn coach(name: &str, championships: u32) -> Coach {
        Coach::new(name, Sport::Football, YearSpan::closed(2000, 2010)).with_achievements(Achievements {
            championships,
            ..Default::default()
        })
    }

    fn link(graph: &mut LineageGraph, mentor: &str, disciple: &str) {
        graph.add_edge(RelationshipEdge {
            mentor_id: CoachId::from(mentor),
            disciple_id: CoachId::from(disciple),
            organization: "Team".to_string(),
            years: ClosedSpan { start: 2001, end: 2002 },
            role: RelationshipRole::Assistant,
        });
    }

    fn find<'a>(scores: &'a [InfluenceScore], id: &str) -> &'a InfluenceScore {
        scores.iter().find(|s| s.coach_id.as_str() == id).unwrap()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(&[0.0, 50.0, 100.0]), vec![0.0, 50.0, 100.0]);
        assert_eq!(normalize(&[10.0, 20.0]), vec![0.0, 100.0]);
        assert_eq!(normalize(&[7.0, 7.0, 7.0]), vec![50.0; 3]);
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(28.04), 28.0);
        assert_eq!(round1(28.05 + 1e-9), 28.1);
        assert_eq!(round1(49.99999999), 50.0);
    }

    #[test]
    fn test_single_coach_population_is_uniform() {
        let graph = LineageGraph::from_coaches([coach("solo", 4)]);
        let scores = scorer().rank(&graph);

        assert_eq!(scores.len(), 1);
        let s = &scores[0];
        assert_eq!(s.direct_success, 50.0);
        assert_eq!(s.disciple_success, 50.0);
        assert_eq!(s.tree_depth, 50.0);
        assert_eq!(s.tree_breadth, 50.0);
        assert_eq!(s.longevity, 50.0);
        assert_eq!(s.composite, 50.0);
        assert_eq!(s.rank, 1);
    }

    #[test]
    fn test_empty_population() {
        assert!(scorer().rank(&LineageGraph::new()).is_empty());
    }

    #[test]
    fn test_direct_success_normalizes_across_population() {
        let graph = LineageGraph::from_coaches([coach("x", 0), coach("y", 2)]);

        let raw = scorer().raw_scores(&graph);
        assert_eq!(raw[0].direct_success, 0.0);
        assert_eq!(raw[1].direct_success, 50.0);

        let scores = scorer().rank(&graph);
        assert_eq!(find(&scores, "x").direct_success, 0.0);
        assert_eq!(find(&scores, "y").direct_success, 100.0);
        assert_eq!(scores[0].coach_id.as_str(), "y");
    }

    #[test]
    fn test_disciple_contribution_before_normalization() {
        // Direct success 40: one title (25) plus three playoff runs (15)
        let mut disciple = coach("d", 1);
        disciple.achievements.playoff_appearances = 3;
        let mut graph = LineageGraph::from_coaches([coach("m", 0), disciple]);
        link(&mut graph, "m", "d");

        let raw = scorer().raw_scores(&graph);
        assert_eq!(raw[1].direct_success, 40.0);
        assert!((raw[0].disciple_success - 28.0).abs() < 1e-9);
        assert_eq!(raw[1].disciple_success, 0.0);
        assert_eq!(raw[1].tree_depth, 0.0);
    }

    #[test]
    fn test_rank_is_population_relative() {
        let mut graph = LineageGraph::from_coaches([coach("a", 3), coach("b", 1)]);
        graph.insert_coach(
            Coach::new("c", Sport::Soccer, YearSpan::closed(2000, 2010)).with_achievements(Achievements {
                championships: 4,
                ..Default::default()
            }),
        );

        let all = scorer().rank(&graph);
        assert_eq!(find(&all, "a").rank, 2);

        let football = scorer().rank(&graph.for_sport(Sport::Football));
        assert_eq!(football.len(), 2);
        assert_eq!(find(&football, "a").rank, 1);
    }

    #[test]
    fn test_ties_get_adjacent_distinct_ranks() {
        let graph = LineageGraph::from_coaches([coach("p", 1), coach("q", 1), coach("r", 0)]);
        let scores = scorer().rank(&graph);

        assert_eq!(find(&scores, "p").composite, find(&scores, "q").composite);
        assert_eq!(find(&scores, "p").rank, 1);
        assert_eq!(find(&scores, "q").rank, 2);
        assert_eq!(find(&scores, "r").rank, 3);
    }

    #[test]
    fn test_top_truncates() {
        let graph = LineageGraph::from_coaches([coach("a", 1), coach("b", 2), coach("c", 3)]);
        let top = scorer().top(&graph, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].coach_id.as_str(), "c");
    }

    #[test]
    fn test_cycle_scores_are_finite() {
        let mut graph = LineageGraph::from_coaches([coach("a", 1), coach("b", 2), coach("c", 0)]);
        link(&mut graph, "a", "b");
        link(&mut graph, "b", "c");
        link(&mut graph, "c", "a");

        for score in scorer().rank(&graph) {
            assert!(score.composite.is_finite());
        }
    }

    #[test]
    fn test_random_populations_stay_bounded_and_ranked() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..25 {
            let size = rng.gen_range(1..30);
            let names: Vec<String> = (0..size).map(|i| format!("coach-{}", i)).collect();
            let mut graph = LineageGraph::from_coaches(names.iter().map(|name| {
                let start = rng.gen_range(1960..2020);
                let end = if rng.gen_bool(0.3) { None } else { Some(start + rng.gen_range(0..30)) };
                Coach::new(name.as_str(), Sport::Football, YearSpan::new(start, end)).with_achievements(Achievements {
                    championships: rng.gen_range(0..6),
                    coach_of_year_awards: rng.gen_range(0..3),
                    playoff_appearances: rng.gen_range(0..20),
                    win_percentage: rng.gen_range(0.0..1.0),
                    all_star_selections: rng.gen_range(0..10),
                    major_trophies: None,
                })
            }));
            for _ in 0..size * 2 {
                let mentor = &names[rng.gen_range(0..size)];
                let disciple = &names[rng.gen_range(0..size)];
                link(&mut graph, mentor, disciple);
            }

            let scores = scorer().rank(&graph);
            assert_eq!(scores.len(), size);

            let mut ranks: Vec<usize> = scores.iter().map(|s| s.rank).collect();
            ranks.sort_unstable();
            assert_eq!(ranks, (1..=size).collect::<Vec<_>>());

            for pair in scores.windows(2) {
                assert!(pair[0].composite >= pair[1].composite);
                assert!(pair[0].rank < pair[1].rank);
            }

            for s in &scores {
                for value in [s.direct_success, s.disciple_success, s.tree_depth, s.tree_breadth, s.longevity, s.composite] {
                    assert!((0.0..=100.0).contains(&value), "{} out of range", value);
                }
            }
        }
    }
}
