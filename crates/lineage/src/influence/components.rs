//! Raw component scores
//!
//! Every component except disciple success is capped at [`SCORE_CAP`]
//! before population normalization.

use crate::graph::LineageGraph;
use crate::model::{Achievements, Coach};
use crate::traversal::{reachable_descendants, walk_descendants};

/// Ceiling for the capped raw components
pub const SCORE_CAP: f64 = 100.0;

/// Points per generation of the longest disciple chain
pub const DEPTH_POINTS_PER_GENERATION: f64 = 20.0;

/// Chains longer than this saturate the depth score
pub const DEPTH_SATURATION: usize = 5;

/// Championships, awards, playoffs, win rate, all-stars and trophies
pub fn direct_success(achievements: &Achievements) -> f64 {
    let raw = achievements.championships as f64 * 25.0
        + achievements.coach_of_year_awards as f64 * 15.0
        + achievements.playoff_appearances as f64 * 5.0
        + achievements.win_percentage * 30.0
        + achievements.all_star_selections as f64 * 2.0
        + achievements.major_trophies.unwrap_or(0) as f64 * 3.0;

    raw.min(SCORE_CAP)
}

/// Decayed direct success of every descendant along every simple path.
///
/// A descendant at generation `g` contributes `direct[d] * decay^g`. Paths
/// stop at `max_generation` or when a coach repeats. Not capped.
pub fn disciple_success(
    graph: &LineageGraph,
    position: usize,
    direct: &[f64],
    decay: f64,
    max_generation: usize,
) -> f64 {
    let mut total = 0.0;
    walk_descendants(graph, position, max_generation, |node, generation| {
        total += direct[node] * decay.powi(generation as i32);
    });
    total
}

/// Generations in the longest disciple chain, searched up to `cap`
pub fn longest_chain(graph: &LineageGraph, position: usize, cap: usize) -> usize {
    let mut longest = 0;
    walk_descendants(graph, position, cap, |_, generation| {
        longest = longest.max(generation);
    });
    longest
}

/// Longest chain at twenty points a generation
pub fn tree_depth(graph: &LineageGraph, position: usize) -> f64 {
    let chain = longest_chain(graph, position, DEPTH_SATURATION);
    (chain as f64 * DEPTH_POINTS_PER_GENERATION).min(SCORE_CAP)
}

/// Head-coach disciples weigh 10, every distinct descendant 0.5
pub fn tree_breadth(graph: &LineageGraph, position: usize) -> f64 {
    let mut direct: Vec<usize> = graph.disciple_positions(position).collect();
    direct.sort_unstable();
    direct.dedup();

    let head_coach_disciples = direct
        .iter()
        .filter(|&&disciple| graph.coach_at(disciple).has_head_coach_tenure())
        .count();
    let descendants = reachable_descendants(graph, position).len();

    (head_coach_disciples as f64 * 10.0 + descendants as f64 * 0.5).min(SCORE_CAP)
}

/// Head-coach years weigh 3, overall years active weigh 2
pub fn longevity(coach: &Coach, current_year: i32) -> f64 {
    let raw = coach.head_coach_years(current_year) as f64 * 3.0
        + coach.years_active(current_year) as f64 * 2.0;
    raw.min(SCORE_CAP)
}
