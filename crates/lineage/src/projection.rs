//! Bounded tree projection for display
//!
//! Builds one root-centred tree: descendants below through disciple edges,
//! ancestors above through mentor edges. Parent nodes never expand their own
//! children and child nodes never expand their own parents, so the result is
//! a tree even when the underlying graph is not.

use crate::graph::LineageGraph;
use crate::influence::InfluenceScore;
use crate::model::{CoachId, Sport};
use crate::traversal::{PathArena, PathId};
use coachtree_common::metrics;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// One coach in a projected tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedNode {
    pub id: CoachId,
    pub name: String,
    pub role: String,
    pub years_active: String,
    pub score: f64,
    pub is_active: bool,
    pub sport: Sport,
    pub championships: u32,
    pub children: Vec<ProjectedNode>,
    pub parents: Vec<ProjectedNode>,
}

impl ProjectedNode {
    /// Nodes in this projection, including `self`
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(ProjectedNode::size).sum::<usize>()
            + self.parents.iter().map(ProjectedNode::size).sum::<usize>()
    }

    /// Generations below this node
    pub fn descendant_depth(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_depth())
            .max()
            .unwrap_or(0)
    }

    /// Generations above this node
    pub fn ancestor_depth(&self) -> usize {
        self.parents
            .iter()
            .map(|parent| 1 + parent.ancestor_depth())
            .max()
            .unwrap_or(0)
    }
}

/// Projects trees out of a lineage graph, annotated with composite scores
pub struct TreeProjector<'a> {
    graph: &'a LineageGraph,
    scores: HashMap<&'a str, f64>,
}

impl<'a> TreeProjector<'a> {
    pub fn new(graph: &'a LineageGraph) -> Self {
        Self {
            graph,
            scores: HashMap::new(),
        }
    }

    /// Annotate nodes with these composite scores; coaches without one get 0
    pub fn with_scores(mut self, scores: &'a [InfluenceScore]) -> Self {
        self.scores = scores
            .iter()
            .map(|score| (score.coach_id.as_str(), score.composite))
            .collect();
        self
    }

    /// Tree rooted at `root` with up to `ancestors` generations above and
    /// `descendants` generations below. `None` when the root is unknown.
    pub fn project(&self, root: &str, ancestors: usize, descendants: usize) -> Option<ProjectedNode> {
        let position = self.graph.index_of(root)?;

        let mut node = self.node(position);

        // A coach is placed at most once in the descending pass
        let mut placed = HashSet::from([position]);
        node.children = self.descend(position, descendants, &mut placed);

        // Upward, a mentor is skipped if it was placed below or repeats along
        // its own ancestor path; the root stays excluded through both
        let mut arena = PathArena::new();
        let path = arena.root(position);
        node.parents = self.ascend(position, ancestors, &placed, &mut arena, path);

        let size = node.size();
        debug!(root, ancestors, descendants, nodes = size, "Tree projected");
        metrics::record_projection(size);

        Some(node)
    }

    fn descend(&self, position: usize, budget: usize, placed: &mut HashSet<usize>) -> Vec<ProjectedNode> {
        if budget == 0 {
            return Vec::new();
        }

        let mut children = Vec::new();
        for disciple in self.graph.disciple_positions(position) {
            if !placed.insert(disciple) {
                continue;
            }
            let mut child = self.node(disciple);
            child.children = self.descend(disciple, budget - 1, placed);
            children.push(child);
        }
        children
    }

    fn ascend(
        &self,
        position: usize,
        budget: usize,
        placed: &HashSet<usize>,
        arena: &mut PathArena,
        path: PathId,
    ) -> Vec<ProjectedNode> {
        if budget == 0 {
            return Vec::new();
        }

        let mut parents = Vec::new();
        for mentor in self.graph.mentor_positions(position) {
            if placed.contains(&mentor) || arena.contains(path, mentor) {
                continue;
            }
            let extended = arena.extend(path, mentor);
            let mut parent = self.node(mentor);
            parent.parents = self.ascend(mentor, budget - 1, placed, arena, extended);
            parents.push(parent);
        }
        parents
    }

    fn node(&self, position: usize) -> ProjectedNode {
        let coach = self.graph.coach_at(position);
        ProjectedNode {
            id: coach.id.clone(),
            name: coach.name.clone(),
            role: coach.display_role(),
            years_active: coach.active_years.to_string(),
            score: self.scores.get(coach.id.as_str()).copied().unwrap_or(0.0),
            is_active: coach.is_active(),
            sport: coach.sport,
            championships: coach.achievements.championships,
            children: Vec::new(),
            parents: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::influence::{InfluenceScorer, ScoringConfig};
    use crate::model::{ClosedSpan, Coach, RelationshipEdge, RelationshipRole, Tenure, YearSpan};

    fn graph(names: &[&str], links: &[(&str, &str)]) -> LineageGraph {
        let mut graph = LineageGraph::from_coaches(
            names.iter().map(|n| Coach::new(*n, Sport::Football, YearSpan::closed(1990, 2010))),
        );
        for (mentor, disciple) in links {
            graph.add_edge(RelationshipEdge {
                mentor_id: CoachId::from(*mentor),
                disciple_id: CoachId::from(*disciple),
                organization: "Team".to_string(),
                years: ClosedSpan { start: 1995, end: 1999 },
                role: RelationshipRole::Assistant,
            });
        }
        graph
    }

    fn ids(nodes: &[ProjectedNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.id.as_str()).collect()
    }

    fn all_ids(node: &ProjectedNode) -> Vec<&str> {
        let mut out = vec![node.id.as_str()];
        for next in node.children.iter().chain(node.parents.iter()) {
            out.extend(all_ids(next));
        }
        out
    }

    fn assert_unique(node: &ProjectedNode) {
        let ids = all_ids(node);
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len(), "repeated coach in {:?}", ids);
    }

    #[test]
    fn test_unknown_root_is_none() {
        let g = graph(&["a"], &[]);
        assert!(TreeProjector::new(&g).project("nobody", 3, 3).is_none());
    }

    #[test]
    fn test_isolated_root() {
        let g = graph(&["a"], &[]);
        let tree = TreeProjector::new(&g).project("a", 3, 3).unwrap();
        assert_eq!(tree.size(), 1);
        assert_eq!(tree.score, 0.0);
        assert_eq!(tree.years_active, "1990-2010");
        assert!(!tree.is_active);
        assert_eq!(tree.role, "Coach");
    }

    #[test]
    fn test_generation_limits() {
        let g = graph(
            &["a", "b", "c", "d", "e"],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("e", "a")],
        );
        let projector = TreeProjector::new(&g);

        let tree = projector.project("b", 1, 1).unwrap();
        assert_eq!(ids(&tree.children), vec!["c"]);
        assert!(tree.children[0].children.is_empty());
        assert_eq!(ids(&tree.parents), vec!["a"]);
        assert!(tree.parents[0].parents.is_empty());

        let deep = projector.project("b", 5, 5).unwrap();
        assert_eq!(deep.descendant_depth(), 2);
        assert_eq!(deep.ancestor_depth(), 2);

        let flat = projector.project("b", 0, 0).unwrap();
        assert_eq!(flat.size(), 1);
    }

    #[test]
    fn test_expanded_nodes_only_grow_outward() {
        // b is a's disciple; c is b's other mentor
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("c", "b")]);
        let tree = TreeProjector::new(&g).project("a", 3, 3).unwrap();

        assert_eq!(ids(&tree.children), vec!["b"]);
        assert!(tree.children[0].parents.is_empty());
        assert!(tree.parents.is_empty());
    }

    #[test]
    fn test_cycle_terminates() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let projector = TreeProjector::new(&g);

        for root in ["a", "b", "c"] {
            let tree = projector.project(root, 10, 10).unwrap();
            assert_eq!(tree.descendant_depth(), 2);
            assert_eq!(tree.ancestor_depth(), 0);
            assert_eq!(tree.size(), 3);
            assert_unique(&tree);
        }

        // Without a descending pass the whole cycle shows up as ancestors
        let up = projector.project("a", 10, 0).unwrap();
        assert_eq!(all_ids(&up), vec!["a", "c", "b"]);
        assert_unique(&up);
    }

    #[test]
    fn test_mentor_who_is_also_a_disciple_appears_once() {
        let g = graph(&["r", "x"], &[("r", "x"), ("x", "r")]);
        let projector = TreeProjector::new(&g);

        let tree = projector.project("r", 5, 5).unwrap();
        assert_eq!(ids(&tree.children), vec!["x"]);
        assert!(tree.parents.is_empty());
        assert_unique(&tree);

        let up = projector.project("r", 5, 0).unwrap();
        assert_eq!(ids(&up.parents), vec!["x"]);
        assert!(up.parents[0].parents.is_empty());
        assert_eq!(up.size(), 2);
    }

    #[test]
    fn test_cycle_members_off_the_root_appear_once() {
        // b sits on a 3-cycle a -> b -> c -> a and also mentors d
        let g = graph(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("c", "a"), ("b", "d")],
        );
        let projector = TreeProjector::new(&g);

        for root in ["a", "b", "c", "d"] {
            for (up, down) in [(10, 10), (10, 0), (0, 10), (1, 1)] {
                assert_unique(&projector.project(root, up, down).unwrap());
            }
        }

        let tree = projector.project("d", 10, 10).unwrap();
        assert_eq!(all_ids(&tree), vec!["d", "b", "a", "c"]);
    }

    #[test]
    fn test_descending_pass_places_each_coach_once() {
        // Diamond: d is reachable through both b and c
        let g = graph(&["a", "b", "c", "d"], &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")]);
        let tree = TreeProjector::new(&g).project("a", 0, 5).unwrap();

        assert_eq!(tree.size(), 4);
        assert_eq!(ids(&tree.children[0].children), vec!["d"]);
        assert!(tree.children[1].children.is_empty());
    }

    #[test]
    fn test_ancestor_branches_do_not_block_each_other() {
        // Diamond upward: d has mentors b and c, who share mentor a
        let g = graph(&["a", "b", "c", "d"], &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")]);
        let tree = TreeProjector::new(&g).project("d", 5, 0).unwrap();

        assert_eq!(ids(&tree.parents), vec!["b", "c"]);
        assert_eq!(ids(&tree.parents[0].parents), vec!["a"]);
        assert_eq!(ids(&tree.parents[1].parents), vec!["a"]);
    }

    #[test]
    fn test_nodes_carry_scores_and_roles() {
        let mut g = graph(&["a", "b"], &[("a", "b")]);
        g.insert_coach(
            Coach::new("b", Sport::Football, YearSpan::open(2001))
                .with_tenure(Tenure::new("Team", YearSpan::closed(1995, 1999), "Linebackers Coach")),
        );
        g.insert_coach(Coach::new("a", Sport::Football, YearSpan::closed(1990, 2010)).with_current_team("Team"));

        let scores = InfluenceScorer::new(ScoringConfig::default().with_current_year(2024)).rank(&g);
        let tree = TreeProjector::new(&g).with_scores(&scores).project("a", 1, 1).unwrap();

        let expected = scores.iter().find(|s| s.coach_id.as_str() == "a").unwrap().composite;
        assert_eq!(tree.score, expected);
        assert_eq!(tree.role, "Head Coach, Team");

        let child = &tree.children[0];
        assert_eq!(child.role, "Linebackers Coach");
        assert_eq!(child.years_active, "2001-present");
        assert!(child.is_active);
    }
}
