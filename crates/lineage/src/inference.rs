//! Relationship inference from overlapping tenures
//!
//! A coach is a disciple of another when both held a post at the same
//! organization in overlapping years, the mentor as head coach and the
//! disciple in any other role. At most one edge is recorded per ordered
//! pair; the first overlapping tenure pair wins.

use crate::graph::LineageGraph;
use crate::model::{Coach, RelationshipEdge, RelationshipRole};
use coachtree_common::metrics;
use tracing::{debug, info};

/// Infers mentor -> disciple edges from career histories
#[derive(Debug, Clone, Copy)]
pub struct RelationshipInferrer {
    /// Year open-ended tenures resolve to
    current_year: i32,
}

impl RelationshipInferrer {
    pub fn new(current_year: i32) -> Self {
        Self { current_year }
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    /// Edge from `mentor` to `disciple`, if their tenures support one
    pub fn infer_pair(&self, disciple: &Coach, mentor: &Coach) -> Option<RelationshipEdge> {
        if disciple.id == mentor.id {
            return None;
        }

        for disciple_tenure in &disciple.tenures {
            for mentor_tenure in &mentor.tenures {
                if disciple_tenure.organization != mentor_tenure.organization {
                    continue;
                }
                if !mentor_tenure.is_head_coach() {
                    continue;
                }
                // Two concurrent head coaches are peers, not mentor and disciple
                if disciple_tenure.is_head_coach() {
                    continue;
                }

                let Some(years) = disciple_tenure
                    .years
                    .overlap(&mentor_tenure.years, self.current_year)
                else {
                    continue;
                };

                return Some(RelationshipEdge {
                    mentor_id: mentor.id.clone(),
                    disciple_id: disciple.id.clone(),
                    organization: disciple_tenure.organization.clone(),
                    years,
                    role: RelationshipRole::classify(&disciple_tenure.role),
                });
            }
        }

        None
    }

    /// Every edge supported by the given career histories
    pub fn infer(&self, coaches: &[Coach]) -> Vec<RelationshipEdge> {
        let mut edges = Vec::new();

        for disciple in coaches {
            if disciple.tenures.is_empty() {
                continue;
            }
            for mentor in coaches {
                if let Some(edge) = self.infer_pair(disciple, mentor) {
                    debug!(
                        mentor = %edge.mentor_id,
                        disciple = %edge.disciple_id,
                        organization = %edge.organization,
                        "Relationship inferred"
                    );
                    edges.push(edge);
                }
            }
        }

        edges
    }

    /// Infer edges over the graph's coaches and add them.
    ///
    /// Returns the number of new edges; pairs that are already linked are
    /// left untouched.
    pub fn link(&self, graph: &mut LineageGraph) -> usize {
        let inferred = self.infer(graph.coaches());
        let candidates = inferred.len();

        let added = inferred
            .into_iter()
            .map(|edge| graph.add_edge(edge))
            .filter(|added| *added)
            .count();

        info!(
            coaches = graph.node_count(),
            candidates,
            added,
            current_year = self.current_year,
            "Relationship inference complete"
        );
        metrics::record_inference(added);

        added
    }
}
