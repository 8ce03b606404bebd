//! Lineage graph representation
//!
//! Provides the in-memory coaching graph. Edges live in a single store;
//! the mentor -> disciple and disciple -> mentor indexes are derived views
//! maintained only by [`LineageGraph::add_edge`], so the mirrored adjacency
//! lists of the persisted shape can never disagree.

use crate::model::{Coach, CoachId, CoachRecord, RelationshipEdge, Sport};
use coachtree_common::errors::{AppError, Result};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// What [`LineageGraph::apply_record`] changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedRecord {
    /// False when an existing coach was replaced
    pub created: bool,
    /// Listed edges that were not already present
    pub edges_added: usize,
}

/// In-memory coaching lineage graph
#[derive(Debug, Clone, Default)]
pub struct LineageGraph {
    /// Coach nodes, addressed by position
    coaches: Vec<Coach>,

    /// id -> position in `coaches`
    index: HashMap<CoachId, usize>,

    /// The single edge store
    edges: Vec<RelationshipEdge>,

    /// Forward index: coach position -> edges where the coach is the mentor
    outgoing: Vec<Vec<usize>>,

    /// Reverse index: coach position -> edges where the coach is the disciple
    incoming: Vec<Vec<usize>>,

    /// (mentor, disciple) positions already linked
    pairs: HashSet<(usize, usize)>,
}

impl LineageGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from coaches with no edges
    pub fn from_coaches(coaches: impl IntoIterator<Item = Coach>) -> Self {
        let mut graph = Self::new();
        for coach in coaches {
            graph.insert_coach(coach);
        }
        graph
    }

    /// Build a graph from persisted records.
    ///
    /// Edges are read from both adjacency lists and de-duplicated per
    /// mentor/disciple pair. References to coaches outside the record set
    /// are dropped.
    pub fn from_records(records: impl IntoIterator<Item = CoachRecord>) -> Self {
        let mut graph = Self::new();
        let mut pending = Vec::new();

        for record in records {
            pending.extend(record.mentors);
            pending.extend(record.disciples);
            graph.insert_coach(record.coach);
        }

        let mut dangling = 0usize;
        for edge in pending {
            if !graph.contains(edge.mentor_id.as_str()) || !graph.contains(edge.disciple_id.as_str()) {
                dangling += 1;
                continue;
            }

            if let Some(existing) = graph.edge_between(edge.mentor_id.as_str(), edge.disciple_id.as_str()) {
                if existing != &edge {
                    warn!(
                        mentor = %edge.mentor_id,
                        disciple = %edge.disciple_id,
                        "Mirrored edge copies disagree, keeping the first"
                    );
                }
                continue;
            }

            graph.add_edge(edge);
        }

        if dangling > 0 {
            warn!(dangling, "Dropped edges referencing coaches outside the population");
        }

        debug!(
            coaches = graph.node_count(),
            edges = graph.edge_count(),
            "Lineage graph built from records"
        );

        graph
    }

    /// Insert a coach, replacing any coach with the same id. Edges are kept.
    pub fn insert_coach(&mut self, coach: Coach) -> usize {
        if let Some(&position) = self.index.get(coach.id.as_str()) {
            self.coaches[position] = coach;
            return position;
        }

        let position = self.coaches.len();
        self.index.insert(coach.id.clone(), position);
        self.coaches.push(coach);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        position
    }

    /// Upsert one coach together with the edges its record lists.
    ///
    /// Every listed edge must involve the record's coach on the expected
    /// side and point at a coach already in the graph. All edges are checked
    /// before anything changes, so a rejected record leaves the graph as it
    /// was. Existing edges of a replaced coach are kept.
    pub fn apply_record(&mut self, record: CoachRecord) -> Result<AppliedRecord> {
        let id = record.coach.id.clone();

        for edge in &record.mentors {
            self.check_listed_edge(&id, edge, &edge.disciple_id, &edge.mentor_id, "mentors")?;
        }
        for edge in &record.disciples {
            self.check_listed_edge(&id, edge, &edge.mentor_id, &edge.disciple_id, "disciples")?;
        }

        let created = !self.contains(id.as_str());
        self.insert_coach(record.coach);

        let edges_added = record
            .mentors
            .into_iter()
            .chain(record.disciples)
            .map(|edge| self.add_edge(edge))
            .filter(|&added| added)
            .count();

        debug!(coach = %id, created, edges_added, "Coach record applied");
        Ok(AppliedRecord { created, edges_added })
    }

    /// `own` must be the record's coach and `other` a known, different coach
    fn check_listed_edge(
        &self,
        id: &CoachId,
        edge: &RelationshipEdge,
        own: &CoachId,
        other: &CoachId,
        list: &str,
    ) -> Result<()> {
        if own != id || other == id {
            return Err(AppError::InvalidFormat {
                message: format!(
                    "{} entry {} -> {} must link {} to another coach",
                    list, edge.mentor_id, edge.disciple_id, id
                ),
            });
        }
        if !self.contains(other.as_str()) {
            return Err(AppError::CoachNotFound { id: other.to_string() });
        }
        Ok(())
    }

    /// Add a mentor -> disciple edge.
    ///
    /// Returns false for self-loops, unknown endpoints, or a pair that is
    /// already linked.
    pub fn add_edge(&mut self, edge: RelationshipEdge) -> bool {
        if edge.mentor_id == edge.disciple_id {
            return false;
        }

        let (Some(mentor), Some(disciple)) = (
            self.index_of(edge.mentor_id.as_str()),
            self.index_of(edge.disciple_id.as_str()),
        ) else {
            return false;
        };

        if !self.pairs.insert((mentor, disciple)) {
            return false;
        }

        let position = self.edges.len();
        self.edges.push(edge);
        self.outgoing[mentor].push(position);
        self.incoming[disciple].push(position);
        true
    }

    /// Look up a coach by id
    pub fn coach(&self, id: &str) -> Option<&Coach> {
        self.index_of(id).map(|position| &self.coaches[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All coaches in insertion order
    pub fn coaches(&self) -> &[Coach] {
        &self.coaches
    }

    /// All edges in insertion order
    pub fn edges(&self) -> &[RelationshipEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.coaches.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coaches.is_empty()
    }

    /// Edges where `id` is the mentor
    pub fn disciples<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a RelationshipEdge> + 'a {
        let edges = self
            .index_of(id)
            .map(|position| self.outgoing[position].as_slice())
            .unwrap_or(&[]);
        edges.iter().map(move |&edge| &self.edges[edge])
    }

    /// Edges where `id` is the disciple
    pub fn mentors<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a RelationshipEdge> + 'a {
        let edges = self
            .index_of(id)
            .map(|position| self.incoming[position].as_slice())
            .unwrap_or(&[]);
        edges.iter().map(move |&edge| &self.edges[edge])
    }

    /// The edge linking `mentor` to `disciple`, if any
    pub fn edge_between(&self, mentor: &str, disciple: &str) -> Option<&RelationshipEdge> {
        self.disciples(mentor)
            .find(|edge| edge.disciple_id.as_str() == disciple)
    }

    /// Get disciple count (outgoing edges)
    pub fn disciple_count(&self, id: &str) -> usize {
        self.disciples(id).count()
    }

    /// Get mentor count (incoming edges)
    pub fn mentor_count(&self, id: &str) -> usize {
        self.mentors(id).count()
    }

    /// Closed sub-population of coaches matching `keep`.
    ///
    /// Edges with an endpoint outside the subset are dropped, so the result
    /// never references an absent coach.
    pub fn subgraph<F>(&self, keep: F) -> LineageGraph
    where
        F: Fn(&Coach) -> bool,
    {
        let mut graph = LineageGraph::from_coaches(self.coaches.iter().filter(|c| keep(c)).cloned());
        for edge in &self.edges {
            graph.add_edge(edge.clone());
        }
        graph
    }

    /// Sub-population for one sport
    pub fn for_sport(&self, sport: Sport) -> LineageGraph {
        self.subgraph(|coach| coach.sport == sport)
    }

    /// Persisted shape of one coach, with both adjacency lists materialized
    pub fn record(&self, id: &str) -> Option<CoachRecord> {
        let coach = self.coach(id)?;
        Some(CoachRecord {
            coach: coach.clone(),
            mentors: self.mentors(id).cloned().collect(),
            disciples: self.disciples(id).cloned().collect(),
        })
    }

    /// Persisted shape of every coach
    pub fn to_records(&self) -> Vec<CoachRecord> {
        self.coaches
            .iter()
            .filter_map(|coach| self.record(coach.id.as_str()))
            .collect()
    }

    /// SHA-256 digest identifying this exact population.
    ///
    /// Coaches and edges are hashed in canonical (sorted) order, so two
    /// graphs built in different insertion orders share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut coaches: Vec<&Coach> = self.coaches.iter().collect();
        coaches.sort_by(|a, b| a.id.cmp(&b.id));

        let mut edges: Vec<&RelationshipEdge> = self.edges.iter().collect();
        edges.sort_by(|a, b| {
            (&a.mentor_id, &a.disciple_id).cmp(&(&b.mentor_id, &b.disciple_id))
        });

        let mut hasher = Sha256::new();
        for coach in coaches {
            // Plain structs and enums: serialization cannot fail
            hasher.update(serde_json::to_vec(coach).unwrap_or_default());
            hasher.update([0u8]);
        }
        hasher.update([1u8]);
        for edge in edges {
            hasher.update(serde_json::to_vec(edge).unwrap_or_default());
            hasher.update([0u8]);
        }

        hex::encode(hasher.finalize())
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub(crate) fn coach_at(&self, position: usize) -> &Coach {
        &self.coaches[position]
    }

    /// Positions of the direct disciples of the coach at `position`
    pub(crate) fn disciple_positions(&self, position: usize) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.outgoing[position]
            .iter()
            .filter_map(move |&edge| self.index_of(self.edges[edge].disciple_id.as_str()))
    }

    /// Positions of the direct mentors of the coach at `position`
    pub(crate) fn mentor_positions(&self, position: usize) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.incoming[position]
            .iter()
            .filter_map(move |&edge| self.index_of(self.edges[edge].mentor_id.as_str()))
    }
}
