//! Cycle-safe walks over disciple edges
//!
//! Paths are kept in an append-only arena: every link points at its parent
//! link, so extending a path never changes what a sibling branch sees. A
//! coach is skipped only when it already appears on the current path, which
//! lets cousin branches pass through the same coach.

use crate::graph::LineageGraph;
use std::collections::{HashSet, VecDeque};

/// Handle to one path stored in a [`PathArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathId(usize);

#[derive(Debug, Clone, Copy)]
struct PathLink {
    node: usize,
    parent: Option<PathId>,
}

/// Append-only store of immutable paths
#[derive(Debug, Default)]
pub struct PathArena {
    links: Vec<PathLink>,
}

impl PathArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a path at `node`
    pub fn root(&mut self, node: usize) -> PathId {
        self.push(PathLink { node, parent: None })
    }

    /// New path equal to `path` followed by `node`; `path` itself is unchanged
    pub fn extend(&mut self, path: PathId, node: usize) -> PathId {
        self.push(PathLink { node, parent: Some(path) })
    }

    /// Whether `node` appears anywhere on `path`
    pub fn contains(&self, path: PathId, node: usize) -> bool {
        let mut cursor = Some(path);
        while let Some(PathId(at)) = cursor {
            let link = self.links[at];
            if link.node == node {
                return true;
            }
            cursor = link.parent;
        }
        false
    }

    fn push(&mut self, link: PathLink) -> PathId {
        self.links.push(link);
        PathId(self.links.len() - 1)
    }
}

/// Visit every simple disciple path from `start`, up to `max_generation`.
///
/// `visit(position, generation)` is called once per path step; a coach
/// reachable along two different paths is visited twice. Direct disciples
/// are generation 1.
pub fn walk_descendants<F>(graph: &LineageGraph, start: usize, max_generation: usize, mut visit: F)
where
    F: FnMut(usize, usize),
{
    if max_generation == 0 {
        return;
    }

    let mut arena = PathArena::new();
    let root = arena.root(start);

    // (coach, generation, path leading to its mentor)
    let mut stack: Vec<(usize, usize, PathId)> = graph
        .disciple_positions(start)
        .rev()
        .map(|disciple| (disciple, 1, root))
        .collect();

    while let Some((node, generation, parent_path)) = stack.pop() {
        if arena.contains(parent_path, node) {
            continue;
        }

        visit(node, generation);

        if generation < max_generation {
            let path = arena.extend(parent_path, node);
            stack.extend(
                graph
                    .disciple_positions(node)
                    .rev()
                    .map(|disciple| (disciple, generation + 1, path)),
            );
        }
    }
}

/// Distinct coaches reachable through disciple edges, excluding `start`
pub fn reachable_descendants(graph: &LineageGraph, start: usize) -> HashSet<usize> {
    let mut seen = HashSet::new();
    let mut queue: VecDeque<usize> = graph.disciple_positions(start).collect();

    while let Some(node) = queue.pop_front() {
        if node == start || !seen.insert(node) {
            continue;
        }
        queue.extend(graph.disciple_positions(node));
    }

    seen
}
