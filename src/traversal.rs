//! Graph traversal iterator strategies sharing a common
//! `current`/`advance`/`at_end` contract (spec §4.C): breadth-first,
//! depth-first, a depth-first variant that can rewind one step
//! (`Backtracker`), and `Haplotyper`, which walks a single forward path
//! through the graph by picking among out-neighbours.
//!
//! Grounded on `original_source/src/graph_iter.hpp` (the shared
//! `GraphIter<TGraph, TSpec>` contract: `operator*`/`operator++`/`at_end`,
//! and `operator--` for the backtracking variant) and
//! `original_source/src/graph.hpp`'s `random_adjacent`/`least_covered_adjacent`
//! for the Haplotyper's neighbour-selection rules.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;

use crate::graph::{Graph, NodeId};
use crate::path::PathSet;

/// Shared contract for every traversal strategy below (spec §4.C: "Reset
/// takes a start node id and optional seed"). Iterators that carry no
/// randomness ignore `seed`; `Haplotyper` reseeds its PRNG from it so a run
/// is reproducible when the caller supplies one (spec §5: "PRNG:
/// thread-local; seed passed explicitly to `haplotyper.reset(start,
/// seed)`").
pub trait GraphIter {
    fn current(&self) -> Option<NodeId>;
    fn advance(&mut self);
    fn reset(&mut self, start: NodeId, seed: Option<u64>);
    fn at_end(&self) -> bool {
        self.current().is_none()
    }
}

/// Breadth-first traversal, visiting each node once.
pub struct Bfs<'g> {
    graph: &'g dyn Graph,
    queue: VecDeque<NodeId>,
    visited: FxHashSet<NodeId>,
    current: Option<NodeId>,
}

impl<'g> Bfs<'g> {
    pub fn new(graph: &'g dyn Graph, start: NodeId) -> Self {
        let mut visited = FxHashSet::default();
        visited.insert(start);
        let mut bfs = Bfs {
            graph,
            queue: VecDeque::new(),
            visited,
            current: Some(start),
        };
        bfs.enqueue_neighbours(start);
        bfs
    }

    fn enqueue_neighbours(&mut self, id: NodeId) {
        let mut next = Vec::new();
        self.graph.for_each_edges_out(id, &mut |to| {
            next.push(to);
            true
        });
        for n in next {
            if self.visited.insert(n) {
                self.queue.push_back(n);
            }
        }
    }
}

impl<'g> GraphIter for Bfs<'g> {
    fn current(&self) -> Option<NodeId> {
        self.current
    }

    fn advance(&mut self) {
        self.current = self.queue.pop_front();
        if let Some(id) = self.current {
            self.enqueue_neighbours(id);
        }
    }

    /// Carries no randomness; `seed` is accepted for trait uniformity and
    /// ignored.
    fn reset(&mut self, start: NodeId, _seed: Option<u64>) {
        self.queue.clear();
        self.visited.clear();
        self.visited.insert(start);
        self.current = Some(start);
        self.enqueue_neighbours(start);
    }
}

/// Depth-first traversal, visiting each node once.
pub struct Dfs<'g> {
    graph: &'g dyn Graph,
    stack: Vec<NodeId>,
    visited: FxHashSet<NodeId>,
    current: Option<NodeId>,
}

impl<'g> Dfs<'g> {
    pub fn new(graph: &'g dyn Graph, start: NodeId) -> Self {
        let mut visited = FxHashSet::default();
        visited.insert(start);
        Dfs {
            graph,
            stack: Vec::new(),
            visited,
            current: Some(start),
        }
    }

    fn push_neighbours(&mut self, id: NodeId) {
        let mut next = Vec::new();
        self.graph.for_each_edges_out(id, &mut |to| {
            next.push(to);
            true
        });
        for n in next.into_iter().rev() {
            if !self.visited.contains(&n) {
                self.stack.push(n);
            }
        }
    }
}

impl<'g> GraphIter for Dfs<'g> {
    fn current(&self) -> Option<NodeId> {
        self.current
    }

    fn advance(&mut self) {
        if let Some(id) = self.current {
            self.push_neighbours(id);
        }
        loop {
            match self.stack.pop() {
                None => {
                    self.current = None;
                    return;
                }
                Some(n) if self.visited.insert(n) => {
                    self.current = Some(n);
                    return;
                }
                Some(_) => continue,
            }
        }
    }

    /// Carries no randomness; `seed` is accepted for trait uniformity and
    /// ignored.
    fn reset(&mut self, start: NodeId, _seed: Option<u64>) {
        self.stack.clear();
        self.visited.clear();
        self.visited.insert(start);
        self.current = Some(start);
    }
}

/// Depth-first traversal that records its path of nodes so it can rewind
/// one step (`rewind`), matching `GraphIter::operator--` in the original.
/// Unlike `Dfs`, nodes are not deduplicated across branches: the caller
/// (the starting-loci selector, spec §4.F) explores and backs out of dead
/// ends, so the same node may be legitimately revisited after a rewind.
pub struct Backtracker<'g> {
    graph: &'g dyn Graph,
    /// `history[i]` is `(node, sibling_candidates_remaining_after_node)`.
    history: Vec<(NodeId, Vec<NodeId>)>,
    current: Option<NodeId>,
}

impl<'g> Backtracker<'g> {
    pub fn new(graph: &'g dyn Graph, start: NodeId) -> Self {
        Backtracker {
            graph,
            history: Vec::new(),
            current: Some(start),
        }
    }

    /// Depth of the current path (number of edges traversed so far).
    pub fn depth(&self) -> usize {
        self.history.len()
    }

    /// Step back to the previous node, restoring it as current. Returns
    /// `false` if there is no history to rewind into.
    pub fn rewind(&mut self) -> bool {
        match self.history.pop() {
            Some((prev, _)) => {
                self.current = Some(prev);
                true
            }
            None => {
                self.current = None;
                false
            }
        }
    }
}

impl<'g> GraphIter for Backtracker<'g> {
    fn current(&self) -> Option<NodeId> {
        self.current
    }

    fn advance(&mut self) {
        let Some(id) = self.current else { return };
        let mut candidates = Vec::new();
        self.graph.for_each_edges_out(id, &mut |to| {
            candidates.push(to);
            true
        });
        match candidates.pop() {
            Some(next) => {
                self.history.push((id, candidates));
                self.current = Some(next);
            }
            None => {
                self.current = None;
            }
        }
    }

    /// Carries no randomness; `seed` is accepted for trait uniformity and
    /// ignored.
    fn reset(&mut self, start: NodeId, _seed: Option<u64>) {
        self.history.clear();
        self.current = Some(start);
    }
}

/// Selection rule used by the `Haplotyper` strategy at each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaplotyperStrategy {
    /// Uniformly random out-neighbour.
    Random,
    /// Least-covered out-neighbour by single-node coverage; falls back to
    /// `Random` when every candidate is equally covered.
    Global,
    /// Like `Global`, but coverage is computed over the whole tail walked
    /// so far plus the candidate, not just the candidate node alone.
    Local,
}

/// Haplotyper: walks a single forward path through the graph, choosing the
/// next node among out-neighbours per `HaplotyperStrategy`. Grounded on
/// `original_source/src/graph.hpp::random_adjacent` /
/// `least_covered_adjacent` (both overloads).
pub struct Haplotyper<'g> {
    graph: &'g dyn Graph,
    paths: &'g PathSet,
    strategy: HaplotyperStrategy,
    tail: Vec<NodeId>,
    current: Option<NodeId>,
    /// Thread-local PRNG (spec §5), explicitly reseeded by `reset`.
    rng: StdRng,
}

impl<'g> Haplotyper<'g> {
    /// Seeds the PRNG from the process-global thread-local `rand::rng()`
    /// so two `Haplotyper`s built without an explicit `reset` still differ;
    /// call `reset(start, Some(seed))` for a reproducible run (spec §5).
    pub fn new(graph: &'g dyn Graph, paths: &'g PathSet, strategy: HaplotyperStrategy, start: NodeId) -> Self {
        Haplotyper {
            graph,
            paths,
            strategy,
            tail: vec![start],
            current: Some(start),
            rng: StdRng::seed_from_u64(rand::rng().random()),
        }
    }

    fn pick_random(&mut self, candidates: &[NodeId]) -> Option<NodeId> {
        if candidates.is_empty() {
            return None;
        }
        let idx = self.rng.random_range(0..candidates.len());
        Some(candidates[idx])
    }

    /// Least-covered-adjacent by single-node path coverage (`Global`).
    fn pick_global(&mut self, candidates: &[NodeId]) -> Option<NodeId> {
        let values: Vec<usize> = candidates.iter().map(|&c| self.paths.path_coverage(c)).collect();
        self.pick_least_covered(candidates, &values)
    }

    /// Least-covered-adjacent by whole-tail coverage (`Local`).
    fn pick_local(&mut self, candidates: &[NodeId]) -> Option<NodeId> {
        let values: Vec<usize> = candidates
            .iter()
            .map(|&c| {
                let mut tail = self.tail.clone();
                tail.push(c);
                self.paths.path_coverage_of_tail(&tail)
            })
            .collect();
        self.pick_least_covered(candidates, &values)
    }

    fn pick_least_covered(&mut self, candidates: &[NodeId], values: &[usize]) -> Option<NodeId> {
        if candidates.is_empty() {
            return None;
        }
        let mut lc_id = None;
        let mut lc_value: Option<usize> = None;
        let mut equally_covered = true;
        for (&c, &value) in candidates.iter().zip(values) {
            if let Some(prev) = lc_value {
                if equally_covered && prev != value {
                    equally_covered = false;
                }
            }
            if lc_value.is_none() || value < lc_value.unwrap() {
                lc_id = Some(c);
                lc_value = Some(value);
            }
        }
        if equally_covered {
            self.pick_random(candidates)
        } else {
            lc_id
        }
    }
}

impl<'g> GraphIter for Haplotyper<'g> {
    fn current(&self) -> Option<NodeId> {
        self.current
    }

    fn advance(&mut self) {
        let Some(id) = self.current else { return };
        let mut candidates = Vec::new();
        self.graph.for_each_edges_out(id, &mut |to| {
            candidates.push(to);
            true
        });
        let next = match self.strategy {
            HaplotyperStrategy::Random => self.pick_random(&candidates),
            HaplotyperStrategy::Global => self.pick_global(&candidates),
            HaplotyperStrategy::Local => self.pick_local(&candidates),
        };
        self.current = next;
        if let Some(n) = next {
            self.tail.push(n);
        }
    }

    /// Reseeds the PRNG from `seed` when given (spec §5: "seed passed
    /// explicitly to `haplotyper.reset(start, seed)`"), otherwise draws a
    /// fresh one from the thread-local generator.
    fn reset(&mut self, start: NodeId, seed: Option<u64>) {
        self.tail = vec![start];
        self.current = Some(start);
        self.rng = StdRng::seed_from_u64(seed.unwrap_or_else(|| rand::rng().random()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SeqGraph;

    fn diamond() -> SeqGraph {
        SeqGraph::new(
            vec![
                (1, b"A".to_vec()),
                (2, b"C".to_vec()),
                (3, b"G".to_vec()),
                (4, b"T".to_vec()),
            ],
            &[(1, 2), (1, 3), (2, 4), (3, 4)],
        )
    }

    #[test]
    fn bfs_visits_every_node_exactly_once() {
        let g = diamond();
        let mut it = Bfs::new(&g, 1);
        let mut seen = vec![it.current().unwrap()];
        while !it.at_end() {
            it.advance();
            if let Some(c) = it.current() {
                seen.push(c);
            }
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3, 4]);

        it.advance();
        assert!(it.at_end());
        it.reset(1, None);
        assert_eq!(it.current(), Some(1));
        assert!(!it.at_end());
    }

    #[test]
    fn dfs_visits_every_node_exactly_once() {
        let g = diamond();
        let mut it = Dfs::new(&g, 1);
        let mut seen = vec![it.current().unwrap()];
        while !it.at_end() {
            it.advance();
            if let Some(c) = it.current() {
                seen.push(c);
            }
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3, 4]);
    }

    #[test]
    fn backtracker_rewinds_to_the_previous_node() {
        let g = diamond();
        let mut it = Backtracker::new(&g, 1);
        assert_eq!(it.current(), Some(1));
        it.advance();
        let second = it.current().unwrap();
        assert!(second == 2 || second == 3);
        assert!(it.rewind());
        assert_eq!(it.current(), Some(1));
        assert!(!it.rewind());
        assert_eq!(it.current(), None);
    }

    #[test]
    fn haplotyper_global_prefers_least_covered_neighbour() {
        let g = diamond();
        let mut paths = PathSet::new();
        paths.mark_reverse_complemented();
        let p = crate::path::Path::new(&g, vec![1, 2, 4], vec![crate::graph::Orientation::Forward; 3]);
        paths.add_path(p);
        let mut hap = Haplotyper::new(&g, &paths, HaplotyperStrategy::Global, 1);
        hap.advance();
        // node 3 has coverage 0, node 2 has coverage 1: least covered is 3.
        assert_eq!(hap.current(), Some(3));
    }

    #[test]
    fn haplotyper_reset_with_same_seed_reproduces_the_same_walk() {
        // two out-neighbours of node 1 are equally covered (coverage 0
        // each), so `Random` tie-break applies; reseeding with the same
        // seed after `reset` must replay the same choice.
        let g = diamond();
        let paths = PathSet::new();
        let mut hap = Haplotyper::new(&g, &paths, HaplotyperStrategy::Random, 1);
        hap.reset(1, Some(42));
        hap.advance();
        let first = hap.current();

        hap.reset(1, Some(42));
        hap.advance();
        let second = hap.current();

        assert_eq!(first, second);
    }
}
