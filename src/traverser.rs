//! On-graph seeding state machine (spec §4.H): walks outward from a
//! starting locus, extending a read-index cursor one graph character at a
//! time, emitting a hit once the cursor has matched `k` characters.
//!
//! Grounded on `original_source/include/psi/traverser_base.hpp`'s `State`
//! shape (iterator/mismatches/start position/current position/depth/end
//! flag) and the BFS/DFS processing-order split in
//! `traverser_bfs.hpp`/`traverser_dfs.hpp`.

use crate::alphabet;
use crate::graph::{Graph, NodeId, Position};
use crate::read_index::{Occurrence, ReadCursor, ReadIndex};

/// One in-flight traversal state (spec §4.H `State`).
#[derive(Debug, Clone)]
struct State {
    cursor: ReadCursor,
    start: Position,
    node: NodeId,
    offset: u32,
    depth: u32,
    mismatches_left: u32,
    finished: bool,
}

/// A seed hit: a starting locus paired with one occurrence of its matched
/// k-length string in the read index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub locus: Position,
    pub occurrence: Occurrence,
}

/// Runs the on-graph state machine for one starting locus against one
/// read index, calling `on_hit` for every emitted hit (spec §4.H).
///
/// `mismatches` is the approximate-matching budget; the public finder
/// config only ever passes `0` (see `DESIGN.md`'s Open Question decision),
/// which makes every state exact-match-only, matching the original's
/// unused `ApproxMatching` alias.
pub struct Traverser<'a, G: Graph> {
    graph: &'a G,
    read_index: &'a ReadIndex,
    k: usize,
    mismatches: u32,
}

impl<'a, G: Graph> Traverser<'a, G> {
    pub fn new(graph: &'a G, read_index: &'a ReadIndex, k: usize, mismatches: u32) -> Self {
        Traverser {
            graph,
            read_index,
            k,
            mismatches,
        }
    }

    fn initial_state(&self, locus: Position) -> State {
        State {
            cursor: self.read_index.go_root(),
            start: locus,
            node: locus.node_id,
            offset: locus.offset,
            depth: 0,
            mismatches_left: self.mismatches,
            finished: false,
        }
    }

    /// `filter`: if `depth == k`, emit one hit per occurrence and retire
    /// the state. Returns `true` if the state was retired.
    fn filter(&self, state: &mut State, on_hit: &mut dyn FnMut(Hit)) -> bool {
        if state.depth as usize == self.k {
            for occurrence in self.read_index.get_occurrences(&state.cursor) {
                on_hit(Hit {
                    locus: state.start,
                    occurrence,
                });
            }
            state.finished = true;
            true
        } else {
            false
        }
    }

    /// `compute`: consume characters of the current node's label, trying
    /// to extend the read-index cursor at each step.
    fn compute(&self, state: &mut State) {
        let remaining = self.k - state.depth as usize;
        let label = self.graph.node_sequence(state.node);
        let mut consumed = 0;
        while consumed < remaining && (state.offset as usize) < label.len() {
            let c = label[state.offset as usize];
            if alphabet::is_ambiguous(c) {
                state.finished = true;
                return;
            }
            let next_cursor = self.read_index.go_down(&state.cursor, c);
            if next_cursor.count_occurrences() == 0 {
                if state.mismatches_left == 0 {
                    state.finished = true;
                    return;
                }
                state.mismatches_left -= 1;
            }
            state.cursor = next_cursor;
            state.offset += 1;
            state.depth += 1;
            consumed += 1;
        }
    }

    /// `advance`: if the node is exhausted but more depth is needed, spawn
    /// one child state per out-edge (returns the full list of successors;
    /// the caller keeps the first in place of `state` and pushes the
    /// rest).
    fn advance(&self, state: &State) -> Vec<State> {
        if (state.offset as usize) < self.graph.node_sequence(state.node).len() {
            return vec![state.clone()];
        }
        let mut children = Vec::new();
        self.graph.for_each_edges_out(state.node, &mut |to| {
            let mut child = state.clone();
            child.node = to;
            child.offset = 0;
            children.push(child);
            true
        });
        if children.is_empty() {
            // dead end before reaching depth k: drop the state.
            Vec::new()
        } else {
            children
        }
    }

    /// BFS variant: process all active states each round until none
    /// remain active.
    pub fn run_bfs(&self, locus: Position, on_hit: &mut dyn FnMut(Hit)) {
        let mut active = vec![self.initial_state(locus)];
        while !active.is_empty() {
            let mut next_round = Vec::new();
            for mut state in active {
                if self.filter(&mut state, on_hit) {
                    continue;
                }
                self.compute(&mut state);
                if state.finished {
                    continue;
                }
                if self.filter(&mut state, on_hit) {
                    continue;
                }
                next_round.extend(self.advance(&state));
            }
            active = next_round;
        }
    }

    /// DFS variant: process one state to completion (through every round
    /// of filter/compute/advance) before popping the next.
    pub fn run_dfs(&self, locus: Position, on_hit: &mut dyn FnMut(Hit)) {
        let mut stack = vec![self.initial_state(locus)];
        while let Some(mut state) = stack.pop() {
            if self.filter(&mut state, on_hit) {
                continue;
            }
            self.compute(&mut state);
            if state.finished {
                continue;
            }
            if self.filter(&mut state, on_hit) {
                continue;
            }
            stack.extend(self.advance(&state));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SeqGraph;

    fn diamond() -> SeqGraph {
        // 1:"AC" -> 2:"GT", 1 -> 3:"TT", both length 2.
        SeqGraph::new(
            vec![(1, b"AC".to_vec()), (2, b"GT".to_vec()), (3, b"TT".to_vec())],
            &[(1, 2), (1, 3)],
        )
    }

    #[test]
    fn bfs_and_dfs_emit_the_same_hits_for_a_branching_graph() {
        let g = diamond();
        let reads: Vec<&[u8]> = vec![b"ACGT", b"ACTT"];
        let ri = ReadIndex::build(&reads);
        let trav = Traverser::new(&g, &ri, 4, 0);

        let mut bfs_hits = Vec::new();
        trav.run_bfs(Position::new(1, 0), &mut |h| bfs_hits.push(h));

        let mut dfs_hits = Vec::new();
        trav.run_dfs(Position::new(1, 0), &mut |h| dfs_hits.push(h));

        assert_eq!(bfs_hits.len(), 2);
        assert_eq!(dfs_hits.len(), 2);
        let mut bfs_reads: Vec<u32> = bfs_hits.iter().map(|h| h.occurrence.read_id).collect();
        let mut dfs_reads: Vec<u32> = dfs_hits.iter().map(|h| h.occurrence.read_id).collect();
        bfs_reads.sort_unstable();
        dfs_reads.sort_unstable();
        assert_eq!(bfs_reads, vec![0, 1]);
        assert_eq!(dfs_reads, vec![0, 1]);
    }

    #[test]
    fn dead_end_before_k_drops_the_state_without_emitting() {
        let g = diamond();
        let reads: Vec<&[u8]> = vec![b"ACGTACGT"];
        let ri = ReadIndex::build(&reads);
        // k = 10 can never be reached: graph depth from node 1 is only 4.
        let trav = Traverser::new(&g, &ri, 10, 0);
        let mut hits = Vec::new();
        trav.run_bfs(Position::new(1, 0), &mut |h| hits.push(h));
        assert!(hits.is_empty());
    }
}
