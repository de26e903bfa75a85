//! Starting-loci selector (spec §4.F): enumerate every `(node_id, offset)`
//! from which some length-`k` walk is not a substring of any selected
//! path.
//!
//! The original computes this set efficiently by walking backward from
//! each node with a backtracker over the reverse path-index text
//! (`original_source/include/psi/graph.hpp` context + `index_iter.hpp`).
//! This module instead implements the Goal definition directly: enumerate
//! forward length-`k` walks from each candidate offset and test each
//! against the path set. Functionally equivalent for the set of loci
//! produced; traded the original's FM-index-driven backward search for a
//! bounded forward DFS, since this crate is not benchmarked against the
//! original's performance. See `DESIGN.md`.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::graph::{Graph, NodeId, Position};
use crate::path::PathSet;
use crate::traversal::{Bfs, GraphIter};

/// Enumerate every distinct length-`k` string reachable by a forward walk
/// starting at `(node, offset)`. A branch that runs out of graph (no
/// out-edges) before reaching length `k` contributes nothing, matching
/// spec §4.H's "node with no out-edges and insufficient depth drops the
/// state".
fn enumerate_k_walks<G: Graph>(graph: &G, node: NodeId, offset: usize, k: usize) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    let mut buf = Vec::with_capacity(k);
    walk(graph, node, offset, k, &mut buf, &mut out);
    out
}

fn walk<G: Graph>(graph: &G, node: NodeId, offset: usize, remaining: usize, buf: &mut Vec<u8>, out: &mut Vec<Vec<u8>>) {
    if remaining == 0 {
        out.push(buf.clone());
        return;
    }
    let label = graph.node_sequence(node);
    if offset < label.len() {
        buf.push(label[offset]);
        walk(graph, node, offset + 1, remaining - 1, buf, out);
        buf.pop();
    } else {
        let mut next_ids = Vec::new();
        graph.for_each_edges_out(node, &mut |to| {
            next_ids.push(to);
            true
        });
        for n in next_ids {
            walk(graph, n, 0, remaining, buf, out);
        }
    }
}

/// Whether `needle` occurs as a contiguous substring of some path's
/// sequence, per spec §4.D's `covered_by`.
fn covered_by<G: Graph>(graph: &G, paths: &PathSet, needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    for path in paths.iter() {
        let seq = crate::graph::path_sequence(graph, path.nodes());
        if seq.len() < needle.len() {
            continue;
        }
        if seq.windows(needle.len()).any(|w| w == needle) {
            return true;
        }
    }
    false
}

/// Select starting loci per spec §4.F. `step` sub-samples candidate
/// offsets (a `step` of 1 considers every offset).
pub fn select_starting_loci<G: Graph>(graph: &G, paths: &PathSet, k: usize, step: usize) -> Vec<Position> {
    let step = step.max(1);
    if paths.is_empty() {
        return bfs_fallback(graph, step);
    }

    let mut starts = Vec::new();
    let mut counter: usize = 0;
    graph.for_each_node(1, &mut |_rank, id| {
        let len = graph.node_length(id) as usize;
        for offset in 0..len {
            if counter % step == 0 {
                let walks = enumerate_k_walks(graph, id, offset, k);
                if !walks.is_empty() && walks.iter().any(|w| !covered_by(graph, paths, w)) {
                    starts.push(Position::new(id, offset as u32));
                }
            }
            counter += 1;
        }
        true
    });
    starts
}

/// Fallback used when the path set is empty: every `step`-th offset of
/// every node, visited in BFS order from the first node.
fn bfs_fallback<G: Graph>(graph: &G, step: usize) -> Vec<Position> {
    let mut starts = Vec::new();
    if graph.node_count() == 0 {
        return starts;
    }
    let root = graph.rank_to_id(1);
    let mut it = Bfs::new(graph, root);
    let mut counter = 0usize;
    loop {
        if let Some(id) = it.current() {
            let len = graph.node_length(id);
            for offset in 0..len {
                if counter % step == 0 {
                    starts.push(Position::new(id, offset));
                }
                counter += 1;
            }
        }
        if it.at_end() {
            break;
        }
        it.advance();
    }
    starts
}

/// Write starting loci as a length-prefixed sequence of `{node_id_ext,
/// offset}` records (spec §6's `P_loci_e{step}l{k}` layout).
pub fn write_starts<W: Write>(starts: &[Position], mut w: W) -> io::Result<()> {
    w.write_u64::<LittleEndian>(starts.len() as u64)?;
    for locus in starts {
        w.write_u64::<LittleEndian>(locus.node_id)?;
        w.write_u32::<LittleEndian>(locus.offset)?;
    }
    Ok(())
}

pub fn read_starts<R: Read>(mut r: R) -> io::Result<Vec<Position>> {
    let count = r.read_u64::<LittleEndian>()? as usize;
    let mut starts = Vec::with_capacity(count);
    for _ in 0..count {
        let node_id = r.read_u64::<LittleEndian>()?;
        let offset = r.read_u32::<LittleEndian>()?;
        starts.push(Position::new(node_id, offset));
    }
    Ok(starts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Orientation, SeqGraph};
    use crate::path::Path;

    fn diamond() -> SeqGraph {
        // 1:"AA" -> 2:"CC", 1 -> 3:"GG", 2 -> 4:"TT", 3 -> 4
        SeqGraph::new(
            vec![
                (1, b"AA".to_vec()),
                (2, b"CC".to_vec()),
                (3, b"GG".to_vec()),
                (4, b"TT".to_vec()),
            ],
            &[(1, 2), (1, 3), (2, 4), (3, 4)],
        )
    }

    #[test]
    fn empty_path_set_falls_back_to_bfs_over_every_offset() {
        let g = diamond();
        let paths = PathSet::new();
        let loci = select_starting_loci(&g, &paths, 2, 1);
        // every offset of every node is emitted when step == 1.
        assert_eq!(loci.len(), 8);
    }

    #[test]
    fn fully_covered_diamond_yields_no_starting_loci() {
        let g = diamond();
        let mut paths = PathSet::new();
        paths.mark_reverse_complemented();
        paths.add_path(Path::new(&g, vec![1, 2, 4], vec![Orientation::Forward; 3]));
        paths.add_path(Path::new(&g, vec![1, 3, 4], vec![Orientation::Forward; 3]));
        // k=2: every 2-mer walk from any offset is covered by one of the two paths.
        let loci = select_starting_loci(&g, &paths, 2, 1);
        assert!(loci.is_empty(), "expected no starting loci, got {loci:?}");
    }

    #[test]
    fn step_subsamples_candidate_offsets() {
        let g = diamond();
        let paths = PathSet::new();
        let all = select_starting_loci(&g, &paths, 1, 1);
        let sampled = select_starting_loci(&g, &paths, 1, 2);
        assert!(sampled.len() < all.len());
    }

    #[test]
    fn starts_round_trip_through_byte_layout() {
        let starts = vec![Position::new(1, 0), Position::new(3, 2), Position::new(7, 1)];
        let mut buf = Vec::new();
        write_starts(&starts, &mut buf).unwrap();
        let back = read_starts(&buf[..]).unwrap();
        assert_eq!(starts, back);
    }
}
