//! Embedded paths and path-set coverage bookkeeping (spec §4.D).
//!
//! Grounded on `original_source/include/psi/seed.hpp`/`index.hpp`'s path
//! shape (an ordered node-id sequence with an inverted per-node coverage
//! index) and the teacher's `IndexMap`-based ordered collections
//! (`index_builder/core.rs`'s `seqid_to_num: IndexMap`), reused here for the
//! per-node "which paths cover me" inverted index.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::graph::{Graph, NodeId, Orientation};

/// A single embedded path: an ordered, oriented sequence of node visits,
/// plus a prefix-sum over node lengths supporting `select` (spec §4.D).
#[derive(Debug, Clone)]
pub struct Path {
    nodes: Vec<NodeId>,
    orientations: Vec<Orientation>,
    /// `prefix[i]` is the path-relative offset of the start of `nodes[i]`;
    /// `prefix[len]` is the total path length.
    prefix: Vec<u64>,
}

impl Path {
    pub fn new<G: Graph>(graph: &G, nodes: Vec<NodeId>, orientations: Vec<Orientation>) -> Self {
        assert_eq!(nodes.len(), orientations.len());
        let mut prefix = Vec::with_capacity(nodes.len() + 1);
        let mut acc = 0u64;
        for &id in &nodes {
            prefix.push(acc);
            acc += graph.node_length(id) as u64;
        }
        prefix.push(acc);
        Path {
            nodes,
            orientations,
            prefix,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn total_length(&self) -> u64 {
        *self.prefix.last().unwrap_or(&0)
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn orientation_at(&self, i: usize) -> Orientation {
        self.orientations[i]
    }

    /// `select(i)`: the `(node_index, offset_within_node)` pair covering
    /// path-relative offset `i`, by rank/select over the length prefix sum.
    pub fn select(&self, i: u64) -> Option<(usize, u64)> {
        if i >= self.total_length() {
            return None;
        }
        let idx = match self.prefix.binary_search(&i) {
            Ok(p) => p,
            Err(p) => p - 1,
        };
        Some((idx, i - self.prefix[idx]))
    }
}

/// A collection of embedded paths, plus an inverted per-node index so
/// coverage queries (`covered_by`, `path_coverage`) don't scan every path.
#[derive(Debug, Clone, Default)]
pub struct PathSet {
    paths: Vec<Path>,
    /// node id -> indices of paths visiting it, insertion-ordered.
    coverage: FxHashMap<NodeId, IndexMap<usize, ()>>,
    reverse_complemented: bool,
}

impl PathSet {
    pub fn new() -> Self {
        PathSet::default()
    }

    /// Marks this set as built over reverse-complemented path text, which
    /// `PathIndex::new` requires before accepting it (spec §9's recommended
    /// resolution for the path-direction Open Question).
    pub fn mark_reverse_complemented(&mut self) {
        self.reverse_complemented = true;
    }

    pub fn is_reverse_complemented(&self) -> bool {
        self.reverse_complemented
    }

    pub fn add_path(&mut self, path: Path) -> usize {
        let idx = self.paths.len();
        for &id in path.nodes() {
            self.coverage.entry(id).or_default().insert(idx, ());
        }
        self.paths.push(path);
        idx
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn get(&self, idx: usize) -> &Path {
        &self.paths[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter()
    }

    /// Whether any path in this set visits `node_id`.
    pub fn covered_by(&self, node_id: NodeId) -> bool {
        self.coverage
            .get(&node_id)
            .map(|m| !m.is_empty())
            .unwrap_or(false)
    }

    /// Number of paths visiting `node_id` (spec §4.C's haplotyper tie-break
    /// metric).
    pub fn path_coverage(&self, node_id: NodeId) -> usize {
        self.coverage.get(&node_id).map(IndexMap::len).unwrap_or(0)
    }

    /// Coverage of an entire node tail: the number of paths containing
    /// `tail` as a contiguous, in-order subsequence (spec §4.D: "number of
    /// paths containing that node sequence contiguously"), not merely
    /// paths that happen to visit every node in `tail` independently.
    /// Mirrors `original_source/src/graph.hpp::least_covered_adjacent`'s
    /// tail-aware overload.
    pub fn path_coverage_of_tail(&self, tail: &[NodeId]) -> usize {
        if tail.is_empty() {
            return 0;
        }
        // Narrow to paths visiting every node in `tail` before paying for
        // the O(path length) contiguous-window scan.
        let mut candidates: Option<IndexMap<usize, ()>> = None;
        for &id in tail {
            let here = self.coverage.get(&id).cloned().unwrap_or_default();
            candidates = Some(match candidates {
                None => here,
                Some(prev) => prev.into_iter().filter(|(i, _)| here.contains_key(i)).collect(),
            });
        }
        candidates
            .map(|m| {
                m.keys()
                    .filter(|&&idx| self.paths[idx].nodes().windows(tail.len()).any(|w| w == tail))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Write every path's node-id list (spec §6's `load`/`save` siblings
    /// extended to cover the forward path set, not just the path index):
    /// a length-prefixed sequence of length-prefixed `node_id` lists.
    pub fn write_node_lists<W: std::io::Write>(&self, mut w: W) -> std::io::Result<()> {
        use byteorder::{LittleEndian, WriteBytesExt};
        w.write_u64::<LittleEndian>(self.paths.len() as u64)?;
        for path in &self.paths {
            w.write_u64::<LittleEndian>(path.nodes().len() as u64)?;
            for &id in path.nodes() {
                w.write_u64::<LittleEndian>(id)?;
            }
        }
        Ok(())
    }

    /// Rebuild a `PathSet` from node-id lists written by `write_node_lists`,
    /// recomputing each `Path`'s prefix sums against `graph` (forward
    /// orientation throughout, matching how `create_path_index` builds
    /// these paths in the first place).
    pub fn read_node_lists<G: Graph, R: std::io::Read>(graph: &G, mut r: R) -> std::io::Result<Self> {
        use byteorder::{LittleEndian, ReadBytesExt};
        let n_paths = r.read_u64::<LittleEndian>()? as usize;
        let mut set = PathSet::new();
        for _ in 0..n_paths {
            let n_nodes = r.read_u64::<LittleEndian>()? as usize;
            let mut nodes = Vec::with_capacity(n_nodes);
            for _ in 0..n_nodes {
                nodes.push(r.read_u64::<LittleEndian>()?);
            }
            let orientations = vec![Orientation::Forward; nodes.len()];
            set.add_path(Path::new(graph, nodes, orientations));
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SeqGraph;

    fn diamond() -> SeqGraph {
        SeqGraph::new(
            vec![
                (1, b"AA".to_vec()),
                (2, b"CCC".to_vec()),
                (3, b"GG".to_vec()),
                (4, b"T".to_vec()),
            ],
            &[(1, 2), (1, 3), (2, 4), (3, 4)],
        )
    }

    #[test]
    fn select_maps_offsets_to_node_and_local_offset() {
        let g = diamond();
        let p = Path::new(&g, vec![1, 2, 4], vec![Orientation::Forward; 3]);
        assert_eq!(p.total_length(), 6);
        assert_eq!(p.select(0), Some((0, 0)));
        assert_eq!(p.select(1), Some((0, 1)));
        assert_eq!(p.select(2), Some((1, 0)));
        assert_eq!(p.select(4), Some((1, 2)));
        assert_eq!(p.select(5), Some((2, 0)));
        assert_eq!(p.select(6), None);
    }

    #[test]
    fn path_coverage_counts_visiting_paths() {
        let g = diamond();
        let mut set = PathSet::new();
        set.add_path(Path::new(&g, vec![1, 2, 4], vec![Orientation::Forward; 3]));
        set.add_path(Path::new(&g, vec![1, 3, 4], vec![Orientation::Forward; 3]));
        assert_eq!(set.path_coverage(1), 2);
        assert_eq!(set.path_coverage(2), 1);
        assert_eq!(set.path_coverage(3), 1);
        assert!(set.covered_by(4));
        assert!(!set.covered_by(99));
    }

    #[test]
    fn tail_coverage_requires_every_node_on_the_same_path() {
        let g = diamond();
        let mut set = PathSet::new();
        set.add_path(Path::new(&g, vec![1, 2, 4], vec![Orientation::Forward; 3]));
        set.add_path(Path::new(&g, vec![1, 3, 4], vec![Orientation::Forward; 3]));
        assert_eq!(set.path_coverage_of_tail(&[1, 2]), 1);
        assert_eq!(set.path_coverage_of_tail(&[1]), 2);
        assert_eq!(set.path_coverage_of_tail(&[2, 3]), 0);
    }

    #[test]
    fn tail_coverage_rejects_nodes_visited_out_of_order_or_non_contiguously() {
        // Path visits 1, 2, 4 in that order; [1, 4] are both on it but not
        // contiguous (2 sits between them), and [4, 1] is the wrong order.
        let g = diamond();
        let mut set = PathSet::new();
        set.add_path(Path::new(&g, vec![1, 2, 4], vec![Orientation::Forward; 3]));
        assert_eq!(set.path_coverage_of_tail(&[1, 4]), 0);
        assert_eq!(set.path_coverage_of_tail(&[4, 1]), 0);
        assert_eq!(set.path_coverage_of_tail(&[1, 2, 4]), 1);
    }
}
