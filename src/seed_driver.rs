//! Dual seed driver (spec §4.I): the paired tree walk that jointly descends
//! the path index and a chunk's read index, emitting a hit for every
//! length-`k` string present in both, and the MEM (maximal exact match)
//! mode that searches a single read against the path index directly.
//!
//! Grounded on `original_source/include/psi/seed_finder.hpp` (dual-index
//! walk, gocc pruning) and `src/mapper.hpp` (MEM extraction loop shape).
//! The original drives the walk by enumerating the children each cursor's
//! suffix-tree node actually has; this crate's `FmIndex`/`ReadIndex`/
//! `PathIndex` cursors only expose "try extending by character `c`", so the
//! walk here instead recurses over the four real DNA bases at each depth
//! and prunes a branch the moment either cursor's interval empties — the
//! same "jointly descend, backtrack when blocked" shape, expressed against
//! this crate's narrower cursor contract.

use crate::alphabet;
use crate::path_index::{PathCursor, PathIndex};
use crate::read_index::{ReadCursor, ReadIndex};

const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// One on-path seed hit: a path occurrence paired with a read occurrence of
/// the same length-`k` string, plus the path-index occurrence count used
/// for gocc thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathOccurrence {
    pub path_index: usize,
    pub path_offset: u64,
    pub read_id: u32,
    pub read_offset: u32,
    pub gocc: usize,
}

/// A maximal exact match of a read against the path index (MEM mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemHit {
    pub path_index: usize,
    pub path_offset: u64,
    pub read_start: u32,
    pub match_len: u32,
    pub gocc: usize,
}

/// Counters the caller cares about beyond individual hits: how many
/// distinct length-`k` strings were pruned for exceeding the gocc
/// threshold (spec §8 invariant 9's "skip count").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounters {
    pub skipped_by_gocc: u64,
}

pub struct DualSeedDriver<'a> {
    path_index: &'a PathIndex,
    k: usize,
    /// Already-normalized: `usize::MAX` means "unlimited" (spec §4.K's
    /// `gocc_threshold = 0 => unlimited` is resolved before this point, by
    /// `FinderConfig::normalize`).
    gocc_threshold: usize,
}

impl<'a> DualSeedDriver<'a> {
    pub fn new(path_index: &'a PathIndex, k: usize, gocc_threshold: usize) -> Self {
        DualSeedDriver {
            path_index,
            k,
            gocc_threshold,
        }
    }

    /// Enumerate every length-`k` string that exists simultaneously in the
    /// path index and `read_index`, emitting one `PathOccurrence` per
    /// `(path occurrence) x (read occurrence)` pair, each exactly once
    /// (spec §4.I, §8 invariant 7).
    pub fn seeds_on_paths(&self, read_index: &ReadIndex, on_hit: &mut dyn FnMut(PathOccurrence)) -> SkipCounters {
        let mut skips = SkipCounters::default();
        self.descend(self.path_index.root(), read_index.go_root(), 0, read_index, on_hit, &mut skips);
        skips
    }

    fn descend(
        &self,
        pcursor: PathCursor,
        rcursor: ReadCursor,
        depth: usize,
        read_index: &ReadIndex,
        on_hit: &mut dyn FnMut(PathOccurrence),
        skips: &mut SkipCounters,
    ) {
        if depth == self.k {
            let gocc = pcursor.occurrence_count();
            if gocc == 0 || rcursor.count_occurrences() == 0 {
                return;
            }
            if gocc > self.gocc_threshold {
                skips.skipped_by_gocc += 1;
                return;
            }
            let path_occs = self.path_index.occurrences(&pcursor);
            let read_occs = read_index.get_occurrences(&rcursor);
            for &(path_index, path_offset) in &path_occs {
                for &occ in &read_occs {
                    on_hit(PathOccurrence {
                        path_index,
                        path_offset,
                        read_id: occ.read_id,
                        read_offset: occ.offset,
                        gocc,
                    });
                }
            }
            return;
        }

        for &ch in &BASES {
            let next_r = read_index.go_down(&rcursor, ch);
            if next_r.count_occurrences() == 0 {
                continue;
            }
            // `extend_down` on the path cursor must be fed the complement
            // of the read character: the path index is built over
            // reverse-complemented text, and feeding `complement(read[i])`
            // in left-to-right read order reproduces a full backward search
            // over `reverse_complement(read[0..k])` one character at a
            // time (see `path_index`'s module doc and its
            // `occurrences_matches_incremental_extend_down...` test).
            let next_p = self.path_index.extend_down(&pcursor, alphabet::complement(ch));
            if next_p.occurrence_count() == 0 {
                continue;
            }
            self.descend(next_p, next_r, depth + 1, read_index, on_hit, skips);
        }
    }

    /// MEM mode (spec §4.I): slide a window over `read`, extending the
    /// path-index cursor as far as it will go from each start position;
    /// emit occurrences whenever the match reaches `minlen` and passes the
    /// gocc threshold, then restart just past the matched span.
    pub fn mem_search(&self, read: &[u8], minlen: usize, on_hit: &mut dyn FnMut(MemHit)) -> SkipCounters {
        let mut skips = SkipCounters::default();
        let mut start = 0usize;
        while start < read.len() {
            let mut cursor = self.path_index.root();
            let mut plen = 0usize;
            let mut pos = start;
            while pos < read.len() {
                if alphabet::is_ambiguous(read[pos]) {
                    break;
                }
                let next = self.path_index.extend_down(&cursor, alphabet::complement(read[pos]));
                if next.occurrence_count() == 0 {
                    break;
                }
                cursor = next;
                plen += 1;
                pos += 1;
            }
            if plen >= minlen {
                let gocc = cursor.occurrence_count();
                if gocc > self.gocc_threshold {
                    skips.skipped_by_gocc += 1;
                } else {
                    for &(path_index, path_offset) in &self.path_index.occurrences(&cursor) {
                        on_hit(MemHit {
                            path_index,
                            path_offset,
                            read_start: start as u32,
                            match_len: plen as u32,
                            gocc,
                        });
                    }
                }
            }
            start += plen.max(1);
        }
        skips
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::reverse_complement;
    use crate::graph::{Orientation, SeqGraph};
    use crate::path::Path as GPath;
    use crate::path::PathSet;

    fn rc_index_over(seq: &[u8]) -> PathIndex {
        let rc_seq = reverse_complement(seq);
        let rc_graph = SeqGraph::new(vec![(1, rc_seq)], &[]);
        let mut set = PathSet::new();
        set.mark_reverse_complemented();
        set.add_path(GPath::new(&rc_graph, vec![1], vec![Orientation::Forward]));
        PathIndex::new(&rc_graph, &set).unwrap()
    }

    #[test]
    fn dual_walk_finds_exact_kmer_shared_by_path_and_read() {
        // path text "GATTACA", k=3: "ATT" occurs at forward offset 1.
        let path_index = rc_index_over(b"GATTACA");
        let reads: Vec<&[u8]> = vec![b"ATT"];
        let read_index = ReadIndex::build(&reads);
        let driver = DualSeedDriver::new(&path_index, 3, usize::MAX);

        let mut hits = Vec::new();
        driver.seeds_on_paths(&read_index, &mut |h| hits.push(h));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path_index, 0);
        assert_eq!(hits[0].path_offset, 1);
        assert_eq!(hits[0].read_id, 0);
        assert_eq!(hits[0].read_offset, 0);
    }

    #[test]
    fn dual_walk_finds_nothing_for_an_absent_kmer() {
        let path_index = rc_index_over(b"GATTACA");
        let reads: Vec<&[u8]> = vec![b"GGG"];
        let read_index = ReadIndex::build(&reads);
        let driver = DualSeedDriver::new(&path_index, 3, usize::MAX);

        let mut hits = Vec::new();
        driver.seeds_on_paths(&read_index, &mut |h| hits.push(h));
        assert!(hits.is_empty());
    }

    #[test]
    fn gocc_threshold_skips_overrepresented_kmers_and_counts_the_skip() {
        // "AAAA" repeated many times pushes gocc for "AA" well past a
        // threshold of 2, mirroring spec §8's S4 scenario shape.
        let path_index = rc_index_over(b"AAAAAAAA");
        let reads: Vec<&[u8]> = vec![b"AA"];
        let read_index = ReadIndex::build(&reads);
        let driver = DualSeedDriver::new(&path_index, 2, 2);

        let mut hits = Vec::new();
        let skips = driver.seeds_on_paths(&read_index, &mut |h| hits.push(h));
        assert!(hits.is_empty());
        assert_eq!(skips.skipped_by_gocc, 1);
    }

    #[test]
    fn mem_search_finds_the_maximal_match_and_restarts_after_it() {
        let path_index = rc_index_over(b"GATTACAGATTACA");
        let mut hits = Vec::new();
        let driver = DualSeedDriver::new(&path_index, 0, usize::MAX);
        driver.mem_search(b"GATTACA", 4, &mut |h| hits.push(h));
        assert!(!hits.is_empty());
        assert!(hits.iter().any(|h| h.match_len == 7));
    }
}
