//! Range-CRS: a sparse boolean matrix whose rows are sorted runs of
//! non-overlapping, non-touching half-open column ranges (spec §4.A).
//!
//! Grounded on `original_source/include/psi/graph.hpp::adjacency_matrix` /
//! `compress_distance_index` for the algebra this exists to support, and on
//! the teacher's `utils/tree.rs` `IntervalTree` for the "sorted, coalesced
//! ranges" row shape (a Range-CRS row is exactly that tree's leaf list).

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

mod algebra;

pub use algebra::{power, spadd, spgemm};

/// A single `[lo, hi)` column range within a row.
pub type Range = (u32, u32);

/// A Range-CRS sparse boolean matrix.
///
/// Invariant (spec §4.A): within each row, ranges are sorted by `lo`,
/// pairwise disjoint, and no two are adjacent (`hi` of one never equals
/// `lo` of the next) — adjacent ranges are always coalesced into one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrsMatrix {
    n_rows: usize,
    n_cols: usize,
    rows: Vec<Vec<Range>>,
}

impl CrsMatrix {
    pub fn empty(n_rows: usize, n_cols: usize) -> Self {
        CrsMatrix {
            n_rows,
            n_cols,
            rows: vec![Vec::new(); n_rows],
        }
    }

    /// Build a matrix from an arbitrary (row, col) pair stream. Pairs may
    /// arrive in any order and with duplicates; each row's set is coalesced
    /// into the canonical sorted, disjoint, non-touching range form.
    pub fn build(n_rows: usize, n_cols: usize, pairs: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut per_row: Vec<Vec<u32>> = vec![Vec::new(); n_rows];
        for (r, c) in pairs {
            per_row[r as usize].push(c);
        }
        let mut rows = Vec::with_capacity(n_rows);
        for mut cols in per_row {
            cols.sort_unstable();
            cols.dedup();
            rows.push(coalesce(&cols));
        }
        CrsMatrix { n_rows, n_cols, rows }
    }

    /// Insert a single already-known-disjoint range into a row, merging with
    /// neighbours as needed. Used by builders that already produce ranges
    /// (e.g. `distance`'s adjacency construction) instead of raw pairs.
    pub fn insert_range(&mut self, row: usize, range: Range) {
        let r = &mut self.rows[row];
        let mut merged = Vec::with_capacity(r.len() + 1);
        let (mut lo, mut hi) = range;
        let mut inserted = false;
        for &(l, h) in r.iter() {
            if h < lo {
                merged.push((l, h));
            } else if l > hi {
                if !inserted {
                    merged.push((lo, hi));
                    inserted = true;
                }
                merged.push((l, h));
            } else {
                lo = lo.min(l);
                hi = hi.max(h);
            }
        }
        if !inserted {
            merged.push((lo, hi));
        }
        *r = merged;
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of set bits (sum of range lengths), not number of ranges.
    pub fn nnz(&self) -> u64 {
        self.rows
            .iter()
            .flat_map(|r| r.iter())
            .map(|&(lo, hi)| (hi - lo) as u64)
            .sum()
    }

    /// Number of ranges stored (the Range-CRS analogue of a CRS matrix's
    /// `nnz` storage cost, distinct from the logical bit count above).
    pub fn storage(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }

    pub fn ranges(&self, row: usize) -> &[Range] {
        &self.rows[row]
    }

    pub(super) fn rows_mut(&mut self) -> &mut [Vec<Range>] {
        &mut self.rows
    }

    /// Iterate individual set column indices of a row, expanding ranges.
    pub fn row_iter(&self, row: usize) -> impl Iterator<Item = u32> + '_ {
        self.rows[row].iter().flat_map(|&(lo, hi)| lo..hi)
    }

    pub fn get(&self, row: usize, col: u32) -> bool {
        self.rows[row]
            .binary_search_by(|&(lo, hi)| {
                if col < lo {
                    std::cmp::Ordering::Greater
                } else if col >= hi {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// Identity matrix (the `I` in `(A+I)^d`).
    pub fn identity(n: usize) -> Self {
        let rows = (0..n as u32).map(|i| vec![(i, i + 1)]).collect();
        CrsMatrix {
            n_rows: n,
            n_cols: n,
            rows,
        }
    }

    /// Drop every range that lies strictly inside a single node's own span,
    /// i.e. remove self-to-self coverage introduced by `I` before a
    /// distance matrix is published (spec §4.G "compress"). `node_span(r)`
    /// returns the `[lo, hi)` char-order span owned by row `r`'s node.
    pub fn compress_intra_node(&mut self, node_span: impl Fn(usize) -> Range) {
        for row in 0..self.n_rows {
            let (span_lo, span_hi) = node_span(row);
            self.rows[row].retain_mut(|&mut (lo, hi)| !(lo >= span_lo && hi <= span_hi));
        }
    }

    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_u64::<LittleEndian>(self.n_rows as u64)?;
        w.write_u64::<LittleEndian>(self.n_cols as u64)?;
        w.write_u64::<LittleEndian>(self.storage() as u64)?;
        for row in &self.rows {
            w.write_u32::<LittleEndian>(row.len() as u32)?;
        }
        for row in &self.rows {
            for &(lo, hi) in row {
                w.write_u32::<LittleEndian>(lo)?;
                w.write_u32::<LittleEndian>(hi)?;
            }
        }
        Ok(())
    }

    pub fn read_from<R: Read>(mut r: R) -> io::Result<Self> {
        let n_rows = r.read_u64::<LittleEndian>()? as usize;
        let n_cols = r.read_u64::<LittleEndian>()? as usize;
        let total_ranges = r.read_u64::<LittleEndian>()? as usize;
        let mut counts = Vec::with_capacity(n_rows);
        for _ in 0..n_rows {
            counts.push(r.read_u32::<LittleEndian>()? as usize);
        }
        if counts.iter().sum::<usize>() != total_ranges {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "range-crs: row count sum does not match stored total",
            ));
        }
        let mut rows = Vec::with_capacity(n_rows);
        for count in counts {
            let mut row = Vec::with_capacity(count);
            for _ in 0..count {
                let lo = r.read_u32::<LittleEndian>()?;
                let hi = r.read_u32::<LittleEndian>()?;
                row.push((lo, hi));
            }
            rows.push(row);
        }
        Ok(CrsMatrix { n_rows, n_cols, rows })
    }
}

/// Merge a sorted, deduplicated column list into coalesced ranges.
pub(super) fn coalesce(cols: &[u32]) -> Vec<Range> {
    let mut out: Vec<Range> = Vec::new();
    for &c in cols {
        match out.last_mut() {
            Some((_, hi)) if *hi == c => *hi = c + 1,
            _ => out.push((c, c + 1)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_coalesces_adjacent_and_duplicate_columns() {
        let m = CrsMatrix::build(2, 10, vec![(0, 1), (0, 2), (0, 2), (0, 5), (1, 7)]);
        assert_eq!(m.ranges(0), &[(1, 3), (5, 6)]);
        assert_eq!(m.ranges(1), &[(7, 8)]);
        assert_eq!(m.nnz(), 4);
        assert_eq!(m.storage(), 3);
    }

    #[test]
    fn identity_has_one_range_per_row() {
        let id = CrsMatrix::identity(4);
        for i in 0..4 {
            assert_eq!(id.ranges(i), &[(i as u32, i as u32 + 1)]);
        }
        assert_eq!(id.nnz(), 4);
    }

    #[test]
    fn round_trips_through_byte_layout() {
        let m = CrsMatrix::build(3, 20, vec![(0, 1), (0, 2), (1, 10), (1, 11), (1, 12)]);
        let mut buf = Vec::new();
        m.write_to(&mut buf).unwrap();
        let back = CrsMatrix::read_from(&buf[..]).unwrap();
        assert_eq!(m, back);
    }

    #[test]
    fn get_respects_half_open_range_boundaries() {
        let m = CrsMatrix::build(1, 10, vec![(0, 3), (0, 4), (0, 5)]);
        assert!(!m.get(0, 2));
        assert!(m.get(0, 3));
        assert!(m.get(0, 4));
        assert!(!m.get(0, 5));
    }

    #[test]
    fn compress_intra_node_drops_self_spans_only() {
        let mut m = CrsMatrix::build(2, 10, vec![(0, 0), (0, 1), (0, 6), (1, 0)]);
        // row 0's node spans [0,2): the (0,2) range is intra-node and
        // dropped, the (6,7) range reaching another node survives.
        m.compress_intra_node(|row| if row == 0 { (0, 2) } else { (2, 6) });
        assert_eq!(m.ranges(0), &[(6, 7)]);
        // row 1's only range reaches back into node 0's span, which is a
        // different node than row 1's own [2,6), so it survives too.
        assert_eq!(m.ranges(1), &[(0, 1)]);
    }
}
