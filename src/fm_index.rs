//! Shared FM-index engine: BWT + `Occ` table + `C`/"less" array + suffix
//! array, plus a bidirectional (FMD-style) cursor used by both the path
//! index (§4.E) and the per-chunk read index (§6).
//!
//! Grounded on
//! `other_examples/.../johanneskoester-rust-bio__src-data_structures-fmindex.rs.rs`:
//! the `backward_search`/`Interval` shape for the single-strand index, and
//! `FMDIndex`'s `BiInterval`/`forward_ext`/`backward_ext` for the
//! bidirectional cursor (Li, 2012). Suffix array construction here is a
//! plain comparison sort rather than a linear-time algorithm (DC3/SA-IS);
//! correct but not intended to be fast on large inputs.

use serde::{Deserialize, Serialize};

use crate::alphabet;

/// Alphabet this index is built over, in ascending `C`-array order. The
/// sentinel sorts first so every real suffix (which never starts with the
/// sentinel inside the text) ranks after the lone terminating row.
const ALPHABET: [u8; 6] = [b'$', b'A', b'C', b'G', b'N', b'T'];

fn code(b: u8) -> usize {
    match b {
        b'$' => 0,
        b'A' | b'a' => 1,
        b'C' | b'c' => 2,
        b'G' | b'g' => 3,
        b'N' | b'n' => 4,
        b'T' | b't' => 5,
        _ => 4, // unknown bases behave like N: present, but never a real match
    }
}

/// A suffix array interval `[lower, upper)` denoting a contiguous block of
/// suffixes sharing a matched prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub lower: u32,
    pub upper: u32,
}

impl Interval {
    pub fn size(&self) -> u32 {
        self.upper - self.lower
    }

    pub fn is_empty(&self) -> bool {
        self.lower >= self.upper
    }
}

/// A bi-interval tracking matches of the current pattern on both the
/// forward text and its reverse complement simultaneously (Li, 2012).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiInterval {
    pub lower: u32,
    pub lower_rev: u32,
    pub size: u32,
}

impl BiInterval {
    pub fn forward(&self) -> Interval {
        Interval {
            lower: self.lower,
            upper: self.lower + self.size,
        }
    }

    pub fn revcomp(&self) -> Interval {
        Interval {
            lower: self.lower_rev,
            upper: self.lower_rev + self.size,
        }
    }

    fn swapped(&self) -> BiInterval {
        BiInterval {
            lower: self.lower_rev,
            lower_rev: self.lower,
            size: self.size,
        }
    }
}

/// A single-strand FM-index over a `$`-terminated text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FmIndex {
    bwt: Vec<u8>,
    sa: Vec<u32>,
    /// `less[c]` = count of symbols in the text strictly less than `c`;
    /// `less[ALPHABET.len()]` is the text length, so `less[code(a)+1] -
    /// less[code(a)]` is the total count of `a` without a separate table.
    less: [u32; ALPHABET.len() + 1],
    /// `prefix[i][c]` = count of symbol `c` among `bwt[0..i]`.
    prefix: Vec<[u32; ALPHABET.len()]>,
}

impl FmIndex {
    /// Build an index over `text`, appending a `$` sentinel if the caller
    /// did not already include one.
    pub fn build(text: &[u8]) -> Self {
        let mut owned;
        let text = if text.last() == Some(&b'$') {
            text
        } else {
            owned = text.to_vec();
            owned.push(b'$');
            &owned[..]
        };

        let n = text.len();
        let mut sa: Vec<u32> = (0..n as u32).collect();
        sa.sort_by(|&a, &b| text[a as usize..].cmp(&text[b as usize..]));

        let bwt: Vec<u8> = sa
            .iter()
            .map(|&s| if s == 0 { text[n - 1] } else { text[s as usize - 1] })
            .collect();

        let mut counts = [0u32; ALPHABET.len()];
        for &b in text {
            counts[code(b)] += 1;
        }
        let mut less = [0u32; ALPHABET.len() + 1];
        let mut acc = 0u32;
        for (i, &count) in counts.iter().enumerate() {
            less[i] = acc;
            acc += count;
        }
        less[ALPHABET.len()] = acc;

        let mut prefix = Vec::with_capacity(n + 1);
        prefix.push([0u32; ALPHABET.len()]);
        for &b in &bwt {
            let mut row = *prefix.last().unwrap();
            row[code(b)] += 1;
            prefix.push(row);
        }

        FmIndex { bwt, sa, less, prefix }
    }

    pub fn len(&self) -> usize {
        self.bwt.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bwt.is_empty()
    }

    pub fn full_interval(&self) -> Interval {
        Interval {
            lower: 0,
            upper: self.bwt.len() as u32,
        }
    }

    /// Occurrence count of `a` in `bwt[..=r]`, or `0` if `r < 0`.
    fn occ(&self, r: i64, a: u8) -> u32 {
        if r < 0 {
            0
        } else {
            self.prefix[(r + 1) as usize][code(a)]
        }
    }

    fn less(&self, a: u8) -> u32 {
        self.less[code(a)]
    }

    /// Upper `less` boundary: `less(a) + (total occurrences of a)`.
    fn less_upper(&self, a: u8) -> u32 {
        self.less[code(a) + 1]
    }

    /// One step of backward search: narrow `interval` by prepending `a`.
    pub fn extend(&self, interval: Interval, a: u8) -> Interval {
        if interval.is_empty() {
            return interval;
        }
        let lo = self.less(a) + self.occ(interval.lower as i64 - 1, a);
        let hi = self.less(a) + self.occ(interval.upper as i64 - 1, a);
        Interval { lower: lo, upper: hi }
    }

    /// Full backward search over `pattern` from the empty interval.
    pub fn backward_search(&self, pattern: &[u8]) -> Interval {
        let mut interval = self.full_interval();
        for &a in pattern.iter().rev() {
            interval = self.extend(interval, a);
            if interval.is_empty() {
                break;
            }
        }
        interval
    }

    pub fn locate(&self, interval: Interval) -> &[u32] {
        &self.sa[interval.lower as usize..interval.upper as usize]
    }
}

/// A bidirectional cursor over an `FmIndex` built on `T$revcomp(T)$`,
/// supporting extension at either end of the currently matched string
/// (spec §4.E's `extend_down`/`extend_up`).
pub struct BiFmCursor<'idx> {
    index: &'idx FmIndex,
}

impl<'idx> BiFmCursor<'idx> {
    pub fn new(index: &'idx FmIndex) -> Self {
        BiFmCursor { index }
    }

    /// The bi-interval matching the single character `a`.
    pub fn init(&self, a: u8) -> BiInterval {
        let comp_a = alphabet::complement(a);
        let lower = self.index.less(a);
        BiInterval {
            lower,
            lower_rev: self.index.less(comp_a),
            size: self.index.less_upper(a) - lower,
        }
    }

    /// Extend by prepending `a` to the matched string ("extend up": widen
    /// the match further upstream in the graph/text).
    pub fn extend_up(&self, interval: &BiInterval, a: u8) -> BiInterval {
        let mut s = 0u32;
        let mut o = 0u32;
        let mut l = interval.lower_rev;
        for &b in ALPHABET.iter() {
            l += s;
            o = self.index.occ(interval.lower as i64 - 1, b);
            s = self.index.occ((interval.lower + interval.size) as i64 - 1, b) - o;
            if b == a {
                break;
            }
        }
        let lower = self.index.less(a) + o;
        BiInterval {
            lower,
            lower_rev: l,
            size: s,
        }
    }

    /// Extend by appending `a` to the matched string ("extend down": widen
    /// the match further downstream).
    pub fn extend_down(&self, interval: &BiInterval, a: u8) -> BiInterval {
        let comp_a = alphabet::complement(a);
        self.extend_up(&interval.swapped(), comp_a).swapped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backward_search_finds_known_substring() {
        let idx = FmIndex::build(b"GCCTTAACAT$");
        let interval = idx.backward_search(b"TTA");
        assert!(!interval.is_empty());
        let mut hits: Vec<u32> = idx.locate(interval).to_vec();
        hits.sort_unstable();
        assert_eq!(hits, vec![4]);
    }

    #[test]
    fn backward_search_misses_absent_substring() {
        let idx = FmIndex::build(b"GCCTTAACAT$");
        let interval = idx.backward_search(b"GGGG");
        assert!(interval.is_empty());
    }

    #[test]
    fn bidirectional_cursor_matches_single_strand_forward_interval() {
        let text = b"GCCTTAACAT";
        let rc = alphabet::reverse_complement(text);
        let mut combined = text.to_vec();
        combined.push(b'$');
        combined.extend_from_slice(&rc);
        combined.push(b'$');
        let idx = FmIndex::build(&combined);
        let cursor = BiFmCursor::new(&idx);

        let mut interval = cursor.init(b'T');
        interval = cursor.extend_down(&interval, b'T');
        interval = cursor.extend_down(&interval, b'A');
        // "TTA" occurs once in the forward text at position 4.
        let fwd = idx.locate(interval.forward());
        assert_eq!(fwd.len(), 1);
        assert_eq!(fwd[0], 4);
    }
}
