//! Boolean-semiring algebra over `CrsMatrix`: SpAdd (union), SpGEMM (OR-AND
//! product), and `power` via exponentiation by squaring.
//!
//! `power(m, d)` computes `m^d`; callers wanting the distance index's
//! `(A+I)^d` pass a matrix that already has `I` unioned in (spec §4.G).
//! Because the semiring is boolean and `I` is reflexive, `(I+A)^d` already
//! contains every walk of length `0..=d` after plain squaring — no separate
//! SpAdd accumulation pass is needed on top of what SpGEMM's row union does.

use super::{coalesce, CrsMatrix};

/// Union of two same-shape matrices.
pub fn spadd(a: &CrsMatrix, b: &CrsMatrix) -> CrsMatrix {
    assert_eq!(a.n_rows(), b.n_rows());
    assert_eq!(a.n_cols(), b.n_cols());
    let mut out = CrsMatrix::empty(a.n_rows(), a.n_cols());
    for row in 0..a.n_rows() {
        out.rows_mut()[row] = union_ranges(a.ranges(row), b.ranges(row));
    }
    out
}

/// Boolean matrix product `A x B`: `C[i][j]` is set iff some `k` has both
/// `A[i][k]` and `B[k][j]` set. Implemented as, for each row `i` of `A`,
/// the union over every `k` in `A`'s row of `B`'s row `k`.
pub fn spgemm(a: &CrsMatrix, b: &CrsMatrix) -> CrsMatrix {
    assert_eq!(a.n_cols(), b.n_rows());
    let mut out = CrsMatrix::empty(a.n_rows(), b.n_cols());
    for i in 0..a.n_rows() {
        let mut acc: Vec<u32> = Vec::new();
        for k in a.row_iter(i) {
            acc.extend(b.row_iter(k as usize));
        }
        acc.sort_unstable();
        acc.dedup();
        out.rows_mut()[i] = coalesce(&acc);
    }
    out
}

/// `m^d` by exponentiation by squaring over the boolean semiring.
/// `d == 0` yields the identity matrix.
pub fn power(m: &CrsMatrix, d: u32) -> CrsMatrix {
    assert_eq!(m.n_rows(), m.n_cols(), "power is only defined on square matrices");
    if d == 0 {
        return CrsMatrix::identity(m.n_rows());
    }
    let mut result = CrsMatrix::identity(m.n_rows());
    let mut base = m.clone();
    let mut exp = d;
    while exp > 0 {
        if exp & 1 == 1 {
            result = spgemm(&result, &base);
        }
        exp >>= 1;
        if exp > 0 {
            base = spgemm(&base, &base);
        }
    }
    result
}

fn union_ranges(a: &[(u32, u32)], b: &[(u32, u32)]) -> Vec<(u32, u32)> {
    let mut merged: Vec<(u32, u32)> = Vec::with_capacity(a.len() + b.len());
    let mut i = 0;
    let mut j = 0;
    while i < a.len() || j < b.len() {
        let next = if i >= a.len() {
            let r = b[j];
            j += 1;
            r
        } else if j >= b.len() {
            let r = a[i];
            i += 1;
            r
        } else if a[i].0 <= b[j].0 {
            let r = a[i];
            i += 1;
            r
        } else {
            let r = b[j];
            j += 1;
            r
        };
        match merged.last_mut() {
            Some((_, hi)) if next.0 <= *hi => *hi = (*hi).max(next.1),
            _ => merged.push(next),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(n: usize) -> CrsMatrix {
        // 0 -> 1 -> 2 -> ... -> n-1
        let pairs: Vec<(u32, u32)> = (0..n as u32 - 1).map(|i| (i, i + 1)).collect();
        CrsMatrix::build(n, n, pairs)
    }

    #[test]
    fn spadd_unions_disjoint_and_overlapping_ranges() {
        let a = CrsMatrix::build(1, 10, vec![(0, 1), (0, 2)]);
        let b = CrsMatrix::build(1, 10, vec![(0, 2), (0, 5)]);
        let c = spadd(&a, &b);
        assert_eq!(c.ranges(0), &[(1, 3), (5, 6)]);
    }

    #[test]
    fn spgemm_composes_one_hop_edges() {
        let a = chain(4); // 0->1->2->3
        let a2 = spgemm(&a, &a);
        // a2[0] should reach node 2 (two hops via node 1)
        assert_eq!(a2.ranges(0), &[(2, 3)]);
        assert_eq!(a2.ranges(1), &[(3, 4)]);
        assert!(a2.ranges(2).is_empty());
    }

    #[test]
    fn power_zero_is_identity() {
        let a = chain(3);
        let p0 = power(&a, 0);
        assert_eq!(p0, CrsMatrix::identity(3));
    }

    #[test]
    fn power_of_reflexive_closure_covers_all_walks_up_to_d() {
        let a = chain(4); // 0->1->2->3
        let with_self = spadd(&a, &CrsMatrix::identity(4));
        let m = power(&with_self, 3);
        // from node 0, every node reachable within 3 hops (0,1,2,3) is set.
        assert_eq!(m.ranges(0), &[(0, 4)]);
        // from node 2, only 2 and 3 are within 3 hops forward.
        assert_eq!(m.ranges(2), &[(2, 4)]);
    }
}
