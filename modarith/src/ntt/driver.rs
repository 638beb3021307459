//! Recursive depth-first / breadth-first transform driver.
//!
//! A block of `n` words at recursion `depth` and position `half` (its index
//! among the `2^depth` blocks of that depth) covers global layer `depth + l`
//! with local layer `l`. Its group `i` in local layer `l` (`m = 2^l`
//! groups) uses forward root `(m << depth) + half * m + i`, and inverse
//! root `N - 2 * (m << depth) + 1 + half * m + i`.

use super::butterfly::{forward_layer, inverse_final_layer, inverse_layer, reduce_from_4q};
use super::tables::Tables;
use crate::simd::{Lanes, Scalar};

/// Blocks at most this long are transformed layer by layer; larger blocks
/// do one layer and recurse on their halves.
pub(crate) const RECURSION_THRESHOLD: usize = 1024;

/// Lanes able to run the transform.
///
/// Recursion goes through [`NttLanes::forward_block`] so that a backend can
/// re-enter its own code path at every level.
pub(crate) trait NttLanes: Lanes {
    fn forward_block<const S: u32>(self, tables: &Tables, a: &mut [u64], depth: usize, half: usize, full: bool);

    fn inverse_block<const S: u32>(self, tables: &Tables, a: &mut [u64], depth: usize, half: usize, full: bool);

    /// Forward layers of stride below `LANES`, run after the full-stride
    /// layers of a breadth-first block.
    fn forward_narrow<const S: u32>(self, tables: &Tables, a: &mut [u64], depth: usize, half: usize);

    /// Inverse layers of stride below `LANES`, run first in a breadth-first
    /// block.
    fn inverse_narrow<const S: u32>(self, tables: &Tables, a: &mut [u64], depth: usize, half: usize);
}

impl NttLanes for Scalar {
    #[inline]
    fn forward_block<const S: u32>(self, tables: &Tables, a: &mut [u64], depth: usize, half: usize, full: bool) {
        forward_recursive::<Scalar, S>(self, tables, a, depth, half, full)
    }

    #[inline]
    fn inverse_block<const S: u32>(self, tables: &Tables, a: &mut [u64], depth: usize, half: usize, full: bool) {
        inverse_recursive::<Scalar, S>(self, tables, a, depth, half, full)
    }

    // Every stride is at least one lane.
    #[inline(always)]
    fn forward_narrow<const S: u32>(self, _tables: &Tables, _a: &mut [u64], _depth: usize, _half: usize) {}

    #[inline(always)]
    fn inverse_narrow<const S: u32>(self, _tables: &Tables, _a: &mut [u64], _depth: usize, _half: usize) {}
}

#[inline(always)]
pub(crate) fn forward_recursive<L: NttLanes, const S: u32>(
    simd: L,
    tables: &Tables,
    a: &mut [u64],
    depth: usize,
    half: usize,
    full: bool,
) {
    let n: usize = a.len();
    if n <= RECURSION_THRESHOLD {
        return forward_breadth_first::<L, S>(simd, tables, a, depth, half, full);
    }

    let idx: usize = (1 << depth) + half;
    forward_layer::<L, S>(
        simd,
        a,
        &tables.roots[idx..idx + 1],
        &tables.roots_precon[idx..idx + 1],
        n >> 1,
        tables.modulus,
    );

    let (lo, hi) = a.split_at_mut(n >> 1);
    simd.forward_block::<S>(tables, lo, depth + 1, half << 1, full);
    simd.forward_block::<S>(tables, hi, depth + 1, (half << 1) + 1, full);
}

#[inline(always)]
fn forward_breadth_first<L: NttLanes, const S: u32>(
    simd: L,
    tables: &Tables,
    a: &mut [u64],
    depth: usize,
    half: usize,
    full: bool,
) {
    let n: usize = a.len();
    let (mut m, mut t): (usize, usize) = (1, n >> 1);
    while t >= L::LANES {
        let idx: usize = (m << depth) + half * m;
        forward_layer::<L, S>(
            simd,
            a,
            &tables.roots[idx..idx + m],
            &tables.roots_precon[idx..idx + m],
            t,
            tables.modulus,
        );
        m <<= 1;
        t >>= 1;
    }

    simd.forward_narrow::<S>(tables, a, depth, half);

    if full {
        reduce_from_4q(simd, a, tables.modulus);
    }
}

#[inline(always)]
pub(crate) fn inverse_recursive<L: NttLanes, const S: u32>(
    simd: L,
    tables: &Tables,
    a: &mut [u64],
    depth: usize,
    half: usize,
    full: bool,
) {
    let n: usize = a.len();
    if n <= RECURSION_THRESHOLD {
        return inverse_breadth_first::<L, S>(simd, tables, a, depth, half, full);
    }

    let (lo, hi) = a.split_at_mut(n >> 1);
    simd.inverse_block::<S>(tables, lo, depth + 1, half << 1, full);
    simd.inverse_block::<S>(tables, hi, depth + 1, (half << 1) + 1, full);

    if depth == 0 {
        inverse_final_layer::<L, S>(simd, tables, a, full);
    } else {
        let idx: usize = tables.degree - (2 << depth) + 1 + half;
        inverse_layer::<L, S>(
            simd,
            a,
            &tables.inv_roots[idx..idx + 1],
            &tables.inv_roots_precon[idx..idx + 1],
            n >> 1,
            tables.modulus,
        );
    }
}

#[inline(always)]
fn inverse_breadth_first<L: NttLanes, const S: u32>(
    simd: L,
    tables: &Tables,
    a: &mut [u64],
    depth: usize,
    half: usize,
    full: bool,
) {
    let n: usize = a.len();

    simd.inverse_narrow::<S>(tables, a, depth, half);

    // The top layer of the whole transform is fused with the scaling.
    let last: usize = if depth == 0 { 2 } else { 1 };
    let (mut m, mut t): (usize, usize) = (n / (2 * L::LANES), L::LANES);
    while m >= last {
        let idx: usize = tables.degree - 2 * (m << depth) + 1 + half * m;
        inverse_layer::<L, S>(
            simd,
            a,
            &tables.inv_roots[idx..idx + m],
            &tables.inv_roots_precon[idx..idx + m],
            t,
            tables.modulus,
        );
        m >>= 1;
        t <<= 1;
    }

    if depth == 0 {
        inverse_final_layer::<L, S>(simd, tables, a, full);
    }
}
