//! Lane-generic Harvey butterflies and full-stride layers.
//!
//! Forward values live in [0, 4q) between layers, inverse values in [0, 2q).

use itertools::izip;

use super::tables::Tables;
use crate::simd::Lanes;

/// `(X, Y) -> (X + WY, X - WY)`, inputs and outputs in [0, 4q).
#[inline(always)]
pub(crate) fn forward_butterfly<L: Lanes, const S: u32>(
    simd: L,
    x: L::V,
    y: L::V,
    w: L::V,
    w_precon: L::V,
    q: L::V,
    two_q: L::V,
) -> (L::V, L::V) {
    let tx: L::V = simd.small_mod(x, two_q);
    let t: L::V = simd.mul_shoup_lazy::<S>(y, w, w_precon, q);
    (simd.add(tx, t), simd.sub(simd.add(tx, two_q), t))
}

/// `(X, Y) -> (X + Y, W(X - Y))`, inputs and outputs in [0, 2q).
#[inline(always)]
pub(crate) fn inverse_butterfly<L: Lanes, const S: u32>(
    simd: L,
    x: L::V,
    y: L::V,
    w: L::V,
    w_precon: L::V,
    q: L::V,
    two_q: L::V,
) -> (L::V, L::V) {
    let tx: L::V = simd.small_mod(simd.add(x, y), two_q);
    let ty: L::V = simd.sub(simd.add(x, two_q), y);
    (tx, simd.mul_shoup_lazy::<S>(ty, w, w_precon, q))
}

/// One forward layer of stride `t >= LANES`: `a` splits into groups of `2t`
/// words and group `i` uses `roots[i]`.
#[inline(always)]
pub(crate) fn forward_layer<L: Lanes, const S: u32>(
    simd: L,
    a: &mut [u64],
    roots: &[u64],
    roots_precon: &[u64],
    t: usize,
    modulus: u64,
) {
    debug_assert!(t >= L::LANES);
    debug_assert_eq!(a.len(), 2 * t * roots.len());
    let q: L::V = simd.splat(modulus);
    let two_q: L::V = simd.splat(modulus << 1);
    izip!(a.chunks_exact_mut(2 * t), roots, roots_precon).for_each(|(group, &w, &w_precon)| {
        let (w, w_precon): (L::V, L::V) = (simd.splat(w), simd.splat(w_precon));
        let (xs, ys) = group.split_at_mut(t);
        izip!(xs.chunks_exact_mut(L::LANES), ys.chunks_exact_mut(L::LANES)).for_each(|(x, y)| {
            let (x1, y1) = forward_butterfly::<L, S>(simd, simd.load(x), simd.load(y), w, w_precon, q, two_q);
            simd.store(x, x1);
            simd.store(y, y1);
        });
    });
}

/// One inverse layer of stride `t >= LANES`, same grouping as
/// [`forward_layer`].
#[inline(always)]
pub(crate) fn inverse_layer<L: Lanes, const S: u32>(
    simd: L,
    a: &mut [u64],
    roots: &[u64],
    roots_precon: &[u64],
    t: usize,
    modulus: u64,
) {
    debug_assert!(t >= L::LANES);
    debug_assert_eq!(a.len(), 2 * t * roots.len());
    let q: L::V = simd.splat(modulus);
    let two_q: L::V = simd.splat(modulus << 1);
    izip!(a.chunks_exact_mut(2 * t), roots, roots_precon).for_each(|(group, &w, &w_precon)| {
        let (w, w_precon): (L::V, L::V) = (simd.splat(w), simd.splat(w_precon));
        let (xs, ys) = group.split_at_mut(t);
        izip!(xs.chunks_exact_mut(L::LANES), ys.chunks_exact_mut(L::LANES)).for_each(|(x, y)| {
            let (x1, y1) = inverse_butterfly::<L, S>(simd, simd.load(x), simd.load(y), w, w_precon, q, two_q);
            simd.store(x, x1);
            simd.store(y, y1);
        });
    });
}

/// Last inverse layer (`m = 1`, `t = n/2`) with the scaling by `n^-1` folded
/// in: `X' = (X + Y) / n`, `Y' = W (X - Y) / n`. Reduces to [0, q) when
/// `full`, otherwise leaves [0, 2q).
#[inline(always)]
pub(crate) fn inverse_final_layer<L: Lanes, const S: u32>(simd: L, tables: &Tables, a: &mut [u64], full: bool) {
    debug_assert_eq!(a.len(), tables.degree);
    let q: L::V = simd.splat(tables.modulus);
    let two_q: L::V = simd.splat(tables.modulus << 1);
    let inv_n: L::V = simd.splat(tables.inv_n);
    let inv_n_precon: L::V = simd.splat(tables.inv_n_precon);
    let inv_n_w: L::V = simd.splat(tables.inv_n_w);
    let inv_n_w_precon: L::V = simd.splat(tables.inv_n_w_precon);

    let (xs, ys) = a.split_at_mut(tables.degree >> 1);
    izip!(xs.chunks_exact_mut(L::LANES), ys.chunks_exact_mut(L::LANES)).for_each(|(x, y)| {
        let (vx, vy): (L::V, L::V) = (simd.load(x), simd.load(y));
        let tx: L::V = simd.small_mod(simd.add(vx, vy), two_q);
        let ty: L::V = simd.sub(simd.add(vx, two_q), vy);
        let mut x1: L::V = simd.mul_shoup_lazy::<S>(tx, inv_n, inv_n_precon, q);
        let mut y1: L::V = simd.mul_shoup_lazy::<S>(ty, inv_n_w, inv_n_w_precon, q);
        if full {
            x1 = simd.small_mod(x1, q);
            y1 = simd.small_mod(y1, q);
        }
        simd.store(x, x1);
        simd.store(y, y1);
    });
}

/// [0, 4q) to [0, q).
#[inline(always)]
pub(crate) fn reduce_from_4q<L: Lanes>(simd: L, a: &mut [u64], modulus: u64) {
    let q: L::V = simd.splat(modulus);
    let two_q: L::V = simd.splat(modulus << 1);
    a.chunks_exact_mut(L::LANES).for_each(|x| {
        let v: L::V = simd.small_mod(simd.small_mod(simd.load(x), two_q), q);
        simd.store(x, v);
    });
}
