//! Eight-lane transform: full-stride layers reuse the generic driver under
//! `avx512f,avx512dq`; the three layers of stride 4, 2 and 1 shuffle each
//! 16-word chunk into an `(X, Y)` register pair and read the replicated root
//! tables eight roots at a time.

use core::arch::x86_64::{__m512i, _mm512_permutex2var_epi64, _mm512_setr_epi64};

use itertools::izip;

use super::butterfly::{forward_butterfly, inverse_butterfly};
use super::driver::{NttLanes, forward_recursive, inverse_recursive};
use super::tables::{Tables, forward_replicated_index, inverse_replicated_index};
use crate::simd::{Avx512, Lanes};

impl NttLanes for Avx512 {
    #[inline]
    fn forward_block<const S: u32>(self, tables: &Tables, a: &mut [u64], depth: usize, half: usize, full: bool) {
        // SAFETY: `self` proves avx512f and avx512dq are available.
        unsafe { forward_block_avx512::<S>(self, tables, a, depth, half, full) }
    }

    #[inline]
    fn inverse_block<const S: u32>(self, tables: &Tables, a: &mut [u64], depth: usize, half: usize, full: bool) {
        // SAFETY: `self` proves avx512f and avx512dq are available.
        unsafe { inverse_block_avx512::<S>(self, tables, a, depth, half, full) }
    }

    #[inline(always)]
    fn forward_narrow<const S: u32>(self, tables: &Tables, a: &mut [u64], depth: usize, half: usize) {
        let n: usize = a.len();
        let big_n: usize = n << depth;
        let rep = &tables.replicated;
        for (stride, m) in [(4, n / 8), (2, n / 4), (1, n / 2)] {
            let pos: usize = forward_replicated_index((m << depth) + half * m, big_n);
            narrow_layer::<S, true>(
                self,
                a,
                &rep.roots[pos..pos + n / 2],
                &rep.roots_precon[pos..pos + n / 2],
                Shuffle::new(stride),
                tables.modulus,
            );
        }
    }

    #[inline(always)]
    fn inverse_narrow<const S: u32>(self, tables: &Tables, a: &mut [u64], depth: usize, half: usize) {
        let n: usize = a.len();
        let big_n: usize = n << depth;
        let rep = &tables.replicated;
        for (stride, m) in [(1, n / 2), (2, n / 4), (4, n / 8)] {
            let pos: usize = inverse_replicated_index(big_n - 2 * (m << depth) + 1 + half * m, big_n);
            narrow_layer::<S, false>(
                self,
                a,
                &rep.inv_roots[pos..pos + n / 2],
                &rep.inv_roots_precon[pos..pos + n / 2],
                Shuffle::new(stride),
                tables.modulus,
            );
        }
    }
}

#[target_feature(enable = "avx512f,avx512dq")]
fn forward_block_avx512<const S: u32>(
    simd: Avx512,
    tables: &Tables,
    a: &mut [u64],
    depth: usize,
    half: usize,
    full: bool,
) {
    forward_recursive::<Avx512, S>(simd, tables, a, depth, half, full)
}

#[target_feature(enable = "avx512f,avx512dq")]
fn inverse_block_avx512<const S: u32>(
    simd: Avx512,
    tables: &Tables,
    a: &mut [u64],
    depth: usize,
    half: usize,
    full: bool,
) {
    inverse_recursive::<Avx512, S>(simd, tables, a, depth, half, full)
}

/// Index vectors for `_mm512_permutex2var_epi64` over a chunk loaded as
/// `(lo, hi)`. Indices 0..8 pick from `lo`, 8..16 from `hi`.
#[derive(Clone, Copy)]
struct Shuffle {
    x: __m512i,
    y: __m512i,
    lo: __m512i,
    hi: __m512i,
}

impl Shuffle {
    #[inline(always)]
    fn new(stride: usize) -> Self {
        // SAFETY: only called from code running under avx512f.
        unsafe {
            match stride {
                4 => Self {
                    x: _mm512_setr_epi64(0, 1, 2, 3, 8, 9, 10, 11),
                    y: _mm512_setr_epi64(4, 5, 6, 7, 12, 13, 14, 15),
                    lo: _mm512_setr_epi64(0, 1, 2, 3, 8, 9, 10, 11),
                    hi: _mm512_setr_epi64(4, 5, 6, 7, 12, 13, 14, 15),
                },
                2 => Self {
                    x: _mm512_setr_epi64(0, 1, 4, 5, 8, 9, 12, 13),
                    y: _mm512_setr_epi64(2, 3, 6, 7, 10, 11, 14, 15),
                    lo: _mm512_setr_epi64(0, 1, 8, 9, 2, 3, 10, 11),
                    hi: _mm512_setr_epi64(4, 5, 12, 13, 6, 7, 14, 15),
                },
                _ => Self {
                    x: _mm512_setr_epi64(0, 2, 4, 6, 8, 10, 12, 14),
                    y: _mm512_setr_epi64(1, 3, 5, 7, 9, 11, 13, 15),
                    lo: _mm512_setr_epi64(0, 8, 1, 9, 2, 10, 3, 11),
                    hi: _mm512_setr_epi64(4, 12, 5, 13, 6, 14, 7, 15),
                },
            }
        }
    }
}

/// One layer of stride 4, 2 or 1. Each 16-word chunk holds eight
/// butterflies and consumes eight replicated roots.
#[inline(always)]
fn narrow_layer<const S: u32, const FORWARD: bool>(
    simd: Avx512,
    a: &mut [u64],
    roots: &[u64],
    roots_precon: &[u64],
    shuffle: Shuffle,
    modulus: u64,
) {
    debug_assert_eq!(a.len(), 2 * roots.len());
    let q: __m512i = simd.splat(modulus);
    let two_q: __m512i = simd.splat(modulus << 1);
    izip!(a.chunks_exact_mut(16), roots.chunks_exact(8), roots_precon.chunks_exact(8)).for_each(|(chunk, w, wp)| {
        let (lo, hi) = chunk.split_at_mut(8);
        let (v0, v1): (__m512i, __m512i) = (simd.load(lo), simd.load(hi));
        // SAFETY: see `Shuffle::new`.
        let (x, y) = unsafe {
            (
                _mm512_permutex2var_epi64(v0, shuffle.x, v1),
                _mm512_permutex2var_epi64(v0, shuffle.y, v1),
            )
        };
        let (w, wp): (__m512i, __m512i) = (simd.load(w), simd.load(wp));
        let (x1, y1) = if FORWARD {
            forward_butterfly::<Avx512, S>(simd, x, y, w, wp, q, two_q)
        } else {
            inverse_butterfly::<Avx512, S>(simd, x, y, w, wp, q, two_q)
        };
        // SAFETY: as above.
        let (r0, r1) = unsafe {
            (
                _mm512_permutex2var_epi64(x1, shuffle.lo, y1),
                _mm512_permutex2var_epi64(x1, shuffle.hi, y1),
            )
        };
        simd.store(lo, r0);
        simd.store(hi, r1);
    });
}
