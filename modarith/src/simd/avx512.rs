use core::arch::x86_64::{
    __m512i, __mmask8, _mm512_add_epi64, _mm512_and_si512, _mm512_cmpeq_epu64_mask, _mm512_cmpge_epu64_mask,
    _mm512_cmpgt_epu64_mask, _mm512_cmple_epu64_mask, _mm512_cmplt_epu64_mask, _mm512_cmpneq_epu64_mask,
    _mm512_loadu_epi64, _mm512_mask_blend_epi64, _mm512_mul_epu32, _mm512_mullo_epi64, _mm512_or_si512,
    _mm512_set1_epi64, _mm512_slli_epi64, _mm512_sllv_epi64, _mm512_srli_epi64, _mm512_srlv_epi64,
    _mm512_storeu_epi64, _mm512_sub_epi64,
};

use super::Lanes;
use crate::capability::cpu_has_avx512dq;
use crate::eltwise::CmpInt;

/// Eight-lane AVX512-F/DQ backend.
///
/// A value can only be obtained through [`Avx512::try_new`], so every method
/// may assume the instructions are present.
#[derive(Clone, Copy, Debug)]
pub struct Avx512 {
    _private: (),
}

impl Avx512 {
    /// Returns a token if the CPU supports AVX512-F and AVX512-DQ.
    #[inline]
    pub fn try_new() -> Option<Self> {
        cpu_has_avx512dq().then_some(Self { _private: () })
    }
}

// SAFETY (all unsafe blocks below): an `Avx512` value exists only if the CPU
// reports avx512f and avx512dq; loads and stores stay within slices of at
// least eight words.
impl Lanes for Avx512 {
    type V = __m512i;
    type Mask = __mmask8;

    const LANES: usize = 8;

    #[inline(always)]
    fn load(self, src: &[u64]) -> __m512i {
        let src: &[u64] = &src[..8];
        unsafe { _mm512_loadu_epi64(src.as_ptr() as *const i64) }
    }

    #[inline(always)]
    fn store(self, dst: &mut [u64], v: __m512i) {
        let dst: &mut [u64] = &mut dst[..8];
        unsafe { _mm512_storeu_epi64(dst.as_mut_ptr() as *mut i64, v) }
    }

    #[inline(always)]
    fn splat(self, x: u64) -> __m512i {
        unsafe { _mm512_set1_epi64(x as i64) }
    }

    #[inline(always)]
    fn add(self, a: __m512i, b: __m512i) -> __m512i {
        unsafe { _mm512_add_epi64(a, b) }
    }

    #[inline(always)]
    fn sub(self, a: __m512i, b: __m512i) -> __m512i {
        unsafe { _mm512_sub_epi64(a, b) }
    }

    #[inline(always)]
    fn mullo(self, a: __m512i, b: __m512i) -> __m512i {
        unsafe { _mm512_mullo_epi64(a, b) }
    }

    /// Full 64x64 -> 128 product assembled from four 32x32 partial products,
    /// then shifted right by `S`.
    #[inline(always)]
    fn mulhi<const S: u32>(self, a: __m512i, b: __m512i) -> __m512i {
        unsafe {
            let lo_32: __m512i = _mm512_set1_epi64(0xffff_ffff);
            let a_hi: __m512i = _mm512_srli_epi64::<32>(a);
            let b_hi: __m512i = _mm512_srli_epi64::<32>(b);

            let ll: __m512i = _mm512_mul_epu32(a, b);
            let lh: __m512i = _mm512_mul_epu32(a, b_hi);
            let hl: __m512i = _mm512_mul_epu32(a_hi, b);
            let hh: __m512i = _mm512_mul_epu32(a_hi, b_hi);

            // < 3 * 2^32
            let mid: __m512i = _mm512_add_epi64(
                _mm512_add_epi64(_mm512_srli_epi64::<32>(ll), _mm512_and_si512(lh, lo_32)),
                _mm512_and_si512(hl, lo_32),
            );

            let hi: __m512i = _mm512_add_epi64(
                _mm512_add_epi64(hh, _mm512_srli_epi64::<32>(lh)),
                _mm512_add_epi64(_mm512_srli_epi64::<32>(hl), _mm512_srli_epi64::<32>(mid)),
            );

            if S == 64 {
                return hi;
            }

            let lo: __m512i = _mm512_or_si512(_mm512_slli_epi64::<32>(mid), _mm512_and_si512(ll, lo_32));
            _mm512_or_si512(
                _mm512_sllv_epi64(hi, _mm512_set1_epi64((64 - S) as i64)),
                _mm512_srlv_epi64(lo, _mm512_set1_epi64(S as i64)),
            )
        }
    }

    #[inline(always)]
    fn ge(self, a: __m512i, b: __m512i) -> __mmask8 {
        unsafe { _mm512_cmpge_epu64_mask(a, b) }
    }

    #[inline(always)]
    fn cmp(self, a: __m512i, b: __m512i, cmp: CmpInt) -> __mmask8 {
        unsafe {
            match cmp {
                CmpInt::Eq => _mm512_cmpeq_epu64_mask(a, b),
                CmpInt::Lt => _mm512_cmplt_epu64_mask(a, b),
                CmpInt::Le => _mm512_cmple_epu64_mask(a, b),
                CmpInt::False => 0,
                CmpInt::Ne => _mm512_cmpneq_epu64_mask(a, b),
                CmpInt::Nlt => _mm512_cmpge_epu64_mask(a, b),
                CmpInt::Nle => _mm512_cmpgt_epu64_mask(a, b),
                CmpInt::True => 0xff,
            }
        }
    }

    #[inline(always)]
    fn select(self, mask: __mmask8, if_true: __m512i, if_false: __m512i) -> __m512i {
        unsafe { _mm512_mask_blend_epi64(mask, if_false, if_true) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::Scalar;

    fn lanes_match<const S: u32>(a: &[u64], b: &[u64]) {
        let Some(simd) = Avx512::try_new() else {
            return;
        };
        let mut out: [u64; 8] = [0; 8];
        a.chunks_exact(8).zip(b.chunks_exact(8)).for_each(|(a, b)| {
            simd.store(&mut out, simd.mulhi::<S>(simd.load(a), simd.load(b)));
            (0..8).for_each(|i| assert_eq!(out[i], Scalar.mulhi::<S>(a[i], b[i]), "S={S} a={} b={}", a[i], b[i]));
        });
    }

    #[test]
    fn mulhi_matches_scalar() {
        let a: Vec<u64> = (1..=64u64).map(|i| i.wrapping_mul(0x9e3779b97f4a7c15)).collect();
        let b: Vec<u64> = (1..=64u64).map(|i| i.wrapping_mul(0xc2b2ae3d27d4eb4f) ^ (i << 40)).collect();
        lanes_match::<64>(&a, &b);
        let a52: Vec<u64> = a.iter().map(|x| x >> 12).collect();
        let b52: Vec<u64> = b.iter().map(|x| x >> 12).collect();
        lanes_match::<52>(&a52, &b52);
        let a32: Vec<u64> = a.iter().map(|x| x >> 32).collect();
        let b32: Vec<u64> = b.iter().map(|x| x >> 32).collect();
        lanes_match::<32>(&a32, &b32);
        lanes_match::<64>(&[u64::MAX; 8], &[u64::MAX; 8]);
    }

    #[test]
    fn compare_select() {
        let Some(simd) = Avx512::try_new() else {
            return;
        };
        let a: [u64; 8] = [0, 1, 2, 3, 4, 5, 6, u64::MAX];
        let b: [u64; 8] = [3; 8];
        let mut out: [u64; 8] = [0; 8];
        for cmp in [
            CmpInt::Eq,
            CmpInt::Lt,
            CmpInt::Le,
            CmpInt::False,
            CmpInt::Ne,
            CmpInt::Nlt,
            CmpInt::Nle,
            CmpInt::True,
        ] {
            let m = simd.cmp(simd.load(&a), simd.load(&b), cmp);
            simd.store(&mut out, simd.select(m, simd.splat(1), simd.splat(0)));
            (0..8).for_each(|i| assert_eq!(out[i] == 1, cmp.holds(a[i], b[i]), "{cmp:?} {}", a[i]));
        }
    }
}
