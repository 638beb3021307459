//! Narrow vector-operations interface shared by the native and vectorized
//! kernels.
//!
//! Kernels and butterflies are written once against [`Lanes`]. The scalar
//! implementation processes one `u64` at a time; the AVX-512 implementation
//! processes eight. All arithmetic is on unsigned 64-bit words and wraps.

mod scalar;
pub use scalar::Scalar;

#[cfg(all(target_arch = "x86_64", feature = "avx512"))]
mod avx512;
#[cfg(all(target_arch = "x86_64", feature = "avx512"))]
pub use avx512::Avx512;

use crate::eltwise::CmpInt;

/// A token for a set of `u64` lanes.
///
/// Holding a value of an implementing type proves the instructions it relies
/// on are available.
pub trait Lanes: Copy {
    /// A register of [`Lanes::LANES`] words.
    type V: Copy;
    /// One boolean per lane.
    type Mask: Copy;

    const LANES: usize;

    /// Loads the first `LANES` words of `src`.
    fn load(self, src: &[u64]) -> Self::V;
    /// Stores `v` into the first `LANES` words of `dst`.
    fn store(self, dst: &mut [u64], v: Self::V);
    fn splat(self, x: u64) -> Self::V;

    fn add(self, a: Self::V, b: Self::V) -> Self::V;
    fn sub(self, a: Self::V, b: Self::V) -> Self::V;
    /// Low 64 bits of `a * b`.
    fn mullo(self, a: Self::V, b: Self::V) -> Self::V;
    /// `floor(a * b / 2^S)` for `S` in {32, 52, 64}, exact in every lane.
    fn mulhi<const S: u32>(self, a: Self::V, b: Self::V) -> Self::V;

    /// Lane-wise `a >= b`.
    fn ge(self, a: Self::V, b: Self::V) -> Self::Mask;
    /// Lane-wise `cmp(a, b)`.
    fn cmp(self, a: Self::V, b: Self::V, cmp: CmpInt) -> Self::Mask;
    /// Picks `if_true` where `mask` is set, `if_false` elsewhere.
    fn select(self, mask: Self::Mask, if_true: Self::V, if_false: Self::V) -> Self::V;

    /// `x >= m ? x - m : x`.
    #[inline(always)]
    fn small_mod(self, x: Self::V, m: Self::V) -> Self::V {
        self.select(self.ge(x, m), self.sub(x, m), x)
    }

    /// Shoup product `w * x mod q` in [0, 2q), given
    /// `w_precon = floor(w * 2^S / q)`, `x < 2^S` and `q < 2^(S-2)`.
    #[inline(always)]
    fn mul_shoup_lazy<const S: u32>(self, x: Self::V, w: Self::V, w_precon: Self::V, q: Self::V) -> Self::V {
        let quotient: Self::V = self.mulhi::<S>(w_precon, x);
        self.sub(self.mullo(w, x), self.mullo(quotient, q))
    }

    /// Barrett reduction of an arbitrary word to [0, 2q), given
    /// `factor = floor(2^64 / q)`.
    #[inline(always)]
    fn barrett_lazy(self, x: Self::V, factor: Self::V, q: Self::V) -> Self::V {
        let quotient: Self::V = self.mulhi::<64>(x, factor);
        self.sub(x, self.mullo(quotient, q))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shoup_bounds<L: Lanes>(simd: L, q: u64, w: u64, xs: &[u64]) {
        use crate::number_theory::MultiplyFactor;

        let precon: u64 = MultiplyFactor::new(w, 64, q).barrett_factor();
        let mut out: Vec<u64> = vec![0; L::LANES];
        xs.chunks_exact(L::LANES).for_each(|x| {
            let r = simd.mul_shoup_lazy::<64>(simd.load(x), simd.splat(w), simd.splat(precon), simd.splat(q));
            simd.store(&mut out, r);
            x.iter().zip(out.iter()).for_each(|(&x, &r)| {
                assert!(r < 2 * q);
                assert_eq!(r % q, ((x as u128 * w as u128) % q as u128) as u64);
            });
        });
    }

    #[test]
    fn scalar_shoup() {
        let q: u64 = 0x1fffffffffe00001;
        let xs: Vec<u64> = (0..64u64).map(|i| i.wrapping_mul(0x9e3779b97f4a7c15) % (4 * q)).collect();
        shoup_bounds(Scalar, q, 123456789, &xs);
        shoup_bounds(Scalar, q, q - 1, &xs);
    }

    #[test]
    fn scalar_mulhi_widths() {
        let (a, b) = (0xdead_beef_cafe_f00du64, 0x0123_4567_89ab_cdefu64);
        let p: u128 = a as u128 * b as u128;
        assert_eq!(Scalar.mulhi::<64>(a, b), (p >> 64) as u64);
        assert_eq!(Scalar.mulhi::<52>(a >> 12, b >> 12), (((a >> 12) as u128 * (b >> 12) as u128) >> 52) as u64);
        assert_eq!(Scalar.mulhi::<32>(a >> 32, b >> 32), ((a >> 32) * (b >> 32)) >> 32);
    }
}
