use super::Lanes;
use crate::eltwise::CmpInt;
use crate::number_theory::ReduceOnce;

/// Single-lane backend; always available.
#[derive(Clone, Copy, Debug, Default)]
pub struct Scalar;

impl Lanes for Scalar {
    type V = u64;
    type Mask = bool;

    const LANES: usize = 1;

    #[inline(always)]
    fn load(self, src: &[u64]) -> u64 {
        src[0]
    }

    #[inline(always)]
    fn store(self, dst: &mut [u64], v: u64) {
        dst[0] = v
    }

    #[inline(always)]
    fn splat(self, x: u64) -> u64 {
        x
    }

    #[inline(always)]
    fn add(self, a: u64, b: u64) -> u64 {
        a.wrapping_add(b)
    }

    #[inline(always)]
    fn sub(self, a: u64, b: u64) -> u64 {
        a.wrapping_sub(b)
    }

    #[inline(always)]
    fn mullo(self, a: u64, b: u64) -> u64 {
        a.wrapping_mul(b)
    }

    #[inline(always)]
    fn mulhi<const S: u32>(self, a: u64, b: u64) -> u64 {
        ((a as u128 * b as u128) >> S) as u64
    }

    #[inline(always)]
    fn ge(self, a: u64, b: u64) -> bool {
        a >= b
    }

    #[inline(always)]
    fn cmp(self, a: u64, b: u64, cmp: CmpInt) -> bool {
        cmp.holds(a, b)
    }

    #[inline(always)]
    fn select(self, mask: bool, if_true: u64, if_false: u64) -> u64 {
        if mask { if_true } else { if_false }
    }

    #[inline(always)]
    fn small_mod(self, x: u64, m: u64) -> u64 {
        x.reduce_once(m)
    }
}
