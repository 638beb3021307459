use super::{Eltwise, EltwiseNative, Map1, dispatch};
use crate::check;
use crate::error::{Error, Result};
use crate::number_theory::MultiplyFactor;
use crate::simd::Lanes;

/// Comparison predicate `x OP bound` for the conditional kernels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CmpInt {
    Eq,
    Lt,
    Le,
    False,
    Ne,
    /// Not less than.
    Nlt,
    /// Not less than or equal.
    Nle,
    True,
}

impl CmpInt {
    #[inline(always)]
    pub fn holds(self, a: u64, b: u64) -> bool {
        match self {
            CmpInt::Eq => a == b,
            CmpInt::Lt => a < b,
            CmpInt::Le => a <= b,
            CmpInt::False => false,
            CmpInt::Ne => a != b,
            CmpInt::Nlt => a >= b,
            CmpInt::Nle => a > b,
            CmpInt::True => true,
        }
    }
}

pub(crate) struct CmpAdd {
    cmp: CmpInt,
    bound: u64,
    diff: u64,
}

impl Map1 for CmpAdd {
    #[inline(always)]
    fn apply<L: Lanes>(&self, simd: L, x: L::V) -> L::V {
        let mask = simd.cmp(x, simd.splat(self.bound), self.cmp);
        simd.select(mask, simd.add(x, simd.splat(self.diff)), x)
    }
}

/// Reduces mod q, then subtracts `diff` where the unreduced value satisfies
/// the comparison.
pub(crate) struct CmpSubMod {
    modulus: u64,
    factor: u64,
    cmp: CmpInt,
    bound: u64,
    diff: u64,
}

impl Map1 for CmpSubMod {
    #[inline(always)]
    fn apply<L: Lanes>(&self, simd: L, x: L::V) -> L::V {
        let q: L::V = simd.splat(self.modulus);
        let diff: L::V = simd.splat(self.diff);
        let mask = simd.cmp(x, simd.splat(self.bound), self.cmp);
        let r: L::V = simd.small_mod(simd.barrett_lazy(x, simd.splat(self.factor), q), q);
        let sub: L::V = simd.sub(r, diff);
        let sub: L::V = simd.select(simd.ge(r, diff), sub, simd.add(sub, q));
        simd.select(mask, sub, r)
    }
}

fn check_cmp_add(result_len: usize, operand: &[u64], diff: u64) -> Result<()> {
    check::non_empty(operand.len())?;
    check::same_len("result", operand.len(), result_len)?;
    if diff == 0 {
        return Err(Error::InvalidDiff {
            diff,
            reason: "must be non-zero",
        });
    }
    Ok(())
}

fn check_cmp_sub_mod(result_len: usize, operand: &[u64], modulus: u64, diff: u64) -> Result<()> {
    check::non_empty(operand.len())?;
    check::same_len("result", operand.len(), result_len)?;
    check::modulus_below(modulus, 63)?;
    if diff == 0 || diff >= modulus {
        return Err(Error::InvalidDiff {
            diff,
            reason: "must be in (0, modulus)",
        });
    }
    Ok(())
}

/// `result[i] = cmp(operand[i], bound) ? operand[i] + diff : operand[i]`,
/// with wrapping addition.
pub fn cmp_add<E: Eltwise>(
    result: &mut [u64],
    operand: &[u64],
    cmp: CmpInt,
    bound: u64,
    diff: u64,
) -> Result<()> {
    check_cmp_add(result.len(), operand, diff)?;
    E::map1(&CmpAdd { cmp, bound, diff }, result, operand);
    Ok(())
}

pub fn cmp_add_inplace<E: Eltwise>(result: &mut [u64], cmp: CmpInt, bound: u64, diff: u64) -> Result<()> {
    check_cmp_add(result.len(), result, diff)?;
    E::map1_inplace(&CmpAdd { cmp, bound, diff }, result);
    Ok(())
}

/// `result[i] = cmp(operand[i], bound) ? (operand[i] mod q) - diff mod q :
/// operand[i] mod q`, with `0 < diff < q < 2^63`.
pub fn cmp_sub_mod<E: Eltwise>(
    result: &mut [u64],
    operand: &[u64],
    modulus: u64,
    cmp: CmpInt,
    bound: u64,
    diff: u64,
) -> Result<()> {
    check_cmp_sub_mod(result.len(), operand, modulus, diff)?;
    E::map1(&cmp_sub_mod_op(modulus, cmp, bound, diff), result, operand);
    Ok(())
}

pub fn cmp_sub_mod_inplace<E: Eltwise>(
    result: &mut [u64],
    modulus: u64,
    cmp: CmpInt,
    bound: u64,
    diff: u64,
) -> Result<()> {
    check_cmp_sub_mod(result.len(), result, modulus, diff)?;
    E::map1_inplace(&cmp_sub_mod_op(modulus, cmp, bound, diff), result);
    Ok(())
}

fn cmp_sub_mod_op(modulus: u64, cmp: CmpInt, bound: u64, diff: u64) -> CmpSubMod {
    CmpSubMod {
        modulus,
        factor: MultiplyFactor::new(1, 64, modulus).barrett_factor(),
        cmp,
        bound,
        diff,
    }
}

pub fn eltwise_cmp_add(result: &mut [u64], operand: &[u64], cmp: CmpInt, bound: u64, diff: u64) -> Result<()> {
    dispatch!("cmp_add", cmp_add(result, operand, cmp, bound, diff))
}

pub fn eltwise_cmp_add_inplace(result: &mut [u64], cmp: CmpInt, bound: u64, diff: u64) -> Result<()> {
    dispatch!("cmp_add_inplace", cmp_add_inplace(result, cmp, bound, diff))
}

pub fn eltwise_cmp_add_native(
    result: &mut [u64],
    operand: &[u64],
    cmp: CmpInt,
    bound: u64,
    diff: u64,
) -> Result<()> {
    cmp_add::<EltwiseNative>(result, operand, cmp, bound, diff)
}

pub fn eltwise_cmp_sub_mod(
    result: &mut [u64],
    operand: &[u64],
    modulus: u64,
    cmp: CmpInt,
    bound: u64,
    diff: u64,
) -> Result<()> {
    dispatch!(
        "cmp_sub_mod",
        cmp_sub_mod(result, operand, modulus, cmp, bound, diff)
    )
}

pub fn eltwise_cmp_sub_mod_inplace(
    result: &mut [u64],
    modulus: u64,
    cmp: CmpInt,
    bound: u64,
    diff: u64,
) -> Result<()> {
    dispatch!(
        "cmp_sub_mod_inplace",
        cmp_sub_mod_inplace(result, modulus, cmp, bound, diff)
    )
}

pub fn eltwise_cmp_sub_mod_native(
    result: &mut [u64],
    operand: &[u64],
    modulus: u64,
    cmp: CmpInt,
    bound: u64,
    diff: u64,
) -> Result<()> {
    cmp_sub_mod::<EltwiseNative>(result, operand, modulus, cmp, bound, diff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_above_bound() {
        let mut op: [u64; 8] = [1, 2, 3, 4, 5, 6, 7, 8];
        cmp_add_inplace::<EltwiseNative>(&mut op, CmpInt::Nle, 3, 5).unwrap();
        assert_eq!(op, [1, 2, 3, 9, 10, 11, 12, 13]);
    }

    #[test]
    fn sub_mod_above_bound() {
        let mut op: [u64; 7] = [1, 2, 3, 4, 5, 6, 7];
        cmp_sub_mod_inplace::<EltwiseNative>(&mut op, 10, CmpInt::Nle, 4, 5).unwrap();
        assert_eq!(op, [1, 2, 3, 4, 0, 1, 2]);
    }

    #[test]
    fn compares_unreduced_value() {
        let operand: [u64; 4] = [3, 13, 23, u64::MAX];
        let mut res: [u64; 4] = [0; 4];
        cmp_sub_mod::<EltwiseNative>(&mut res, &operand, 10, CmpInt::Lt, 20, 4).unwrap();
        assert_eq!(res, [9, 9, 3, (u64::MAX % 10)]);
        cmp_sub_mod::<EltwiseNative>(&mut res, &operand, 10, CmpInt::True, 0, 4).unwrap();
        assert_eq!(res, [9, 9, 9, (u64::MAX % 10 + 6) % 10]);
        cmp_sub_mod::<EltwiseNative>(&mut res, &operand, 10, CmpInt::False, 0, 4).unwrap();
        assert_eq!(res, [3, 3, 3, u64::MAX % 10]);
    }

    #[test]
    fn invalid_diff() {
        let mut res: [u64; 1] = [0];
        assert!(cmp_add::<EltwiseNative>(&mut res, &[1], CmpInt::Eq, 1, 0).is_err());
        assert!(cmp_sub_mod::<EltwiseNative>(&mut res, &[1], 10, CmpInt::Eq, 1, 0).is_err());
        assert!(cmp_sub_mod::<EltwiseNative>(&mut res, &[1], 10, CmpInt::Eq, 1, 10).is_err());
    }
}
