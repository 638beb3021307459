use super::{Eltwise, EltwiseNative, Map1, Map2, check_binary, check_unary, dispatch};
use crate::error::Result;
use crate::simd::Lanes;

/// `a + b mod q` for `a, b < q`: the sum is compared against `q` rather
/// than reduced with a division.
pub(crate) struct AddMod {
    pub(crate) modulus: u64,
}

impl Map2 for AddMod {
    #[inline(always)]
    fn apply<L: Lanes>(&self, simd: L, a: L::V, b: L::V) -> L::V {
        simd.small_mod(simd.add(a, b), simd.splat(self.modulus))
    }
}

/// `a + s mod q` as `a >= q - s ? a - (q - s) : a + s`.
pub(crate) struct AddScalarMod {
    scalar: u64,
    diff: u64,
}

impl AddScalarMod {
    pub(crate) fn new(scalar: u64, modulus: u64) -> Self {
        Self {
            scalar,
            diff: modulus - scalar,
        }
    }
}

impl Map1 for AddScalarMod {
    #[inline(always)]
    fn apply<L: Lanes>(&self, simd: L, x: L::V) -> L::V {
        let diff: L::V = simd.splat(self.diff);
        simd.select(
            simd.ge(x, diff),
            simd.sub(x, diff),
            simd.add(x, simd.splat(self.scalar)),
        )
    }
}

/// `result[i] = a[i] + b[i] mod q`, with `a[i], b[i] < q < 2^63`.
pub fn add_mod<E: Eltwise>(result: &mut [u64], a: &[u64], b: &[u64], modulus: u64) -> Result<()> {
    check_binary(result.len(), a, b, modulus, 63, 1)?;
    E::map2(&AddMod { modulus }, result, a, b);
    Ok(())
}

/// `result[i] = result[i] + b[i] mod q`.
pub fn add_mod_inplace<E: Eltwise>(result: &mut [u64], b: &[u64], modulus: u64) -> Result<()> {
    check_binary(result.len(), result, b, modulus, 63, 1)?;
    E::map2_inplace(&AddMod { modulus }, result, b);
    Ok(())
}

/// `result[i] = a[i] + scalar mod q`, with `a[i], scalar < q < 2^63`.
pub fn add_scalar_mod<E: Eltwise>(result: &mut [u64], a: &[u64], scalar: u64, modulus: u64) -> Result<()> {
    check_unary(result.len(), a, scalar, modulus, 63)?;
    E::map1(&AddScalarMod::new(scalar, modulus), result, a);
    Ok(())
}

pub fn add_scalar_mod_inplace<E: Eltwise>(result: &mut [u64], scalar: u64, modulus: u64) -> Result<()> {
    check_unary(result.len(), result, scalar, modulus, 63)?;
    E::map1_inplace(&AddScalarMod::new(scalar, modulus), result);
    Ok(())
}

pub fn eltwise_add_mod(result: &mut [u64], a: &[u64], b: &[u64], modulus: u64) -> Result<()> {
    dispatch!("add_mod", add_mod(result, a, b, modulus))
}

pub fn eltwise_add_mod_inplace(result: &mut [u64], b: &[u64], modulus: u64) -> Result<()> {
    dispatch!("add_mod_inplace", add_mod_inplace(result, b, modulus))
}

pub fn eltwise_add_mod_native(result: &mut [u64], a: &[u64], b: &[u64], modulus: u64) -> Result<()> {
    add_mod::<EltwiseNative>(result, a, b, modulus)
}

pub fn eltwise_add_scalar_mod(result: &mut [u64], a: &[u64], scalar: u64, modulus: u64) -> Result<()> {
    dispatch!("add_scalar_mod", add_scalar_mod(result, a, scalar, modulus))
}

pub fn eltwise_add_scalar_mod_inplace(result: &mut [u64], scalar: u64, modulus: u64) -> Result<()> {
    dispatch!("add_scalar_mod_inplace", add_scalar_mod_inplace(result, scalar, modulus))
}

pub fn eltwise_add_scalar_mod_native(result: &mut [u64], a: &[u64], scalar: u64, modulus: u64) -> Result<()> {
    add_scalar_mod::<EltwiseNative>(result, a, scalar, modulus)
}
