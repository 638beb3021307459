use super::{Eltwise, EltwiseNative, Map1, Map2, check_binary, check_unary, dispatch};
use crate::error::Result;
use crate::simd::Lanes;

/// `a - b mod q` as `a >= b ? a - b : a + q - b`.
pub(crate) struct SubMod {
    pub(crate) modulus: u64,
}

impl Map2 for SubMod {
    #[inline(always)]
    fn apply<L: Lanes>(&self, simd: L, a: L::V, b: L::V) -> L::V {
        let diff: L::V = simd.sub(a, b);
        simd.select(simd.ge(a, b), diff, simd.add(diff, simd.splat(self.modulus)))
    }
}

pub(crate) struct SubScalarMod {
    pub(crate) scalar: u64,
    pub(crate) modulus: u64,
}

impl Map1 for SubScalarMod {
    #[inline(always)]
    fn apply<L: Lanes>(&self, simd: L, x: L::V) -> L::V {
        SubMod {
            modulus: self.modulus,
        }
        .apply(simd, x, simd.splat(self.scalar))
    }
}

/// `result[i] = a[i] - b[i] mod q`, with `a[i], b[i] < q < 2^63`.
pub fn sub_mod<E: Eltwise>(result: &mut [u64], a: &[u64], b: &[u64], modulus: u64) -> Result<()> {
    check_binary(result.len(), a, b, modulus, 63, 1)?;
    E::map2(&SubMod { modulus }, result, a, b);
    Ok(())
}

pub fn sub_mod_inplace<E: Eltwise>(result: &mut [u64], b: &[u64], modulus: u64) -> Result<()> {
    check_binary(result.len(), result, b, modulus, 63, 1)?;
    E::map2_inplace(&SubMod { modulus }, result, b);
    Ok(())
}

/// `result[i] = a[i] - scalar mod q`.
pub fn sub_scalar_mod<E: Eltwise>(result: &mut [u64], a: &[u64], scalar: u64, modulus: u64) -> Result<()> {
    check_unary(result.len(), a, scalar, modulus, 63)?;
    E::map1(&SubScalarMod { scalar, modulus }, result, a);
    Ok(())
}

pub fn sub_scalar_mod_inplace<E: Eltwise>(result: &mut [u64], scalar: u64, modulus: u64) -> Result<()> {
    check_unary(result.len(), result, scalar, modulus, 63)?;
    E::map1_inplace(&SubScalarMod { scalar, modulus }, result);
    Ok(())
}

pub fn eltwise_sub_mod(result: &mut [u64], a: &[u64], b: &[u64], modulus: u64) -> Result<()> {
    dispatch!("sub_mod", sub_mod(result, a, b, modulus))
}

pub fn eltwise_sub_mod_inplace(result: &mut [u64], b: &[u64], modulus: u64) -> Result<()> {
    dispatch!("sub_mod_inplace", sub_mod_inplace(result, b, modulus))
}

pub fn eltwise_sub_mod_native(result: &mut [u64], a: &[u64], b: &[u64], modulus: u64) -> Result<()> {
    sub_mod::<EltwiseNative>(result, a, b, modulus)
}

pub fn eltwise_sub_scalar_mod(result: &mut [u64], a: &[u64], scalar: u64, modulus: u64) -> Result<()> {
    dispatch!("sub_scalar_mod", sub_scalar_mod(result, a, scalar, modulus))
}

pub fn eltwise_sub_scalar_mod_inplace(result: &mut [u64], scalar: u64, modulus: u64) -> Result<()> {
    dispatch!("sub_scalar_mod_inplace", sub_scalar_mod_inplace(result, scalar, modulus))
}

pub fn eltwise_sub_scalar_mod_native(result: &mut [u64], a: &[u64], scalar: u64, modulus: u64) -> Result<()> {
    sub_scalar_mod::<EltwiseNative>(result, a, scalar, modulus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_vector() {
        let a: [u64; 8] = [1, 2, 3, 4, 5, 6, 7, 8];
        let b: [u64; 8] = [1, 3, 5, 7, 2, 4, 6, 8];
        let mut res: [u64; 8] = [0; 8];
        sub_mod::<EltwiseNative>(&mut res, &a, &b, 10).unwrap();
        assert_eq!(res, [0, 9, 8, 7, 3, 2, 1, 0]);
    }

    #[test]
    fn vector_scalar() {
        let mut a: [u64; 8] = [1, 2, 3, 4, 5, 6, 7, 8];
        sub_scalar_mod_inplace::<EltwiseNative>(&mut a, 3, 10).unwrap();
        assert_eq!(a, [8, 9, 0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn inplace_matches_out_of_place() {
        let q: u64 = (1 << 63) - 25;
        let a: Vec<u64> = (0..13u64).map(|i| i.wrapping_mul(0x9e3779b97f4a7c15) % q).collect();
        let b: Vec<u64> = (0..13u64).map(|i| i.wrapping_mul(0xc2b2ae3d27d4eb4f) % q).collect();
        let mut res: Vec<u64> = vec![0; 13];
        sub_mod::<EltwiseNative>(&mut res, &a, &b, q).unwrap();
        let mut inplace: Vec<u64> = a.clone();
        sub_mod_inplace::<EltwiseNative>(&mut inplace, &b, q).unwrap();
        assert_eq!(res, inplace);
        res.iter().zip(a.iter().zip(b.iter())).for_each(|(&r, (&a, &b))| {
            assert_eq!(r as i128, (a as i128 - b as i128).rem_euclid(q as i128));
        });
    }
}
