use super::{Eltwise, EltwiseNative, Map1, Map2, dispatch};
use crate::check;
use crate::error::Result;
use crate::number_theory::MultiplyFactor;
use crate::simd::Lanes;

/// Reduces `x < F * q` to [0, q).
#[inline(always)]
fn reduce_input<L: Lanes, const F: u64>(simd: L, x: L::V, q: L::V, two_q: L::V) -> L::V {
    match F {
        1 => x,
        2 => simd.small_mod(x, q),
        _ => simd.small_mod(simd.small_mod(x, two_q), q),
    }
}

/// `arg1 * arg2 (+ arg3) mod q` with `arg2` Shoup-preconditioned at 64 bits.
pub(crate) struct FmaMod<const F: u64> {
    modulus: u64,
    arg2: u64,
    arg2_precon: u64,
}

impl<const F: u64> FmaMod<F> {
    fn new(arg2: u64, modulus: u64) -> Self {
        let arg2: u64 = arg2 % modulus;
        Self {
            modulus,
            arg2,
            arg2_precon: MultiplyFactor::new(arg2, 64, modulus).barrett_factor(),
        }
    }

    #[inline(always)]
    fn product<L: Lanes>(&self, simd: L, x: L::V, q: L::V, two_q: L::V) -> L::V {
        let x: L::V = reduce_input::<L, F>(simd, x, q, two_q);
        let prod: L::V = simd.mul_shoup_lazy::<64>(
            x,
            simd.splat(self.arg2),
            simd.splat(self.arg2_precon),
            q,
        );
        simd.small_mod(prod, q)
    }
}

impl<const F: u64> Map1 for FmaMod<F> {
    #[inline(always)]
    fn apply<L: Lanes>(&self, simd: L, x: L::V) -> L::V {
        let q: L::V = simd.splat(self.modulus);
        self.product(simd, x, q, simd.splat(self.modulus << 1))
    }
}

impl<const F: u64> Map2 for FmaMod<F> {
    #[inline(always)]
    fn apply<L: Lanes>(&self, simd: L, x: L::V, addend: L::V) -> L::V {
        let q: L::V = simd.splat(self.modulus);
        let two_q: L::V = simd.splat(self.modulus << 1);
        let prod: L::V = self.product(simd, x, q, two_q);
        let addend: L::V = reduce_input::<L, F>(simd, addend, q, two_q);
        simd.small_mod(simd.add(prod, addend), q)
    }
}

fn check_fma(
    result_len: usize,
    arg1: &[u64],
    arg2: u64,
    arg3: Option<&[u64]>,
    modulus: u64,
    input_mod_factor: u64,
) -> Result<()> {
    check::non_empty(arg1.len())?;
    check::same_len("result", arg1.len(), result_len)?;
    check::modulus_below(modulus, 62)?;
    check::mod_factor("input_mod_factor", input_mod_factor, &[1, 2, 4])?;
    let bound: u128 = check::bound(input_mod_factor, modulus);
    check::all_below("arg1", arg1, bound)?;
    check::scalar_below("arg2", arg2, bound)?;
    if let Some(arg3) = arg3 {
        check::same_len("arg3", arg1.len(), arg3.len())?;
        check::all_below("arg3", arg3, bound)?;
    }
    Ok(())
}

fn run_fma<E: Eltwise>(
    result: &mut [u64],
    arg1: Option<&[u64]>,
    arg2: u64,
    arg3: Option<&[u64]>,
    modulus: u64,
    input_mod_factor: u64,
) {
    macro_rules! run {
        ($f:literal) => {{
            let op: FmaMod<$f> = FmaMod::new(arg2, modulus);
            match (arg1, arg3) {
                (Some(arg1), Some(arg3)) => E::map2(&op, result, arg1, arg3),
                (Some(arg1), None) => E::map1(&op, result, arg1),
                (None, Some(arg3)) => E::map2_inplace(&op, result, arg3),
                (None, None) => E::map1_inplace(&op, result),
            }
        }};
    }

    match input_mod_factor {
        1 => run!(1),
        2 => run!(2),
        _ => run!(4),
    }
}

/// `result[i] = arg1[i] * arg2 + arg3[i] mod q`, or `arg1[i] * arg2 mod q`
/// without `arg3`.
///
/// Operands must be below `input_mod_factor * q` with `input_mod_factor` in
/// {1, 2, 4} and `q < 2^62`. The result is fully reduced.
pub fn fma_mod<E: Eltwise>(
    result: &mut [u64],
    arg1: &[u64],
    arg2: u64,
    arg3: Option<&[u64]>,
    modulus: u64,
    input_mod_factor: u64,
) -> Result<()> {
    check_fma(result.len(), arg1, arg2, arg3, modulus, input_mod_factor)?;
    run_fma::<E>(result, Some(arg1), arg2, arg3, modulus, input_mod_factor);
    Ok(())
}

/// [`fma_mod`] with `arg1` read from `result`.
pub fn fma_mod_inplace<E: Eltwise>(
    result: &mut [u64],
    arg2: u64,
    arg3: Option<&[u64]>,
    modulus: u64,
    input_mod_factor: u64,
) -> Result<()> {
    check_fma(result.len(), result, arg2, arg3, modulus, input_mod_factor)?;
    run_fma::<E>(result, None, arg2, arg3, modulus, input_mod_factor);
    Ok(())
}

pub fn eltwise_fma_mod(
    result: &mut [u64],
    arg1: &[u64],
    arg2: u64,
    arg3: Option<&[u64]>,
    modulus: u64,
    input_mod_factor: u64,
) -> Result<()> {
    dispatch!(
        "fma_mod",
        fma_mod(result, arg1, arg2, arg3, modulus, input_mod_factor)
    )
}

pub fn eltwise_fma_mod_inplace(
    result: &mut [u64],
    arg2: u64,
    arg3: Option<&[u64]>,
    modulus: u64,
    input_mod_factor: u64,
) -> Result<()> {
    dispatch!(
        "fma_mod_inplace",
        fma_mod_inplace(result, arg2, arg3, modulus, input_mod_factor)
    )
}

pub fn eltwise_fma_mod_native(
    result: &mut [u64],
    arg1: &[u64],
    arg2: u64,
    arg3: Option<&[u64]>,
    modulus: u64,
    input_mod_factor: u64,
) -> Result<()> {
    fma_mod::<EltwiseNative>(result, arg1, arg2, arg3, modulus, input_mod_factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(a: u64, b: u64, c: u64, q: u64) -> u64 {
        ((a as u128 * b as u128 + c as u128) % q as u128) as u64
    }

    #[test]
    fn identity_multiplier() {
        let mut arg1: [u64; 9] = [1, 2, 3, 4, 5, 6, 7, 8, 9];
        fma_mod_inplace::<EltwiseNative>(&mut arg1, 1, None, 769, 1).unwrap();
        assert_eq!(arg1, [1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn with_addend() {
        let q: u64 = (1 << 62) - 57;
        for factor in [1u64, 2, 4] {
            let bound: u128 = factor as u128 * q as u128;
            let arg1: Vec<u64> = (1..=11u64)
                .map(|i| (i.wrapping_mul(0x9e3779b97f4a7c15) as u128 % bound) as u64)
                .collect();
            let arg3: Vec<u64> = (1..=11u64)
                .map(|i| (i.wrapping_mul(0xc2b2ae3d27d4eb4f) as u128 % bound) as u64)
                .collect();
            let arg2: u64 = (0xdeadbeefcafef00du128 % bound) as u64;
            let mut res: Vec<u64> = vec![0; 11];
            fma_mod::<EltwiseNative>(&mut res, &arg1, arg2, Some(&arg3), q, factor).unwrap();
            (0..11).for_each(|i| assert_eq!(res[i], reference(arg1[i] % q, arg2 % q, arg3[i] % q, q)));
            fma_mod::<EltwiseNative>(&mut res, &arg1, arg2, None, q, factor).unwrap();
            (0..11).for_each(|i| assert_eq!(res[i], reference(arg1[i] % q, arg2 % q, 0, q)));
        }
    }

    #[test]
    fn bounds() {
        let mut res: [u64; 2] = [0; 2];
        assert!(fma_mod::<EltwiseNative>(&mut res, &[1, 2], 3, None, 1 << 62, 1).is_err());
        assert!(fma_mod::<EltwiseNative>(&mut res, &[1, 2], 769, None, 769, 1).is_err());
        assert!(fma_mod::<EltwiseNative>(&mut res, &[1, 2], 769, None, 769, 2).is_ok());
        assert!(fma_mod::<EltwiseNative>(&mut res, &[1, 2], 1, Some(&[0, 769]), 769, 1).is_err());
        assert!(fma_mod::<EltwiseNative>(&mut res, &[1, 2], 1, Some(&[0]), 769, 1).is_err());
        assert!(fma_mod::<EltwiseNative>(&mut res, &[1, 2], 1, None, 769, 3).is_err());
    }
}
