use super::{Eltwise, EltwiseNative, Map1, dispatch};
use crate::check;
use crate::error::{Error, Result};
use crate::number_theory::MultiplyFactor;
use crate::simd::Lanes;

/// Arbitrary word to [0, q) (`FULL`) or [0, 2q), by Barrett reduction with
/// `floor(2^64 / q)`.
pub(crate) struct FromArbitrary<const FULL: bool> {
    modulus: u64,
    factor: u64,
}

impl<const FULL: bool> FromArbitrary<FULL> {
    pub(crate) fn new(modulus: u64) -> Self {
        Self {
            modulus,
            factor: MultiplyFactor::new(1, 64, modulus).barrett_factor(),
        }
    }
}

impl<const FULL: bool> Map1 for FromArbitrary<FULL> {
    #[inline(always)]
    fn apply<L: Lanes>(&self, simd: L, x: L::V) -> L::V {
        let q: L::V = simd.splat(self.modulus);
        let r: L::V = simd.barrett_lazy(x, simd.splat(self.factor), q);
        if FULL { simd.small_mod(r, q) } else { r }
    }
}

/// [0, 2q) to [0, q).
pub(crate) struct From2q {
    modulus: u64,
}

impl Map1 for From2q {
    #[inline(always)]
    fn apply<L: Lanes>(&self, simd: L, x: L::V) -> L::V {
        simd.small_mod(x, simd.splat(self.modulus))
    }
}

/// [0, 4q) to [0, 2q), then to [0, q) if `FULL`.
pub(crate) struct From4q<const FULL: bool> {
    modulus: u64,
}

impl<const FULL: bool> Map1 for From4q<FULL> {
    #[inline(always)]
    fn apply<L: Lanes>(&self, simd: L, x: L::V) -> L::V {
        let r: L::V = simd.small_mod(x, simd.splat(self.modulus << 1));
        if FULL {
            simd.small_mod(r, simd.splat(self.modulus))
        } else {
            r
        }
    }
}

fn check_reduce(
    result_len: usize,
    operand: &[u64],
    modulus: u64,
    input_mod_factor: u64,
    output_mod_factor: u64,
) -> Result<()> {
    check::non_empty(operand.len())?;
    check::same_len("result", operand.len(), result_len)?;
    check::modulus_below(modulus, 63)?;
    if input_mod_factor == output_mod_factor {
        return Err(Error::IdenticalModFactors {
            factor: input_mod_factor,
        });
    }
    check::mod_factor("output_mod_factor", output_mod_factor, &[1, 2])?;
    if input_mod_factor != modulus {
        check::mod_factor("input_mod_factor", input_mod_factor, &[2, 4])?;
        check::all_below(
            "operand",
            operand,
            check::bound(input_mod_factor, modulus),
        )?;
    }
    Ok(())
}

fn run_reduce<E: Eltwise>(
    result: &mut [u64],
    operand: Option<&[u64]>,
    modulus: u64,
    input_mod_factor: u64,
    output_mod_factor: u64,
) {
    macro_rules! run {
        ($op:expr) => {
            match operand {
                Some(operand) => E::map1(&$op, result, operand),
                None => E::map1_inplace(&$op, result),
            }
        };
    }

    match (input_mod_factor == modulus, input_mod_factor, output_mod_factor) {
        (true, _, 1) => run!(FromArbitrary::<true>::new(modulus)),
        (true, _, _) => run!(FromArbitrary::<false>::new(modulus)),
        (false, 2, _) => run!(From2q { modulus }),
        (false, _, 1) => run!(From4q::<true> { modulus }),
        (false, _, _) => run!(From4q::<false> { modulus }),
    }
}

/// Reduces `operand` from `input_mod_factor * q` down to
/// `output_mod_factor * q`.
///
/// `input_mod_factor` is `modulus` (any word), 2 or 4; `output_mod_factor`
/// is 1 or 2, and the two must differ.
///
/// For `modulus` 2 or 4 an `input_mod_factor` equal to `modulus` always means
/// "any word", never the relaxed 2q or 4q bound. So `modulus = 2` with both
/// factors 2 is rejected with [`Error::IdenticalModFactors`].
pub fn reduce_mod<E: Eltwise>(
    result: &mut [u64],
    operand: &[u64],
    modulus: u64,
    input_mod_factor: u64,
    output_mod_factor: u64,
) -> Result<()> {
    check_reduce(
        result.len(),
        operand,
        modulus,
        input_mod_factor,
        output_mod_factor,
    )?;
    run_reduce::<E>(
        result,
        Some(operand),
        modulus,
        input_mod_factor,
        output_mod_factor,
    );
    Ok(())
}

pub fn reduce_mod_inplace<E: Eltwise>(
    result: &mut [u64],
    modulus: u64,
    input_mod_factor: u64,
    output_mod_factor: u64,
) -> Result<()> {
    check_reduce(
        result.len(),
        result,
        modulus,
        input_mod_factor,
        output_mod_factor,
    )?;
    run_reduce::<E>(result, None, modulus, input_mod_factor, output_mod_factor);
    Ok(())
}

pub fn eltwise_reduce_mod(
    result: &mut [u64],
    operand: &[u64],
    modulus: u64,
    input_mod_factor: u64,
    output_mod_factor: u64,
) -> Result<()> {
    dispatch!(
        "reduce_mod",
        reduce_mod(
            result,
            operand,
            modulus,
            input_mod_factor,
            output_mod_factor
        )
    )
}

pub fn eltwise_reduce_mod_inplace(
    result: &mut [u64],
    modulus: u64,
    input_mod_factor: u64,
    output_mod_factor: u64,
) -> Result<()> {
    dispatch!(
        "reduce_mod_inplace",
        reduce_mod_inplace(result, modulus, input_mod_factor, output_mod_factor)
    )
}

pub fn eltwise_reduce_mod_native(
    result: &mut [u64],
    operand: &[u64],
    modulus: u64,
    input_mod_factor: u64,
    output_mod_factor: u64,
) -> Result<()> {
    reduce_mod::<EltwiseNative>(
        result,
        operand,
        modulus,
        input_mod_factor,
        output_mod_factor,
    )
}
