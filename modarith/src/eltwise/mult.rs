use itertools::izip;
use tracing::trace;

use super::check_binary;
use crate::error::Result;
use crate::number_theory::BarrettFactor128;

/// `result[i] = a[i] * b[i] mod q` for `a[i], b[i] < input_mod_factor * q`,
/// `input_mod_factor` in {1, 2, 4} and `q < 2^62`.
///
/// The full 128-bit product is reduced with `floor(2^128 / q)`. Only a
/// native implementation exists.
pub fn eltwise_mult_mod(
    result: &mut [u64],
    a: &[u64],
    b: &[u64],
    modulus: u64,
    input_mod_factor: u64,
) -> Result<()> {
    check_mult(result.len(), a, b, modulus, input_mod_factor)?;
    trace!(op = "mult_mod", backend = "native");
    let barrett: BarrettFactor128 = BarrettFactor128::new(modulus);
    izip!(result.iter_mut(), a, b).for_each(|(r, &a, &b)| *r = barrett.mul(a, b));
    Ok(())
}

pub fn eltwise_mult_mod_inplace(
    result: &mut [u64],
    b: &[u64],
    modulus: u64,
    input_mod_factor: u64,
) -> Result<()> {
    check_mult(result.len(), result, b, modulus, input_mod_factor)?;
    trace!(op = "mult_mod_inplace", backend = "native");
    let barrett: BarrettFactor128 = BarrettFactor128::new(modulus);
    izip!(result.iter_mut(), b).for_each(|(r, &b)| *r = barrett.mul(*r, b));
    Ok(())
}

fn check_mult(result_len: usize, a: &[u64], b: &[u64], modulus: u64, input_mod_factor: u64) -> Result<()> {
    crate::check::mod_factor("input_mod_factor", input_mod_factor, &[1, 2, 4])?;
    check_binary(result_len, a, b, modulus, 62, input_mod_factor)
}
