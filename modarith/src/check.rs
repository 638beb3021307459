//! Argument validation shared by every public entry point.
//!
//! All checks run before any output is written and are never compiled out.

use crate::error::{Error, Result};

#[inline]
pub(crate) fn non_empty(n: usize) -> Result<()> {
    if n == 0 {
        return Err(Error::EmptyInput);
    }
    Ok(())
}

#[inline]
pub(crate) fn same_len(name: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(Error::LengthMismatch {
            name,
            expected,
            found,
        });
    }
    Ok(())
}

/// Accepts `1 < modulus < 2^bits`.
#[inline]
pub(crate) fn modulus_below(modulus: u64, bits: u32) -> Result<()> {
    if modulus <= 1 || (bits < 64 && modulus >> bits != 0) {
        return Err(Error::InvalidModulus {
            modulus,
            max_bits: bits,
        });
    }
    Ok(())
}

/// Returns `factor * modulus` without overflow.
#[inline(always)]
pub(crate) fn bound(factor: u64, modulus: u64) -> u128 {
    factor as u128 * modulus as u128
}

pub(crate) fn all_below(name: &'static str, values: &[u64], bound: u128) -> Result<()> {
    match values.iter().position(|&v| v as u128 >= bound) {
        Some(index) => Err(Error::OperandOutOfBound {
            name,
            index,
            value: values[index],
            bound,
        }),
        None => Ok(()),
    }
}

#[inline]
pub(crate) fn scalar_below(name: &'static str, value: u64, bound: u128) -> Result<()> {
    if value as u128 >= bound {
        return Err(Error::ScalarOutOfBound { name, value, bound });
    }
    Ok(())
}

#[inline]
pub(crate) fn mod_factor(name: &'static str, factor: u64, accepted: &[u64]) -> Result<()> {
    if !accepted.contains(&factor) {
        return Err(Error::InvalidModFactor { name, factor });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modulus_range() {
        assert!(modulus_below(0, 63).is_err());
        assert!(modulus_below(1, 63).is_err());
        assert!(modulus_below(2, 63).is_ok());
        assert!(modulus_below((1 << 63) - 1, 63).is_ok());
        assert!(modulus_below(1 << 63, 63).is_err());
        assert!(modulus_below(1 << 62, 62).is_err());
    }

    #[test]
    fn first_offending_index() {
        let values: [u64; 5] = [0, 3, 9, 10, 11];
        assert_eq!(
            all_below("a", &values, 10),
            Err(Error::OperandOutOfBound {
                name: "a",
                index: 3,
                value: 10,
                bound: 10
            })
        );
        assert!(all_below("a", &values, 12).is_ok());
    }

    #[test]
    fn bound_does_not_wrap() {
        let q: u64 = (1 << 62) - 57;
        assert_eq!(bound(4, q), (u64::MAX - 227) as u128);
        assert!(scalar_below("x", u64::MAX - 228, bound(4, q)).is_ok());
        assert!(scalar_below("x", u64::MAX - 227, bound(4, q)).is_err());
        assert!(scalar_below("x", u64::MAX, bound(4, q)).is_err());
        assert!(scalar_below("x", u64::MAX, bound(2, q)).is_err());
    }
}
