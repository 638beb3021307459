use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Precomputed quotient `floor(operand * 2^bit_shift / modulus)`.
///
/// With `bit_shift = 64` and `operand = 1` this is the Barrett factor
/// `floor(2^64 / q)`; with the NTT roots as operand it is their Shoup
/// companion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MultiplyFactor {
    operand: u64,
    barrett_factor: u64,
}

impl MultiplyFactor {
    pub fn new(operand: u64, bit_shift: u32, modulus: u64) -> Self {
        debug_assert!(
            matches!(bit_shift, 32 | 52 | 64),
            "invalid bit_shift={bit_shift}"
        );
        debug_assert!(operand < modulus, "operand={operand} >= modulus={modulus}");
        let barrett_factor: u64 = (((operand as u128) << bit_shift) / modulus as u128) as u64;
        Self {
            operand,
            barrett_factor,
        }
    }

    #[inline(always)]
    pub fn operand(&self) -> u64 {
        self.operand
    }

    #[inline(always)]
    pub fn barrett_factor(&self) -> u64 {
        self.barrett_factor
    }
}

/// `floor(2^128 / q)` split in two words, for reducing 128-bit products.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarrettFactor128 {
    modulus: u64,
    hi: u64,
    lo: u64,
}

impl BarrettFactor128 {
    pub fn new(modulus: u64) -> Self {
        debug_assert!(modulus > 1);
        let big_r: BigUint = (BigUint::one() << (u64::BITS << 1)) / BigUint::from(modulus);
        let mut digits = big_r.iter_u64_digits();
        let lo: u64 = digits.next().unwrap_or_default();
        let hi: u64 = digits.next().unwrap_or_default();
        debug_assert!(!big_r.is_zero());
        Self { modulus, hi, lo }
    }

    #[inline(always)]
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    #[inline(always)]
    pub fn value_hi(&self) -> u64 {
        self.hi
    }

    #[inline(always)]
    pub fn value_lo(&self) -> u64 {
        self.lo
    }

    /// Reduces `x < 2^128` to [0, q).
    #[inline(always)]
    pub fn reduce(&self, x: u128) -> u64 {
        let (x_hi, x_lo): (u128, u128) = (x >> 64, x & u64::MAX as u128);
        let (r_hi, r_lo): (u128, u128) = (self.hi as u128, self.lo as u128);

        // floor(x * r / 2^128), assembled from the four partial products.
        let carry: u128 = (x_lo * r_lo) >> 64;
        let (mid, overflow) = (x_hi * r_lo + carry).overflowing_add(x_lo * r_hi);
        let quotient: u128 = x_hi * r_hi + (mid >> 64) + ((overflow as u128) << 64);

        // x - quotient * q lies in [0, 2q).
        let r: u64 = x.wrapping_sub(quotient.wrapping_mul(self.modulus as u128)) as u64;
        if r >= self.modulus { r - self.modulus } else { r }
    }

    /// `a * b mod q`.
    #[inline(always)]
    pub fn mul(&self, a: u64, b: u64) -> u64 {
        self.reduce(a as u128 * b as u128)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiply_factor() {
        assert_eq!(MultiplyFactor::new(1, 64, 2).barrett_factor(), 1 << 63);
        assert_eq!(MultiplyFactor::new(1, 64, 3).barrett_factor(), u64::MAX / 3);
        assert_eq!(MultiplyFactor::new(3, 32, 769).barrett_factor(), (3u64 << 32) / 769);
        let mf: MultiplyFactor = MultiplyFactor::new(768, 52, 769);
        assert_eq!(mf.operand(), 768);
        assert_eq!(mf.barrett_factor(), ((768u128 << 52) / 769) as u64);
    }

    #[test]
    fn barrett_128() {
        for q in [2u64, 3, 769, 0x7fffffff, 0x3fffffffffffffb5, (1 << 63) - 25, 1 << 40] {
            let precomp: BarrettFactor128 = BarrettFactor128::new(q);
            let expected: u128 = (1u128 << 127) / q as u128 * 2 + ((1u128 << 127) % q as u128 * 2) / q as u128;
            assert_eq!(((precomp.value_hi() as u128) << 64) | precomp.value_lo() as u128, expected);
            for x in [0u128, 1, q as u128 - 1, q as u128, u128::MAX, u128::MAX / 3, (q as u128) * (q as u128) - 1] {
                assert_eq!(precomp.reduce(x), (x % q as u128) as u64, "q={q} x={x}");
            }
            assert_eq!(precomp.mul(q - 1, q - 1), 1 % q);
        }
    }
}
