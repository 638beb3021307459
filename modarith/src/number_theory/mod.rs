//! Number-theory helpers: reduction constants, modular exponentiation and
//! inversion, primality, primitive roots and prime generation.
//!
//! Everything here is pure and only used on scalars, mostly at NTT
//! construction time. 128-bit intermediates are used freely.

mod multiply_factor;
mod prime;
mod roots;

pub use multiply_factor::{BarrettFactor128, MultiplyFactor};
pub use prime::{generate_primes, is_prime};
pub use roots::{is_primitive_root, minimal_primitive_root};

pub trait WordOps<O> {
    /// Floor of the base-2 logarithm. `self` must be non-zero.
    fn log2(self) -> u32;
    /// Reverses the `n` least significant bits.
    fn reverse_bits_msb(self, n: u32) -> O;
}

impl WordOps<u64> for u64 {
    #[inline(always)]
    fn log2(self) -> u32 {
        self.ilog2()
    }
    #[inline(always)]
    fn reverse_bits_msb(self, n: u32) -> u64 {
        if n == 0 {
            return 0;
        }
        self.reverse_bits() >> (u64::BITS - n)
    }
}

impl WordOps<usize> for usize {
    #[inline(always)]
    fn log2(self) -> u32 {
        self.ilog2()
    }
    #[inline(always)]
    fn reverse_bits_msb(self, n: u32) -> usize {
        if n == 0 {
            return 0;
        }
        self.reverse_bits() >> (usize::BITS - n)
    }
}

pub trait ReduceOnce<O> {
    /// Assigns self-q to self if self >= q.
    fn reduce_once_assign(&mut self, q: O);
    /// Returns self-q if self >= q else self.
    fn reduce_once(&self, q: O) -> O;
}

impl ReduceOnce<u64> for u64 {
    #[inline(always)]
    fn reduce_once_assign(&mut self, q: u64) {
        if *self >= q {
            *self -= q
        }
    }

    #[inline(always)]
    fn reduce_once(&self, q: u64) -> u64 {
        if *self >= q { *self - q } else { *self }
    }
}

/// `a * b mod q` with a 128-bit intermediate.
#[inline]
pub fn multiply_mod(a: u64, b: u64, modulus: u64) -> u64 {
    ((a as u128 * b as u128) % modulus as u128) as u64
}

/// `a + b mod q` for `a, b < q`.
#[inline]
pub fn add_uint_mod(a: u64, b: u64, modulus: u64) -> u64 {
    debug_assert!(a < modulus && b < modulus);
    let sum: u128 = a as u128 + b as u128;
    if sum >= modulus as u128 {
        (sum - modulus as u128) as u64
    } else {
        sum as u64
    }
}

/// `a - b mod q` for `a, b < q`.
#[inline]
pub fn sub_uint_mod(a: u64, b: u64, modulus: u64) -> u64 {
    debug_assert!(a < modulus && b < modulus);
    if a >= b { a - b } else { a + (modulus - b) }
}

/// `base^exp mod q` by square-and-multiply.
pub fn pow_mod(base: u64, mut exp: u64, modulus: u64) -> u64 {
    if modulus == 1 {
        return 0;
    }
    let mut base: u64 = base % modulus;
    let mut acc: u64 = 1;
    while exp != 0 {
        if exp & 1 == 1 {
            acc = multiply_mod(acc, base, modulus);
        }
        base = multiply_mod(base, base, modulus);
        exp >>= 1;
    }
    acc
}

/// Inverse of `x` mod `q`, if `gcd(x, q) = 1`.
pub fn inverse_mod(x: u64, modulus: u64) -> Option<u64> {
    if modulus <= 1 {
        return None;
    }
    let (mut r0, mut r1): (i128, i128) = (modulus as i128, (x % modulus) as i128);
    let (mut t0, mut t1): (i128, i128) = (0, 1);
    while r1 != 0 {
        let quotient: i128 = r0 / r1;
        (r0, r1) = (r1, r0 - quotient * r1);
        (t0, t1) = (t1, t0 - quotient * t1);
    }
    if r0 != 1 {
        return None;
    }
    Some(t0.rem_euclid(modulus as i128) as u64)
}

/// Reverses the `bit_width` least significant bits of `x`.
#[inline]
pub fn reverse_bits(x: u64, bit_width: u32) -> u64 {
    debug_assert!(bit_width <= 64);
    x.reverse_bits_msb(bit_width)
}

/// Floor of the base-2 logarithm; `x` must be non-zero.
#[inline]
pub fn log2(x: u64) -> u32 {
    x.log2()
}

#[inline]
pub fn is_power_of_two(x: u64) -> bool {
    x.is_power_of_two()
}

/// Largest value representable in `bits` bits.
#[inline]
pub fn maximum_value(bits: u32) -> u64 {
    debug_assert!(bits <= 64);
    if bits >= 64 { u64::MAX } else { (1 << bits) - 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse() {
        assert_eq!(inverse_mod(3, 769), Some(513));
        assert_eq!(inverse_mod(6, 9), None);
        assert_eq!(inverse_mod(0, 7), None);
        let q: u64 = 0x1fffffffffffffff;
        for x in [1u64, 2, 12345, q - 1] {
            let inv: u64 = inverse_mod(x, q).unwrap();
            assert_eq!(multiply_mod(x, inv, q), 1);
        }
    }

    #[test]
    fn pow() {
        assert_eq!(pow_mod(2, 10, 1000), 24);
        assert_eq!(pow_mod(5, 0, 7), 1);
        assert_eq!(pow_mod(0, 0, 7), 1);
        assert_eq!(pow_mod(3, 768, 769), 1);
    }

    #[test]
    fn add_sub() {
        let q: u64 = (1 << 63) - 25;
        assert_eq!(add_uint_mod(q - 1, q - 1, q), q - 2);
        assert_eq!(sub_uint_mod(0, 1, q), q - 1);
        assert_eq!(sub_uint_mod(5, 3, 10), 2);
    }

    #[test]
    fn bits() {
        assert_eq!(reverse_bits(1, 3), 4);
        assert_eq!(reverse_bits(6, 3), 3);
        assert_eq!(reverse_bits(5, 0), 0);
        assert_eq!(reverse_bits(1, 64), 1 << 63);
        assert_eq!(log2(1), 0);
        assert_eq!(log2(1024), 10);
        assert_eq!(log2(1025), 10);
        assert!(is_power_of_two(64) && !is_power_of_two(0) && !is_power_of_two(12));
        assert_eq!(maximum_value(64), u64::MAX);
        assert_eq!(maximum_value(52), (1 << 52) - 1);
        assert_eq!(maximum_value(0), 0);
    }
}
