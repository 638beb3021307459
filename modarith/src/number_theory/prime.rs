use primality_test::is_prime as is_prime_u64;

use crate::error::{Error, Result};

/// Deterministic primality test.
#[inline]
pub fn is_prime(q: u64) -> bool {
    is_prime_u64(q)
}

/// Returns `count` primes of exactly `bit_size` bits, congruent to 1 mod
/// `2 * ntt_size`.
///
/// With `prefer_small` the scan walks upward from `2^(bit_size-1)`,
/// otherwise downward from `2^bit_size`.
pub fn generate_primes(count: usize, bit_size: u32, prefer_small: bool, ntt_size: u64) -> Result<Vec<u64>> {
    let err: Error = Error::PrimeGeneration {
        count,
        bit_size,
        ntt_size,
    };

    if count == 0 || !(2..=62).contains(&bit_size) || !ntt_size.is_power_of_two() {
        return Err(err);
    }

    let nth_root: u64 = ntt_size << 1;
    let lower: u64 = 1 << (bit_size - 1);
    let upper: u64 = 1 << bit_size;

    let mut primes: Vec<u64> = Vec::with_capacity(count);

    if prefer_small {
        let mut candidate: u64 = lower - (lower % nth_root) + 1;
        if candidate < lower {
            candidate += nth_root;
        }
        while candidate < upper && primes.len() < count {
            if is_prime(candidate) {
                primes.push(candidate);
            }
            candidate += nth_root;
        }
    } else {
        let mut candidate: u64 = (upper - 1) - ((upper - 1) % nth_root) + 1;
        if candidate >= upper {
            candidate = candidate.saturating_sub(nth_root);
        }
        while candidate >= lower && primes.len() < count {
            if is_prime(candidate) {
                primes.push(candidate);
            }
            match candidate.checked_sub(nth_root) {
                Some(next) => candidate = next,
                None => break,
            }
        }
    }

    if primes.len() < count {
        return Err(err);
    }
    Ok(primes)
}
