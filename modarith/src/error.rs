use thiserror::Error;

/// Precondition violations reported by the kernels and the NTT constructor.
///
/// Every entry point validates its arguments before touching the output, so
/// an `Err` means no output element has been written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("empty input")]
    EmptyInput,

    #[error("{name} has {found} elements, expected {expected}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid modulus {modulus}: must be greater than 1 and below 2^{max_bits}")]
    InvalidModulus { modulus: u64, max_bits: u32 },

    #[error("{name}[{index}] = {value} is not below {bound}")]
    OperandOutOfBound {
        name: &'static str,
        index: usize,
        value: u64,
        bound: u128,
    },

    #[error("{name} = {value} is not below {bound}")]
    ScalarOutOfBound {
        name: &'static str,
        value: u64,
        bound: u128,
    },

    #[error("unsupported {name} {factor}")]
    InvalidModFactor { name: &'static str, factor: u64 },

    #[error("input and output mod factors are both {factor}")]
    IdenticalModFactors { factor: u64 },

    #[error("invalid degree {degree}: must be a power of two in [2, 2^20]")]
    InvalidDegree { degree: usize },

    #[error("modulus {modulus} is not congruent to 1 mod 2*{degree}")]
    NotNttFriendly { modulus: u64, degree: usize },

    #[error("modulus {modulus} is not prime")]
    NotPrime { modulus: u64 },

    #[error("{value} has no inverse mod {modulus}")]
    NotInvertible { value: u64, modulus: u64 },

    #[error("{root} is not a primitive {order}-th root of unity mod {modulus}")]
    InvalidRootOfUnity { root: u64, order: u64, modulus: u64 },

    #[error("no primitive {order}-th root of unity mod {modulus}")]
    NoRootOfUnity { order: u64, modulus: u64 },

    #[error("unsupported bit shift {bit_shift}, expected 32, 52 or 64")]
    UnsupportedBitShift { bit_shift: u32 },

    #[error("invalid diff {diff}: {reason}")]
    InvalidDiff { diff: u64, reason: &'static str },

    #[error("could not find {count} primes of {bit_size} bits congruent to 1 mod 2*{ntt_size}")]
    PrimeGeneration {
        count: usize,
        bit_size: u32,
        ntt_size: u64,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
