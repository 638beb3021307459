use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_core::RngCore;

/// Seedable ChaCha8 stream used to draw operands below a bound.
pub struct Source {
    source: ChaCha8Rng,
}

impl Source {
    pub fn new(seed: [u8; 32]) -> Source {
        Source {
            source: ChaCha8Rng::from_seed(seed),
        }
    }

    /// Seed derived from a single word, convenient for fixed test streams.
    pub fn from_u64(seed: u64) -> Source {
        Source {
            source: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Rejection-samples `x & mask` until it falls below `max`.
    #[inline(always)]
    pub fn next_u64n(&mut self, max: u64, mask: u64) -> u64 {
        let mut x: u64 = self.next_u64() & mask;
        while x >= max {
            x = self.next_u64() & mask;
        }
        x
    }

    /// Uniform value in [0, bound). `bound` must be non-zero.
    #[inline(always)]
    pub fn next_below(&mut self, bound: u64) -> u64 {
        debug_assert!(bound != 0);
        let mask: u64 = u64::MAX >> (bound - 1).leading_zeros().min(63);
        self.next_u64n(bound, mask)
    }

    /// Fills `out` with uniform values in [0, bound).
    pub fn fill_below(&mut self, bound: u64, out: &mut [u64]) {
        out.iter_mut().for_each(|x| *x = self.next_below(bound));
    }

    /// Returns `n` uniform values in [0, bound).
    pub fn vec_below(&mut self, bound: u64, n: usize) -> Vec<u64> {
        let mut out: Vec<u64> = vec![0u64; n];
        self.fill_below(bound, &mut out);
        out
    }
}

impl RngCore for Source {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        self.source.next_u32()
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        self.source.next_u64()
    }

    #[inline(always)]
    fn fill_bytes(&mut self, bytes: &mut [u8]) {
        self.source.fill_bytes(bytes)
    }
}
