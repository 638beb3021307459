//! Negacyclic number-theoretic transform over `Z_q[X]/(X^n + 1)`.
//!
//! The forward transform is a decimation-in-time Harvey butterfly network
//! with bit-reversed output; the inverse runs the same network backwards
//! with the inverse powers and folds the scaling by `n^-1` into its last
//! layer. Blocks of at most 1024 words are transformed layer by layer,
//! larger blocks do one layer and recurse on their halves.

mod butterfly;
mod driver;
mod tables;

#[cfg(all(target_arch = "x86_64", feature = "avx512"))]
mod avx512;

use tracing::{debug, trace};

use crate::check;
use crate::error::{Error, Result};
use crate::number_theory::{is_power_of_two, is_prime, is_primitive_root, minimal_primitive_root};
use crate::simd::Scalar;
use driver::NttLanes;
use tables::Tables;

#[cfg(all(target_arch = "x86_64", feature = "avx512"))]
use crate::simd::Avx512;
#[cfg(all(target_arch = "x86_64", feature = "avx512"))]
use tables::MIN_VECTORIZED_DEGREE;

/// Largest supported transform size.
pub const MAX_DEGREE: usize = 1 << 20;

/// Bit shifts of the Shoup precomputation that have a kernel instantiation.
pub const SUPPORTED_BIT_SHIFTS: [u32; 3] = [32, 52, 64];

/// Forward and inverse NTT of a fixed `(degree, modulus)` pair.
///
/// Construction validates the parameters and builds the root-of-unity
/// tables once; transforms only read them, so an `Ntt` can be shared across
/// threads.
pub struct Ntt {
    degree: usize,
    modulus: u64,
    bit_shift: u32,
    root_of_unity: u64,
    tables: Tables,
}

impl Ntt {
    /// Transform of size `degree` modulo `modulus`, using the minimal
    /// primitive `2 * degree`-th root of unity and the narrowest bit shift
    /// the modulus allows.
    pub fn new(degree: usize, modulus: u64) -> Result<Self> {
        check_degree(degree)?;
        check::modulus_below(modulus, 62)?;
        let bit_shift: u32 = default_bit_shift(modulus);
        check_modulus(degree, modulus, bit_shift)?;
        let root: u64 = minimal_primitive_root(2 * degree as u64, modulus).ok_or(Error::NoRootOfUnity {
            order: 2 * degree as u64,
            modulus,
        })?;
        Self::build(degree, modulus, root, bit_shift)
    }

    /// Same as [`Ntt::new`] with a caller-chosen primitive `2 * degree`-th
    /// root of unity.
    pub fn with_root(degree: usize, modulus: u64, root: u64) -> Result<Self> {
        check_degree(degree)?;
        check::modulus_below(modulus, 62)?;
        let bit_shift: u32 = default_bit_shift(modulus);
        check_modulus(degree, modulus, bit_shift)?;
        if root >= modulus || !is_primitive_root(root, 2 * degree as u64, modulus) {
            return Err(Error::InvalidRootOfUnity {
                root,
                order: 2 * degree as u64,
                modulus,
            });
        }
        Self::build(degree, modulus, root, bit_shift)
    }

    /// Same as [`Ntt::new`] with a pinned bit shift in
    /// [`SUPPORTED_BIT_SHIFTS`]. The modulus must be below `2^(bit_shift - 2)`.
    pub fn with_bit_shift(degree: usize, modulus: u64, bit_shift: u32) -> Result<Self> {
        if !SUPPORTED_BIT_SHIFTS.contains(&bit_shift) {
            return Err(Error::UnsupportedBitShift { bit_shift });
        }
        check_degree(degree)?;
        check_modulus(degree, modulus, bit_shift)?;
        let root: u64 = minimal_primitive_root(2 * degree as u64, modulus).ok_or(Error::NoRootOfUnity {
            order: 2 * degree as u64,
            modulus,
        })?;
        Self::build(degree, modulus, root, bit_shift)
    }

    fn build(degree: usize, modulus: u64, root: u64, bit_shift: u32) -> Result<Self> {
        debug!(degree, modulus, bit_shift, root, "building ntt tables");
        Ok(Self {
            degree,
            modulus,
            bit_shift,
            root_of_unity: root,
            tables: Tables::new(degree, modulus, root, bit_shift)?,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    pub fn bit_shift(&self) -> u32 {
        self.bit_shift
    }

    /// The primitive `2n`-th root of unity `psi` the tables are built from.
    pub fn root_of_unity(&self) -> u64 {
        self.root_of_unity
    }

    /// `psi^i` stored at index `bitrev(i)`.
    pub fn root_of_unity_powers(&self) -> &[u64] {
        &self.tables.roots
    }

    pub fn precon_root_of_unity_powers(&self) -> &[u64] {
        &self.tables.roots_precon
    }

    /// Inverses of [`Ntt::root_of_unity_powers`] in the order the inverse
    /// layers read them.
    pub fn inv_root_of_unity_powers(&self) -> &[u64] {
        &self.tables.inv_roots
    }

    pub fn precon_inv_root_of_unity_powers(&self) -> &[u64] {
        &self.tables.inv_roots_precon
    }

    /// `result = NTT(operand)`, operand in `[0, input_mod_factor * q)` with
    /// `input_mod_factor` in {1, 2, 4}, result in
    /// `[0, output_mod_factor * q)` with `output_mod_factor` in {1, 4}.
    pub fn forward(
        &self,
        result: &mut [u64],
        operand: &[u64],
        input_mod_factor: u64,
        output_mod_factor: u64,
    ) -> Result<()> {
        self.check_forward(operand, input_mod_factor, output_mod_factor)?;
        check::same_len("result", self.degree, result.len())?;
        result.copy_from_slice(operand);
        self.run_forward(result, output_mod_factor, true);
        Ok(())
    }

    pub fn forward_inplace(&self, a: &mut [u64], input_mod_factor: u64, output_mod_factor: u64) -> Result<()> {
        self.check_forward(a, input_mod_factor, output_mod_factor)?;
        self.run_forward(a, output_mod_factor, true);
        Ok(())
    }

    /// [`Ntt::forward`] on the scalar path.
    pub fn forward_native(
        &self,
        result: &mut [u64],
        operand: &[u64],
        input_mod_factor: u64,
        output_mod_factor: u64,
    ) -> Result<()> {
        self.check_forward(operand, input_mod_factor, output_mod_factor)?;
        check::same_len("result", self.degree, result.len())?;
        result.copy_from_slice(operand);
        self.run_forward(result, output_mod_factor, false);
        Ok(())
    }

    /// `result = NTT^-1(operand)`, operand in `[0, input_mod_factor * q)`
    /// with `input_mod_factor` in {1, 2}, result in
    /// `[0, output_mod_factor * q)` with `output_mod_factor` in {1, 2}.
    pub fn inverse(
        &self,
        result: &mut [u64],
        operand: &[u64],
        input_mod_factor: u64,
        output_mod_factor: u64,
    ) -> Result<()> {
        self.check_inverse(operand, input_mod_factor, output_mod_factor)?;
        check::same_len("result", self.degree, result.len())?;
        result.copy_from_slice(operand);
        self.run_inverse(result, output_mod_factor, true);
        Ok(())
    }

    pub fn inverse_inplace(&self, a: &mut [u64], input_mod_factor: u64, output_mod_factor: u64) -> Result<()> {
        self.check_inverse(a, input_mod_factor, output_mod_factor)?;
        self.run_inverse(a, output_mod_factor, true);
        Ok(())
    }

    /// [`Ntt::inverse`] on the scalar path.
    pub fn inverse_native(
        &self,
        result: &mut [u64],
        operand: &[u64],
        input_mod_factor: u64,
        output_mod_factor: u64,
    ) -> Result<()> {
        self.check_inverse(operand, input_mod_factor, output_mod_factor)?;
        check::same_len("result", self.degree, result.len())?;
        result.copy_from_slice(operand);
        self.run_inverse(result, output_mod_factor, false);
        Ok(())
    }

    fn check_forward(&self, operand: &[u64], input_mod_factor: u64, output_mod_factor: u64) -> Result<()> {
        check::same_len("operand", self.degree, operand.len())?;
        check::mod_factor("input_mod_factor", input_mod_factor, &[1, 2, 4])?;
        check::mod_factor("output_mod_factor", output_mod_factor, &[1, 4])?;
        check::all_below("operand", operand, check::bound(input_mod_factor, self.modulus))
    }

    fn check_inverse(&self, operand: &[u64], input_mod_factor: u64, output_mod_factor: u64) -> Result<()> {
        check::same_len("operand", self.degree, operand.len())?;
        check::mod_factor("input_mod_factor", input_mod_factor, &[1, 2])?;
        check::mod_factor("output_mod_factor", output_mod_factor, &[1, 2])?;
        check::all_below("operand", operand, check::bound(input_mod_factor, self.modulus))
    }

    fn run_forward(&self, a: &mut [u64], output_mod_factor: u64, vectorize: bool) {
        let full: bool = output_mod_factor == 1;

        #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
        if vectorize && self.degree >= MIN_VECTORIZED_DEGREE && crate::capability::has_avx512dq() {
            if let Some(simd) = Avx512::try_new() {
                trace!(op = "ntt_forward", backend = "avx512", degree = self.degree);
                self.forward_with(simd, a, full);
                debug_assert!(a.iter().all(|&x| (x as u128) < check::bound(output_mod_factor, self.modulus)));
                return;
            }
        }
        #[cfg(not(all(target_arch = "x86_64", feature = "avx512")))]
        let _ = vectorize;

        trace!(op = "ntt_forward", backend = "native", degree = self.degree);
        self.forward_with(Scalar, a, full);
        debug_assert!(a.iter().all(|&x| (x as u128) < check::bound(output_mod_factor, self.modulus)));
    }

    fn run_inverse(&self, a: &mut [u64], output_mod_factor: u64, vectorize: bool) {
        let full: bool = output_mod_factor == 1;

        #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
        if vectorize && self.degree >= MIN_VECTORIZED_DEGREE && crate::capability::has_avx512dq() {
            if let Some(simd) = Avx512::try_new() {
                trace!(op = "ntt_inverse", backend = "avx512", degree = self.degree);
                self.inverse_with(simd, a, full);
                debug_assert!(a.iter().all(|&x| (x as u128) < check::bound(output_mod_factor, self.modulus)));
                return;
            }
        }
        #[cfg(not(all(target_arch = "x86_64", feature = "avx512")))]
        let _ = vectorize;

        trace!(op = "ntt_inverse", backend = "native", degree = self.degree);
        self.inverse_with(Scalar, a, full);
        debug_assert!(a.iter().all(|&x| (x as u128) < check::bound(output_mod_factor, self.modulus)));
    }

    /// In-place forward transform on the lanes of `simd`, reduced to
    /// `[0, q)` when `full`, else left in `[0, 4q)`.
    fn forward_with<L: NttLanes>(&self, simd: L, a: &mut [u64], full: bool) {
        match self.bit_shift {
            32 => simd.forward_block::<32>(&self.tables, a, 0, 0, full),
            52 => simd.forward_block::<52>(&self.tables, a, 0, 0, full),
            _ => simd.forward_block::<64>(&self.tables, a, 0, 0, full),
        }
    }

    /// In-place inverse transform, reduced to `[0, q)` when `full`, else
    /// left in `[0, 2q)`.
    fn inverse_with<L: NttLanes>(&self, simd: L, a: &mut [u64], full: bool) {
        match self.bit_shift {
            32 => simd.inverse_block::<32>(&self.tables, a, 0, 0, full),
            52 => simd.inverse_block::<52>(&self.tables, a, 0, 0, full),
            _ => simd.inverse_block::<64>(&self.tables, a, 0, 0, full),
        }
    }
}

/// 32 below 2^30, 52 below 2^50, 64 otherwise.
fn default_bit_shift(modulus: u64) -> u32 {
    if modulus < 1 << 30 {
        32
    } else if modulus < 1 << 50 {
        52
    } else {
        64
    }
}

fn check_degree(degree: usize) -> Result<()> {
    if !(2..=MAX_DEGREE).contains(&degree) || !is_power_of_two(degree as u64) {
        return Err(Error::InvalidDegree { degree });
    }
    Ok(())
}

fn check_modulus(degree: usize, modulus: u64, bit_shift: u32) -> Result<()> {
    check::modulus_below(modulus, bit_shift - 2)?;
    if modulus % (2 * degree as u64) != 1 {
        return Err(Error::NotNttFriendly { modulus, degree });
    }
    if !is_prime(modulus) {
        return Err(Error::NotPrime { modulus });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number_theory::{generate_primes, multiply_mod};
    use sampling::Source;

    fn negacyclic_product(a: &[u64], b: &[u64], q: u64) -> Vec<u64> {
        let n: usize = a.len();
        let mut c: Vec<u64> = vec![0u64; n];
        for i in 0..n {
            for j in 0..n {
                let p: u64 = multiply_mod(a[i], b[j], q);
                let k: usize = (i + j) % n;
                c[k] = if i + j < n { (c[k] + p) % q } else { (c[k] + q - p) % q };
            }
        }
        c
    }

    #[test]
    fn rejects_bad_parameters() {
        assert_eq!(Ntt::new(12, 769).err(), Some(Error::InvalidDegree { degree: 12 }));
        assert_eq!(Ntt::new(1, 769).err(), Some(Error::InvalidDegree { degree: 1 }));
        assert_eq!(
            Ntt::new(2 * MAX_DEGREE, 769).err(),
            Some(Error::InvalidDegree { degree: 2 * MAX_DEGREE })
        );
        assert_eq!(
            Ntt::new(8, 771).err(),
            Some(Error::NotNttFriendly {
                modulus: 771,
                degree: 8
            })
        );
        // 33 = 1 mod 16
        assert_eq!(Ntt::new(8, 33).err(), Some(Error::NotPrime { modulus: 33 }));
        assert_eq!(
            Ntt::with_bit_shift(8, 769, 40).err(),
            Some(Error::UnsupportedBitShift { bit_shift: 40 })
        );
        assert!(matches!(
            Ntt::with_bit_shift(8, 0xffffffffffc0001, 32),
            Err(Error::InvalidModulus { max_bits: 30, .. })
        ));
        assert!(matches!(
            Ntt::with_root(8, 769, 1),
            Err(Error::InvalidRootOfUnity { root: 1, .. })
        ));
    }

    #[test]
    fn default_bit_shift_follows_modulus_size() {
        assert_eq!(Ntt::new(8, 769).unwrap().bit_shift(), 32);
        assert_eq!(Ntt::new(16, 0xffffffffffc0001).unwrap().bit_shift(), 64);
        let q: u64 = generate_primes(1, 40, true, 16).unwrap()[0];
        assert_eq!(Ntt::new(16, q).unwrap().bit_shift(), 52);
    }

    #[test]
    fn small_example_round_trip() {
        let ntt: Ntt = Ntt::new(8, 769).unwrap();
        let arg: Vec<u64> = (1..=8).collect();
        let mut freq: Vec<u64> = vec![0u64; 8];
        ntt.forward(&mut freq, &arg, 1, 1).unwrap();
        assert!(freq.iter().all(|&x| x < 769));
        let mut back: Vec<u64> = vec![0u64; 8];
        ntt.inverse(&mut back, &freq, 1, 1).unwrap();
        assert_eq!(back, arg);
    }

    #[test]
    fn transform_diagonalizes_negacyclic_product() {
        let q: u64 = 7681;
        let n: usize = 32;
        let ntt: Ntt = Ntt::new(n, q).unwrap();
        let mut source: Source = Source::new([3u8; 32]);
        let a: Vec<u64> = source.vec_below(q, n);
        let b: Vec<u64> = source.vec_below(q, n);

        let mut fa: Vec<u64> = vec![0u64; n];
        let mut fb: Vec<u64> = vec![0u64; n];
        ntt.forward(&mut fa, &a, 1, 1).unwrap();
        ntt.forward(&mut fb, &b, 1, 1).unwrap();
        let mut c: Vec<u64> = fa.iter().zip(&fb).map(|(&x, &y)| multiply_mod(x, y, q)).collect();
        ntt.inverse_inplace(&mut c, 1, 1).unwrap();

        assert_eq!(c, negacyclic_product(&a, &b, q));
    }

    #[test]
    fn round_trip_across_recursion_threshold() {
        let q: u64 = 0xffffffffffc0001;
        for log_n in [1, 4, 10, 11, 13] {
            let n: usize = 1 << log_n;
            let ntt: Ntt = Ntt::new(n, q).unwrap();
            let mut source: Source = Source::new([log_n as u8; 32]);
            let a: Vec<u64> = source.vec_below(q, n);
            let mut b: Vec<u64> = a.clone();
            ntt.forward_inplace(&mut b, 1, 1).unwrap();
            ntt.inverse_inplace(&mut b, 1, 1).unwrap();
            assert_eq!(a, b, "n={n}");
        }
    }

    #[test]
    fn lazy_bounds() {
        let q: u64 = 998244353;
        let n: usize = 2048;
        let ntt: Ntt = Ntt::new(n, q).unwrap();
        let mut source: Source = Source::new([9u8; 32]);
        let a: Vec<u64> = source.vec_below(4 * q, n);

        let mut lazy: Vec<u64> = vec![0u64; n];
        ntt.forward(&mut lazy, &a, 4, 4).unwrap();
        assert!(lazy.iter().all(|&x| x < 4 * q));

        let mut exact: Vec<u64> = vec![0u64; n];
        ntt.forward(&mut exact, &a, 4, 1).unwrap();
        assert!(lazy.iter().zip(&exact).all(|(&l, &e)| l % q == e));

        let reduced: Vec<u64> = exact.iter().map(|&x| x + if x < q { q } else { 0 }).collect();
        let mut back: Vec<u64> = vec![0u64; n];
        ntt.inverse(&mut back, &reduced, 2, 2).unwrap();
        assert!(back.iter().zip(&a).all(|(&x, &y)| x < 2 * q && x % q == y % q));
    }

    #[test]
    fn bit_shifts_agree() {
        let q: u64 = 998244353;
        let n: usize = 4096;
        let mut source: Source = Source::new([1u8; 32]);
        let a: Vec<u64> = source.vec_below(q, n);
        let outputs: Vec<Vec<u64>> = SUPPORTED_BIT_SHIFTS
            .iter()
            .map(|&s| {
                let ntt: Ntt = Ntt::with_bit_shift(n, q, s).unwrap();
                let mut out: Vec<u64> = vec![0u64; n];
                ntt.forward(&mut out, &a, 1, 1).unwrap();
                out
            })
            .collect();
        assert_eq!(outputs[0], outputs[1]);
        assert_eq!(outputs[0], outputs[2]);
    }

    #[test]
    fn rejects_bad_operands() {
        let ntt: Ntt = Ntt::new(8, 769).unwrap();
        let mut out: Vec<u64> = vec![7u64; 8];
        let mut a: Vec<u64> = vec![0u64; 8];
        a[5] = 769;
        assert!(matches!(
            ntt.forward(&mut out, &a, 1, 1),
            Err(Error::OperandOutOfBound { index: 5, .. })
        ));
        assert!(ntt.forward(&mut out, &a, 2, 1).is_ok());
        assert!(matches!(
            ntt.forward(&mut out, &a, 1, 2),
            Err(Error::InvalidModFactor { .. })
        ));
        assert!(matches!(
            ntt.inverse(&mut out, &a, 4, 1),
            Err(Error::InvalidModFactor { .. })
        ));
        assert!(matches!(
            ntt.forward(&mut out[..4], &a, 2, 1),
            Err(Error::LengthMismatch { .. })
        ));
    }

    #[test]
    fn rejected_call_leaves_result_untouched() {
        let ntt: Ntt = Ntt::new(8, 769).unwrap();
        let mut out: Vec<u64> = vec![7u64; 8];
        let a: Vec<u64> = vec![1000u64; 8];
        assert!(ntt.inverse(&mut out, &a, 1, 1).is_err());
        assert_eq!(out, vec![7u64; 8]);
    }

    #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
    #[test]
    fn avx512_matches_native() {
        let Some(simd) = Avx512::try_new() else {
            return;
        };
        let q: u64 = 998244353;
        for &s in SUPPORTED_BIT_SHIFTS.iter() {
            for log_n in [4, 5, 6, 10, 11, 12] {
                let n: usize = 1 << log_n;
                let ntt: Ntt = Ntt::with_bit_shift(n, q, s).unwrap();
                let mut source: Source = Source::new([log_n as u8 ^ s as u8; 32]);
                let a: Vec<u64> = source.vec_below(4 * q, n);
                for full in [false, true] {
                    let mut native: Vec<u64> = a.clone();
                    let mut vector: Vec<u64> = a.clone();
                    ntt.forward_with(Scalar, &mut native, full);
                    ntt.forward_with(simd, &mut vector, full);
                    assert_eq!(native, vector, "forward s={s} n={n} full={full}");

                    let mut native: Vec<u64> = a.iter().map(|&x| x % (2 * q)).collect();
                    let mut vector: Vec<u64> = native.clone();
                    ntt.inverse_with(Scalar, &mut native, full);
                    ntt.inverse_with(simd, &mut vector, full);
                    assert_eq!(native, vector, "inverse s={s} n={n} full={full}");
                }
            }
        }
    }
}
