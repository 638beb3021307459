#[cfg(all(target_arch = "x86_64", feature = "avx512"))]
use std::ops::Range;

use crate::error::{Error, Result};
use crate::number_theory::{MultiplyFactor, WordOps, inverse_mod, multiply_mod};

/// Root-of-unity tables of one `(degree, modulus, bit_shift)` triple.
///
/// `roots[bitrev(i)] = psi^i`. `inv_roots` holds the inverses of `roots`
/// reordered so that layer `m` (m = n/2, n/4, ..., 1) reads the contiguous
/// run starting at `n - 2m + 1`. Every table has a Shoup companion computed
/// with `bit_shift`.
pub(crate) struct Tables {
    pub(crate) degree: usize,
    pub(crate) modulus: u64,
    pub(crate) roots: Vec<u64>,
    pub(crate) roots_precon: Vec<u64>,
    pub(crate) inv_roots: Vec<u64>,
    pub(crate) inv_roots_precon: Vec<u64>,
    pub(crate) inv_n: u64,
    pub(crate) inv_n_precon: u64,
    /// `inv_n * inv_roots[n - 1]`, fused into the last inverse layer.
    pub(crate) inv_n_w: u64,
    pub(crate) inv_n_w_precon: u64,
    pub(crate) replicated: Replicated,
}

/// Copies of the tables laid out for eight-lane loads on the layers whose
/// stride is below eight: each root of the stride-4 layer appears four
/// times, each root of the stride-2 layer twice. Empty below degree 16.
#[derive(Default)]
#[cfg_attr(not(all(target_arch = "x86_64", feature = "avx512")), allow(dead_code))]
pub(crate) struct Replicated {
    pub(crate) roots: Vec<u64>,
    pub(crate) roots_precon: Vec<u64>,
    pub(crate) inv_roots: Vec<u64>,
    pub(crate) inv_roots_precon: Vec<u64>,
}

/// Smallest degree handled by the eight-lane kernels.
#[cfg_attr(not(all(target_arch = "x86_64", feature = "avx512")), allow(dead_code))]
pub(crate) const MIN_VECTORIZED_DEGREE: usize = 16;

impl Tables {
    pub(crate) fn new(degree: usize, modulus: u64, root: u64, bit_shift: u32) -> Result<Self> {
        let log_n: u32 = degree.log2();
        let precon = |w: u64| MultiplyFactor::new(w, bit_shift, modulus).barrett_factor();
        let inverse = |x: u64| inverse_mod(x, modulus).ok_or(Error::NotInvertible { value: x, modulus });

        let mut roots: Vec<u64> = vec![0u64; degree];
        let mut power: u64 = 1;
        for i in 0..degree {
            roots[i.reverse_bits_msb(log_n)] = power;
            power = multiply_mod(power, root, modulus);
        }

        let inv: Vec<u64> = roots.iter().map(|&w| inverse(w)).collect::<Result<Vec<u64>>>()?;
        let mut inv_roots: Vec<u64> = Vec::with_capacity(degree);
        inv_roots.push(inv[0]);
        let mut m: usize = degree >> 1;
        while m > 0 {
            inv_roots.extend_from_slice(&inv[m..m << 1]);
            m >>= 1;
        }
        debug_assert_eq!(inv_roots.len(), degree);

        let inv_n: u64 = inverse(degree as u64)?;
        let inv_n_w: u64 = multiply_mod(inv_n, inv_roots[degree - 1], modulus);

        let roots_precon: Vec<u64> = roots.iter().map(|&w| precon(w)).collect();
        let inv_roots_precon: Vec<u64> = inv_roots.iter().map(|&w| precon(w)).collect();

        #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
        let replicated: Replicated = if degree >= MIN_VECTORIZED_DEGREE {
            Replicated::new(degree, &roots, &roots_precon, &inv_roots, &inv_roots_precon)
        } else {
            Replicated::default()
        };
        #[cfg(not(all(target_arch = "x86_64", feature = "avx512")))]
        let replicated: Replicated = Replicated::default();

        Ok(Self {
            degree,
            modulus,
            roots,
            roots_precon,
            inv_roots,
            inv_roots_precon,
            inv_n,
            inv_n_precon: precon(inv_n),
            inv_n_w,
            inv_n_w_precon: precon(inv_n_w),
            replicated,
        })
    }
}

#[cfg(all(target_arch = "x86_64", feature = "avx512"))]
impl Replicated {
    fn new(n: usize, roots: &[u64], roots_precon: &[u64], inv_roots: &[u64], inv_roots_precon: &[u64]) -> Self {
        let forward: [(Range<usize>, usize); 4] = [
            (0..n / 8, 1),
            (n / 8..n / 4, 4),
            (n / 4..n / 2, 2),
            (n / 2..n, 1),
        ];
        let inverse: [(Range<usize>, usize); 4] = [
            (0..n / 2 + 1, 1),
            (n / 2 + 1..3 * n / 4 + 1, 2),
            (3 * n / 4 + 1..7 * n / 8 + 1, 4),
            (7 * n / 8 + 1..n, 1),
        ];
        Self {
            roots: replicate(roots, &forward),
            roots_precon: replicate(roots_precon, &forward),
            inv_roots: replicate(inv_roots, &inverse),
            inv_roots_precon: replicate(inv_roots_precon, &inverse),
        }
    }
}

#[cfg(all(target_arch = "x86_64", feature = "avx512"))]
fn replicate(src: &[u64], segments: &[(Range<usize>, usize)]) -> Vec<u64> {
    segments
        .iter()
        .flat_map(|(range, copies)| {
            src[range.clone()]
                .iter()
                .flat_map(move |&w| std::iter::repeat_n(w, *copies))
        })
        .collect()
}

/// Position in [`Replicated::roots`] of the forward root `idx` for a
/// transform of size `n`.
#[cfg_attr(not(all(target_arch = "x86_64", feature = "avx512")), allow(dead_code))]
pub(crate) fn forward_replicated_index(idx: usize, n: usize) -> usize {
    if idx < n / 8 {
        idx
    } else if idx < n / 4 {
        (idx - n / 8) * 4 + n / 8
    } else if idx < n / 2 {
        (idx - n / 4) * 2 + 5 * n / 8
    } else {
        idx + 5 * n / 8
    }
}

/// Position in [`Replicated::inv_roots`] of the inverse root `idx` for a
/// transform of size `n`.
#[cfg_attr(not(all(target_arch = "x86_64", feature = "avx512")), allow(dead_code))]
pub(crate) fn inverse_replicated_index(idx: usize, n: usize) -> usize {
    if idx <= n / 2 {
        idx
    } else if idx <= 3 * n / 4 {
        (idx - (n / 2 + 1)) * 2 + n / 2 + 1
    } else if idx <= 7 * n / 8 {
        (idx - (3 * n / 4 + 1)) * 4 + n + 1
    } else {
        idx + 5 * n / 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number_theory::{minimal_primitive_root, pow_mod};

    fn tables(degree: usize, modulus: u64) -> Tables {
        let root: u64 = minimal_primitive_root(2 * degree as u64, modulus).unwrap();
        Tables::new(degree, modulus, root, 64).unwrap()
    }

    #[test]
    fn bit_reversed_powers() {
        let t: Tables = tables(8, 769);
        let psi: u64 = t.roots[4];
        assert_eq!(t.roots[0], 1);
        (0..8usize).for_each(|i| assert_eq!(t.roots[i.reverse_bits_msb(3)], pow_mod(psi, i as u64, 769)));
        assert_eq!(multiply_mod(t.inv_n, 8, 769), 1);
    }

    #[test]
    fn inverse_layers_are_contiguous() {
        let n: usize = 32;
        let t: Tables = tables(n, 7681);
        let mut m: usize = n >> 1;
        while m > 0 {
            let base: usize = n - 2 * m + 1;
            (0..m).for_each(|i| {
                assert_eq!(multiply_mod(t.inv_roots[base + i], t.roots[m + i], 7681), 1);
            });
            m >>= 1;
        }
    }

    #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
    #[test]
    fn replicated_layout() {
        for n in [16usize, 64, 2048] {
            let t: Tables = tables(n, 0xffffffffffc0001);
            assert_eq!(t.replicated.roots.len(), 13 * n / 8);
            assert_eq!(t.replicated.inv_roots.len(), 13 * n / 8);
            (0..n).for_each(|idx| {
                let pos: usize = forward_replicated_index(idx, n);
                assert_eq!(t.replicated.roots[pos], t.roots[idx]);
                assert_eq!(t.replicated.roots_precon[pos], t.roots_precon[idx]);
                let pos: usize = inverse_replicated_index(idx, n);
                assert_eq!(t.replicated.inv_roots[pos], t.inv_roots[idx]);
                assert_eq!(t.replicated.inv_roots_precon[pos], t.inv_roots_precon[idx]);
            });
            // stride-4 roots are repeated four times
            let pos: usize = forward_replicated_index(n / 8, n);
            assert!(t.replicated.roots[pos..pos + 4].iter().all(|&w| w == t.roots[n / 8]));
        }
    }

    #[test]
    fn small_degree_has_no_replicas() {
        let t: Tables = tables(8, 769);
        assert!(t.replicated.roots.is_empty());
    }
}
