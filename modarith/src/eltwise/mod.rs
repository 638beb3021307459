//! Element-wise modular kernels over residue slices.
//!
//! Each operation is a small [`Map1`] or [`Map2`] value describing what one
//! register of lanes becomes. The [`Eltwise`] backends run it over the
//! slices: [`EltwiseNative`] one word at a time, [`EltwiseAvx512`] eight
//! words at a time after peeling the `n % 8` head through the native path.
//!
//! The `eltwise_*` entry points validate their arguments, then pick the
//! backend from [`crate::capability::has_avx512dq`]. The generic forms
//! (`add_mod::<E>`, ...) pin a backend and are what the equivalence tests
//! compare.

mod add;
mod cmp;
mod fma;
mod mult;
mod reduce;
mod sub;

pub use add::*;
pub use cmp::*;
pub use fma::*;
pub use mult::*;
pub use reduce::*;
pub use sub::*;

use itertools::izip;

use crate::check;
use crate::error::Result;
use crate::simd::{Lanes, Scalar};

#[cfg(all(target_arch = "x86_64", feature = "avx512"))]
use crate::simd::Avx512;

/// One-operand lane map.
pub trait Map1 {
    fn apply<L: Lanes>(&self, simd: L, x: L::V) -> L::V;
}

/// Two-operand lane map.
pub trait Map2 {
    fn apply<L: Lanes>(&self, simd: L, a: L::V, b: L::V) -> L::V;
}

/// Backend strategy running a lane map over whole slices.
///
/// Implementations assume the arguments have been validated: equal lengths
/// and operands within the bounds the map expects.
pub trait Eltwise {
    /// `res[i] = op(a[i])`
    fn map1<M: Map1>(op: &M, res: &mut [u64], a: &[u64]);
    /// `res[i] = op(res[i])`
    fn map1_inplace<M: Map1>(op: &M, res: &mut [u64]);
    /// `res[i] = op(a[i], b[i])`
    fn map2<M: Map2>(op: &M, res: &mut [u64], a: &[u64], b: &[u64]);
    /// `res[i] = op(res[i], b[i])`
    fn map2_inplace<M: Map2>(op: &M, res: &mut [u64], b: &[u64]);
}

/// Portable backend, also the correctness reference.
pub struct EltwiseNative;

impl Eltwise for EltwiseNative {
    #[inline(always)]
    fn map1<M: Map1>(op: &M, res: &mut [u64], a: &[u64]) {
        map1_lanes(Scalar, op, res, a)
    }

    #[inline(always)]
    fn map1_inplace<M: Map1>(op: &M, res: &mut [u64]) {
        map1_inplace_lanes(Scalar, op, res)
    }

    #[inline(always)]
    fn map2<M: Map2>(op: &M, res: &mut [u64], a: &[u64], b: &[u64]) {
        map2_lanes(Scalar, op, res, a, b)
    }

    #[inline(always)]
    fn map2_inplace<M: Map2>(op: &M, res: &mut [u64], b: &[u64]) {
        map2_inplace_lanes(Scalar, op, res, b)
    }
}

/// AVX512-DQ backend. Falls back to [`EltwiseNative`] on CPUs without the
/// extension, so it is always safe to call.
#[cfg(all(target_arch = "x86_64", feature = "avx512"))]
pub struct EltwiseAvx512;

#[cfg(all(target_arch = "x86_64", feature = "avx512"))]
impl Eltwise for EltwiseAvx512 {
    fn map1<M: Map1>(op: &M, res: &mut [u64], a: &[u64]) {
        match Avx512::try_new() {
            // SAFETY: the token proves avx512f and avx512dq are available.
            Some(simd) => unsafe { map1_avx512(simd, op, res, a) },
            None => EltwiseNative::map1(op, res, a),
        }
    }

    fn map1_inplace<M: Map1>(op: &M, res: &mut [u64]) {
        match Avx512::try_new() {
            // SAFETY: see `map1`.
            Some(simd) => unsafe { map1_inplace_avx512(simd, op, res) },
            None => EltwiseNative::map1_inplace(op, res),
        }
    }

    fn map2<M: Map2>(op: &M, res: &mut [u64], a: &[u64], b: &[u64]) {
        match Avx512::try_new() {
            // SAFETY: see `map1`.
            Some(simd) => unsafe { map2_avx512(simd, op, res, a, b) },
            None => EltwiseNative::map2(op, res, a, b),
        }
    }

    fn map2_inplace<M: Map2>(op: &M, res: &mut [u64], b: &[u64]) {
        match Avx512::try_new() {
            // SAFETY: see `map1`.
            Some(simd) => unsafe { map2_inplace_avx512(simd, op, res, b) },
            None => EltwiseNative::map2_inplace(op, res, b),
        }
    }
}

#[cfg(all(target_arch = "x86_64", feature = "avx512"))]
#[target_feature(enable = "avx512f,avx512dq")]
fn map1_avx512<M: Map1>(simd: Avx512, op: &M, res: &mut [u64], a: &[u64]) {
    map1_lanes(simd, op, res, a)
}

#[cfg(all(target_arch = "x86_64", feature = "avx512"))]
#[target_feature(enable = "avx512f,avx512dq")]
fn map1_inplace_avx512<M: Map1>(simd: Avx512, op: &M, res: &mut [u64]) {
    map1_inplace_lanes(simd, op, res)
}

#[cfg(all(target_arch = "x86_64", feature = "avx512"))]
#[target_feature(enable = "avx512f,avx512dq")]
fn map2_avx512<M: Map2>(simd: Avx512, op: &M, res: &mut [u64], a: &[u64], b: &[u64]) {
    map2_lanes(simd, op, res, a, b)
}

#[cfg(all(target_arch = "x86_64", feature = "avx512"))]
#[target_feature(enable = "avx512f,avx512dq")]
fn map2_inplace_avx512<M: Map2>(simd: Avx512, op: &M, res: &mut [u64], b: &[u64]) {
    map2_inplace_lanes(simd, op, res, b)
}

// The `n % LANES` head goes through the scalar path, the rest in full
// registers.

#[inline(always)]
fn map1_lanes<L: Lanes, M: Map1>(simd: L, op: &M, res: &mut [u64], a: &[u64]) {
    #[cfg(debug_assertions)]
    {
        assert_eq!(res.len(), a.len());
    }
    let head: usize = res.len() % L::LANES;
    let (res_head, res_body) = res.split_at_mut(head);
    let (a_head, a_body) = a.split_at(head);
    izip!(res_head.iter_mut(), a_head).for_each(|(r, &a)| *r = op.apply(Scalar, a));
    izip!(
        res_body.chunks_exact_mut(L::LANES),
        a_body.chunks_exact(L::LANES)
    )
    .for_each(|(r, a)| simd.store(r, op.apply(simd, simd.load(a))));
}

#[inline(always)]
fn map1_inplace_lanes<L: Lanes, M: Map1>(simd: L, op: &M, res: &mut [u64]) {
    let head: usize = res.len() % L::LANES;
    let (res_head, res_body) = res.split_at_mut(head);
    res_head.iter_mut().for_each(|r| *r = op.apply(Scalar, *r));
    res_body.chunks_exact_mut(L::LANES).for_each(|r| {
        let x: L::V = simd.load(r);
        simd.store(r, op.apply(simd, x))
    });
}

#[inline(always)]
fn map2_lanes<L: Lanes, M: Map2>(simd: L, op: &M, res: &mut [u64], a: &[u64], b: &[u64]) {
    #[cfg(debug_assertions)]
    {
        assert_eq!(res.len(), a.len());
        assert_eq!(res.len(), b.len());
    }
    let head: usize = res.len() % L::LANES;
    let (res_head, res_body) = res.split_at_mut(head);
    let (a_head, a_body) = a.split_at(head);
    let (b_head, b_body) = b.split_at(head);
    izip!(res_head.iter_mut(), a_head, b_head).for_each(|(r, &a, &b)| *r = op.apply(Scalar, a, b));
    izip!(
        res_body.chunks_exact_mut(L::LANES),
        a_body.chunks_exact(L::LANES),
        b_body.chunks_exact(L::LANES)
    )
    .for_each(|(r, a, b)| simd.store(r, op.apply(simd, simd.load(a), simd.load(b))));
}

#[inline(always)]
fn map2_inplace_lanes<L: Lanes, M: Map2>(simd: L, op: &M, res: &mut [u64], b: &[u64]) {
    #[cfg(debug_assertions)]
    {
        assert_eq!(res.len(), b.len());
    }
    let head: usize = res.len() % L::LANES;
    let (res_head, res_body) = res.split_at_mut(head);
    let (b_head, b_body) = b.split_at(head);
    izip!(res_head.iter_mut(), b_head).for_each(|(r, &b)| *r = op.apply(Scalar, *r, b));
    izip!(res_body.chunks_exact_mut(L::LANES), b_body.chunks_exact(L::LANES)).for_each(|(r, b)| {
        let a: L::V = simd.load(r);
        simd.store(r, op.apply(simd, a, simd.load(b)))
    });
}

/// Calls `$f::<Backend>(args)` with the backend chosen by the capability
/// signal.
macro_rules! dispatch {
    ($op:literal, $f:ident($($arg:expr),* $(,)?)) => {{
        #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
        if $crate::capability::has_avx512dq() {
            tracing::trace!(op = $op, backend = "avx512");
            return $f::<$crate::eltwise::EltwiseAvx512>($($arg),*);
        }
        tracing::trace!(op = $op, backend = "native");
        $f::<$crate::eltwise::EltwiseNative>($($arg),*)
    }};
}
pub(crate) use dispatch;

/// Shared validation of the two-slice kernels: non-empty, equal lengths,
/// `1 < q < 2^max_bits`, both operands below `factor * q`.
pub(crate) fn check_binary(
    result_len: usize,
    a: &[u64],
    b: &[u64],
    modulus: u64,
    max_bits: u32,
    factor: u64,
) -> Result<()> {
    check::non_empty(a.len())?;
    check::same_len("result", a.len(), result_len)?;
    check::same_len("b", a.len(), b.len())?;
    check::modulus_below(modulus, max_bits)?;
    let bound: u128 = check::bound(factor, modulus);
    check::all_below("a", a, bound)?;
    check::all_below("b", b, bound)
}

/// Validation of the slice-scalar kernels.
pub(crate) fn check_unary(
    result_len: usize,
    a: &[u64],
    scalar: u64,
    modulus: u64,
    max_bits: u32,
) -> Result<()> {
    check::non_empty(a.len())?;
    check::same_len("result", a.len(), result_len)?;
    check::modulus_below(modulus, max_bits)?;
    check::all_below("a", a, modulus as u128)?;
    check::scalar_below("scalar", scalar, modulus as u128)
}
