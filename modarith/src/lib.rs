//! Modular arithmetic and negacyclic NTT kernels over word-sized primes.
//!
//! Every kernel exists in a portable form and an eight-lane AVX512-DQ form
//! written once against [`simd::Lanes`]. The unsuffixed entry points choose
//! between them at runtime from [`capability::has_avx512dq`]; the `*_native`
//! entry points pin the portable form.
//!
//! Residue slices carry a declared *mod factor* `f`: every element lies in
//! `[0, f * q)`. Entry points check their inputs against the declared bound
//! and return an [`Error`] before writing anything when a check fails.

pub mod capability;
pub(crate) mod check;
pub mod eltwise;
pub mod error;
pub mod ntt;
pub mod number_theory;
pub mod simd;

pub use eltwise::{
    CmpInt, eltwise_add_mod, eltwise_add_mod_inplace, eltwise_add_scalar_mod, eltwise_add_scalar_mod_inplace,
    eltwise_cmp_add, eltwise_cmp_add_inplace, eltwise_cmp_sub_mod, eltwise_cmp_sub_mod_inplace, eltwise_fma_mod,
    eltwise_fma_mod_inplace, eltwise_mult_mod, eltwise_mult_mod_inplace, eltwise_reduce_mod,
    eltwise_reduce_mod_inplace, eltwise_sub_mod, eltwise_sub_mod_inplace, eltwise_sub_scalar_mod,
    eltwise_sub_scalar_mod_inplace,
};
pub use error::{Error, Result};
pub use ntt::Ntt;

use std::alloc::{Layout, alloc_zeroed, dealloc, handle_alloc_error};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

/// Alignment of [`alloc_aligned`] buffers: one 512-bit register.
pub const DEFAULTALIGN: usize = 64;

/// Zeroed `u64` buffer whose first element is aligned to `align` bytes.
pub struct AlignedVec {
    ptr: NonNull<u64>,
    len: usize,
    layout: Layout,
}

// SAFETY: `AlignedVec` uniquely owns its allocation, like `Vec<u64>`.
unsafe impl Send for AlignedVec {}
unsafe impl Sync for AlignedVec {}

/// Allocates `size` zeroed words aligned to `align` bytes.
///
/// # Panics
/// If `align` is not a power of two multiple of 8.
pub fn alloc_aligned(size: usize, align: usize) -> AlignedVec {
    assert!(
        align.is_power_of_two() && align >= std::mem::align_of::<u64>(),
        "align={align} must be a power of two not smaller than 8"
    );
    let bytes: usize = (size * std::mem::size_of::<u64>()).next_multiple_of(align).max(align);
    let layout: Layout = match Layout::from_size_align(bytes, align) {
        Ok(layout) => layout,
        Err(err) => panic!("invalid layout for {size} words aligned to {align}: {err}"),
    };
    // SAFETY: `layout` has a non-zero size.
    let raw: *mut u64 = unsafe { alloc_zeroed(layout) } as *mut u64;
    let Some(ptr) = NonNull::new(raw) else {
        handle_alloc_error(layout)
    };
    AlignedVec { ptr, len: size, layout }
}

impl Deref for AlignedVec {
    type Target = [u64];

    fn deref(&self) -> &[u64] {
        // SAFETY: the allocation holds at least `len` initialized words.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl DerefMut for AlignedVec {
    fn deref_mut(&mut self) -> &mut [u64] {
        // SAFETY: see `deref`; `&mut self` guarantees uniqueness.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for AlignedVec {
    fn drop(&mut self) {
        // SAFETY: allocated in `alloc_aligned` with this layout.
        unsafe { dealloc(self.ptr.as_ptr() as *mut u8, self.layout) }
    }
}

impl std::fmt::Debug for AlignedVec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_buffer() {
        for size in [0, 1, 7, 8, 1000] {
            let mut buf: AlignedVec = alloc_aligned(size, DEFAULTALIGN);
            assert_eq!(buf.len(), size);
            assert_eq!(buf.as_ptr() as usize % DEFAULTALIGN, 0);
            assert!(buf.iter().all(|&x| x == 0));
            buf.iter_mut().enumerate().for_each(|(i, x)| *x = i as u64);
            assert!(buf.iter().enumerate().all(|(i, &x)| x == i as u64));
        }
    }

    #[test]
    #[should_panic]
    fn rejects_bad_alignment() {
        let _ = alloc_aligned(8, 24);
    }
}
