//! Process-wide SIMD capability signal.
//!
//! Computed at most once, on first use, and never mutated afterwards. Setting
//! [`DISABLE_AVX512DQ_ENV`] before the first query pins every dispatcher to
//! the native backend.

use once_cell::sync::Lazy;
use tracing::debug;

/// Any value disables the AVX512-DQ backend for the lifetime of the process.
pub const DISABLE_AVX512DQ_ENV: &str = "MODARITH_DISABLE_AVX512DQ";

static HAS_AVX512DQ: Lazy<bool> = Lazy::new(detect);

/// Returns `true` when the dispatchers route to the AVX512-DQ backend.
#[inline]
pub fn has_avx512dq() -> bool {
    *HAS_AVX512DQ
}

/// Returns `true` when the CPU reports AVX512-F and AVX512-DQ and the backend
/// is compiled in, regardless of [`DISABLE_AVX512DQ_ENV`].
pub fn cpu_has_avx512dq() -> bool {
    #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
    {
        std::arch::is_x86_feature_detected!("avx512f") && std::arch::is_x86_feature_detected!("avx512dq")
    }
    #[cfg(not(all(target_arch = "x86_64", feature = "avx512")))]
    {
        false
    }
}

fn detect() -> bool {
    let cpu: bool = cpu_has_avx512dq();
    if std::env::var_os(DISABLE_AVX512DQ_ENV).is_some() {
        debug!(cpu_avx512dq = cpu, "avx512dq backend disabled by {}", DISABLE_AVX512DQ_ENV);
        return false;
    }
    debug!(avx512dq = cpu, "capability detection");
    cpu
}
