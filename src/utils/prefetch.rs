//! Memory prefetching hints
//!
//! Architecture-specific prefetch instructions. They never fault and have no
//! observable effect besides cache state, so callers may pass any address
//! derived from a live slice.

/// Prefetch for read into L1 cache
#[inline(always)]
pub fn prefetch_read_l1<T>(ptr: *const T) {
    #[cfg(target_arch = "aarch64")]
    unsafe {
        // PRFM PLDL1KEEP, [ptr]
        // Prefetch for load, L1, temporal (keep in cache)
        std::arch::asm!(
            "prfm pldl1keep, [{ptr}]",
            ptr = in(reg) ptr,
            options(nostack, preserves_flags)
        );
    }

    #[cfg(target_arch = "x86_64")]
    unsafe {
        // T0 hint: Prefetch into all cache levels
        std::arch::x86_64::_mm_prefetch(ptr as *const i8, std::arch::x86_64::_MM_HINT_T0);
    }

    #[cfg(not(any(target_arch = "aarch64", target_arch = "x86_64")))]
    {
        // No-op on unsupported architectures
        let _ = ptr;
    }
}
