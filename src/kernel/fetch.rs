//! How kernels read entries of the dense X block
//!
//! Both modes return exactly `x[i]`. The cached mode additionally hints the
//! next entry a row will need into cache, standing in for a read-only
//! texture path on hardware that has one.

use std::fmt;
use std::str::FromStr;

use crate::utils::prefetch::prefetch_read_l1;

/// Read path used for the X block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Plain indexed reads
    #[default]
    Direct,
    /// Indexed reads plus a prefetch hint for the next slot's entries
    Cached,
}

impl FetchMode {
    /// Kernel name used in reports
    pub fn kernel_name(&self) -> &'static str {
        match self {
            FetchMode::Direct => "ell",
            FetchMode::Cached => "ell_tex",
        }
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMode::Direct => f.write_str("direct"),
            FetchMode::Cached => f.write_str("cached"),
        }
    }
}

impl FromStr for FetchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" | "plain" => Ok(FetchMode::Direct),
            "cached" | "tex" | "texture" => Ok(FetchMode::Cached),
            other => Err(format!("unknown fetch mode '{}'", other)),
        }
    }
}

/// Compile-time selection of the X read path
pub(crate) trait Fetch {
    /// Hint that `x[i]` will be read soon
    fn prefetch<T>(x: &[T], i: usize);

    /// Reads `x[i]`
    #[inline(always)]
    fn fetch<T: Copy>(x: &[T], i: usize) -> T {
        x[i]
    }
}

pub(crate) struct DirectFetch;

impl Fetch for DirectFetch {
    #[inline(always)]
    fn prefetch<T>(_x: &[T], _i: usize) {}
}

pub(crate) struct CachedFetch;

impl Fetch for CachedFetch {
    #[inline(always)]
    fn prefetch<T>(x: &[T], i: usize) {
        if let Some(entry) = x.get(i) {
            prefetch_read_l1(entry as *const T);
        }
    }
}
