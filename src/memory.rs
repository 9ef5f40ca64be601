//! Location-tagged arrays for host and device memory
//!
//! Every buffer used by the kernels lives in exactly one [`MemoryLocation`].
//! Host arrays are ordinary `Vec`s; device arrays are allocated separately
//! with device alignment and are only filled or read back through
//! [`copy_array`]. A copy always produces a new owned array, so a source and
//! its copy never alias.

use std::alloc::Layout;
use std::fmt;

use aligned_vec::{AVec, RuntimeAlign};
use num_traits::Zero;

use crate::constants::DEVICE_ALIGNMENT;
use crate::error::{Error, Result};

/// Execution domain an array belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryLocation {
    /// Process memory of the controlling thread
    Host,
    /// Memory owned by the data-parallel device
    Device,
}

impl MemoryLocation {
    /// Short label used in reports
    pub fn name(&self) -> &'static str {
        match self {
            MemoryLocation::Host => "cpu",
            MemoryLocation::Device => "gpu",
        }
    }
}

impl fmt::Display for MemoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

enum Storage<T> {
    Host(Vec<T>),
    Device(AVec<T, RuntimeAlign>),
}

/// An owned array tagged with the location it was allocated in
pub struct LocatedArray<T> {
    storage: Storage<T>,
}

impl<T> LocatedArray<T> {
    /// Wraps an existing host vector without copying
    pub fn from_vec(values: Vec<T>) -> Self {
        Self {
            storage: Storage::Host(values),
        }
    }

    /// Location this array was allocated in
    pub fn location(&self) -> MemoryLocation {
        match self.storage {
            Storage::Host(_) => MemoryLocation::Host,
            Storage::Device(_) => MemoryLocation::Device,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Whether the array holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read access to the elements
    pub fn as_slice(&self) -> &[T] {
        match &self.storage {
            Storage::Host(v) => &v[..],
            Storage::Device(v) => &v[..],
        }
    }

    /// Write access to the elements
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match &mut self.storage {
            Storage::Host(v) => &mut v[..],
            Storage::Device(v) => &mut v[..],
        }
    }

    /// Checks that the array lives at `expected`
    pub(crate) fn expect_location(&self, what: &'static str, expected: MemoryLocation) -> Result<()> {
        let got = self.location();
        if got != expected {
            return Err(Error::LocationMismatch { what, expected, got });
        }
        Ok(())
    }
}

impl<T: Copy> LocatedArray<T> {
    /// Copies a host slice into a new array at `location`
    pub fn from_slice(values: &[T], location: MemoryLocation) -> Result<Self> {
        transfer(values, values.len(), location)
    }

    /// Copies the whole array to `location`
    pub fn to_location(&self, location: MemoryLocation) -> Result<Self> {
        copy_array(self, self.len(), location)
    }

    /// Copies the array into a host vector
    pub fn to_vec(&self) -> Vec<T> {
        self.as_slice().to_vec()
    }
}

impl<T> fmt::Debug for LocatedArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocatedArray")
            .field("location", &self.location())
            .field("len", &self.len())
            .finish()
    }
}

impl<T: Clone> Clone for LocatedArray<T> {
    fn clone(&self) -> Self {
        let storage = match &self.storage {
            Storage::Host(v) => Storage::Host(v.clone()),
            Storage::Device(v) => Storage::Device(AVec::from_slice(DEVICE_ALIGNMENT, v)),
        };
        Self { storage }
    }
}

/// Allocates `count` zero-initialized elements at `location`
pub fn allocate<T: Copy + Zero>(count: usize, location: MemoryLocation) -> Result<LocatedArray<T>> {
    check_layout::<T>(count, location)?;
    let storage = match location {
        MemoryLocation::Host => {
            let mut v = Vec::new();
            v.try_reserve_exact(count)
                .map_err(|_| Error::Allocation { count, location })?;
            v.resize(count, T::zero());
            Storage::Host(v)
        }
        MemoryLocation::Device => {
            Storage::Device(AVec::from_iter(DEVICE_ALIGNMENT, (0..count).map(|_| T::zero())))
        }
    };
    Ok(LocatedArray { storage })
}

/// Allocates a new array at `dst` holding the first `count` elements of `src`
///
/// Works for every pair of source and destination locations.
pub fn copy_array<T: Copy>(
    src: &LocatedArray<T>,
    count: usize,
    dst: MemoryLocation,
) -> Result<LocatedArray<T>> {
    log::trace!("copy {} elements {} -> {}", count, src.location(), dst);
    transfer(src.as_slice(), count, dst)
}

/// Releases an array
///
/// Consuming the array makes a second release of the same buffer impossible.
pub fn free<T>(array: LocatedArray<T>) {
    drop(array);
}

fn transfer<T: Copy>(src: &[T], count: usize, dst: MemoryLocation) -> Result<LocatedArray<T>> {
    if count > src.len() {
        return Err(Error::DimensionMismatch {
            what: "copy source",
            expected: count,
            got: src.len(),
        });
    }
    check_layout::<T>(count, dst)?;
    let src = &src[..count];
    let storage = match dst {
        MemoryLocation::Host => {
            let mut v = Vec::new();
            v.try_reserve_exact(count)
                .map_err(|_| Error::Allocation { count, location: dst })?;
            v.extend_from_slice(src);
            Storage::Host(v)
        }
        MemoryLocation::Device => Storage::Device(AVec::from_slice(DEVICE_ALIGNMENT, src)),
    };
    Ok(LocatedArray { storage })
}

fn check_layout<T>(count: usize, location: MemoryLocation) -> Result<()> {
    Layout::array::<T>(count)
        .map(|_| ())
        .map_err(|_| Error::Allocation { count, location })
}
