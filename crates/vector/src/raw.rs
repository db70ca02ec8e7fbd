use core::{alloc::Layout, fmt, marker::PhantomData, mem, ptr::NonNull};
use std::alloc;

use bytesize::ByteSize;
use log::error;

/// An error with allocating memory for a [`RawMemory`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    /// The requested capacity, in bytes, overflowed `isize::MAX`.
    #[error("capacity overflow")]
    CapacityOverflow,
    /// The global allocator could not satisfy the request.
    #[error("memory allocation of {} bytes failed", .layout.size())]
    OutOfMemory {
        /// Size and alignment of the block that was requested.
        layout: Layout,
    },
}

/// Reports an allocation failure the way the standard collections do.
#[cold]
#[track_caller]
pub(crate) fn handle_error(err: AllocError) -> ! {
    match err {
        AllocError::CapacityOverflow => panic!("capacity overflow"),
        AllocError::OutOfMemory { layout } => alloc::handle_alloc_error(layout),
    }
}

/// An owned block of uninitialized memory with room for `capacity` values of `T`.
///
/// `RawMemory` never constructs or drops a `T`. It does not know which of its slots hold live
/// values, so whoever writes into it is responsible for dropping those values before the block
/// is released (or moved somewhere else).
///
/// A capacity of zero, or a zero-sized `T`, never touches the allocator.
pub struct RawMemory<T> {
    ptr: NonNull<T>,
    capacity: usize,
    _marker: PhantomData<T>,
}

// SAFETY: `RawMemory` uniquely owns its block, just like `Box<[MaybeUninit<T>]>`.
unsafe impl<T: Send> Send for RawMemory<T> {}
unsafe impl<T: Sync> Sync for RawMemory<T> {}

impl<T> RawMemory<T> {
    /// Constructs an empty `RawMemory` without allocating.
    pub const fn new() -> Self {
        Self {
            ptr: NonNull::dangling(),
            capacity: 0,
            _marker: PhantomData,
        }
    }

    /// Allocates room for exactly `capacity` values.
    ///
    /// # Panics
    ///
    /// Panics if the size of the block would exceed `isize::MAX` bytes. Aborts through
    /// [`handle_alloc_error`](std::alloc::handle_alloc_error) if the allocator fails.
    #[track_caller]
    pub fn with_capacity(capacity: usize) -> Self {
        match Self::try_with_capacity(capacity) {
            Ok(memory) => memory,
            Err(err) => handle_error(err),
        }
    }

    /// Allocates room for exactly `capacity` values.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the size of the block would exceed `isize::MAX` bytes or the allocator
    /// cannot satisfy the request.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, AllocError> {
        let layout = Self::layout(capacity)?;
        if layout.size() == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                capacity,
                _marker: PhantomData,
            });
        }

        // SAFETY: layout has a non-zero size
        let raw = unsafe { alloc::alloc(layout) };
        match NonNull::new(raw.cast::<T>()) {
            Some(ptr) => Ok(Self {
                ptr,
                capacity,
                _marker: PhantomData,
            }),
            None => {
                error!(
                    "failed to allocate {} for {} elements",
                    ByteSize::b(layout.size() as u64).to_string_as(true),
                    capacity
                );
                Err(AllocError::OutOfMemory { layout })
            }
        }
    }

    fn layout(capacity: usize) -> Result<Layout, AllocError> {
        Layout::array::<T>(capacity).map_err(|_| {
            error!(
                "requested capacity exceeds isize::MAX bytes: {} elements of {}",
                capacity,
                ByteSize::b(mem::size_of::<T>() as u64).to_string_as(true)
            );
            AllocError::CapacityOverflow
        })
    }

    /// Returns the number of values the block has room for.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Returns a pointer to the slot at `offset`.
    ///
    /// `offset == capacity` yields the one-past-the-end pointer, which must not be dereferenced.
    /// Computing the pointer is always safe; reading or writing through it is not.
    #[inline]
    pub fn ptr_at(&self, offset: usize) -> *mut T {
        debug_assert!(
            offset <= self.capacity,
            "offset (is {offset}) should be <= capacity (is {})",
            self.capacity
        );
        self.ptr.as_ptr().wrapping_add(offset)
    }

    /// Exchanges blocks with `other`. Never allocates.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Moves the block out, leaving `self` empty.
    #[inline]
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::new())
    }
}

impl<T> Default for RawMemory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for RawMemory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawMemory")
            .field("ptr", &self.ptr)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<T> Drop for RawMemory<T> {
    fn drop(&mut self) {
        // the layout was valid when the block was allocated
        if let Ok(layout) = Layout::array::<T>(self.capacity) {
            if layout.size() != 0 {
                // SAFETY: allocated by `try_with_capacity` with this same layout
                unsafe { alloc::dealloc(self.ptr.as_ptr().cast(), layout) }
            }
        }
    }
}
