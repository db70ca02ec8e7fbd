use core::{
    convert::Infallible,
    fmt,
    hash::{Hash, Hasher},
    mem::{self, ManuallyDrop},
    ops::{Deref, DerefMut, Index, IndexMut},
    ptr,
    slice::{self, SliceIndex},
};

use log::trace;

use crate::{
    constants::{GROWTH_FACTOR, MIN_NON_ZERO_CAPACITY},
    raw::{handle_error, AllocError, RawMemory},
};

/// An error from [`Vector::try_emplace`].
#[derive(Debug, thiserror::Error)]
pub enum EmplaceError<E> {
    /// Storage for the new element could not be allocated.
    #[error(transparent)]
    Alloc(#[from] AllocError),
    /// The element constructor returned an error.
    #[error("element constructor failed: {0}")]
    Construct(E),
}

/// A contiguous growable array type, written as `Vector<T>`.
///
/// A `Vector` owns a single [`RawMemory`] block. Slots `[0, len)` hold live values and slots
/// `[len, capacity)` are uninitialized. Whenever more room is needed, a new block is allocated,
/// the new state is fully built inside it, and only then is it swapped in for the old one. A
/// failed allocation or a failed element constructor therefore leaves the vector as it was.
pub struct Vector<T> {
    data: RawMemory<T>,
    len: usize,
}

/// Moves `count` live values from `src` into the uninitialized slots at `dst`.
///
/// Moves in Rust are bitwise and cannot fail, so relocation never leaves a half-moved range
/// behind and never needs to fall back to cloning.
///
/// # Safety
///
/// `src` must point to `count` live values, `dst` to `count` uninitialized slots in a different
/// block. Afterwards the values at `src` are logically moved-from and must not be dropped.
#[inline]
unsafe fn relocate<T>(src: *const T, dst: *mut T, count: usize) {
    ptr::copy_nonoverlapping(src, dst, count);
}

/// Truncates the vector back to `len` if dropped, i.e. if a constructor panics mid-way.
struct TruncateOnUnwind<'a, T> {
    vector: &'a mut Vector<T>,
    len: usize,
}

impl<T> Drop for TruncateOnUnwind<'_, T> {
    fn drop(&mut self) {
        self.vector.truncate(self.len);
    }
}

impl<T> Vector<T> {
    /// Constructs a new, empty `Vector<T>`. Does not allocate.
    pub const fn new() -> Self {
        Self {
            data: RawMemory::new(),
            len: 0,
        }
    }

    /// Constructs an empty `Vector<T>` with room for exactly `capacity` values.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity exceeds `isize::MAX` bytes.
    #[track_caller]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: RawMemory::with_capacity(capacity),
            len: 0,
        }
    }

    /// Fallible version of [`with_capacity`](Self::with_capacity).
    ///
    /// # Errors
    ///
    /// Returns `Err` if the storage cannot be allocated.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, AllocError> {
        Ok(Self {
            data: RawMemory::try_with_capacity(capacity)?,
            len: 0,
        })
    }

    /// Constructs a `Vector<T>` holding `len` default values.
    ///
    /// If `T::default` panics, the values built so far are dropped and the storage is freed.
    pub fn with_len(len: usize) -> Self
    where
        T: Default,
    {
        let mut vector = Self::with_capacity(len);
        vector.resize_with(len, T::default);
        vector
    }

    /// Constructs a `Vector<T>` holding `n` clones of `elem`.
    pub fn from_elem(elem: T, n: usize) -> Self
    where
        T: Clone,
    {
        let mut vector = Self::with_capacity(n);
        if n > 0 {
            for _ in 1..n {
                // SAFETY: capacity is n
                unsafe { vector.push_unchecked(elem.clone()) }
            }
            // SAFETY: capacity is n
            unsafe { vector.push_unchecked(elem) }
        }
        vector
    }

    /// Returns the number of live values.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of values the vector can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self
    }

    /// Ensures the vector can hold at least `new_capacity` values.
    ///
    /// Does nothing if the capacity is already large enough. Otherwise allocates exactly
    /// `new_capacity` slots and moves every value into them.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity exceeds `isize::MAX` bytes.
    #[track_caller]
    pub fn reserve(&mut self, new_capacity: usize) {
        if let Err(err) = self.try_reserve(new_capacity) {
            handle_error(err);
        }
    }

    /// Fallible version of [`reserve`](Self::reserve).
    ///
    /// # Errors
    ///
    /// Returns `Err` if the new storage cannot be allocated. The vector is left unchanged.
    pub fn try_reserve(&mut self, new_capacity: usize) -> Result<(), AllocError> {
        if new_capacity <= self.capacity() {
            return Ok(());
        }
        let new_data = RawMemory::<T>::try_with_capacity(new_capacity)?;
        // SAFETY: [0, len) are live, the new block is fresh and at least as large
        unsafe { relocate(self.data.as_ptr(), new_data.ptr_at(0), self.len) };
        self.replace_storage(new_data);
        Ok(())
    }

    /// Swaps in a block that already holds the live values, freeing the old one.
    ///
    /// The old block's values must already have been relocated, so it is released without
    /// dropping anything.
    fn replace_storage(&mut self, mut new_data: RawMemory<T>) {
        trace!(
            "replacing storage: capacity {} -> {} ({} live)",
            self.data.capacity(),
            new_data.capacity(),
            self.len
        );
        self.data.swap(&mut new_data);
    }

    fn grown_capacity(&self) -> Result<usize, AllocError> {
        match self.capacity() {
            0 => Ok(MIN_NON_ZERO_CAPACITY),
            capacity => capacity
                .checked_mul(GROWTH_FACTOR)
                .ok_or(AllocError::CapacityOverflow),
        }
    }

    /// Writes `value` into the first free slot.
    ///
    /// # Safety
    ///
    /// `len` must be less than `capacity`.
    #[inline]
    unsafe fn push_unchecked(&mut self, value: T) {
        debug_assert!(self.len < self.capacity());
        self.data.ptr_at(self.len).write(value);
        self.len += 1;
    }

    /// Constructs a value in place at `index`, shifting everything after it to the right.
    ///
    /// `ctor` always runs before any existing value is touched, so if it panics the vector is
    /// left unchanged. Returns a reference to the inserted value.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    ///
    /// # Examples
    ///
    /// ```
    /// use advanced_vector::vector;
    ///
    /// let mut v = vector![1, 2, 3];
    /// *v.emplace(1, || 10) += 1;
    /// assert_eq!(v, [1, 11, 2, 3]);
    /// ```
    #[track_caller]
    pub fn emplace<F>(&mut self, index: usize, ctor: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        match self.try_emplace(index, || Ok::<T, Infallible>(ctor())) {
            Ok(value) => value,
            Err(EmplaceError::Alloc(err)) => handle_error(err),
            Err(EmplaceError::Construct(never)) => match never {},
        }
    }

    /// Constructs a value in place at `index` with a fallible constructor.
    ///
    /// # Errors
    ///
    /// Returns `Err` if more storage was needed and could not be allocated, or if `ctor` returned
    /// an error. Either way the vector is left unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    #[track_caller]
    pub fn try_emplace<E, F>(&mut self, index: usize, ctor: F) -> Result<&mut T, EmplaceError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        #[cold]
        #[track_caller]
        fn assert_failed(index: usize, len: usize) -> ! {
            panic!("insertion index (is {index}) should be <= len (is {len})");
        }

        let len = self.len;
        if index > len {
            assert_failed(index, len);
        }

        if len == self.capacity() {
            // build the new block, value first, then relocate around it
            let new_data = RawMemory::<T>::try_with_capacity(self.grown_capacity()?)?;
            let value = ctor().map_err(EmplaceError::Construct)?;
            // SAFETY: the new block has room for len + 1 values and the two destination ranges
            // [0, index) and [index + 1, len + 1) do not overlap
            unsafe {
                new_data.ptr_at(index).write(value);
                relocate(self.data.as_ptr(), new_data.ptr_at(0), index);
                relocate(self.data.ptr_at(index), new_data.ptr_at(index + 1), len - index);
            }
            self.replace_storage(new_data);
        } else {
            let value = ctor().map_err(EmplaceError::Construct)?;
            // SAFETY: len < capacity, so slot len is free
            unsafe {
                let slot = self.data.ptr_at(index);
                if index < len {
                    ptr::copy(slot, slot.add(1), len - index);
                }
                slot.write(value);
            }
        }

        self.len = len + 1;
        // SAFETY: just written
        Ok(unsafe { &mut *self.data.ptr_at(index) })
    }

    /// Inserts `value` at `index`, shifting everything after it to the right.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    #[track_caller]
    pub fn insert(&mut self, index: usize, value: T) -> &mut T {
        self.emplace(index, move || value)
    }

    /// Constructs a value in place at the back of the vector. Amortized *O*(1).
    #[track_caller]
    pub fn emplace_back<F>(&mut self, ctor: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        self.emplace(self.len, ctor)
    }

    /// Appends `value` to the back of the vector. Amortized *O*(1).
    #[track_caller]
    pub fn push_back(&mut self, value: T) {
        self.emplace_back(move || value);
    }

    /// Fallible version of [`push_back`](Self::push_back).
    ///
    /// # Errors
    ///
    /// Returns `Err` if the vector was full and more storage could not be allocated. `value` is
    /// dropped and the vector is left unchanged.
    pub fn try_push_back(&mut self, value: T) -> Result<(), AllocError> {
        match self.try_emplace(self.len, move || Ok::<T, Infallible>(value)) {
            Ok(_) => Ok(()),
            Err(EmplaceError::Alloc(err)) => Err(err),
            Err(EmplaceError::Construct(never)) => match never {},
        }
    }

    /// Removes the last value and returns it, or `None` if the vector is empty.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: slot len was live and is now outside [0, len)
        Some(unsafe { self.data.ptr_at(self.len).read() })
    }

    /// Removes and returns the value at `index`, shifting everything after it to the left.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[track_caller]
    pub fn remove(&mut self, index: usize) -> T {
        #[cold]
        #[track_caller]
        fn assert_failed(index: usize, len: usize) -> ! {
            panic!("removal index (is {index}) should be < len (is {len})");
        }

        let len = self.len;
        if index >= len {
            assert_failed(index, len);
        }
        // SAFETY: index < len
        unsafe {
            let slot = self.data.ptr_at(index);
            let value = slot.read();
            ptr::copy(slot.add(1), slot, len - index - 1);
            self.len = len - 1;
            value
        }
    }

    /// Drops the value at `index`, shifting everything after it to the left.
    ///
    /// Returns `index`, which now addresses the value that followed the erased one (or the end).
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`, in particular on an empty vector.
    #[track_caller]
    pub fn erase(&mut self, index: usize) -> usize {
        drop(self.remove(index));
        index
    }

    /// Drops every value past `new_len`. Does nothing if `new_len >= len`.
    pub fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len {
            return;
        }
        let tail = ptr::slice_from_raw_parts_mut(self.data.ptr_at(new_len), self.len - new_len);
        // shrink first so a panicking drop cannot expose dropped slots
        self.len = new_len;
        // SAFETY: [new_len, old len) were live and are now outside [0, len)
        unsafe { ptr::drop_in_place(tail) }
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Resizes the vector to `new_len`, filling new slots with `T::default()`.
    ///
    /// If `T::default` panics, the vector keeps its original values.
    #[track_caller]
    pub fn resize(&mut self, new_len: usize)
    where
        T: Default,
    {
        self.resize_with(new_len, T::default);
    }

    /// Resizes the vector to `new_len`, filling new slots with the values returned by `f`.
    ///
    /// If `f` panics, the values it produced so far are dropped and the vector keeps its
    /// original values.
    #[track_caller]
    pub fn resize_with<F>(&mut self, new_len: usize, mut f: F)
    where
        F: FnMut() -> T,
    {
        let len = self.len;
        if new_len <= len {
            self.truncate(new_len);
            return;
        }

        self.reserve(new_len);
        let guard = TruncateOnUnwind { vector: self, len };
        while guard.vector.len < new_len {
            // SAFETY: capacity >= new_len
            unsafe { guard.vector.push_unchecked(f()) }
        }
        mem::forget(guard);
    }

    /// Exchanges storage and contents with `other` in *O*(1).
    #[inline]
    pub fn swap_with(&mut self, other: &mut Self) {
        self.data.swap(&mut other.data);
        mem::swap(&mut self.len, &mut other.len);
    }

    /// Hands out the block and the live length without dropping anything.
    pub(crate) fn into_raw_parts(self) -> (RawMemory<T>, usize) {
        let mut this = ManuallyDrop::new(self);
        (this.data.take(), this.len)
    }
}

impl<T> Drop for Vector<T> {
    fn drop(&mut self) {
        // SAFETY: [0, len) are live; the block itself is freed by `RawMemory`
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.data.as_mut_ptr(),
                self.len,
            ))
        }
    }
}

impl<T> Default for Vector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for Vector<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        // SAFETY: [0, len) are live and the pointer is aligned and non-null
        unsafe { slice::from_raw_parts(self.data.as_ptr(), self.len) }
    }
}

impl<T> DerefMut for Vector<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: [0, len) are live and the pointer is aligned and non-null
        unsafe { slice::from_raw_parts_mut(self.data.as_mut_ptr(), self.len) }
    }
}

impl<T, I: SliceIndex<[T]>> Index<I> for Vector<T> {
    type Output = I::Output;

    #[inline]
    fn index(&self, index: I) -> &Self::Output {
        Index::index(&**self, index)
    }
}

impl<T, I: SliceIndex<[T]>> IndexMut<I> for Vector<T> {
    #[inline]
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        IndexMut::index_mut(&mut **self, index)
    }
}

impl<T: Clone> Clone for Vector<T> {
    /// Clones into storage sized to `self.len()`.
    ///
    /// If any clone panics, the clones made so far are dropped and nothing is returned.
    fn clone(&self) -> Self {
        let mut cloned = Self::with_capacity(self.len);
        for value in self.iter() {
            // SAFETY: capacity is self.len
            unsafe { cloned.push_unchecked(value.clone()) }
        }
        cloned
    }

    /// Overwrites `self` with a copy of `source`.
    ///
    /// If `source` does not fit in the current capacity, a full copy is built first and swapped
    /// in, so a panicking clone leaves `self` unchanged. Otherwise the existing storage is
    /// reused: overlapping values are assigned with [`Clone::clone_from`], extra values are
    /// cloned in place and surplus values are dropped. A panic on that path leaves `self` valid
    /// but only partially updated.
    fn clone_from(&mut self, source: &Self) {
        if source.len > self.capacity() {
            let mut fresh = source.clone();
            self.swap_with(&mut fresh);
            return;
        }

        let overlap = self.len.min(source.len);
        for (dst, src) in self[..overlap].iter_mut().zip(&source[..overlap]) {
            dst.clone_from(src);
        }
        if self.len < source.len {
            for value in &source[overlap..] {
                // SAFETY: source.len <= capacity
                unsafe { self.push_unchecked(value.clone()) }
            }
        } else {
            self.truncate(source.len);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Vector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Hash> Hash for Vector<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Hash::hash(&**self, state);
    }
}

impl<T, U> PartialEq<Vector<U>> for Vector<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &Vector<U>) -> bool {
        self[..] == other[..]
    }
}

impl<T: Eq> Eq for Vector<T> {}

impl<T, U> PartialEq<[U]> for Vector<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U]) -> bool {
        self[..] == *other
    }
}

impl<T, U> PartialEq<&[U]> for Vector<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &&[U]) -> bool {
        self[..] == **other
    }
}

impl<T, U, const N: usize> PartialEq<[U; N]> for Vector<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U; N]) -> bool {
        self[..] == other[..]
    }
}

impl<T> AsRef<[T]> for Vector<T> {
    fn as_ref(&self) -> &[T] {
        self
    }
}

impl<T> AsMut<[T]> for Vector<T> {
    fn as_mut(&mut self) -> &mut [T] {
        self
    }
}

impl<T> Extend<T> for Vector<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        let needed = self.len.saturating_add(lower);
        if needed > self.capacity() {
            // never grow by less than a regular growth step
            let grown = self.grown_capacity().unwrap_or(needed);
            self.reserve(needed.max(grown));
        }
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<'a, T: Copy + 'a> Extend<&'a T> for Vector<T> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T> FromIterator<T> for Vector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut vector = Self::new();
        vector.extend(iter);
        vector
    }
}

impl<T: Clone> From<&[T]> for Vector<T> {
    fn from(values: &[T]) -> Self {
        let mut vector = Self::with_capacity(values.len());
        for value in values {
            // SAFETY: capacity is values.len()
            unsafe { vector.push_unchecked(value.clone()) }
        }
        vector
    }
}

impl<T, const N: usize> From<[T; N]> for Vector<T> {
    fn from(values: [T; N]) -> Self {
        values.into_iter().collect()
    }
}

impl<'a, T> IntoIterator for &'a Vector<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Vector<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Creates a [`Vector`] containing the arguments.
///
/// ```
/// use advanced_vector::vector;
///
/// let v = vector![1, 2, 3];
/// assert_eq!(v, [1, 2, 3]);
///
/// let zeros = vector![0u8; 4];
/// assert_eq!(zeros, [0, 0, 0, 0]);
/// ```
#[macro_export]
macro_rules! vector {
    () => {
        $crate::Vector::new()
    };
    ($elem:expr; $n:expr) => {
        $crate::Vector::from_elem($elem, $n)
    };
    ($($x:expr),+ $(,)?) => {
        $crate::Vector::from([$($x),+])
    };
}
