use core::{fmt, iter::FusedIterator, ptr, slice};

use crate::{containers::vec::Vector, raw::RawMemory};

/// An iterator that moves values out of a [`Vector`].
///
/// Slots `[start, end)` of the block are still live; everything outside has been yielded.
pub struct IntoIter<T> {
    data: RawMemory<T>,
    start: usize,
    end: usize,
}

impl<T> IntoIter<T> {
    /// Returns the values that have not been yielded yet.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: [start, end) are live
        unsafe { slice::from_raw_parts(self.data.ptr_at(self.start), self.end - self.start) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: [start, end) are live
        unsafe { slice::from_raw_parts_mut(self.data.ptr_at(self.start), self.end - self.start) }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        let index = self.start;
        self.start += 1;
        // SAFETY: index was live and is now outside [start, end)
        Some(unsafe { self.data.ptr_at(index).read() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.end - self.start;
        (len, Some(len))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        self.end -= 1;
        // SAFETY: end was live and is now outside [start, end)
        Some(unsafe { self.data.ptr_at(self.end).read() })
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        let rest =
            ptr::slice_from_raw_parts_mut(self.data.ptr_at(self.start), self.end - self.start);
        self.start = self.end;
        // SAFETY: [start, end) were live
        unsafe { ptr::drop_in_place(rest) }
    }
}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

impl<T> IntoIterator for Vector<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        let (data, len) = self.into_raw_parts();
        IntoIter {
            data,
            start: 0,
            end: len,
        }
    }
}
