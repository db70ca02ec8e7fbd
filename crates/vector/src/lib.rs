//! A contiguous growable array built directly on raw, uninitialized memory.
//!
//! The crate is split in two layers:
//!
//! - [`RawMemory`] owns a block of uninitialized memory sized for a fixed number of values and
//!   knows nothing about which of its slots are live.
//! - [`Vector`] owns one `RawMemory` plus a length, and is responsible for constructing and
//!   dropping values, growing, and inserting or removing at arbitrary positions.
//!
//! Growth never resizes a block in place. A bigger block is allocated, the new state is built
//! inside it (the newly inserted value first), and then the blocks are swapped. Allocation and
//! element construction can fail; swapping cannot.
//!
//! ```
//! use advanced_vector::{vector, Vector};
//!
//! let mut v = Vector::new();
//! v.push_back(1);
//! v.push_back(2);
//! v.push_back(3);
//! assert_eq!(v.capacity(), 4);
//!
//! v.insert(1, 99);
//! v.erase(0);
//! assert_eq!(v, vector![99, 2, 3]);
//! ```

pub mod constants;
mod containers;
mod raw;

pub use containers::{
    into_iter::IntoIter,
    vec::{EmplaceError, Vector},
};
pub use raw::{AllocError, RawMemory};
