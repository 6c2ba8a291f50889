#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A growable, contiguous array built from two strictly layered parts:
//!
//! * [`RawBuffer<T>`] owns uninitialized memory for a fixed number of items. It never constructs
//!   or drops a `T` and has no idea which of its slots are in use.
//! * [`DynamicArray<T>`] owns a [`RawBuffer<T>`] plus a length. It constructs, drops, moves and
//!   shifts items, and grows by allocating a new buffer and relocating its items into it.
//!
//! The interesting part is panic safety. Item code (constructors passed to `emplace()`, `Clone`,
//! `Default`, `Drop`) may panic or, via the `try_` methods, return an error. Whatever happens, the
//! array stays valid, leaks nothing and drops nothing twice. Growth and insertion go further:
//! the new item is constructed before any existing item is touched, so a failure leaves the array
//! exactly as it was.
//!
//! Existing items are relocated (moved) whenever storage changes. In Rust a move is a bitwise copy
//! that can neither fail nor be disabled, so growth never needs to fall back to cloning.
//!
//! # Example
//!
//! ```
//! use dynamic_array::DynamicArray;
//!
//! let mut names = DynamicArray::new();
//! names.push_back("Alice".to_string());
//! names.push_back("Carol".to_string());
//! names.insert(1, "Bob".to_string());
//!
//! assert_eq!(names, ["Alice", "Bob", "Carol"]);
//! assert_eq!(names.len(), 3);
//! assert_eq!(names.capacity(), 4);
//!
//! let copy = names.clone();
//! names.clear();
//!
//! assert!(names.is_empty());
//! assert_eq!(copy.len(), 3);
//! ```
//!
//! Fallible construction leaves the array untouched on failure:
//!
//! ```
//! use dynamic_array::DynamicArray;
//!
//! let mut numbers = DynamicArray::from([1, 2, 3]);
//!
//! let result = numbers.try_emplace_back(|| "four".parse::<i32>());
//!
//! assert!(result.is_err());
//! assert_eq!(numbers, [1, 2, 3]);
//! assert_eq!(numbers.capacity(), 3);
//! ```

mod construct;
mod dynamic_array;
mod error;
mod into_iter;
#[cfg(test)]
#[allow(
    clippy::arithmetic_side_effects,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod probe;
mod raw_buffer;

pub use dynamic_array::DynamicArray;
pub use error::*;
pub use into_iter::IntoIter;
pub use raw_buffer::RawBuffer;
