use std::alloc::{Layout, LayoutError};

use thiserror::Error;

/// Errors that can occur when acquiring storage for a [`RawBuffer`][crate::RawBuffer] or a
/// [`DynamicArray`][crate::DynamicArray].
///
/// Only the `try_*` family of methods returns this type. The infallible methods panic on
/// capacity overflow and report allocator failure via [`std::alloc::handle_alloc_error`].
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum AllocError {
    /// The requested number of items does not fit in a single allocation.
    #[error("capacity of {requested} items exceeds the maximum allocation size")]
    CapacityOverflow {
        /// The capacity, in items, that was requested.
        requested: usize,

        /// Why the memory layout for the requested capacity could not be calculated.
        #[source]
        source: LayoutError,
    },

    /// The global allocator could not provide the requested memory.
    #[error("memory allocation of {} bytes failed", .layout.size())]
    AllocationFailed {
        /// The layout of the allocation that failed.
        layout: Layout,
    },
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(AllocError: Send, Sync, Debug, Clone);

    #[test]
    fn capacity_overflow_exposes_layout_error_as_source() {
        let source = Layout::array::<u64>(usize::MAX).unwrap_err();

        let error = AllocError::CapacityOverflow {
            requested: usize::MAX,
            source,
        };

        assert!(error.source().is_some());
        assert!(error.to_string().contains(&usize::MAX.to_string()));
    }

    #[test]
    fn allocation_failed_reports_size() {
        let error = AllocError::AllocationFailed {
            layout: Layout::new::<[u8; 48]>(),
        };

        assert!(error.source().is_none());
        assert_eq!(error.to_string(), "memory allocation of 48 bytes failed");
    }
}
