//! Status codes returned by device routines.
//!
//! Every device entry point reports its outcome through a [`Status`] rather than
//! a `Result`, because the harness asserts on the exact classification: a routine
//! that returns `InvalidPointer` where `InvalidSize` was documented is a bug under
//! test even though both are "errors".

use core::fmt;

/// Outcome of a device routine call.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The call completed (or was enqueued) successfully.
    Success,
    /// The handle argument was null.
    InvalidHandle,
    /// A required buffer argument was null.
    InvalidPointer,
    /// A dimension, increment or leading dimension is out of range.
    InvalidSize,
    /// A non-size argument (e.g. a fill mode) is out of range.
    InvalidValue,
    /// Scratch memory could not be provided.
    MemoryError,
    /// Memory-size query: the requested scratch size grew.
    SizeIncreased,
    /// Memory-size query: the requested scratch size did not grow.
    SizeUnchanged,
    /// The routine could not enqueue its kernels.
    InternalError,
}

impl Status {
    /// True for [`Status::Success`].
    pub fn is_success(self) -> bool {
        self == Status::Success
    }

    /// Statuses a routine may legitimately return while a memory-size query is
    /// active.
    pub fn is_query_status(self) -> bool {
        matches!(
            self,
            Status::Success | Status::SizeIncreased | Status::SizeUnchanged
        )
    }

    /// Stable name used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::InvalidHandle => "invalid_handle",
            Status::InvalidPointer => "invalid_pointer",
            Status::InvalidSize => "invalid_size",
            Status::InvalidValue => "invalid_value",
            Status::MemoryError => "memory_error",
            Status::SizeIncreased => "size_increased",
            Status::SizeUnchanged => "size_unchanged",
            Status::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_statuses() {
        assert!(Status::Success.is_query_status());
        assert!(Status::SizeIncreased.is_query_status());
        assert!(Status::SizeUnchanged.is_query_status());
        assert!(!Status::InvalidSize.is_query_status());
        assert!(!Status::MemoryError.is_query_status());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(format!("{}", Status::InvalidPointer), "invalid_pointer");
        assert_eq!(Status::Success.to_string(), "success");
    }
}
