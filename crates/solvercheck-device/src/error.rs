//! Errors raised by the device runtime.

use thiserror::Error;

use crate::AllocId;

/// Errors from allocation, transfers and kernel execution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The allocation does not fit in the remaining device memory.
    #[error("Out of device memory: requested {requested} bytes, {available} available")]
    OutOfMemory {
        /// Bytes requested
        requested: usize,
        /// Bytes still free on the device
        available: usize,
    },

    /// A kernel or transfer dereferenced a null device pointer.
    #[error("Null device pointer dereferenced by {context}")]
    NullPointer {
        /// Kernel or transfer that faulted
        context: String,
    },

    /// An access referenced an allocation that does not exist (or was freed).
    #[error("Unknown allocation {id:?} accessed by {context}")]
    UnknownAllocation {
        /// Allocation identifier
        id: AllocId,
        /// Kernel or transfer that faulted
        context: String,
    },

    /// An access ran past the end of an allocation.
    #[error("Out-of-bounds access by {context}: bytes {start}..{end} of a {size}-byte allocation")]
    OutOfBounds {
        /// Kernel or transfer that faulted
        context: String,
        /// First byte accessed
        start: usize,
        /// One past the last byte accessed
        end: usize,
        /// Allocation size in bytes
        size: usize,
    },

    /// Host and device transfer sizes disagree.
    #[error("Transfer size mismatch: host holds {host} elements, device holds {device}")]
    TransferMismatch {
        /// Host element count
        host: usize,
        /// Device element count
        device: usize,
    },

    /// A kernel reported a failure of its own.
    #[error("Kernel {kernel} failed: {reason}")]
    KernelFault {
        /// Kernel name
        kernel: &'static str,
        /// Failure description
        reason: String,
    },

    /// A size or offset does not fit in a kernel index.
    #[error("Kernel {kernel} cannot index {value} elements")]
    IndexOverflow {
        /// Kernel being launched
        kernel: &'static str,
        /// Offending size or offset
        value: usize,
    },

    /// The device state was poisoned by a panic in another caller.
    #[error("Device unavailable")]
    Unavailable,
}

/// Result type for device runtime operations.
pub type DeviceResult<T> = Result<T, DeviceError>;
