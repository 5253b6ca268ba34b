//! Case drivers: one [`solvercheck::Routine`] per routine.
//!
//! A driver is generic over the element type and holds the parsed dimensions
//! of one case. Buffers it allocates with `with_results` set carry a separate
//! host copy of every output that is compared, so that the host reference can
//! run in place on the inputs.

use bytemuck::Pod;
use solvercheck::{BufferPair, HarnessError, HarnessResult, HostBuffer, StorageDescriptor};

mod lacgv;
mod larfg;
mod laswp;
mod potf2;

pub use lacgv::*;
pub use larfg::*;
pub use laswp::*;
pub use potf2::*;

/// Result buffer for `pair`, when results are compared.
pub(crate) fn result_buffer<T: Pod>(
    pair: &BufferPair<T>,
    with_results: bool,
) -> HarnessResult<Option<HostBuffer<T>>> {
    with_results.then(|| pair.result_buffer()).transpose()
}

/// Copy the device side of `pair` into `result`, if it exists.
pub(crate) fn read_back_into<T: Pod>(
    pair: &BufferPair<T>,
    result: &mut Option<HostBuffer<T>>,
) -> HarnessResult<()> {
    match result {
        Some(result) => pair.read_back_into(result),
        None => Ok(()),
    }
}

/// The result buffer a comparison needs.
pub(crate) fn compared<'a, T>(
    result: &'a Option<HostBuffer<T>>,
    name: &str,
) -> HarnessResult<&'a HostBuffer<T>> {
    result.as_ref().ok_or_else(|| HarnessError::ShapeMismatch {
        reason: format!("result buffer for {name} was not allocated"),
    })
}

/// Layout of a scalar argument, or a placeholder when the problem is empty.
pub(crate) fn scalar(present: bool) -> StorageDescriptor {
    if present {
        StorageDescriptor::vector(1, 1)
    } else {
        StorageDescriptor::placeholder()
    }
}

/// Non-negative dimension as `usize`.
pub(crate) fn to_usize(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}
