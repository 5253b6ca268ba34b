//! Dual execution: device routine and host reference on the same inputs.

use solvercheck_device::{Handle, Status};

use crate::init::{DataInitializer, InitMode};
use crate::metric::NormSpec;
use crate::routine::{expect_status, Routine};
use crate::HarnessResult;

/// Run the device routine and the host reference on one freshly generated
/// input and return their discrepancy.
///
/// The order is fixed: generate, mirror, device call, read-back into the
/// result buffers, host call in place, compare. A non-success status from the
/// device on this validly-shaped problem aborts the case.
pub fn compute_error<R: Routine>(
    routine: &R,
    handle: &Handle,
    init: &DataInitializer,
    buffers: &mut R::Buffers,
    norm: NormSpec,
) -> HarnessResult<f64> {
    init.initialize(routine, buffers, InitMode::GENERATE_AND_MIRROR)?;

    let status = routine.call_device(handle, buffers);
    expect_status(routine.name(), "device routine", Status::Success, status)?;
    handle.synchronize()?;
    routine.read_back(buffers)?;

    routine.call_host(buffers)?;

    let error = routine.discrepancy(buffers, norm)?;
    log::debug!("{}: error {error:e}", routine.name());
    Ok(error)
}
