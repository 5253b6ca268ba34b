use cubecl_core as cubecl;
use cubecl_core::prelude::*;
use solvercheck::device::{DevicePtr, DeviceRuntime, Handle, Status};

use super::{dim, elementwise, profiled, span, KernelElement};

/// Negate the imaginary part of `n` interleaved complex values `step` apart.
#[cube(launch)]
pub fn lacgv_kernel<F: Float>(x: &mut Array<F>, offset: u32, step: u32, n: u32) {
    if ABSOLUTE_POS < n {
        let at = (offset + ABSOLUTE_POS * step) * 2 + 1;
        x[at] = -x[at];
    }
}

/// Conjugate `n` elements of `x` spaced `|incx|` apart. `incx` may be negative
/// but not zero.
pub fn lacgv<T: KernelElement>(handle: Option<&Handle>, n: i64, x: DevicePtr<T>, incx: i64) -> Status {
    let Some(handle) = handle else {
        return Status::InvalidHandle;
    };
    if n < 0 || incx == 0 {
        return Status::InvalidSize;
    }
    if handle.is_device_memory_size_query() {
        return handle.set_optimal_device_memory_size(&[]);
    }
    if n > 0 && x.is_null() {
        return Status::InvalidPointer;
    }
    if n == 0 {
        return Status::Success;
    }

    let n = dim(n);
    let step = usize::try_from(incx.unsigned_abs()).unwrap_or(usize::MAX);
    profiled(handle, "lacgv", || {
        handle.launch("lacgv", |launch| {
            let x = launch.array::<T, T::Scalar>(x, span(n, step))?;
            if !T::IS_COMPLEX {
                return Ok(());
            }
            let units = launch.index(n)?;
            let (count, cube_dim) = elementwise(units);
            lacgv_kernel::launch::<T::Scalar, DeviceRuntime>(
                launch.client(),
                count,
                cube_dim,
                x.arg(),
                ScalarArg::new(x.offset()),
                ScalarArg::new(launch.index(step)?),
                ScalarArg::new(units),
            );
            Ok(())
        })
    })
}
