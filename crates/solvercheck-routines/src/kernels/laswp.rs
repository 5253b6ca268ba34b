use cubecl_core as cubecl;
use cubecl_core::prelude::*;
use solvercheck::device::{DevicePtr, DeviceRuntime, Handle, Status};

use super::{dim, elementwise, profiled, KernelElement};

/// Row interchanges, one unit per column.
///
/// Step `s` of the sweep handles row `k1 + r` (0-based) with `r = s`, or
/// `r = count - 1 - s` when `reverse == 1`, and swaps it with the 1-based
/// pivot `ipiv[ipiv_offset + r * ipiv_step]`. A pivot outside `1..=lda` stops
/// the column and is reported through `fault`.
#[cube(launch)]
pub fn laswp_kernel<F: Float>(
    a: &mut Array<F>,
    ipiv: &Array<u32>,
    fault: &mut Array<u32>,
    a_offset: u32,
    ipiv_offset: u32,
    n: u32,
    lda: u32,
    k1: u32,
    count: u32,
    ipiv_step: u32,
    reverse: u32,
    fault_code: u32,
    #[comptime] width: u32,
) {
    let col = ABSOLUTE_POS;
    if col < n {
        let column = a_offset + col * lda;
        for s in 0..count {
            let mut r = s;
            if reverse == 1 {
                r = count - 1 - s;
            }
            let pivot = ipiv[ipiv_offset + r * ipiv_step];
            // Pivot 0 wraps around, so one comparison covers both ends.
            let target = pivot - 1;
            if target >= lda {
                if col == 0 && fault[0] == 0 {
                    fault[0] = fault_code;
                    fault[1] = pivot;
                }
                break;
            }
            let row = k1 + r;
            if target != row {
                for w in 0..width {
                    let p = (column + row) * width + w;
                    let q = (column + target) * width + w;
                    let tmp = a[p];
                    a[p] = a[q];
                    a[q] = tmp;
                }
            }
        }
    }
}

/// Interchange rows `k1..=k2` (1-based) of the `lda x n` matrix `a` with the
/// rows named by the 1-based pivots in `ipiv`, read `|incx|` apart. A negative
/// `incx` applies the interchanges in reverse order; row `i` uses entry
/// `k1 + (i - k1) * |incx|` in both directions.
///
/// `ipiv` must be valid even when `n == 0`. A pivot outside `1..=lda` faults
/// the kernel.
#[allow(clippy::too_many_arguments)]
pub fn laswp<T: KernelElement>(
    handle: Option<&Handle>,
    n: i64,
    a: DevicePtr<T>,
    lda: i64,
    k1: i64,
    k2: i64,
    ipiv: DevicePtr<i32>,
    incx: i64,
) -> Status {
    let Some(handle) = handle else {
        return Status::InvalidHandle;
    };
    if n < 0 || lda < 1 || incx == 0 || k1 < 1 || k2 < 1 || k2 < k1 {
        return Status::InvalidSize;
    }
    let Some(pivots) = pivot_count(k1, k2, incx) else {
        return Status::InvalidSize;
    };
    if handle.is_device_memory_size_query() {
        return handle.set_optimal_device_memory_size(&[]);
    }
    if (n > 0 && a.is_null()) || ipiv.is_null() {
        return Status::InvalidPointer;
    }
    if n == 0 {
        return Status::Success;
    }

    let (n, lda, k1, k2) = (dim(n), dim(lda), dim(k1), dim(k2));
    // A single row never advances through ipiv.
    let step = if k2 > k1 {
        usize::try_from(incx.unsigned_abs()).unwrap_or(usize::MAX)
    } else {
        0
    };
    let width = if T::IS_COMPLEX { 2 } else { 1 };

    profiled(handle, "laswp", || {
        handle.launch("laswp", |launch| {
            let extent = lda.saturating_mul(n);
            let a = launch.array::<T, T::Scalar>(a, extent)?;
            let ipiv = launch.array::<i32, u32>(ipiv, pivots)?;
            let fault = launch.fault_cell("pivot outside 1..=lda:")?;
            // Entry for row k1 sits at index k1 - 1 whatever the direction.
            let first_pivot = launch.index(ipiv.offset() as usize + (k1 - 1))?;
            let units = launch.index(n)?;
            let (count, cube_dim) = elementwise(units);
            laswp_kernel::launch::<T::Scalar, DeviceRuntime>(
                launch.client(),
                count,
                cube_dim,
                a.arg(),
                ipiv.arg(),
                fault.arg(),
                ScalarArg::new(a.offset()),
                ScalarArg::new(first_pivot),
                ScalarArg::new(units),
                ScalarArg::new(launch.index(lda)?),
                ScalarArg::new(launch.index(k1 - 1)?),
                ScalarArg::new(launch.index(k2 - k1 + 1)?),
                ScalarArg::new(launch.index(step)?),
                ScalarArg::new(u32::from(incx < 0)),
                ScalarArg::new(fault.code()),
                width,
            );
            Ok(())
        })
    })
}

/// Pivot entries read for rows `k1..=k2` at `|incx|` spacing, or `None` when
/// the count overflows.
fn pivot_count(k1: i64, k2: i64, incx: i64) -> Option<usize> {
    let k1 = usize::try_from(k1).ok()?;
    let k2 = usize::try_from(k2).ok()?;
    let step = usize::try_from(incx.unsigned_abs()).ok()?;
    k2.checked_sub(k1)?.checked_mul(step)?.checked_add(k1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pivot_count() {
        assert_eq!(pivot_count(2, 4, -2), Some(6));
        assert_eq!(pivot_count(1, 5, 1 << 62), None);
        assert_eq!(pivot_count(2, 3, i64::MIN), None);
        assert_eq!(pivot_count(3, 3, i64::MIN), Some(3));
    }
}
