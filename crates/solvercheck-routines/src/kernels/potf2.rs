use core::mem::size_of;

use cubecl_core as cubecl;
use cubecl_core::prelude::*;
use solvercheck::device::{DevicePtr, DeviceRuntime, Handle, Status};

use super::{dim, elementwise, profiled, KernelElement};
use crate::Fill;

/// Scratch bytes requested by [`potf2_strided_batched`]: one staged row of
/// `n` elements per batch instance.
pub fn potf2_workspace_size<T: KernelElement>(n: i64, batch_count: i64) -> usize {
    if n > 0 && batch_count > 0 {
        dim(n)
            .saturating_mul(dim(batch_count))
            .saturating_mul(size_of::<T>())
    } else {
        0
    }
}

/// Storage index of lower-view entry `(row, col)`. The upper variant is the
/// lower one applied to the conjugate transpose.
#[cube]
fn at(row: u32, col: u32, lda: u32, #[comptime] upper: bool) -> u32 {
    let mut index = row + col * lda;
    if upper {
        index = col + row * lda;
    }
    index
}

/// Zero `count` info cells.
#[cube(launch)]
pub fn reset_info_kernel(info: &mut Array<u32>, offset: u32, count: u32) {
    if ABSOLUTE_POS < count {
        info[offset + ABSOLUTE_POS] = 0;
    }
}

/// Real unblocked Cholesky, one cube per batch instance. Row `j` of the
/// factor is staged in `work` before column `j` is updated.
#[cube(launch)]
pub fn potf2_real_kernel<F: Float>(
    a: &mut Array<F>,
    work: &mut Array<F>,
    info: &mut Array<u32>,
    a_offset: u32,
    work_offset: u32,
    info_offset: u32,
    n: u32,
    lda: u32,
    stride: u32,
    #[comptime] upper: bool,
) {
    if UNIT_POS == 0 {
        let batch = CUBE_POS;
        let base = a_offset + batch * stride;
        let staged = work_offset + batch * n;
        let cell = info_offset + batch;
        info[cell] = 0;

        for j in 0..n {
            if info[cell] == 0 {
                for k in 0..j {
                    work[staged + k] = a[base + at(j, k, lda, upper)];
                }
                let diag = base + j + j * lda;
                let mut ajj = a[diag];
                for k in 0..j {
                    ajj -= work[staged + k] * work[staged + k];
                }

                if ajj > F::new(0.0) {
                    let root = F::sqrt(ajj);
                    a[diag] = root;
                    let recip = F::new(1.0) / root;
                    let mut i = j + 1;
                    while i < n {
                        let mut sum = a[base + at(i, j, lda, upper)];
                        for k in 0..j {
                            sum -= a[base + at(i, k, lda, upper)] * work[staged + k];
                        }
                        a[base + at(i, j, lda, upper)] = sum * recip;
                        i += 1;
                    }
                } else {
                    // Not positive definite (or NaN): keep the minor, stop here.
                    a[diag] = ajj;
                    info[cell] = j + 1;
                }
            }
        }
    }
}

/// Complex unblocked Cholesky on interleaved `(re, im)` pairs, one cube per
/// batch instance. `flip` is the sign of the imaginary part in the lower view:
/// the upper triangle is read conjugated and written back conjugated.
#[cube(launch)]
pub fn potf2_complex_kernel<F: Float>(
    a: &mut Array<F>,
    work: &mut Array<F>,
    info: &mut Array<u32>,
    a_offset: u32,
    work_offset: u32,
    info_offset: u32,
    n: u32,
    lda: u32,
    stride: u32,
    #[comptime] upper: bool,
) {
    if UNIT_POS == 0 {
        let batch = CUBE_POS;
        let base = a_offset + batch * stride;
        let staged = work_offset + batch * n;
        let cell = info_offset + batch;
        let mut flip = F::new(1.0);
        if upper {
            flip = -flip;
        }
        info[cell] = 0;

        for j in 0..n {
            if info[cell] == 0 {
                // Staged row holds conj(lower view of row j).
                for k in 0..j {
                    let src = (base + at(j, k, lda, upper)) * 2;
                    let dst = (staged + k) * 2;
                    work[dst] = a[src];
                    work[dst + 1] = -(flip * a[src + 1]);
                }
                let diag = (base + j + j * lda) * 2;
                let mut ajj = a[diag];
                for k in 0..j {
                    let wr = work[(staged + k) * 2];
                    let wi = work[(staged + k) * 2 + 1];
                    ajj -= wr * wr + wi * wi;
                }
                a[diag + 1] = F::new(0.0);

                if ajj > F::new(0.0) {
                    let root = F::sqrt(ajj);
                    a[diag] = root;
                    let recip = F::new(1.0) / root;
                    let mut i = j + 1;
                    while i < n {
                        let dst = (base + at(i, j, lda, upper)) * 2;
                        let mut sr = a[dst];
                        let mut si = flip * a[dst + 1];
                        for k in 0..j {
                            let src = (base + at(i, k, lda, upper)) * 2;
                            let pr = a[src];
                            let pi = flip * a[src + 1];
                            let wr = work[(staged + k) * 2];
                            let wi = work[(staged + k) * 2 + 1];
                            sr -= pr * wr - pi * wi;
                            si -= pr * wi + pi * wr;
                        }
                        a[dst] = sr * recip;
                        a[dst + 1] = flip * (si * recip);
                        i += 1;
                    }
                } else {
                    a[diag] = ajj;
                    info[cell] = j + 1;
                }
            }
        }
    }
}

/// Unblocked Cholesky factorization of `batch_count` Hermitian
/// positive-definite matrices stored `stride_a` elements apart.
///
/// `info[b]` receives 0 on success, or the 1-based order of the first leading
/// minor of instance `b` that is not positive definite. With `n == 0` the
/// `info` cells are reset and `a` is not read. With `batch_count == 0` nothing
/// is read and either pointer may be null.
#[allow(clippy::too_many_arguments)]
pub fn potf2_strided_batched<T: KernelElement>(
    handle: Option<&Handle>,
    uplo: Fill,
    n: i64,
    a: DevicePtr<T>,
    lda: i64,
    stride_a: i64,
    info: DevicePtr<i32>,
    batch_count: i64,
) -> Status {
    let Some(handle) = handle else {
        return Status::InvalidHandle;
    };
    if uplo == Fill::Full {
        return Status::InvalidValue;
    }
    if n < 0 || lda < n || stride_a < 0 || batch_count < 0 {
        return Status::InvalidSize;
    }
    if handle.is_device_memory_size_query() {
        return handle.set_optimal_device_memory_size(&[potf2_workspace_size::<T>(n, batch_count)]);
    }
    if batch_count > 0 && ((n > 0 && a.is_null()) || info.is_null()) {
        return Status::InvalidPointer;
    }
    if batch_count == 0 {
        return Status::Success;
    }

    let (n, lda, stride, batch_count) = (dim(n), dim(lda), dim(stride_a), dim(batch_count));
    if n == 0 {
        return profiled(handle, "potf2", || {
            handle.launch("reset_info", |launch| {
                let info = launch.array::<i32, u32>(info, batch_count)?;
                let units = launch.index(batch_count)?;
                let (count, cube_dim) = elementwise(units);
                reset_info_kernel::launch::<DeviceRuntime>(
                    launch.client(),
                    count,
                    cube_dim,
                    info.arg(),
                    ScalarArg::new(info.offset()),
                    ScalarArg::new(units),
                );
                Ok(())
            })
        });
    }

    let work = match handle.workspace::<T>(n.saturating_mul(batch_count)) {
        Ok(ptr) => ptr,
        Err(status) => return status,
    };

    profiled(handle, "potf2", || {
        handle.launch("potf2_factor", |launch| {
            let extent = lda.saturating_mul(n - 1).saturating_add(n);
            let span = stride
                .saturating_mul(batch_count - 1)
                .saturating_add(extent);
            let a = launch.array::<T, T::Scalar>(a, span)?;
            let work = launch.array::<T, T::Scalar>(work, n.saturating_mul(batch_count))?;
            let info = launch.array::<i32, u32>(info, batch_count)?;
            let count = CubeCount::Static(launch.index(batch_count)?, 1, 1);
            let cube_dim = CubeDim::new(1, 1, 1);
            let (a_offset, work_offset, info_offset) = (a.offset(), work.offset(), info.offset());
            let (n, lda, stride) = (launch.index(n)?, launch.index(lda)?, launch.index(stride)?);
            let upper = uplo == Fill::Upper;

            if T::IS_COMPLEX {
                potf2_complex_kernel::launch::<T::Scalar, DeviceRuntime>(
                    launch.client(),
                    count,
                    cube_dim,
                    a.arg(),
                    work.arg(),
                    info.arg(),
                    ScalarArg::new(a_offset),
                    ScalarArg::new(work_offset),
                    ScalarArg::new(info_offset),
                    ScalarArg::new(n),
                    ScalarArg::new(lda),
                    ScalarArg::new(stride),
                    upper,
                );
            } else {
                potf2_real_kernel::launch::<T::Scalar, DeviceRuntime>(
                    launch.client(),
                    count,
                    cube_dim,
                    a.arg(),
                    work.arg(),
                    info.arg(),
                    ScalarArg::new(a_offset),
                    ScalarArg::new(work_offset),
                    ScalarArg::new(info_offset),
                    ScalarArg::new(n),
                    ScalarArg::new(lda),
                    ScalarArg::new(stride),
                    upper,
                );
            }
            Ok(())
        })
    })
}
