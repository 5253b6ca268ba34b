use core::mem::size_of;

use cubecl_core as cubecl;
use cubecl_core::prelude::*;
use solvercheck::device::{DevicePtr, DeviceRuntime, Handle, Status};

use super::{dim, profiled, single, span, KernelElement};
use crate::reference::safmin;

/// Rescaling passes allowed when `beta` is tiny.
const MAX_RESCALES: f32 = 20.0;

/// Scratch bytes requested by [`larfg`]: one working-precision norm.
pub fn larfg_workspace_size<T: KernelElement>(n: i64) -> usize {
    if n > 0 {
        size_of::<T::Real>()
    } else {
        0
    }
}

/// `sqrt(x^2 + y^2 + z^2)` without unnecessary overflow.
#[cube]
fn lapy3<F: Float>(x: F, y: F, z: F) -> F {
    let xa = F::abs(x);
    let ya = F::abs(y);
    let za = F::abs(z);
    let mut w = xa;
    if ya > w {
        w = ya;
    }
    if za > w {
        w = za;
    }
    let mut result = xa + ya + za;
    if w > F::new(0.0) {
        let xw = xa / w;
        let yw = ya / w;
        let zw = za / w;
        result = w * F::sqrt(xw * xw + yw * yw + zw * zw);
    }
    result
}

/// `-|magnitude|` if `sign >= 0`, else `|magnitude|`.
#[cube]
fn neg_sign<F: Float>(magnitude: F, sign: F) -> F {
    let mut result = F::abs(magnitude);
    if sign >= F::new(0.0) {
        result = -result;
    }
    result
}

/// Two-norm of `m` elements of `x` spaced `incx` apart, into `norm[norm_offset]`.
#[cube(launch)]
pub fn larfg_norm_kernel<F: Float>(
    x: &Array<F>,
    norm: &mut Array<F>,
    x_offset: u32,
    incx: u32,
    m: u32,
    norm_offset: u32,
    #[comptime] complex: bool,
) {
    if ABSOLUTE_POS == 0 {
        let mut sum = F::new(0.0);
        for i in 0..m {
            if complex {
                let at = (x_offset + i * incx) * 2;
                sum += x[at] * x[at] + x[at + 1] * x[at + 1];
            } else {
                let at = x_offset + i * incx;
                sum += x[at] * x[at];
            }
        }
        norm[norm_offset] = F::sqrt(sum);
    }
}

/// Form `beta` and `tau` from `alpha` and the norm, and scale `x` by
/// `1 / (alpha - beta)`, rescaling by `1 / safmin` while `beta` is tiny.
#[cube(launch)]
pub fn larfg_apply_kernel<F: Float>(
    alpha: &mut Array<F>,
    x: &mut Array<F>,
    tau: &mut Array<F>,
    norm: &Array<F>,
    alpha_offset: u32,
    x_offset: u32,
    incx: u32,
    m: u32,
    tau_offset: u32,
    norm_offset: u32,
    safmin: F,
    #[comptime] complex: bool,
) {
    if ABSOLUTE_POS == 0 {
        let zero = F::new(0.0);
        let one = F::new(1.0);
        let xnorm = norm[norm_offset];
        let mut alphr = zero;
        let mut alphi = zero;
        if complex {
            alphr = alpha[alpha_offset * 2];
            alphi = alpha[alpha_offset * 2 + 1];
        } else {
            alphr = alpha[alpha_offset];
        }

        if xnorm == zero && alphi == zero {
            if complex {
                tau[tau_offset * 2] = zero;
                tau[tau_offset * 2 + 1] = zero;
            } else {
                tau[tau_offset] = zero;
            }
        } else {
            let mut beta = neg_sign::<F>(lapy3::<F>(alphr, alphi, xnorm), alphr);
            let mut scale = one;
            let mut rescales = zero;
            if F::abs(beta) < safmin {
                let rsafmn = one / safmin;
                while rescales < F::new(MAX_RESCALES) {
                    rescales += one;
                    scale *= rsafmn;
                    beta *= rsafmn;
                    alphr *= rsafmn;
                    alphi *= rsafmn;
                    if F::abs(beta) >= safmin {
                        break;
                    }
                }
                beta = neg_sign::<F>(lapy3::<F>(alphr, alphi, xnorm * scale), alphr);
            }

            // x *= scale / (alpha - beta)
            let dr = alphr - beta;
            let mut fr = scale / dr;
            let mut fi = zero;
            if complex {
                let denom = dr * dr + alphi * alphi;
                fr = scale * dr / denom;
                fi = -(scale * alphi / denom);
            }
            for i in 0..m {
                if complex {
                    let at = (x_offset + i * incx) * 2;
                    let vr = x[at];
                    let vi = x[at + 1];
                    x[at] = vr * fr - vi * fi;
                    x[at + 1] = vr * fi + vi * fr;
                } else {
                    let at = x_offset + i * incx;
                    x[at] = x[at] * fr;
                }
            }

            if complex {
                tau[tau_offset * 2] = (beta - alphr) / beta;
                tau[tau_offset * 2 + 1] = -(alphi / beta);
            } else {
                tau[tau_offset] = (beta - alphr) / beta;
            }

            while rescales > zero {
                beta *= safmin;
                rescales -= one;
            }
            if complex {
                alpha[alpha_offset * 2] = beta;
                alpha[alpha_offset * 2 + 1] = zero;
            } else {
                alpha[alpha_offset] = beta;
            }
        }
    }
}

/// Generate an elementary reflector `H` such that `H^H * (alpha, x) = (beta, 0)`.
///
/// `x` holds `n - 1` elements spaced `incx` apart and may be null when
/// `n <= 1`. On completion `alpha` holds `beta`, `x` the reflector tail and
/// `tau` the scalar factor.
///
/// The norm of `x` is reduced into the workspace by a first kernel; a second
/// kernel forms `beta` and `tau` and scales `x`.
pub fn larfg<T: KernelElement>(
    handle: Option<&Handle>,
    n: i64,
    alpha: DevicePtr<T>,
    x: DevicePtr<T>,
    incx: i64,
    tau: DevicePtr<T>,
) -> Status {
    let Some(handle) = handle else {
        return Status::InvalidHandle;
    };
    if n < 0 || incx < 1 {
        return Status::InvalidSize;
    }
    if handle.is_device_memory_size_query() {
        return handle.set_optimal_device_memory_size(&[larfg_workspace_size::<T>(n)]);
    }
    if (n > 1 && x.is_null()) || (n > 0 && (alpha.is_null() || tau.is_null())) {
        return Status::InvalidPointer;
    }
    if n == 0 {
        return Status::Success;
    }

    let norm = match handle.workspace::<T::Real>(1) {
        Ok(ptr) => ptr,
        Err(status) => return status,
    };
    let (m, incx) = (dim(n) - 1, dim(incx));

    profiled(handle, "larfg", || {
        let status = handle.launch("larfg_norm", |launch| {
            // With no tail there is nothing to bind; the kernel reads no element.
            let x = match m {
                0 => launch.unbound::<T::Scalar>(),
                _ => launch.array::<T, T::Scalar>(x, span(m, incx))?,
            };
            let norm = launch.array::<T::Real, T::Scalar>(norm, 1)?;
            let (count, cube_dim) = single();
            larfg_norm_kernel::launch::<T::Scalar, DeviceRuntime>(
                launch.client(),
                count,
                cube_dim,
                x.arg(),
                norm.arg(),
                ScalarArg::new(x.offset()),
                ScalarArg::new(launch.index(incx)?),
                ScalarArg::new(launch.index(m)?),
                ScalarArg::new(norm.offset()),
                T::IS_COMPLEX,
            );
            Ok(())
        });
        if !status.is_success() {
            return status;
        }

        handle.launch("larfg_apply", |launch| {
            let alpha = launch.array::<T, T::Scalar>(alpha, 1)?;
            let x = match m {
                0 => launch.unbound::<T::Scalar>(),
                _ => launch.array::<T, T::Scalar>(x, span(m, incx))?,
            };
            let tau = launch.array::<T, T::Scalar>(tau, 1)?;
            let norm = launch.array::<T::Real, T::Scalar>(norm, 1)?;
            let (count, cube_dim) = single();
            larfg_apply_kernel::launch::<T::Scalar, DeviceRuntime>(
                launch.client(),
                count,
                cube_dim,
                alpha.arg(),
                x.arg(),
                tau.arg(),
                norm.arg(),
                ScalarArg::new(alpha.offset()),
                ScalarArg::new(x.offset()),
                ScalarArg::new(launch.index(incx)?),
                ScalarArg::new(launch.index(m)?),
                ScalarArg::new(tau.offset()),
                ScalarArg::new(norm.offset()),
                ScalarArg::new(T::scalar(safmin::<T::Real>())),
                T::IS_COMPLEX,
            );
            Ok(())
        })
    })
}
