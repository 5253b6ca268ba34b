//! Device routines.
//!
//! Every routine is a library entry point with the same contract:
//!
//! 1. A missing handle returns [`Status::InvalidHandle`]
//! 2. Invalid enumerations return [`Status::InvalidValue`]
//! 3. Invalid dimensions return [`Status::InvalidSize`]
//! 4. During a memory-size query the routine reports its scratch sizes and
//!    returns without checking pointers
//! 5. Null pointers to data the problem needs return [`Status::InvalidPointer`]
//! 6. A logically empty problem returns [`Status::Success`] without reading any
//!    buffer
//! 7. Otherwise scratch memory is taken from the handle's workspace and the
//!    `#[cube]` kernels are launched; the call returns before they run
//!
//! ## Key Operations
//!
//! - **larfg**: reflector generation, a norm kernel and an apply kernel
//! - **lacgv**: elementwise conjugation
//! - **laswp**: row interchanges, one unit per column
//! - **potf2**: unblocked Cholesky, one cube per batch instance, staged
//!   through the workspace
//!
//! Complex elements are bound as interleaved `(re, im)` scalar pairs. Sums run
//! in one unit in the order the host references use, so device and host
//! results differ by rounding only.
//!
//! [`Status::InvalidHandle`]: solvercheck::device::Status::InvalidHandle
//! [`Status::InvalidValue`]: solvercheck::device::Status::InvalidValue
//! [`Status::InvalidSize`]: solvercheck::device::Status::InvalidSize
//! [`Status::InvalidPointer`]: solvercheck::device::Status::InvalidPointer
//! [`Status::Success`]: solvercheck::device::Status::Success

use bytemuck::Pod;
use cubecl_core::prelude::{CubeCount, CubeDim, CubeElement, Float as CubeFloat};
use num_complex::{Complex32, Complex64};
use solvercheck::device::{Handle, Status};
use solvercheck::Element;

mod lacgv;
mod larfg;
mod laswp;
mod potf2;

pub use lacgv::*;
pub use larfg::*;
pub use laswp::*;
pub use potf2::*;

/// Units per cube for elementwise kernels.
const CUBE_SIZE: u32 = 256;

/// Elements the kernels run on: the working real type is the kernel scalar,
/// and a complex element is two of them.
pub trait KernelElement: Element {
    /// Scalar type the kernels are instantiated with.
    type Scalar: CubeFloat + CubeElement + Pod;

    /// A working-precision value as a kernel scalar.
    fn scalar(value: Self::Real) -> Self::Scalar;
}

macro_rules! kernel_element {
    ($($elem:ty => $scalar:ty),* $(,)?) => {
        $(
            impl KernelElement for $elem {
                type Scalar = $scalar;

                fn scalar(value: $scalar) -> $scalar {
                    value
                }
            }
        )*
    };
}

kernel_element!(f32 => f32, f64 => f64, Complex32 => f32, Complex64 => f64);

/// Run `body` as routine `name` for profiling purposes.
pub(crate) fn profiled(handle: &Handle, name: &'static str, body: impl FnOnce() -> Status) -> Status {
    handle.enter(name);
    let status = body();
    handle.exit();
    status
}

/// Dimension that the size checks already proved non-negative.
pub(crate) fn dim(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

/// Elements a strided access of `count` elements `step` apart spans. Saturates,
/// so an impossible span fails the bounds check instead of wrapping.
pub(crate) fn span(count: usize, step: usize) -> usize {
    match count {
        0 => 0,
        _ => (count - 1).saturating_mul(step).saturating_add(1),
    }
}

/// One unit per work item.
pub(crate) fn elementwise(units: u32) -> (CubeCount, CubeDim) {
    (
        CubeCount::Static(units.div_ceil(CUBE_SIZE), 1, 1),
        CubeDim::new(CUBE_SIZE, 1, 1),
    )
}

/// A single unit.
pub(crate) fn single() -> (CubeCount, CubeDim) {
    (CubeCount::Static(1, 1, 1), CubeDim::new(1, 1, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span() {
        assert_eq!(span(0, 3), 0);
        assert_eq!(span(1, 3), 1);
        assert_eq!(span(4, 3), 10);
        assert_eq!(span(usize::MAX, 2), usize::MAX);
    }
}
