//! # solvercheck-routines
//!
//! LAPACK auxiliary routines validated with [`solvercheck`].
//!
//! Each routine comes in three parts:
//!
//! - **Host reference** ([`reference`]): plain sequential implementation on
//!   host slices, following the LAPACK algorithm
//! - **Device routine** ([`kernels`]): the library entry point, which checks
//!   its arguments, answers memory-size queries and launches `#[cube]`
//!   kernels on the device
//! - **Case driver** ([`cases`]): a [`solvercheck::Routine`] tying the two
//!   together with buffer allocation and input generation
//!
//! ## Routines
//!
//! | name                     | precisions | operation                              |
//! |--------------------------|------------|----------------------------------------|
//! | `larfg`                  | s d c z    | generate an elementary reflector       |
//! | `lacgv`                  | c z        | conjugate a vector                     |
//! | `laswp`                  | s d c z    | row interchanges                       |
//! | `potf2_strided_batched`  | s d c z    | unblocked Cholesky, strided batch      |
//!
//! ## Example
//!
//! ```ignore
//! use solvercheck::{Arguments, BenchTable, RunConfig, Validator};
//! use solvercheck::device::{Device, DeviceConfig, Handle};
//! use solvercheck_routines::run_case;
//!
//! let device = Device::new(DeviceConfig::default())?;
//! let handle = Handle::new(&device);
//! let mut validator = Validator::new(&handle, RunConfig::bench(), BenchTable::new(std::io::stdout()));
//!
//! let mut args: Arguments = "n=64 incx=2".parse()?;
//! run_case(&mut validator, "larfg", 'd', &mut args)?;
//! ```

mod fill;
mod registry;

/// Host reference implementations
pub mod reference;

/// Device routines and their kernels
pub mod kernels;

/// Test case drivers
pub mod cases;

pub use fill::*;
pub use registry::*;
