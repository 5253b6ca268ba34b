//! Host reference implementations.
//!
//! Straightforward sequential versions of each routine, working in place on
//! host slices with LAPACK storage conventions: column-major matrices, strided
//! vectors and 1-based pivot indices. Device results are compared against
//! these.

mod blas;
mod lacgv;
mod larfg;
mod laswp;
mod potf2;

pub use blas::*;
pub use lacgv::*;
pub use larfg::*;
pub use laswp::*;
pub use potf2::*;
