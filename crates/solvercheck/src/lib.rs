//! # solvercheck
//!
//! Correctness and performance validation for linear-algebra routines that
//! have a device implementation and a host reference.
//!
//! ## Features
//!
//! - **Storage descriptors**: strided, batched vectors and matrices, with
//!   negative increments and capacity-1 placeholders
//! - **Dual execution**: device routine and host reference on identical seeded
//!   inputs, compared with a configurable norm
//! - **Timing**: warm-up and hot-call loops that reset inputs before every call
//!   and synchronize the device before stopping the clock
//! - **Orchestration**: argument checks, invalid sizes, memory-size queries,
//!   quick returns, correctness and performance, in that order
//! - **Reporting**: bench tables, JSON lines, in-memory collection
//!
//! ## Example
//!
//! ```ignore
//! use solvercheck::{Collector, RunConfig, Validator};
//! use solvercheck::device::{Device, DeviceConfig, Handle};
//!
//! let device = Device::new(DeviceConfig::default())?;
//! let handle = Handle::new(&device);
//! let mut validator = Validator::new(&handle, RunConfig::default(), Collector::new());
//!
//! let record = validator.run(&my_routine)?;
//! assert!(record.passed());
//! ```

mod arguments;
mod config;
mod element;
mod error;
mod executor;
mod init;
mod metric;
mod report;
mod routine;
mod storage;
mod timer;
mod tolerance;
mod validate;

pub use solvercheck_device as device;

pub use arguments::*;
pub use config::*;
pub use element::*;
pub use error::*;
pub use executor::*;
pub use init::*;
pub use metric::*;
pub use report::*;
pub use routine::*;
pub use storage::*;
pub use timer::*;
pub use tolerance::*;
pub use validate::*;
