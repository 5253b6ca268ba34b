//! # solvercheck device runtime
//!
//! The accelerator the routines under test run on, backed by a cubecl compute
//! client (the CPU runtime by default, CUDA with the `cuda` feature).
//!
//! ## Features
//!
//! - **Device memory**: limit-accounted allocations behind typed [`DevicePtr`]s
//! - **Kernel launches**: [`Launch`] binds pointers as `#[cube]` kernel
//!   arguments and catches null or out-of-bounds pointers
//! - **Sticky faults**: a faulting kernel surfaces on the next sync or read-back
//! - **Counters**: launches and transfer bytes, see [`DeviceStats`]
//! - **Handles**: scratch workspace, memory-size queries and profiling mode
//!
//! ## Example
//!
//! ```
//! use solvercheck_device::{Device, DeviceBuffer, DeviceConfig};
//!
//! let device = Device::new(DeviceConfig::default()).unwrap();
//! let mut x = DeviceBuffer::<f32>::new(&device, 3).unwrap();
//! x.copy_from_host(&[1.0, 2.0, 3.0]).unwrap();
//! assert_eq!(x.to_vec().unwrap(), vec![1.0, 2.0, 3.0]);
//! ```

mod device;
mod error;
mod handle;
mod launch;
mod memory;
mod runtime;
mod status;

pub use device::*;
pub use error::*;
pub use handle::*;
pub use launch::{FaultCell, KernelArray, Launch};
pub use memory::{AllocId, DevicePtr, DeviceStats};
pub use runtime::{DeviceClient, DeviceRuntime};
pub use status::*;
