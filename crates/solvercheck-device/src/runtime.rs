//! The cubecl runtime device memory and kernels live on.
//!
//! The CPU runtime is the default so the harness runs anywhere; the `cuda`
//! feature moves everything onto the first CUDA device.

use cubecl_core::prelude::*;

/// Runtime every kernel is compiled for.
#[cfg(feature = "cuda")]
pub type DeviceRuntime = cubecl_cuda::CudaRuntime;

/// Runtime every kernel is compiled for.
#[cfg(not(feature = "cuda"))]
pub type DeviceRuntime = cubecl_cpu::CpuRuntime;

/// Client of the compute server behind a [`crate::Device`].
pub type DeviceClient = ComputeClient<<DeviceRuntime as Runtime>::Server>;

pub(crate) fn client() -> DeviceClient {
    let device = Default::default();
    DeviceRuntime::client(&device)
}
