//! The device: a cubecl compute client plus the allocation and fault
//! bookkeeping the routines rely on.
//!
//! ```text
//! host                              compute client
//! ────                              ──────────────
//! DeviceBuffer::new     ──────────► create_from_slice(zeros)
//! copy_from_host        ──────────► create_from_slice(data), replaces the buffer
//! Handle::launch        ──────────► Launch binds arguments, kernel::launch (async)
//! synchronize           ──────────► sync, then decode the fault cell
//! copy_to_host          ──────────► sync, read_one
//! ```
//!
//! Launches are asynchronous: a caller that wants to time a kernel has to
//! synchronize before stopping the clock. Faults stay pending until the next
//! synchronization or read-back, and a pending fault skips every later launch.

use core::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use bytemuck::Pod;
use cubecl_core::future;

use crate::launch::{FaultLog, Launch};
use crate::memory::{DeviceMemory, DeviceStats};
use crate::runtime::{self, DeviceClient};
use crate::{AllocId, DeviceError, DevicePtr, DeviceResult};

/// Log target for profiling records.
pub const PROFILE_TARGET: &str = "solvercheck::profile";

/// Device configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Name reported in logs.
    pub name: String,
    /// Device memory available to the harness, in bytes.
    pub memory_limit: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: "device:0".to_string(),
            memory_limit: 512 << 20,
        }
    }
}

impl DeviceConfig {
    /// Set the device memory limit.
    #[must_use]
    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = bytes;
        self
    }
}

struct DeviceState {
    memory: DeviceMemory,
    faults: FaultLog,
}

struct DeviceShared {
    name: String,
    client: DeviceClient,
    state: Mutex<DeviceState>,
}

/// Handle to a device. Cloning shares the same client, memory and faults.
#[derive(Clone)]
pub struct Device {
    shared: Arc<DeviceShared>,
}

impl Device {
    /// Connect to the runtime's default device.
    pub fn new(config: DeviceConfig) -> DeviceResult<Self> {
        let client = runtime::client();
        log::debug!(
            "opened device {} with {} bytes of memory",
            config.name,
            config.memory_limit
        );

        Ok(Self {
            shared: Arc::new(DeviceShared {
                name: config.name,
                client,
                state: Mutex::new(DeviceState {
                    memory: DeviceMemory::new(config.memory_limit),
                    faults: FaultLog::default(),
                }),
            }),
        })
    }

    /// Device name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// The underlying compute client.
    pub fn client(&self) -> &DeviceClient {
        &self.shared.client
    }

    fn state(&self) -> DeviceResult<MutexGuard<'_, DeviceState>> {
        self.shared.state.lock().map_err(|_| DeviceError::Unavailable)
    }

    /// Launch a kernel. `bind` resolves the kernel's arguments through the
    /// [`Launch`] and calls the cubecl `launch` function; an argument that
    /// cannot be bound becomes the pending fault and nothing is launched.
    ///
    /// With `profile` the launch is synchronized and its time logged under
    /// [`PROFILE_TARGET`].
    pub fn launch<F>(&self, name: &'static str, profile: bool, bind: F) -> DeviceResult<()>
    where
        F: FnOnce(&mut Launch<'_>) -> DeviceResult<()>,
    {
        let mut guard = self.state()?;
        let state = &mut *guard;
        if state.faults.pending.is_some() {
            log::debug!("skipping kernel {name}: device has a pending fault");
            return Ok(());
        }

        state.memory.stats.kernel_launches += 1;
        let start = Instant::now();
        let result = {
            let mut launch = Launch::new(&self.shared.client, &state.memory, &mut state.faults, name);
            bind(&mut launch)
        };
        if profile {
            future::block_on(self.shared.client.sync());
            log::trace!(
                target: PROFILE_TARGET,
                "kernel {name}: {:.3} us",
                start.elapsed().as_secs_f64() * 1e6
            );
        }
        if let Err(fault) = result {
            log::debug!("kernel {name} faulted: {fault}");
            state.faults.pending = Some(fault);
        }
        Ok(())
    }

    /// Block until every launched kernel finished. Returns (and clears) the
    /// first fault raised since the previous synchronization.
    pub fn synchronize(&self) -> DeviceResult<()> {
        let mut state = self.state()?;
        self.settle(&mut state)
    }

    fn settle(&self, state: &mut DeviceState) -> DeviceResult<()> {
        future::block_on(self.shared.client.sync());
        let pending = state.faults.pending.take();
        let raised = state.faults.collect(&self.shared.client);
        match pending {
            Some(fault) => Err(fault),
            None => raised,
        }
    }

    /// Snapshot of the device counters.
    pub fn stats(&self) -> DeviceResult<DeviceStats> {
        Ok(self.state()?.memory.stats)
    }

    pub(crate) fn allocate(&self, bytes: usize) -> DeviceResult<AllocId> {
        self.state()?.memory.allocate(&self.shared.client, bytes)
    }

    pub(crate) fn free(&self, id: AllocId) {
        if let Ok(mut state) = self.state() {
            state.memory.free(id);
        }
    }

    fn write(&self, id: AllocId, data: &[u8]) -> DeviceResult<()> {
        let mut state = self.state()?;
        if let Some(fault) = state.faults.pending.take() {
            return Err(fault);
        }
        state.memory.upload(&self.shared.client, id, data)
    }

    fn read(&self, id: AllocId) -> DeviceResult<Vec<u8>> {
        let mut state = self.state()?;
        self.settle(&mut state)?;
        state.memory.download(&self.shared.client, id)
    }
}

/// Owned device allocation holding `len` elements of `T`.
pub struct DeviceBuffer<T: Pod> {
    device: Device,
    pub(crate) id: AllocId,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: Pod> DeviceBuffer<T> {
    /// Allocate `len` zeroed elements.
    pub fn new(device: &Device, len: usize) -> DeviceResult<Self> {
        let bytes = len
            .checked_mul(core::mem::size_of::<T>())
            .ok_or(DeviceError::OutOfMemory {
                requested: usize::MAX,
                available: 0,
            })?;
        let id = device.allocate(bytes)?;
        Ok(Self {
            device: device.clone(),
            id,
            len,
            _marker: PhantomData,
        })
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-element allocation.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Device the buffer lives on.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Pointer to the whole allocation.
    pub fn ptr(&self) -> DevicePtr<T> {
        DevicePtr::new(self.id, 0, self.len)
    }

    /// Copy `src` into the buffer. Kernels launched earlier keep the contents
    /// they were launched with.
    pub fn copy_from_host(&mut self, src: &[T]) -> DeviceResult<()> {
        if src.len() != self.len {
            return Err(DeviceError::TransferMismatch {
                host: src.len(),
                device: self.len,
            });
        }
        self.device.write(self.id, bytemuck::cast_slice(src))
    }

    /// Copy the buffer into `dst`. Blocks until every launched kernel ran.
    pub fn copy_to_host(&self, dst: &mut [T]) -> DeviceResult<()> {
        if dst.len() != self.len {
            return Err(DeviceError::TransferMismatch {
                host: dst.len(),
                device: self.len,
            });
        }
        let bytes = self.device.read(self.id)?;
        dst.copy_from_slice(&bytemuck::pod_collect_to_vec::<u8, T>(&bytes));
        Ok(())
    }

    /// Copy the buffer into a new vector.
    pub fn to_vec(&self) -> DeviceResult<Vec<T>> {
        let mut out = vec![T::zeroed(); self.len];
        self.copy_to_host(&mut out)?;
        Ok(out)
    }
}

impl<T: Pod> Drop for DeviceBuffer<T> {
    fn drop(&mut self) {
        self.device.free(self.id);
    }
}
