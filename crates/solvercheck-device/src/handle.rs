//! Library handle: the per-run context every device routine receives.
//!
//! A handle owns the scratch workspace and the memory-size query state, and
//! carries the profiling mode. It is deliberately `!Sync`: one orchestrator run
//! owns it exclusively.

use core::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use bytemuck::Pod;

use crate::device::PROFILE_TARGET;
use crate::launch::Launch;
use crate::{Device, DeviceBuffer, DevicePtr, DeviceResult, Status};

/// Alignment of every workspace sub-allocation requested during a size query.
pub const WORKSPACE_ALIGNMENT: usize = 64;

/// How the handle provides scratch memory to routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceMode {
    /// Grow the workspace whenever a routine asks for more.
    OnDemand,
    /// Only the size set with [`Handle::set_device_memory_size`] is available.
    Fixed,
}

/// Profiling configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileMode {
    /// Nesting depth of routine calls to record; 0 disables profiling.
    pub max_levels: u32,
    /// Also record every kernel launch.
    pub kernels: bool,
}

impl ProfileMode {
    /// Profiling disabled.
    pub const OFF: ProfileMode = ProfileMode {
        max_levels: 0,
        kernels: false,
    };

    /// True when any record is emitted.
    pub fn is_enabled(&self) -> bool {
        self.max_levels > 0
    }
}

/// Per-run device context.
pub struct Handle {
    device: Device,
    mode: WorkspaceMode,
    workspace: RefCell<Option<DeviceBuffer<u8>>>,
    query: Cell<Option<usize>>,
    profile: Cell<ProfileMode>,
    depth: Cell<u32>,
    calls: RefCell<BTreeMap<&'static str, u64>>,
}

impl Handle {
    /// Handle with an on-demand workspace.
    pub fn new(device: &Device) -> Self {
        Self::with_workspace_mode(device, WorkspaceMode::OnDemand)
    }

    /// Handle with the given workspace policy.
    pub fn with_workspace_mode(device: &Device, mode: WorkspaceMode) -> Self {
        Self {
            device: device.clone(),
            mode,
            workspace: RefCell::new(None),
            query: Cell::new(None),
            profile: Cell::new(ProfileMode::OFF),
            depth: Cell::new(0),
            calls: RefCell::new(BTreeMap::new()),
        }
    }

    /// Device this handle submits to.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Workspace policy.
    pub fn workspace_mode(&self) -> WorkspaceMode {
        self.mode
    }

    /// True when routines may grow the workspace themselves.
    pub fn allocates_on_demand(&self) -> bool {
        self.mode == WorkspaceMode::OnDemand
    }

    /// Begin a memory-size query. Routines called while the query is active
    /// report their scratch requirement instead of executing.
    pub fn start_device_memory_size_query(&self) -> Result<(), Status> {
        if self.query.get().is_some() {
            return Err(Status::InternalError);
        }
        self.query.set(Some(0));
        Ok(())
    }

    /// True while a memory-size query is active.
    pub fn is_device_memory_size_query(&self) -> bool {
        self.query.get().is_some()
    }

    /// Report the scratch sizes (in bytes) a routine needs. Each size is padded
    /// to [`WORKSPACE_ALIGNMENT`].
    pub fn set_optimal_device_memory_size(&self, sizes: &[usize]) -> Status {
        let Some(current) = self.query.get() else {
            return Status::InternalError;
        };
        let total: usize = sizes
            .iter()
            .map(|size| size.div_ceil(WORKSPACE_ALIGNMENT) * WORKSPACE_ALIGNMENT)
            .sum();

        if total > current {
            self.query.set(Some(total));
            Status::SizeIncreased
        } else {
            Status::SizeUnchanged
        }
    }

    /// End the query and return the largest size any routine reported.
    pub fn stop_device_memory_size_query(&self) -> Result<usize, Status> {
        self.query.take().ok_or(Status::InternalError)
    }

    /// Allocate exactly `bytes` of workspace, replacing the current one.
    pub fn set_device_memory_size(&self, bytes: usize) -> DeviceResult<()> {
        let buffer = DeviceBuffer::<u8>::new(&self.device, bytes)?;
        log::debug!("workspace set to {bytes} bytes");
        *self.workspace.borrow_mut() = Some(buffer);
        Ok(())
    }

    /// Current workspace size in bytes.
    pub fn device_memory_size(&self) -> usize {
        self.workspace
            .borrow()
            .as_ref()
            .map_or(0, |buffer| buffer.len())
    }

    /// Scratch space for `count` elements of `T`.
    ///
    /// With [`WorkspaceMode::OnDemand`] the workspace grows as needed; with
    /// [`WorkspaceMode::Fixed`] a request larger than the workspace fails with
    /// [`Status::MemoryError`].
    pub fn workspace<T: Pod>(&self, count: usize) -> Result<DevicePtr<T>, Status> {
        if count == 0 {
            return Ok(DevicePtr::null());
        }
        let bytes = count
            .checked_mul(core::mem::size_of::<T>())
            .ok_or(Status::MemoryError)?;

        if bytes > self.device_memory_size() {
            match self.mode {
                WorkspaceMode::Fixed => return Err(Status::MemoryError),
                WorkspaceMode::OnDemand => {
                    self.set_device_memory_size(bytes)
                        .map_err(|_| Status::MemoryError)?;
                }
            }
        }

        let workspace = self.workspace.borrow();
        let buffer = workspace.as_ref().ok_or(Status::MemoryError)?;
        Ok(DevicePtr::new(buffer.id, 0, count))
    }

    /// Set the profiling mode.
    pub fn set_profile(&self, mode: ProfileMode) {
        self.profile.set(mode);
    }

    /// Current profiling mode.
    pub fn profile(&self) -> ProfileMode {
        self.profile.get()
    }

    /// Number of profiled calls per routine name.
    pub fn profile_summary(&self) -> BTreeMap<&'static str, u64> {
        self.calls.borrow().clone()
    }

    /// Clear the profiled call counts.
    pub fn clear_profile(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Record entry into a routine. Nested entries deeper than the profiling
    /// level are not recorded. Call [`Handle::exit`] when the routine returns.
    pub fn enter(&self, routine: &'static str) {
        let depth = self.depth.get() + 1;
        self.depth.set(depth);

        let profile = self.profile.get();
        if profile.is_enabled() && depth <= profile.max_levels {
            *self.calls.borrow_mut().entry(routine).or_insert(0) += 1;
            log::trace!(target: PROFILE_TARGET, "{:indent$}{routine}", "", indent = 2 * (depth as usize - 1));
        }
    }

    /// Record exit from a routine entered with [`Handle::enter`].
    pub fn exit(&self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }

    /// Launch a kernel on the device; see [`Device::launch`].
    pub fn launch<F>(&self, name: &'static str, bind: F) -> Status
    where
        F: FnOnce(&mut Launch<'_>) -> DeviceResult<()>,
    {
        let profile = self.profile.get();
        let record = profile.is_enabled() && profile.kernels;
        match self.device.launch(name, record, bind) {
            Ok(()) => Status::Success,
            Err(_) => Status::InternalError,
        }
    }

    /// Wait for every queued kernel.
    pub fn synchronize(&self) -> DeviceResult<()> {
        self.device.synchronize()
    }
}
