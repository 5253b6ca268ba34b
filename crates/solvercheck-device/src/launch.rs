//! Binding device pointers to cubecl kernel arguments.
//!
//! A routine launches its `#[cube]` kernels from inside [`crate::Handle::launch`],
//! which hands it a [`Launch`]. Turning a [`DevicePtr`] into a kernel argument
//! is where a real driver would fault on a bad address, so that is where null,
//! freed and out-of-bounds pointers are caught here too. Faults a kernel finds
//! while running (say an out-of-range pivot) go through a [`FaultCell`], a small
//! device array the kernel writes and the next synchronization decodes.

use core::marker::PhantomData;
use core::mem::size_of;

use bytemuck::Pod;
use cubecl_core::prelude::*;
use cubecl_core::server::Handle as ServerHandle;

use crate::memory::DeviceMemory;
use crate::runtime::{DeviceClient, DeviceRuntime};
use crate::{DeviceError, DevicePtr, DeviceResult};

const FAULT_CELL_WORDS: usize = 2;

/// A device buffer bound as an `Array<S>` kernel argument.
///
/// The whole allocation is bound; [`KernelArray::offset`] is where the pointer
/// starts, in elements of the pointer's type.
pub struct KernelArray<S> {
    handle: ServerHandle,
    len: usize,
    offset: u32,
    _marker: PhantomData<S>,
}

impl<S: CubePrimitive> KernelArray<S> {
    /// Kernel argument for this array.
    pub fn arg(&self) -> ArrayArg<'_, DeviceRuntime> {
        // SAFETY: `len` scalars of `S` fit in the buffer behind `handle`.
        unsafe { ArrayArg::from_raw_parts::<S>(&self.handle, self.len, 1) }
    }

    /// First element the pointer refers to.
    pub fn offset(&self) -> u32 {
        self.offset
    }
}

/// Where a kernel reports a fault: `[code, detail]`, written at most once.
///
/// A kernel that hits the condition it was given `code` for stores `code` and a
/// detail word, unless an earlier fault already claimed the cell.
pub struct FaultCell {
    array: KernelArray<u32>,
    code: u32,
}

impl FaultCell {
    /// Kernel argument for the cell.
    pub fn arg(&self) -> ArrayArg<'_, DeviceRuntime> {
        self.array.arg()
    }

    /// Code the kernel stores when it faults.
    pub fn code(&self) -> u32 {
        self.code
    }
}

/// Faults raised since the last synchronization.
#[derive(Default)]
pub(crate) struct FaultLog {
    cell: Option<ServerHandle>,
    sources: Vec<(&'static str, &'static str)>,
    /// Found while binding arguments; later launches are skipped.
    pub(crate) pending: Option<DeviceError>,
}

impl FaultLog {
    /// Read and clear the fault cell. Call after the client synchronized.
    pub(crate) fn collect(&mut self, client: &DeviceClient) -> DeviceResult<()> {
        if self.sources.is_empty() {
            return Ok(());
        }
        let sources = core::mem::take(&mut self.sources);
        let Some(cell) = self.cell.take() else {
            return Ok(());
        };

        let bytes = client.read_one(cell);
        let words: Vec<u32> = bytes
            .get(..FAULT_CELL_WORDS * size_of::<u32>())
            .map(bytemuck::pod_collect_to_vec::<u8, u32>)
            .unwrap_or_default();
        match *words.as_slice() {
            [code, detail] if code > 0 => {
                let (kernel, what) = sources
                    .get(code as usize - 1)
                    .copied()
                    .unwrap_or(("unknown kernel", "fault"));
                Err(DeviceError::KernelFault {
                    kernel,
                    reason: format!("{what} {}", detail as i32),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Argument binding for one kernel launch.
pub struct Launch<'a> {
    client: &'a DeviceClient,
    memory: &'a DeviceMemory,
    faults: &'a mut FaultLog,
    kernel: &'static str,
}

impl<'a> Launch<'a> {
    pub(crate) fn new(
        client: &'a DeviceClient,
        memory: &'a DeviceMemory,
        faults: &'a mut FaultLog,
        kernel: &'static str,
    ) -> Self {
        Self {
            client,
            memory,
            faults,
            kernel,
        }
    }

    /// Compute client to launch on.
    pub fn client(&self) -> &DeviceClient {
        self.client
    }

    /// Name of the kernel being launched.
    pub fn kernel(&self) -> &'static str {
        self.kernel
    }

    /// Bind the first `count` elements of `ptr` as an array of scalars `S`.
    ///
    /// Complex elements bind as two interleaved scalars each.
    pub fn array<T: Pod, S: CubePrimitive + Pod>(
        &self,
        ptr: DevicePtr<T>,
        count: usize,
    ) -> DeviceResult<KernelArray<S>> {
        let context = self.kernel;
        let id = ptr.alloc.ok_or_else(|| DeviceError::NullPointer {
            context: context.to_string(),
        })?;
        let alloc = self
            .memory
            .get(id)
            .ok_or_else(|| DeviceError::UnknownAllocation {
                id,
                context: context.to_string(),
            })?;

        let start = ptr.byte_offset;
        let end = count
            .checked_mul(size_of::<T>())
            .and_then(|bytes| bytes.checked_add(start));
        match end {
            Some(end) if count <= ptr.len && end <= alloc.bytes => {}
            _ => {
                return Err(DeviceError::OutOfBounds {
                    context: context.to_string(),
                    start,
                    end: end.unwrap_or(usize::MAX),
                    size: alloc.bytes,
                })
            }
        }

        Ok(KernelArray {
            handle: alloc.handle.clone(),
            len: alloc.bytes / size_of::<S>(),
            offset: self.index(start / size_of::<T>())?,
            _marker: PhantomData,
        })
    }

    /// A one-element scratch array, for an argument the kernel never reads.
    pub fn unbound<S: CubePrimitive + Pod>(&self) -> KernelArray<S> {
        KernelArray {
            handle: self.client.create_from_slice(bytemuck::bytes_of(&S::zeroed())),
            len: 1,
            offset: 0,
            _marker: PhantomData,
        }
    }

    /// The device fault cell, with a code identifying `what` went wrong in
    /// this kernel.
    pub fn fault_cell(&mut self, what: &'static str) -> DeviceResult<FaultCell> {
        let handle = match &self.faults.cell {
            Some(handle) => handle.clone(),
            None => {
                let handle = self
                    .client
                    .create_from_slice(bytemuck::cast_slice(&[0u32; FAULT_CELL_WORDS]));
                self.faults.cell = Some(handle.clone());
                handle
            }
        };
        self.faults.sources.push((self.kernel, what));
        let code = self.index(self.faults.sources.len())?;

        Ok(FaultCell {
            array: KernelArray {
                handle,
                len: FAULT_CELL_WORDS,
                offset: 0,
                _marker: PhantomData,
            },
            code,
        })
    }

    /// A host size or offset as a kernel index.
    pub fn index(&self, value: usize) -> DeviceResult<u32> {
        u32::try_from(value).map_err(|_| DeviceError::IndexOverflow {
            kernel: self.kernel,
            value,
        })
    }
}
