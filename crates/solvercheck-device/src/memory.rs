//! Device allocations and typed device pointers.
//!
//! Every allocation is a cubecl buffer. The host never maps it: uploads replace
//! the buffer contents and read-backs go through the compute client, while
//! kernels bind it through [`crate::Launch`]. The arena only does the
//! bookkeeping the runtime does not, namely the memory limit and the transfer
//! counters that let a test prove a quick-return path left every buffer alone.

use core::fmt;
use core::marker::PhantomData;
use std::collections::HashMap;

use cubecl_core::server::Handle as ServerHandle;

use crate::runtime::DeviceClient;
use crate::{DeviceError, DeviceResult};

/// Identifier of one device allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllocId(pub(crate) u64);

/// Typed view of a device allocation: `len` elements of `T` starting at a byte
/// offset.
///
/// A pointer is either null or refers to an allocation. Creating a pointer never
/// touches memory; only kernels and transfers dereference it.
pub struct DevicePtr<T> {
    pub(crate) alloc: Option<AllocId>,
    pub(crate) byte_offset: usize,
    pub(crate) len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> DevicePtr<T> {
    pub(crate) fn new(alloc: AllocId, byte_offset: usize, len: usize) -> Self {
        Self {
            alloc: Some(alloc),
            byte_offset,
            len,
            _marker: PhantomData,
        }
    }

    /// The null pointer.
    pub fn null() -> Self {
        Self {
            alloc: None,
            byte_offset: 0,
            len: 0,
            _marker: PhantomData,
        }
    }

    /// True for the null pointer.
    pub fn is_null(&self) -> bool {
        self.alloc.is_none()
    }

    /// Number of elements reachable through this pointer.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no element is reachable.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pointer advanced by `count` elements. Advancing past the end yields an
    /// empty (but non-null) pointer, which faults on any access.
    pub fn add(self, count: usize) -> Self {
        if self.is_null() {
            return self;
        }
        let count = count.min(self.len);
        Self {
            alloc: self.alloc,
            byte_offset: self.byte_offset + count * core::mem::size_of::<T>(),
            len: self.len - count,
            _marker: PhantomData,
        }
    }

    /// Pointer restricted to its first `len` elements.
    pub fn take(self, len: usize) -> Self {
        Self {
            len: self.len.min(len),
            ..self
        }
    }
}

impl<T> Clone for DevicePtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for DevicePtr<T> {}

impl<T> PartialEq for DevicePtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.alloc == other.alloc && self.byte_offset == other.byte_offset && self.len == other.len
    }
}

impl<T> Eq for DevicePtr<T> {}

impl<T> fmt::Debug for DevicePtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.alloc {
            None => write!(f, "DevicePtr(null)"),
            Some(id) => write!(f, "DevicePtr({:?}+{}, len={})", id, self.byte_offset, self.len),
        }
    }
}

/// Counters exposed by [`crate::Device::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Kernels launched since the device was created.
    pub kernel_launches: u64,
    /// Bytes copied host to device.
    pub bytes_to_device: u64,
    /// Bytes copied device to host.
    pub bytes_to_host: u64,
    /// Live allocations.
    pub live_allocations: usize,
    /// Bytes currently allocated.
    pub memory_in_use: usize,
}

pub(crate) struct Allocation {
    pub(crate) handle: ServerHandle,
    pub(crate) bytes: usize,
}

pub(crate) struct DeviceMemory {
    allocations: HashMap<AllocId, Allocation>,
    next_id: u64,
    limit: usize,
    pub(crate) stats: DeviceStats,
}

impl DeviceMemory {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            allocations: HashMap::new(),
            next_id: 1,
            limit,
            stats: DeviceStats::default(),
        }
    }

    /// Reserve `bytes` against the limit and create a zeroed buffer.
    pub(crate) fn allocate(&mut self, client: &DeviceClient, bytes: usize) -> DeviceResult<AllocId> {
        let available = self.limit.saturating_sub(self.stats.memory_in_use);
        if bytes > available {
            return Err(DeviceError::OutOfMemory {
                requested: bytes,
                available,
            });
        }

        let id = AllocId(self.next_id);
        self.next_id += 1;
        let handle = client.create_from_slice(&vec![0u8; physical_size(bytes)]);
        self.allocations.insert(id, Allocation { handle, bytes });
        self.stats.memory_in_use += bytes;
        self.stats.live_allocations += 1;
        Ok(id)
    }

    pub(crate) fn free(&mut self, id: AllocId) {
        if let Some(alloc) = self.allocations.remove(&id) {
            self.stats.memory_in_use -= alloc.bytes;
            self.stats.live_allocations -= 1;
        }
    }

    pub(crate) fn get(&self, id: AllocId) -> Option<&Allocation> {
        self.allocations.get(&id)
    }

    fn lookup(&self, id: AllocId, context: &str) -> DeviceResult<&Allocation> {
        self.get(id).ok_or_else(|| DeviceError::UnknownAllocation {
            id,
            context: context.to_string(),
        })
    }

    /// Replace the whole contents of an allocation.
    pub(crate) fn upload(&mut self, client: &DeviceClient, id: AllocId, data: &[u8]) -> DeviceResult<()> {
        let context = "host-to-device copy";
        let size = self.lookup(id, context)?.bytes;
        if data.len() != size {
            return Err(DeviceError::OutOfBounds {
                context: context.to_string(),
                start: 0,
                end: data.len(),
                size,
            });
        }

        let mut padded = data.to_vec();
        padded.resize(physical_size(size), 0);
        let handle = client.create_from_slice(&padded);
        if let Some(alloc) = self.allocations.get_mut(&id) {
            alloc.handle = handle;
        }
        self.stats.bytes_to_device += size as u64;
        Ok(())
    }

    /// Read the whole contents of an allocation. Waits for every kernel that
    /// writes to it.
    pub(crate) fn download(&mut self, client: &DeviceClient, id: AllocId) -> DeviceResult<Vec<u8>> {
        let alloc = self.lookup(id, "device-to-host copy")?;
        let size = alloc.bytes;
        let bytes = client.read_one(alloc.handle.clone());
        let data = bytes.get(..size).map(<[u8]>::to_vec).ok_or_else(|| DeviceError::OutOfBounds {
            context: "device-to-host copy".to_string(),
            start: 0,
            end: size,
            size: bytes.len(),
        })?;
        self.stats.bytes_to_host += size as u64;
        Ok(data)
    }
}

/// Bytes actually requested from the runtime: never zero, and a whole number of
/// 8-byte words so every element type can bind the buffer.
fn physical_size(bytes: usize) -> usize {
    bytes.max(1).div_ceil(8) * 8
}
