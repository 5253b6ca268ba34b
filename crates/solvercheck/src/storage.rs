//! Strided, optionally batched buffers on host and device.
//!
//! A [`StorageDescriptor`] is pure layout: it knows how many physical elements
//! a logical vector or matrix needs and where the i-th logical element of the
//! j-th batch instance lives. [`HostBuffer`] and [`DeviceStorage`] attach memory
//! to a descriptor, and [`BufferPair`] keeps one of each with the same layout.

use core::ops::{Index, IndexMut};

use bytemuck::Pod;
use solvercheck_device::{Device, DeviceBuffer, DevicePtr};

use crate::{HarnessError, HarnessResult};

/// Logical shape of one batch instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `n` elements spaced `inc` apart. A negative increment walks the storage
    /// backwards, BLAS style: logical element 0 sits at the highest address.
    Vector {
        /// Logical length
        n: usize,
        /// Distance between consecutive logical elements
        inc: isize,
    },
    /// Column-major `rows x cols` matrix with leading dimension `ld`.
    Matrix {
        /// Number of rows
        rows: usize,
        /// Number of columns
        cols: usize,
        /// Leading dimension (distance between columns)
        ld: usize,
    },
}

/// Layout of a strided, batched buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageDescriptor {
    /// Shape of each instance
    pub shape: Shape,
    /// Distance between consecutive instances
    pub stride: usize,
    /// Number of instances
    pub batch_count: usize,
    placeholder: bool,
}

impl StorageDescriptor {
    /// A single strided vector.
    pub fn vector(n: usize, inc: isize) -> Self {
        Self {
            shape: Shape::Vector { n, inc },
            stride: 0,
            batch_count: 1,
            placeholder: false,
        }
    }

    /// A single column-major matrix.
    pub fn matrix(rows: usize, cols: usize, ld: usize) -> Self {
        Self {
            shape: Shape::Matrix { rows, cols, ld },
            stride: 0,
            batch_count: 1,
            placeholder: false,
        }
    }

    /// Repeat this layout `batch_count` times, `stride` elements apart.
    #[must_use]
    pub fn strided_batch(mut self, stride: usize, batch_count: usize) -> Self {
        self.stride = stride;
        self.batch_count = batch_count;
        self
    }

    /// A one-element buffer standing in for a logically unused argument.
    pub fn placeholder() -> Self {
        Self {
            shape: Shape::Vector { n: 1, inc: 1 },
            stride: 1,
            batch_count: 1,
            placeholder: true,
        }
    }

    /// This layout, or a placeholder if it holds no logical element.
    #[must_use]
    pub fn or_placeholder(self) -> Self {
        if self.is_empty() {
            Self::placeholder()
        } else {
            self
        }
    }

    /// True for a placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Logical elements per instance.
    pub fn instance_len(&self) -> usize {
        match self.shape {
            Shape::Vector { n, .. } => n,
            Shape::Matrix { rows, cols, .. } => rows.saturating_mul(cols),
        }
    }

    /// Logical elements over all instances.
    pub fn element_count(&self) -> usize {
        self.instance_len().saturating_mul(self.batch_count)
    }

    /// True when no logical element exists.
    pub fn is_empty(&self) -> bool {
        self.element_count() == 0
    }

    /// Physical elements spanned by one instance.
    pub fn extent(&self) -> HarnessResult<usize> {
        let overflow = || HarnessError::CapacityOverflow {
            reason: format!("{:?}", self.shape),
        };
        match self.shape {
            Shape::Vector { n: 0, .. } => Ok(0),
            Shape::Vector { n, inc } => (n - 1)
                .checked_mul(inc.unsigned_abs())
                .and_then(|span| span.checked_add(1))
                .ok_or_else(overflow),
            Shape::Matrix { cols: 0, .. } | Shape::Matrix { rows: 0, .. } => Ok(0),
            Shape::Matrix { rows, cols, ld } => ld
                .max(rows)
                .checked_mul(cols - 1)
                .and_then(|span| span.checked_add(rows))
                .ok_or_else(overflow),
        }
    }

    /// Minimum physical capacity, in elements, holding every instance.
    pub fn capacity(&self) -> HarnessResult<usize> {
        if self.placeholder {
            return Ok(1);
        }
        let extent = self.extent()?;
        if self.batch_count == 0 || extent == 0 {
            return Ok(0);
        }
        self.stride
            .checked_mul(self.batch_count - 1)
            .and_then(|span| span.checked_add(extent))
            .ok_or_else(|| HarnessError::CapacityOverflow {
                reason: format!(
                    "{} instances of {extent} elements with stride {}",
                    self.batch_count, self.stride
                ),
            })
    }

    /// Elements to allocate: the capacity, but never zero.
    pub fn allocation_len(&self) -> HarnessResult<usize> {
        Ok(self.capacity()?.max(1))
    }

    /// Physical index of logical element `i` of instance `batch`.
    pub fn offset(&self, batch: usize, i: usize) -> usize {
        let base = batch * self.stride;
        match self.shape {
            Shape::Vector { n, inc } if inc < 0 => base + (n - 1 - i) * inc.unsigned_abs(),
            Shape::Vector { inc, .. } => base + i * inc.unsigned_abs(),
            Shape::Matrix { rows, ld, .. } => base + (i % rows) + (i / rows) * ld,
        }
    }

    /// Physical index of entry `(row, col)` of instance `batch`.
    pub fn offset_2d(&self, batch: usize, row: usize, col: usize) -> usize {
        match self.shape {
            Shape::Matrix { ld, .. } => batch * self.stride + row + col * ld,
            Shape::Vector { .. } => self.offset(batch, row),
        }
    }
}

/// Host memory laid out by a [`StorageDescriptor`].
#[derive(Debug, Clone, PartialEq)]
pub struct HostBuffer<T> {
    desc: StorageDescriptor,
    data: Vec<T>,
}

impl<T: Pod> HostBuffer<T> {
    /// Zero-filled buffer.
    pub fn new(desc: StorageDescriptor) -> HarnessResult<Self> {
        let len = desc.allocation_len()?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| HarnessError::CapacityOverflow {
                reason: format!("host allocation of {len} elements"),
            })?;
        data.resize(len, T::zeroed());
        Ok(Self { desc, data })
    }

    /// Layout.
    pub fn desc(&self) -> &StorageDescriptor {
        &self.desc
    }

    /// Whole physical storage.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Whole physical storage, mutable.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Physical storage of instance `batch`, starting at its first element.
    pub fn batch(&self, batch: usize) -> &[T] {
        &self.data[batch * self.desc.stride..]
    }

    /// Mutable physical storage of instance `batch`.
    pub fn batch_mut(&mut self, batch: usize) -> &mut [T] {
        let start = batch * self.desc.stride;
        &mut self.data[start..]
    }

    /// Logical element `i` of instance `batch`.
    pub fn get(&self, batch: usize, i: usize) -> T {
        self.data[self.desc.offset(batch, i)]
    }

    /// Entry `(row, col)` of instance `batch`.
    pub fn get_2d(&self, batch: usize, row: usize, col: usize) -> T {
        self.data[self.desc.offset_2d(batch, row, col)]
    }

    /// Logical elements of instance `batch` in logical order (column-major for
    /// matrices).
    pub fn logical(&self, batch: usize) -> Vec<T> {
        (0..self.desc.instance_len())
            .map(|i| self.get(batch, i))
            .collect()
    }
}

impl<T> Index<usize> for HostBuffer<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for HostBuffer<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}

/// Device memory laid out by a [`StorageDescriptor`].
pub struct DeviceStorage<T: Pod> {
    desc: StorageDescriptor,
    buffer: DeviceBuffer<T>,
}

impl<T: Pod> DeviceStorage<T> {
    /// Zero-filled device allocation.
    pub fn new(device: &Device, desc: StorageDescriptor) -> HarnessResult<Self> {
        let buffer = DeviceBuffer::new(device, desc.allocation_len()?)?;
        Ok(Self { desc, buffer })
    }

    /// Layout.
    pub fn desc(&self) -> &StorageDescriptor {
        &self.desc
    }

    /// Pointer to the first element.
    pub fn ptr(&self) -> DevicePtr<T> {
        self.buffer.ptr()
    }

    /// Copy host contents in. Blocks until the data is on the device.
    pub fn upload(&mut self, host: &HostBuffer<T>) -> HarnessResult<()> {
        self.check_layout(host.desc())?;
        self.buffer.copy_from_host(host.as_slice())?;
        Ok(())
    }

    /// Copy contents out. Blocks until every queued kernel ran.
    pub fn download(&self, host: &mut HostBuffer<T>) -> HarnessResult<()> {
        self.check_layout(host.desc())?;
        self.buffer.copy_to_host(host.as_mut_slice())?;
        Ok(())
    }

    fn check_layout(&self, host: &StorageDescriptor) -> HarnessResult<()> {
        if host != &self.desc {
            return Err(HarnessError::ShapeMismatch {
                reason: format!("host {host:?} vs device {:?}", self.desc),
            });
        }
        Ok(())
    }
}

/// A host buffer and its device mirror.
pub struct BufferPair<T: Pod> {
    /// Authoritative host data
    pub host: HostBuffer<T>,
    /// Transient device mirror
    pub device: DeviceStorage<T>,
}

impl<T: Pod> BufferPair<T> {
    /// Allocate both sides with the same layout.
    pub fn new(device: &Device, desc: StorageDescriptor) -> HarnessResult<Self> {
        Ok(Self {
            host: HostBuffer::new(desc)?,
            device: DeviceStorage::new(device, desc)?,
        })
    }

    /// Device pointer.
    pub fn ptr(&self) -> DevicePtr<T> {
        self.device.ptr()
    }

    /// Copy the host data to the device.
    pub fn mirror(&mut self) -> HarnessResult<()> {
        self.device.upload(&self.host)
    }

    /// Copy the device data into a separate result buffer, leaving the host
    /// inputs alone.
    pub fn read_back_into(&self, result: &mut HostBuffer<T>) -> HarnessResult<()> {
        self.device.download(result)
    }

    /// Empty result buffer with this pair's layout.
    pub fn result_buffer(&self) -> HarnessResult<HostBuffer<T>> {
        HostBuffer::new(*self.host.desc())
    }
}
