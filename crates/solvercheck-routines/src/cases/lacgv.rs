use core::marker::PhantomData;

use solvercheck::device::{Device, DevicePtr, Handle, Status};
use solvercheck::{
    norm_error, Arguments, BufferPair, Element, HarnessResult, HostBuffer, InputGenerator,
    NormSpec, Routine, StatusChecks, StorageDescriptor,
};

use super::{compared, read_back_into, result_buffer, to_usize};
use crate::kernels::{self, KernelElement};
use crate::reference;

/// `lacgv` case: length `n`, increment `incx` (negative allowed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lacgv<T> {
    /// Vector length
    pub n: i64,
    /// Increment
    pub incx: i64,
    _marker: PhantomData<T>,
}

impl<T> Lacgv<T> {
    /// Case with the given dimensions.
    pub fn new(n: i64, incx: i64) -> Self {
        Self {
            n,
            incx,
            _marker: PhantomData,
        }
    }
}

/// Buffers of a [`Lacgv`] case.
pub struct LacgvBuffers<T: Element> {
    /// The vector, conjugated in place
    pub x: BufferPair<T>,
    /// Device `x` read back for comparison
    pub x_result: Option<HostBuffer<T>>,
}

impl<T: KernelElement> Routine for Lacgv<T> {
    type Elem = T;
    type Buffers = LacgvBuffers<T>;

    fn name(&self) -> &'static str {
        "lacgv"
    }

    fn from_arguments(args: &mut Arguments) -> HarnessResult<Self> {
        Ok(Self::new(args.get("n")?, args.get_or("incx", 1)?))
    }

    fn arguments(&self) -> Vec<(&'static str, String)> {
        vec![("n", self.n.to_string()), ("incx", self.incx.to_string())]
    }

    fn has_invalid_size(&self) -> bool {
        self.n < 0 || self.incx == 0
    }

    fn is_quick_return(&self) -> bool {
        self.n == 0
    }

    fn tolerance_scale(&self) -> usize {
        to_usize(self.n)
    }

    fn check_bad_args(handle: &Handle, checks: &mut StatusChecks) -> HarnessResult<()> {
        let x = BufferPair::<T>::new(handle.device(), StorageDescriptor::vector(2, 1))?;

        checks.expect(
            "null handle",
            kernels::lacgv(None, 2, x.ptr(), 1),
            Status::InvalidHandle,
        );
        checks.expect(
            "null x",
            kernels::lacgv(Some(handle), 2, DevicePtr::<T>::null(), 1),
            Status::InvalidPointer,
        );
        checks.expect(
            "quick return with null x",
            kernels::lacgv(Some(handle), 0, DevicePtr::<T>::null(), 1),
            Status::Success,
        );
        Ok(())
    }

    fn call_unallocated(&self, handle: &Handle) -> Status {
        kernels::lacgv(Some(handle), self.n, DevicePtr::<T>::null(), self.incx)
    }

    fn allocate(&self, device: &Device, with_results: bool) -> HarnessResult<Self::Buffers> {
        let desc = StorageDescriptor::vector(to_usize(self.n), self.incx as isize).or_placeholder();
        let x = BufferPair::new(device, desc)?;
        let x_result = result_buffer(&x, with_results)?;
        Ok(LacgvBuffers { x, x_result })
    }

    fn generate(&self, buffers: &mut Self::Buffers, gen: &mut InputGenerator) {
        gen.fill(&mut buffers.x.host);
    }

    fn mirror(&self, buffers: &mut Self::Buffers) -> HarnessResult<()> {
        buffers.x.mirror()
    }

    fn call_device(&self, handle: &Handle, buffers: &Self::Buffers) -> Status {
        kernels::lacgv(Some(handle), self.n, buffers.x.ptr(), self.incx)
    }

    fn read_back(&self, buffers: &mut Self::Buffers) -> HarnessResult<()> {
        read_back_into(&buffers.x, &mut buffers.x_result)
    }

    fn call_host(&self, buffers: &mut Self::Buffers) -> HarnessResult<()> {
        reference::lacgv(
            to_usize(self.n),
            buffers.x.host.as_mut_slice(),
            self.incx as isize,
        );
        Ok(())
    }

    fn discrepancy(&self, buffers: &Self::Buffers, norm: NormSpec) -> HarnessResult<f64> {
        norm_error(norm, &buffers.x.host, compared(&buffers.x_result, "x")?)
    }
}
