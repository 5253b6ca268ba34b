use core::marker::PhantomData;

use solvercheck::device::{Device, DevicePtr, Handle, Status};
use solvercheck::{
    norm_error, Arguments, BufferPair, Element, HarnessResult, HostBuffer, InputGenerator,
    NormSpec, Routine, StatusChecks, StorageDescriptor,
};

use super::{compared, read_back_into, result_buffer, scalar, to_usize};
use crate::kernels::{self, KernelElement};
use crate::reference;

/// `larfg` case: order `n`, `x` increment `incx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Larfg<T> {
    /// Order of the reflector
    pub n: i64,
    /// Increment of `x`
    pub incx: i64,
    _marker: PhantomData<T>,
}

impl<T> Larfg<T> {
    /// Case with the given dimensions.
    pub fn new(n: i64, incx: i64) -> Self {
        Self {
            n,
            incx,
            _marker: PhantomData,
        }
    }
}

/// Buffers of a [`Larfg`] case.
pub struct LarfgBuffers<T: Element> {
    /// Scalar `alpha`, overwritten with `beta`
    pub alpha: BufferPair<T>,
    /// Vector `x`, overwritten with the reflector tail
    pub x: BufferPair<T>,
    /// Scalar `tau`
    pub tau: BufferPair<T>,
    /// Device `x` read back for comparison
    pub x_result: Option<HostBuffer<T>>,
}

impl<T: KernelElement> Routine for Larfg<T> {
    type Elem = T;
    type Buffers = LarfgBuffers<T>;

    fn name(&self) -> &'static str {
        "larfg"
    }

    fn from_arguments(args: &mut Arguments) -> HarnessResult<Self> {
        Ok(Self::new(args.get("n")?, args.get_or("incx", 1)?))
    }

    fn arguments(&self) -> Vec<(&'static str, String)> {
        vec![("n", self.n.to_string()), ("incx", self.incx.to_string())]
    }

    fn has_invalid_size(&self) -> bool {
        self.n < 0 || self.incx < 1
    }

    fn is_quick_return(&self) -> bool {
        self.n == 0
    }

    fn tolerance_scale(&self) -> usize {
        to_usize(self.n)
    }

    fn check_bad_args(handle: &Handle, checks: &mut StatusChecks) -> HarnessResult<()> {
        let device = handle.device();
        let alpha = BufferPair::<T>::new(device, StorageDescriptor::vector(1, 1))?;
        let x = BufferPair::<T>::new(device, StorageDescriptor::vector(1, 1))?;
        let tau = BufferPair::<T>::new(device, StorageDescriptor::vector(1, 1))?;
        let null = DevicePtr::<T>::null;

        checks.expect(
            "null handle",
            kernels::larfg(None, 2, alpha.ptr(), x.ptr(), 1, tau.ptr()),
            Status::InvalidHandle,
        );
        checks.expect(
            "null alpha",
            kernels::larfg(Some(handle), 2, null(), x.ptr(), 1, tau.ptr()),
            Status::InvalidPointer,
        );
        checks.expect(
            "null x",
            kernels::larfg(Some(handle), 2, alpha.ptr(), null(), 1, tau.ptr()),
            Status::InvalidPointer,
        );
        checks.expect(
            "null tau",
            kernels::larfg(Some(handle), 2, alpha.ptr(), x.ptr(), 1, null()),
            Status::InvalidPointer,
        );
        checks.expect(
            "quick return with null pointers",
            kernels::larfg(Some(handle), 0, null(), null(), 1, null()),
            Status::Success,
        );
        checks.expect(
            "n = 1 with null x",
            kernels::larfg(Some(handle), 1, alpha.ptr(), null(), 1, tau.ptr()),
            Status::Success,
        );
        Ok(())
    }

    fn call_unallocated(&self, handle: &Handle) -> Status {
        let null = DevicePtr::<T>::null;
        kernels::larfg(Some(handle), self.n, null(), null(), self.incx, null())
    }

    fn allocate(&self, device: &Device, with_results: bool) -> HarnessResult<Self::Buffers> {
        let present = self.n > 0;
        // x is allocated even for n = 1, when it holds no logical element
        let x_desc = if present {
            StorageDescriptor::vector(to_usize(self.n - 1).max(1), self.incx as isize)
        } else {
            StorageDescriptor::placeholder()
        };

        let x = BufferPair::new(device, x_desc)?;
        let x_result = result_buffer(&x, with_results)?;
        Ok(LarfgBuffers {
            alpha: BufferPair::new(device, scalar(present))?,
            x,
            tau: BufferPair::new(device, scalar(present))?,
            x_result,
        })
    }

    fn generate(&self, buffers: &mut Self::Buffers, gen: &mut InputGenerator) {
        gen.fill(&mut buffers.alpha.host);
        gen.fill(&mut buffers.x.host);
    }

    fn mirror(&self, buffers: &mut Self::Buffers) -> HarnessResult<()> {
        buffers.alpha.mirror()?;
        buffers.x.mirror()
    }

    fn call_device(&self, handle: &Handle, buffers: &Self::Buffers) -> Status {
        kernels::larfg(
            Some(handle),
            self.n,
            buffers.alpha.ptr(),
            buffers.x.ptr(),
            self.incx,
            buffers.tau.ptr(),
        )
    }

    fn read_back(&self, buffers: &mut Self::Buffers) -> HarnessResult<()> {
        read_back_into(&buffers.x, &mut buffers.x_result)
    }

    fn call_host(&self, buffers: &mut Self::Buffers) -> HarnessResult<()> {
        let mut alpha = buffers.alpha.host[0];
        let mut tau = T::zero();
        reference::larfg(
            to_usize(self.n),
            &mut alpha,
            buffers.x.host.as_mut_slice(),
            to_usize(self.incx),
            &mut tau,
        );
        buffers.alpha.host[0] = alpha;
        buffers.tau.host[0] = tau;
        Ok(())
    }

    fn discrepancy(&self, buffers: &Self::Buffers, norm: NormSpec) -> HarnessResult<f64> {
        norm_error(norm, &buffers.x.host, compared(&buffers.x_result, "x")?)
    }
}
