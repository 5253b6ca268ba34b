use core::marker::PhantomData;

use solvercheck::device::{Device, DevicePtr, Handle, Status};
use solvercheck::{
    norm_error, Arguments, BufferPair, Element, HarnessError, HarnessResult, HostBuffer,
    InputGenerator, NormSpec, Routine, StatusChecks, StorageDescriptor,
};

use super::{compared, read_back_into, result_buffer, to_usize};
use crate::kernels::{self, KernelElement};
use crate::reference::{self, pivot_len};

/// `laswp` case: interchanges on rows `k1..=k2` of an `lda x n` matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Laswp<T> {
    /// Number of columns
    pub n: i64,
    /// Leading dimension, also the number of rows
    pub lda: i64,
    /// First interchanged row, 1-based
    pub k1: i64,
    /// Last interchanged row, 1-based
    pub k2: i64,
    /// Pivot increment; negative applies the interchanges in reverse
    pub incx: i64,
    _marker: PhantomData<T>,
}

impl<T> Laswp<T> {
    /// Case with the given dimensions.
    pub fn new(n: i64, lda: i64, k1: i64, k2: i64, incx: i64) -> Self {
        Self {
            n,
            lda,
            k1,
            k2,
            incx,
            _marker: PhantomData,
        }
    }

    fn pivot_len(&self) -> Option<usize> {
        let incx = isize::try_from(self.incx).ok()?;
        pivot_len(to_usize(self.k1), to_usize(self.k2), incx)
    }
}

/// Buffers of a [`Laswp`] case.
pub struct LaswpBuffers<T: Element> {
    /// The matrix
    pub a: BufferPair<T>,
    /// 1-based pivots
    pub ipiv: BufferPair<i32>,
    /// Device `a` read back for comparison
    pub a_result: Option<HostBuffer<T>>,
}

impl<T: KernelElement> Routine for Laswp<T> {
    type Elem = T;
    type Buffers = LaswpBuffers<T>;

    fn name(&self) -> &'static str {
        "laswp"
    }

    fn from_arguments(args: &mut Arguments) -> HarnessResult<Self> {
        let n: i64 = args.get("n")?;
        let lda = args.get_or("lda", n.max(1))?;
        let k1 = args.get_or("k1", 1)?;
        let k2 = args.get_or("k2", lda)?;
        let case = Self::new(n, lda, k1, k2, args.get_or("incx", 1)?);

        // Rows past lda do not exist in the generated matrix.
        if !case.has_invalid_size() && k2 > lda {
            return Err(HarnessError::InvalidArgument {
                name: "k2".to_string(),
                value: k2.to_string(),
                reason: format!("must not exceed lda = {lda}"),
            });
        }
        Ok(case)
    }

    fn arguments(&self) -> Vec<(&'static str, String)> {
        vec![
            ("n", self.n.to_string()),
            ("lda", self.lda.to_string()),
            ("k1", self.k1.to_string()),
            ("k2", self.k2.to_string()),
            ("incx", self.incx.to_string()),
        ]
    }

    fn has_invalid_size(&self) -> bool {
        self.n < 0
            || self.lda < 1
            || self.incx == 0
            || self.k1 < 1
            || self.k2 < 1
            || self.k2 < self.k1
            || self.pivot_len().is_none()
    }

    fn is_quick_return(&self) -> bool {
        self.n == 0
    }

    fn tolerance_scale(&self) -> usize {
        to_usize(self.n)
    }

    fn check_bad_args(handle: &Handle, checks: &mut StatusChecks) -> HarnessResult<()> {
        let device = handle.device();
        let a = BufferPair::<T>::new(device, StorageDescriptor::matrix(2, 2, 2))?;
        let ipiv = BufferPair::<i32>::new(device, StorageDescriptor::vector(2, 1))?;
        let null_a = DevicePtr::<T>::null;
        let null_ipiv = DevicePtr::<i32>::null;

        checks.expect(
            "null handle",
            kernels::laswp(None, 2, a.ptr(), 2, 1, 2, ipiv.ptr(), 1),
            Status::InvalidHandle,
        );
        checks.expect(
            "null A",
            kernels::laswp(Some(handle), 2, null_a(), 2, 1, 2, ipiv.ptr(), 1),
            Status::InvalidPointer,
        );
        checks.expect(
            "null ipiv",
            kernels::laswp(Some(handle), 2, a.ptr(), 2, 1, 2, null_ipiv(), 1),
            Status::InvalidPointer,
        );
        checks.expect(
            "quick return with null A",
            kernels::laswp(Some(handle), 0, null_a(), 2, 1, 2, ipiv.ptr(), 1),
            Status::Success,
        );
        checks.expect(
            "quick return still needs ipiv",
            kernels::laswp(Some(handle), 0, null_a(), 2, 1, 2, null_ipiv(), 1),
            Status::InvalidPointer,
        );
        Ok(())
    }

    fn call_unallocated(&self, handle: &Handle) -> Status {
        kernels::laswp(
            Some(handle),
            self.n,
            DevicePtr::<T>::null(),
            self.lda,
            self.k1,
            self.k2,
            DevicePtr::null(),
            self.incx,
        )
    }

    fn allocate(&self, device: &Device, with_results: bool) -> HarnessResult<Self::Buffers> {
        let lda = to_usize(self.lda);
        let a_desc = StorageDescriptor::matrix(lda, to_usize(self.n), lda).or_placeholder();
        let a = BufferPair::new(device, a_desc)?;
        let a_result = result_buffer(&a, with_results)?;
        let pivots = self.pivot_len().ok_or_else(|| HarnessError::CapacityOverflow {
            reason: format!("laswp pivots for k1={} k2={} incx={}", self.k1, self.k2, self.incx),
        })?;
        let ipiv = BufferPair::new(device, StorageDescriptor::vector(pivots, 1))?;
        Ok(LaswpBuffers { a, ipiv, a_result })
    }

    fn generate(&self, buffers: &mut Self::Buffers, gen: &mut InputGenerator) {
        gen.fill(&mut buffers.a.host);
        gen.fill_ints(&mut buffers.ipiv.host, 1..=i32::try_from(self.lda).unwrap_or(i32::MAX));
    }

    fn mirror(&self, buffers: &mut Self::Buffers) -> HarnessResult<()> {
        buffers.a.mirror()?;
        buffers.ipiv.mirror()
    }

    fn call_device(&self, handle: &Handle, buffers: &Self::Buffers) -> Status {
        kernels::laswp(
            Some(handle),
            self.n,
            buffers.a.ptr(),
            self.lda,
            self.k1,
            self.k2,
            buffers.ipiv.ptr(),
            self.incx,
        )
    }

    fn read_back(&self, buffers: &mut Self::Buffers) -> HarnessResult<()> {
        read_back_into(&buffers.a, &mut buffers.a_result)
    }

    fn call_host(&self, buffers: &mut Self::Buffers) -> HarnessResult<()> {
        reference::laswp(
            to_usize(self.n),
            buffers.a.host.as_mut_slice(),
            to_usize(self.lda),
            to_usize(self.k1),
            to_usize(self.k2),
            buffers.ipiv.host.as_slice(),
            self.incx as isize,
        )
    }

    fn discrepancy(&self, buffers: &Self::Buffers, norm: NormSpec) -> HarnessResult<f64> {
        norm_error(norm, &buffers.a.host, compared(&buffers.a_result, "A")?)
    }
}
