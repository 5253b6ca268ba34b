use core::marker::PhantomData;

use solvercheck::device::{Device, DevicePtr, Handle, Status};
use solvercheck::{
    count_mismatches, instance_error, Arguments, BufferPair, Element, HarnessError, HarnessResult,
    HostBuffer, InputGenerator, NormSpec, RealElement, Routine, StatusChecks, StorageDescriptor,
};

use super::{compared, read_back_into, result_buffer, to_usize};
use crate::kernels::{self, KernelElement};
use crate::{reference, Fill};

/// `potf2_strided_batched` case.
///
/// Inputs are Hermitian and strictly diagonally dominant, hence positive
/// definite. With `singular` set, instances `bc/4`, `bc/2` and `bc-1` get a
/// negative diagonal entry at column `n/4` so that the factorization stops
/// there and reports it in `info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Potf2StridedBatched<T> {
    /// Referenced triangle
    pub uplo: Fill,
    /// Order of each matrix
    pub n: i64,
    /// Leading dimension
    pub lda: i64,
    /// Distance between instances
    pub stride_a: i64,
    /// Number of instances
    pub batch_count: i64,
    /// Make some instances indefinite
    pub singular: bool,
    _marker: PhantomData<T>,
}

impl<T> Potf2StridedBatched<T> {
    /// Case with a tightly packed batch (`lda = n`, `stride_a = n * n`).
    pub fn new(uplo: Fill, n: i64, batch_count: i64) -> Self {
        Self {
            uplo,
            n,
            lda: n,
            stride_a: n * n,
            batch_count,
            singular: false,
            _marker: PhantomData,
        }
    }

    /// Set the leading dimension and instance stride.
    #[must_use]
    pub fn with_layout(mut self, lda: i64, stride_a: i64) -> Self {
        self.lda = lda;
        self.stride_a = stride_a;
        self
    }

    /// Make some instances indefinite.
    #[must_use]
    pub fn with_singular(mut self, singular: bool) -> Self {
        self.singular = singular;
        self
    }

    fn is_singular_instance(&self, batch: usize) -> bool {
        let count = to_usize(self.batch_count);
        self.singular && (batch == count / 4 || batch == count / 2 || batch + 1 == count)
    }
}

/// Buffers of a [`Potf2StridedBatched`] case.
pub struct Potf2Buffers<T: Element> {
    /// The batch of matrices
    pub a: BufferPair<T>,
    /// One status cell per instance
    pub info: BufferPair<i32>,
    /// Device `a` read back for comparison
    pub a_result: Option<HostBuffer<T>>,
    /// Device `info` read back for comparison
    pub info_result: Option<HostBuffer<i32>>,
}

impl<T: KernelElement> Routine for Potf2StridedBatched<T> {
    type Elem = T;
    type Buffers = Potf2Buffers<T>;

    fn name(&self) -> &'static str {
        "potf2_strided_batched"
    }

    fn from_arguments(args: &mut Arguments) -> HarnessResult<Self> {
        let uplo = args.get_or("uplo", Fill::Upper)?;
        let n: i64 = args.get("n")?;
        let lda = args.get_or("lda", n)?;
        let stride_a = args.get_or("stride_a", lda.saturating_mul(n))?;
        let case = Self::new(uplo, n, args.get_or("batch_count", 1)?)
            .with_layout(lda, stride_a)
            .with_singular(args.flag("singular", false)?);

        if uplo == Fill::Full {
            return Err(HarnessError::InvalidArgument {
                name: "uplo".to_string(),
                value: uplo.to_string(),
                reason: "must be U or L".to_string(),
            });
        }
        let extent = if n > 0 { lda.saturating_mul(n - 1).saturating_add(n) } else { 0 };
        if !case.has_invalid_size() && stride_a < extent {
            return Err(HarnessError::InvalidArgument {
                name: "stride_a".to_string(),
                value: stride_a.to_string(),
                reason: format!("instances of {extent} elements would overlap"),
            });
        }
        Ok(case)
    }

    fn arguments(&self) -> Vec<(&'static str, String)> {
        vec![
            ("uplo", self.uplo.to_string()),
            ("n", self.n.to_string()),
            ("lda", self.lda.to_string()),
            ("stride_a", self.stride_a.to_string()),
            ("batch_count", self.batch_count.to_string()),
            ("singular", u8::from(self.singular).to_string()),
        ]
    }

    fn has_invalid_size(&self) -> bool {
        self.n < 0 || self.lda < self.n || self.stride_a < 0 || self.batch_count < 0
    }

    fn is_quick_return(&self) -> bool {
        self.n == 0 || self.batch_count == 0
    }

    fn tolerance_scale(&self) -> usize {
        to_usize(self.n)
    }

    fn check_bad_args(handle: &Handle, checks: &mut StatusChecks) -> HarnessResult<()> {
        let device = handle.device();
        let a = BufferPair::<T>::new(device, StorageDescriptor::matrix(2, 2, 2))?;
        let info = BufferPair::<i32>::new(device, StorageDescriptor::vector(1, 1))?;
        let null_a = DevicePtr::<T>::null;
        let null_info = DevicePtr::<i32>::null;
        let call = |handle: Option<&Handle>,
                    uplo: Fill,
                    n: i64,
                    a: DevicePtr<T>,
                    info: DevicePtr<i32>,
                    batch_count: i64| {
            kernels::potf2_strided_batched(handle, uplo, n, a, 2, 4, info, batch_count)
        };

        checks.expect(
            "null handle",
            call(None, Fill::Upper, 2, a.ptr(), info.ptr(), 1),
            Status::InvalidHandle,
        );
        checks.expect(
            "full fill mode",
            call(Some(handle), Fill::Full, 2, a.ptr(), info.ptr(), 1),
            Status::InvalidValue,
        );
        checks.expect(
            "null A",
            call(Some(handle), Fill::Lower, 2, null_a(), info.ptr(), 1),
            Status::InvalidPointer,
        );
        checks.expect(
            "null info",
            call(Some(handle), Fill::Lower, 2, a.ptr(), null_info(), 1),
            Status::InvalidPointer,
        );
        checks.expect(
            "n = 0 with null A",
            call(Some(handle), Fill::Upper, 0, null_a(), info.ptr(), 1),
            Status::Success,
        );
        checks.expect(
            "empty batch with null pointers",
            call(Some(handle), Fill::Upper, 2, null_a(), null_info(), 0),
            Status::Success,
        );
        Ok(())
    }

    fn call_unallocated(&self, handle: &Handle) -> Status {
        kernels::potf2_strided_batched(
            Some(handle),
            self.uplo,
            self.n,
            DevicePtr::<T>::null(),
            self.lda,
            self.stride_a,
            DevicePtr::null(),
            self.batch_count,
        )
    }

    fn allocate(&self, device: &Device, with_results: bool) -> HarnessResult<Self::Buffers> {
        let (n, batch_count) = (to_usize(self.n), to_usize(self.batch_count));
        let a_desc = StorageDescriptor::matrix(n, n, to_usize(self.lda))
            .strided_batch(to_usize(self.stride_a), batch_count)
            .or_placeholder();
        let info_desc = StorageDescriptor::vector(1, 1)
            .strided_batch(1, batch_count)
            .or_placeholder();

        let a = BufferPair::new(device, a_desc)?;
        let info = BufferPair::new(device, info_desc)?;
        Ok(Potf2Buffers {
            a_result: result_buffer(&a, with_results)?,
            info_result: result_buffer(&info, with_results)?,
            a,
            info,
        })
    }

    fn generate(&self, buffers: &mut Self::Buffers, gen: &mut InputGenerator) {
        gen.fill(&mut buffers.a.host);
        buffers.info.host.as_mut_slice().fill(0);
        if buffers.a.host.desc().is_placeholder() {
            return;
        }

        let (n, lda) = (to_usize(self.n), to_usize(self.lda));
        // Off-diagonal magnitudes stay below 15, so this makes every row
        // strictly diagonally dominant.
        let boost = T::Real::from_f64(15.0 * n as f64);
        for batch in 0..to_usize(self.batch_count) {
            let m = buffers.a.host.batch_mut(batch);
            for j in 0..n {
                m[j + j * lda] = T::from_real(m[j + j * lda].real_part() + boost);
                for i in j + 1..n {
                    m[j + i * lda] = m[i + j * lda].conjugate();
                }
            }
            if self.is_singular_instance(batch) {
                let k = n / 4;
                m[k + k * lda] = T::from_real(-m[k + k * lda].real_part());
            }
        }
    }

    fn mirror(&self, buffers: &mut Self::Buffers) -> HarnessResult<()> {
        buffers.a.mirror()?;
        buffers.info.mirror()
    }

    fn call_device(&self, handle: &Handle, buffers: &Self::Buffers) -> Status {
        kernels::potf2_strided_batched(
            Some(handle),
            self.uplo,
            self.n,
            buffers.a.ptr(),
            self.lda,
            self.stride_a,
            buffers.info.ptr(),
            self.batch_count,
        )
    }

    fn read_back(&self, buffers: &mut Self::Buffers) -> HarnessResult<()> {
        read_back_into(&buffers.a, &mut buffers.a_result)?;
        read_back_into(&buffers.info, &mut buffers.info_result)
    }

    fn call_host(&self, buffers: &mut Self::Buffers) -> HarnessResult<()> {
        let (n, lda) = (to_usize(self.n), to_usize(self.lda));
        for batch in 0..to_usize(self.batch_count) {
            let info = reference::potf2(self.uplo, n, buffers.a.host.batch_mut(batch), lda)?;
            buffers.info.host[batch] = info;
        }
        Ok(())
    }

    /// Worst relative error over the instances the host factored
    /// successfully, plus one per `info` cell that differs.
    fn discrepancy(&self, buffers: &Self::Buffers, norm: NormSpec) -> HarnessResult<f64> {
        let a_result = compared(&buffers.a_result, "A")?;
        let info_result = compared(&buffers.info_result, "info")?;

        let mut worst = 0.0f64;
        for batch in 0..to_usize(self.batch_count) {
            if buffers.info.host[batch] != 0 {
                continue;
            }
            let error = instance_error(norm, &buffers.a.host, a_result, batch)?;
            if error.is_nan() {
                return Ok(f64::NAN);
            }
            worst = worst.max(error);
        }
        let mismatches = count_mismatches(buffers.info.host.as_slice(), info_result.as_slice());
        Ok(worst + mismatches as f64)
    }
}
