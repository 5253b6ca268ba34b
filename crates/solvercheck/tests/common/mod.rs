//! A minimal routine (`x := alpha * x`) used to drive the orchestrator.
#![allow(dead_code)]

use core::marker::PhantomData;

use bytemuck::Pod;
use cubecl_core as cubecl;
use cubecl_core::prelude::*;
use num_complex::{Complex32, Complex64};
use solvercheck::device::{Device, DeviceConfig, DevicePtr, DeviceRuntime, Handle, Status};
use solvercheck::{
    norm_error, Arguments, BufferPair, Element, HarnessError, HarnessResult, HostBuffer,
    InputGenerator, NormSpec, RealElement, Routine, StatusChecks, StorageDescriptor,
};

/// Deliberate bugs the device implementation can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Defect {
    None,
    WrongValue,
    OutOfBounds,
    WrongStatus,
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn device() -> Device {
    Device::new(DeviceConfig::default().with_memory_limit(16 << 20)).unwrap()
}

pub fn device_scal<T: ScalElement>(
    handle: Option<&Handle>,
    n: i64,
    alpha: T,
    x: DevicePtr<T>,
    incx: i64,
    defect: Defect,
) -> Status {
    let Some(handle) = handle else {
        return Status::InvalidHandle;
    };
    if n < 0 || incx < 1 {
        return Status::InvalidSize;
    }
    if handle.is_device_memory_size_query() {
        return handle.set_optimal_device_memory_size(&[n as usize * core::mem::size_of::<T>()]);
    }
    if n > 0 && x.is_null() {
        return Status::InvalidPointer;
    }
    if n == 0 {
        return Status::Success;
    }
    if defect == Defect::WrongStatus {
        return Status::InternalError;
    }

    let (n, incx) = (n as usize, incx as usize);
    let (alpha_re, alpha_im) = alpha.parts();
    handle.launch("scal", |launch| {
        let mut extent = (n - 1) * incx + 1;
        if defect == Defect::OutOfBounds {
            extent = n * incx + 1;
        }
        let x = launch.array::<T, T::Scalar>(x, extent)?;
        scal_kernel::launch::<T::Scalar, DeviceRuntime>(
            launch.client(),
            CubeCount::Static((n as u32).div_ceil(64), 1, 1),
            CubeDim::new(64, 1, 1),
            x.arg(),
            ScalarArg::new(alpha_re),
            ScalarArg::new(alpha_im),
            ScalarArg::new(x.offset()),
            ScalarArg::new(incx as u32),
            ScalarArg::new(n as u32),
            ScalarArg::new(u32::from(defect == Defect::WrongValue)),
            T::IS_COMPLEX,
        );
        Ok(())
    })
}

/// `x[i] *= alpha`; with `bump` the first element also gains 1.
#[cube(launch)]
fn scal_kernel<F: Float>(
    x: &mut Array<F>,
    alpha_re: F,
    alpha_im: F,
    offset: u32,
    incx: u32,
    n: u32,
    bump: u32,
    #[comptime] complex: bool,
) {
    let i = ABSOLUTE_POS;
    if i < n {
        if complex {
            let at = (offset + i * incx) * 2;
            let vr = x[at];
            let vi = x[at + 1];
            x[at] = vr * alpha_re - vi * alpha_im;
            x[at + 1] = vr * alpha_im + vi * alpha_re;
        } else {
            let at = offset + i * incx;
            x[at] = x[at] * alpha_re;
        }
        if i == 0 && bump == 1 {
            let mut first = offset;
            if complex {
                first = offset * 2;
            }
            x[first] = x[first] + F::new(1.0);
        }
    }
}

/// Elements the test kernel runs on, split into kernel scalars.
pub trait ScalElement: Element {
    type Scalar: Float + CubeElement + Pod;

    fn parts(self) -> (Self::Scalar, Self::Scalar);
}

impl ScalElement for f32 {
    type Scalar = f32;

    fn parts(self) -> (f32, f32) {
        (self, 0.0)
    }
}

impl ScalElement for f64 {
    type Scalar = f64;

    fn parts(self) -> (f64, f64) {
        (self, 0.0)
    }
}

impl ScalElement for Complex32 {
    type Scalar = f32;

    fn parts(self) -> (f32, f32) {
        (self.re, self.im)
    }
}

impl ScalElement for Complex64 {
    type Scalar = f64;

    fn parts(self) -> (f64, f64) {
        (self.re, self.im)
    }
}

pub struct Scal<T> {
    pub n: i64,
    pub incx: i64,
    pub alpha: f64,
    pub defect: Defect,
    _marker: PhantomData<T>,
}

impl<T> Scal<T> {
    pub fn new(n: i64, incx: i64) -> Self {
        Self {
            n,
            incx,
            alpha: 3.0,
            defect: Defect::None,
            _marker: PhantomData,
        }
    }

    pub fn with_defect(mut self, defect: Defect) -> Self {
        self.defect = defect;
        self
    }

    fn alpha(&self) -> T
    where
        T: Element,
    {
        T::from_real(T::Real::from_f64(self.alpha))
    }
}

pub struct ScalBuffers<T: Element> {
    pub x: BufferPair<T>,
    pub xr: Option<HostBuffer<T>>,
}

impl<T: ScalElement> Routine for Scal<T> {
    type Elem = T;
    type Buffers = ScalBuffers<T>;

    fn name(&self) -> &'static str {
        "scal"
    }

    fn from_arguments(args: &mut Arguments) -> HarnessResult<Self> {
        let mut case = Self::new(args.get("n")?, args.get_or("incx", 1)?);
        case.alpha = args.get_or("alpha", 3.0)?;
        Ok(case)
    }

    fn arguments(&self) -> Vec<(&'static str, String)> {
        vec![("n", self.n.to_string()), ("inc", self.incx.to_string())]
    }

    fn has_invalid_size(&self) -> bool {
        self.n < 0 || self.incx < 1
    }

    fn is_quick_return(&self) -> bool {
        self.n == 0
    }

    fn tolerance_scale(&self) -> usize {
        self.n.max(1) as usize
    }

    fn check_bad_args(handle: &Handle, checks: &mut StatusChecks) -> HarnessResult<()> {
        let device = handle.device();
        let x = BufferPair::<T>::new(device, StorageDescriptor::vector(2, 1))?;
        let alpha = T::one();

        checks.expect(
            "null handle",
            device_scal(None, 2, alpha, x.ptr(), 1, Defect::None),
            Status::InvalidHandle,
        );
        checks.expect(
            "null x",
            device_scal(Some(handle), 2, alpha, DevicePtr::null(), 1, Defect::None),
            Status::InvalidPointer,
        );
        checks.expect(
            "quick return with null x",
            device_scal(Some(handle), 0, alpha, DevicePtr::null(), 1, Defect::None),
            Status::Success,
        );
        Ok(())
    }

    fn call_unallocated(&self, handle: &Handle) -> Status {
        device_scal(
            Some(handle),
            self.n,
            self.alpha(),
            DevicePtr::null(),
            self.incx,
            self.defect,
        )
    }

    fn allocate(&self, device: &Device, with_results: bool) -> HarnessResult<Self::Buffers> {
        let desc = StorageDescriptor::vector(self.n.max(1) as usize, self.incx as isize);
        let x = BufferPair::new(device, desc)?;
        let xr = if with_results {
            Some(x.result_buffer()?)
        } else {
            None
        };
        Ok(ScalBuffers { x, xr })
    }

    fn generate(&self, buffers: &mut Self::Buffers, gen: &mut InputGenerator) {
        gen.fill(&mut buffers.x.host);
    }

    fn mirror(&self, buffers: &mut Self::Buffers) -> HarnessResult<()> {
        buffers.x.mirror()
    }

    fn call_device(&self, handle: &Handle, buffers: &Self::Buffers) -> Status {
        device_scal(
            Some(handle),
            self.n,
            self.alpha(),
            buffers.x.ptr(),
            self.incx,
            self.defect,
        )
    }

    fn read_back(&self, buffers: &mut Self::Buffers) -> HarnessResult<()> {
        match buffers.xr.as_mut() {
            Some(xr) => buffers.x.read_back_into(xr),
            None => Ok(()),
        }
    }

    fn call_host(&self, buffers: &mut Self::Buffers) -> HarnessResult<()> {
        let alpha = self.alpha();
        let host = &mut buffers.x.host;
        for i in 0..self.n as usize {
            let at = host.desc().offset(0, i);
            host[at] *= alpha;
        }
        Ok(())
    }

    fn discrepancy(&self, buffers: &Self::Buffers, norm: NormSpec) -> HarnessResult<f64> {
        let xr = buffers.xr.as_ref().ok_or_else(|| HarnessError::ShapeMismatch {
            reason: "result buffer not allocated".to_string(),
        })?;
        norm_error(norm, &buffers.x.host, xr)
    }
}
