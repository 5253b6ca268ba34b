//! Routines whose device and host results must agree exactly.

mod common;

use common::{device, validator};
use num_complex::{Complex32, Complex64};
use solvercheck::device::{DeviceError, Handle, Status};
use solvercheck::{Arguments, BufferPair, HarnessError, Outcome, Routine, StorageDescriptor};
use solvercheck_routines::cases::{Lacgv, Laswp};
use solvercheck_routines::kernels;

#[test]
fn test_lacgv_increments() {
    let device = device();
    let handle = Handle::new(&device);
    let mut validator = validator(&handle);

    for incx in [1, 4, -1, -3] {
        let record = validator.run(&Lacgv::<Complex32>::new(15, incx)).unwrap();
        assert!(record.passed(), "incx={incx}: {:?}", record.failures);
        assert_eq!(record.error(), Some(0.0));
    }

    let record = validator.run(&Lacgv::<Complex64>::new(5, 0)).unwrap();
    assert_eq!(record.outcome, Outcome::InvalidSize);
    let record = validator.run(&Lacgv::<Complex64>::new(0, -2)).unwrap();
    assert_eq!(record.outcome, Outcome::QuickReturn);
    assert!(validator.reporter().failed() == 0);
}

#[test]
fn test_laswp_pivot_orders() {
    let device = device();
    let handle = Handle::new(&device);
    let mut validator = validator(&handle);

    let cases = [
        Laswp::<f64>::new(6, 8, 1, 8, 1),
        Laswp::<f64>::new(6, 8, 2, 5, -2),
        Laswp::<f64>::new(3, 10, 4, 4, 3),
    ];
    for case in &cases {
        let record = validator.run(case).unwrap();
        assert!(record.passed(), "{case:?}: {:?}", record.failures);
        assert_eq!(record.error(), Some(0.0));
    }

    let record = validator.run(&Laswp::<Complex32>::new(5, 5, 1, 5, -1)).unwrap();
    assert!(record.passed(), "{:?}", record.failures);
}

#[test]
fn test_laswp_sizes() {
    let device = device();
    let handle = Handle::new(&device);
    let mut validator = validator(&handle);

    let invalid = [
        Laswp::<f32>::new(-1, 4, 1, 4, 1),
        Laswp::<f32>::new(4, 0, 1, 4, 1),
        Laswp::<f32>::new(4, 4, 0, 4, 1),
        Laswp::<f32>::new(4, 4, 3, 2, 1),
        Laswp::<f32>::new(4, 4, 1, 4, 0),
    ];
    for case in &invalid {
        let record = validator.run(case).unwrap();
        assert_eq!(record.outcome, Outcome::InvalidSize, "{case:?}");
    }

    let record = validator.run(&Laswp::<f32>::new(0, 4, 1, 4, 1)).unwrap();
    assert_eq!(record.outcome, Outcome::QuickReturn);
    assert_eq!(validator.reporter().failed(), 0);
}

#[test]
fn test_laswp_from_arguments_defaults() {
    let mut args: Arguments = "n=7".parse().unwrap();
    let case = Laswp::<f64>::from_arguments(&mut args).unwrap();
    args.validate_consumed().unwrap();
    assert_eq!((case.lda, case.k1, case.k2, case.incx), (7, 1, 7, 1));

    let mut args: Arguments = "n=7 lda=7 k2=9".parse().unwrap();
    assert!(matches!(
        Laswp::<f64>::from_arguments(&mut args),
        Err(HarnessError::InvalidArgument { .. })
    ));
}

#[test]
fn test_laswp_pivot_count_overflow() {
    let device = device();
    let handle = Handle::new(&device);

    let case = Laswp::<f64>::new(1, 5, 1, 5, 1 << 62);
    assert!(case.has_invalid_size());
    assert!(matches!(
        case.allocate(&device, false),
        Err(HarnessError::CapacityOverflow { .. })
    ));

    let record = validator(&handle).run(&case).unwrap();
    assert_eq!(record.outcome, Outcome::InvalidSize);
    assert!(record.passed(), "{:?}", record.failures);
    assert_eq!(device.stats().unwrap().live_allocations, 0);
}

#[test]
fn test_laswp_out_of_range_pivot_faults() {
    let device = device();
    let handle = Handle::new(&device);

    let mut a = BufferPair::<f64>::new(&device, StorageDescriptor::matrix(2, 2, 2)).unwrap();
    let mut ipiv = BufferPair::<i32>::new(&device, StorageDescriptor::vector(2, 1)).unwrap();
    a.mirror().unwrap();
    ipiv.host.as_mut_slice().copy_from_slice(&[3, 1]);
    ipiv.mirror().unwrap();

    let status = kernels::laswp(Some(&handle), 2, a.ptr(), 2, 1, 2, ipiv.ptr(), 1);
    assert_eq!(status, Status::Success);
    assert!(matches!(
        handle.synchronize(),
        Err(DeviceError::KernelFault { kernel: "laswp", .. })
    ));
}

#[test]
fn test_bad_args() {
    let device = device();
    let handle = Handle::new(&device);
    let validator = validator(&handle);

    let failures = validator.check_bad_args::<Lacgv<Complex64>>().unwrap();
    assert!(failures.is_empty(), "{failures:?}");
    let failures = validator.check_bad_args::<Laswp<f32>>().unwrap();
    assert!(failures.is_empty(), "{failures:?}");
}
