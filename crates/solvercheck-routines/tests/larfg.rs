mod common;

use common::{device, init_logging, relaxed, validator};
use num_complex::{Complex32, Complex64};
use solvercheck::device::{Handle, WorkspaceMode};
use solvercheck::{Collector, Outcome, RunConfig, Validator};
use solvercheck_routines::cases::Larfg;

#[test]
fn test_larfg_order_two() {
    init_logging();
    let device = device();
    let handle = Handle::new(&device);
    let mut validator = validator(&handle);

    let record = validator.run(&Larfg::<f32>::new(2, 1)).unwrap();
    assert!(record.passed(), "{:?}", record.failures);

    let record = validator.run(&Larfg::<f64>::new(2, 1)).unwrap();
    assert!(record.passed(), "{:?}", record.failures);
}

#[test]
fn test_larfg_strided_real() {
    let device = device();
    let handle = Handle::new(&device);
    let mut validator = relaxed(&handle);

    for (n, incx) in [(1, 1), (17, 3), (300, 1)] {
        let record = validator.run(&Larfg::<f64>::new(n, incx)).unwrap();
        assert!(record.passed(), "n={n} incx={incx}: {:?}", record.failures);
        let record = validator.run(&Larfg::<f32>::new(n, incx)).unwrap();
        assert!(record.passed(), "n={n} incx={incx}: {:?}", record.failures);
    }
}

#[test]
fn test_larfg_complex() {
    let device = device();
    let handle = Handle::new(&device);
    let mut validator = relaxed(&handle);

    let record = validator.run(&Larfg::<Complex32>::new(24, 2)).unwrap();
    assert!(record.passed(), "{:?}", record.failures);
    let record = validator.run(&Larfg::<Complex64>::new(24, 1)).unwrap();
    assert!(record.passed(), "{:?}", record.failures);
}

#[test]
fn test_larfg_quick_return_touches_nothing() {
    let device = device();
    let handle = Handle::new(&device);
    let mut validator = Validator::new(&handle, RunConfig::bench(), Collector::new());

    let record = validator.run(&Larfg::<Complex64>::new(0, 1)).unwrap();

    assert_eq!(record.outcome, Outcome::QuickReturn);
    assert!(record.passed());
    let stats = device.stats().unwrap();
    assert_eq!(stats.kernel_launches, 0);
    assert_eq!(stats.bytes_to_device, 0);
}

#[test]
fn test_larfg_invalid_sizes() {
    let device = device();
    let handle = Handle::new(&device);
    let mut validator = validator(&handle);

    for (n, incx) in [(-1, 1), (4, 0), (4, -1)] {
        let record = validator.run(&Larfg::<f32>::new(n, incx)).unwrap();
        assert_eq!(record.outcome, Outcome::InvalidSize);
        assert!(record.passed(), "{:?}", record.failures);
    }
    assert_eq!(device.stats().unwrap().live_allocations, 0);
}

#[test]
fn test_larfg_memory_query() {
    let device = device();
    let handle = Handle::new(&device);
    let config = RunConfig::default().with_mem_query(true);
    let mut validator = Validator::new(&handle, config, Collector::new());

    // One real for the norm, padded to the workspace alignment.
    let record = validator.run(&Larfg::<f64>::new(10, 1)).unwrap();
    assert_eq!(record.outcome, Outcome::MemoryQuery { bytes: 64 });

    let record = validator.run(&Larfg::<f64>::new(0, 1)).unwrap();
    assert_eq!(record.outcome, Outcome::MemoryQuery { bytes: 0 });
    assert_eq!(device.stats().unwrap().bytes_to_device, 0);
}

#[test]
fn test_larfg_fixed_workspace() {
    let device = device();
    let handle = Handle::with_workspace_mode(&device, WorkspaceMode::Fixed);
    let mut validator = relaxed(&handle);

    let record = validator.run(&Larfg::<f64>::new(10, 2)).unwrap();

    assert!(record.passed(), "{:?}", record.failures);
    assert_eq!(handle.device_memory_size(), 64);
}

#[test]
fn test_larfg_bad_args() {
    let device = device();
    let handle = Handle::new(&device);
    let validator = validator(&handle);

    let failures = validator.check_bad_args::<Larfg<f64>>().unwrap();
    assert!(failures.is_empty(), "{failures:?}");
    let failures = validator.check_bad_args::<Larfg<Complex32>>().unwrap();
    assert!(failures.is_empty(), "{failures:?}");
}
