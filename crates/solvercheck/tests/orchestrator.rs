//! End-to-end tests of the validation orchestrator.

mod common;

use core::num::NonZeroUsize;

use common::{device, init_logging, Defect, Scal};
use num_complex::Complex64;
use solvercheck::device::{DeviceError, Handle, WorkspaceMode};
use solvercheck::{
    compute_error, Arguments, CheckFailure, Collector, DataInitializer, HarnessError,
    JsonLinesReporter, NormSpec, Outcome, Routine, RunConfig, ToleranceMode, Validator,
};

#[test]
fn test_valid_case_passes() {
    init_logging();
    let device = device();
    let handle = Handle::new(&device);
    let mut validator = Validator::new(&handle, RunConfig::default(), Collector::new());

    let record = validator.run(&Scal::<f64>::new(20, 2)).unwrap();

    assert!(record.passed(), "{:?}", record.failures);
    let error = record.error().unwrap();
    assert!(error.is_finite() && error >= 0.0);
    assert_eq!(validator.reporter().records().len(), 1);
}

#[test]
fn test_invalid_size_terminates_without_touching_data() {
    init_logging();
    let device = device();
    let handle = Handle::new(&device);
    let mut validator = Validator::new(&handle, RunConfig::bench(), Collector::new());

    for (n, incx) in [(5, 0), (5, -1), (-1, 1)] {
        let record = validator.run(&Scal::<f32>::new(n, incx)).unwrap();
        assert_eq!(record.outcome, Outcome::InvalidSize);
        assert!(record.passed());
    }

    let stats = device.stats().unwrap();
    assert_eq!(stats.kernel_launches, 0);
    assert_eq!(stats.bytes_to_device, 0);
    assert_eq!(stats.live_allocations, 0);
}

#[test]
fn test_quick_return_touches_no_buffer() {
    init_logging();
    let device = device();
    let handle = Handle::new(&device);
    let mut validator = Validator::new(&handle, RunConfig::bench(), Collector::new());

    let record = validator.run(&Scal::<Complex64>::new(0, 1)).unwrap();

    assert_eq!(record.outcome, Outcome::QuickReturn);
    assert!(record.passed());
    let stats = device.stats().unwrap();
    assert_eq!(stats.kernel_launches, 0);
    assert_eq!(stats.bytes_to_device, 0);
}

#[test]
fn test_memory_query_only() {
    let device = device();
    let handle = Handle::new(&device);
    let config = RunConfig::default().with_mem_query(true);
    let mut validator = Validator::new(&handle, config, Collector::new());

    let record = validator.run(&Scal::<f64>::new(10, 1)).unwrap();

    // 10 doubles, padded to the workspace alignment.
    assert_eq!(record.outcome, Outcome::MemoryQuery { bytes: 128 });
    assert!(!handle.is_device_memory_size_query());
    assert_eq!(device.stats().unwrap().bytes_to_device, 0);
}

#[test]
fn test_fixed_workspace_is_sized_by_query() {
    let device = device();
    let handle = Handle::with_workspace_mode(&device, WorkspaceMode::Fixed);
    let mut validator = Validator::new(&handle, RunConfig::default(), Collector::new());

    let record = validator.run(&Scal::<f32>::new(33, 1)).unwrap();

    assert!(record.passed());
    assert_eq!(handle.device_memory_size(), 192);
}

#[test]
fn test_discrepancy_is_a_recorded_failure() {
    init_logging();
    let device = device();
    let handle = Handle::new(&device);
    let mut validator = Validator::new(&handle, RunConfig::default(), Collector::new());

    let buggy = Scal::<f64>::new(8, 1).with_defect(Defect::WrongValue);
    let record = validator.run(&buggy).unwrap();

    assert!(matches!(
        record.failures.as_slice(),
        [CheckFailure::ToleranceExceeded { .. }]
    ));

    // The suite carries on with the next case.
    let record = validator.run(&Scal::<f64>::new(8, 1)).unwrap();
    assert!(record.passed());
    assert_eq!(validator.reporter().failed(), 1);
}

#[test]
fn test_relaxed_tolerance_is_applied() {
    let device = device();
    let handle = Handle::new(&device);
    let config = RunConfig::default().with_tolerance(ToleranceMode::Multiplier(1e20));
    let mut validator = Validator::new(&handle, config, Collector::new());

    let buggy = Scal::<f64>::new(8, 1).with_defect(Defect::WrongValue);
    assert!(validator.run(&buggy).unwrap().passed());
}

#[test]
fn test_device_fault_aborts_case() {
    let device = device();
    let handle = Handle::new(&device);
    let mut validator = Validator::new(&handle, RunConfig::default(), Collector::new());

    let faulty = Scal::<f32>::new(4, 1).with_defect(Defect::OutOfBounds);
    let err = validator.run(&faulty).unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Device(DeviceError::OutOfBounds { .. })
    ));

    // Nothing was reported for the aborted case, and the device recovered.
    assert!(validator.reporter().records().is_empty());
    assert!(validator.run(&Scal::<f32>::new(4, 1)).unwrap().passed());
}

#[test]
fn test_unexpected_status_aborts_case() {
    let device = device();
    let handle = Handle::new(&device);
    let mut validator = Validator::new(&handle, RunConfig::default(), Collector::new());

    let broken = Scal::<f32>::new(4, 1).with_defect(Defect::WrongStatus);
    assert!(matches!(
        validator.run(&broken),
        Err(HarnessError::UnexpectedStatus { call: "device routine", .. })
    ));
}

#[test]
fn test_timing_counts_warmup_and_hot_calls() {
    init_logging();
    let device = device();
    let handle = Handle::new(&device);
    let config = RunConfig {
        unit_check: false,
        norm_check: false,
        timing: true,
        perf: true,
        hot_calls: NonZeroUsize::new(10).unwrap(),
        ..RunConfig::default()
    };
    let mut validator = Validator::new(&handle, config, Collector::new());

    let record = validator.run(&Scal::<f64>::new(16, 1)).unwrap();

    let Outcome::Measured {
        error,
        cpu_time_us,
        gpu_time_us,
    } = record.outcome
    else {
        panic!("expected a measured outcome, got {:?}", record.outcome);
    };
    assert_eq!(error, None);
    assert_eq!(cpu_time_us, None);
    assert!(gpu_time_us.unwrap() > 0.0);

    // 2 warm-up + 10 hot calls, each after a fresh mirror of the 16 inputs.
    let stats = device.stats().unwrap();
    assert_eq!(stats.kernel_launches, 12);
    assert_eq!(stats.bytes_to_device, 12 * 16 * 8);
}

#[test]
fn test_profiling_does_not_change_results() {
    let device = device();
    let handle = Handle::new(&device);
    let plain = RunConfig::bench();
    let profiled = RunConfig::bench().with_profile(3, true);

    let case = Scal::<Complex64>::new(12, 3);
    let first = Validator::new(&handle, plain, Collector::new())
        .run(&case)
        .unwrap();
    let second = Validator::new(&handle, profiled, Collector::new())
        .run(&case)
        .unwrap();

    assert_eq!(first.error(), second.error());
    assert_eq!(handle.profile(), solvercheck::device::ProfileMode::OFF);
}

#[test]
fn test_compute_error_is_deterministic() {
    let device = device();
    let handle = Handle::new(&device);
    let case = Scal::<f32>::new(9, 2).with_defect(Defect::WrongValue);
    let init = DataInitializer::for_case(42, &case);

    let mut buffers = case.allocate(&device, true).unwrap();
    let first = compute_error(&case, &handle, &init, &mut buffers, NormSpec::default()).unwrap();
    let second = compute_error(&case, &handle, &init, &mut buffers, NormSpec::default()).unwrap();

    assert!(first > 0.0);
    assert_eq!(first, second);
}

#[test]
fn test_bad_args_sweep() {
    let device = device();
    let handle = Handle::new(&device);
    let validator = Validator::new(&handle, RunConfig::default(), Collector::new());

    let failures = validator.check_bad_args::<Scal<f64>>().unwrap();
    assert!(failures.is_empty(), "{failures:?}");
}

#[test]
fn test_case_from_arguments_with_json_report() {
    let device = device();
    let handle = Handle::new(&device);

    let mut args: Arguments = "n=6 incx=1 norm_check=1 timing=1 iters=3".parse().unwrap();
    let config = RunConfig::from_arguments(&mut args).unwrap();
    let case = Scal::<f32>::from_arguments(&mut args).unwrap();
    args.validate_consumed().unwrap();

    let mut validator = Validator::new(&handle, config, JsonLinesReporter::new(Vec::new()));
    validator.run(&case).unwrap();

    let text = String::from_utf8(validator.into_reporter().into_inner()).unwrap();
    let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
    assert_eq!(value["routine"], "scal");
    assert_eq!(value["precision"], "s");
    assert_eq!(value["arguments"]["n"], "6");
    assert_eq!(value["outcome"]["status"], "measured");
    assert!(value["outcome"]["gpu_time_us"].as_f64().unwrap() > 0.0);
    assert!(value["outcome"]["cpu_time_us"].as_f64().unwrap() >= 0.0);
}
