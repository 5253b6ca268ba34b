mod common;

use common::{device, relaxed, validator};
use solvercheck::device::Handle;
use solvercheck::{
    Arguments, Collector, HarnessError, JsonLinesReporter, RunConfig, ToleranceMode, Validator,
};
use solvercheck_routines::{check_bad_args, routines, run_case};

#[test]
fn test_run_case_by_name() {
    let device = device();
    let handle = Handle::new(&device);
    let mut validator = relaxed(&handle);

    let mut args: Arguments = "n=33 incx=2".parse().unwrap();
    let record = run_case(&mut validator, "larfg", 'd', &mut args).unwrap();
    assert_eq!((record.routine.as_str(), record.precision), ("larfg", 'd'));
    assert!(record.passed(), "{:?}", record.failures);

    let mut args = Arguments::new()
        .with("uplo", "L")
        .with("n", 6)
        .with("batch_count", 4)
        .with("singular", 1);
    let record = run_case(&mut validator, "potf2_strided_batched", 'z', &mut args).unwrap();
    assert!(record.passed(), "{:?}", record.failures);
}

#[test]
fn test_run_case_rejects_unknown_and_unused() {
    let device = device();
    let handle = Handle::new(&device);
    let mut validator = validator(&handle);

    let mut args: Arguments = "n=4".parse().unwrap();
    assert!(matches!(
        run_case(&mut validator, "lacgv", 's', &mut args),
        Err(HarnessError::UnknownRoutine { precision: 's', .. })
    ));
    assert!(matches!(
        run_case(&mut validator, "geqrf", 'd', &mut args),
        Err(HarnessError::UnknownRoutine { .. })
    ));

    let mut args: Arguments = "n=4 incx=1 alpha=2".parse().unwrap();
    assert!(matches!(
        run_case(&mut validator, "lacgv", 'c', &mut args),
        Err(HarnessError::UnconsumedArguments(keys)) if keys == ["alpha"]
    ));
    assert!(validator.reporter().records().is_empty());
}

#[test]
fn test_every_routine_classifies_bad_arguments() {
    let device = device();
    let handle = Handle::new(&device);
    let validator = validator(&handle);

    for (name, precision) in routines() {
        let failures = check_bad_args(&validator, name, precision).unwrap();
        assert!(failures.is_empty(), "{name} ({precision}): {failures:?}");
    }
}

#[test]
fn test_every_routine_passes_a_small_case() {
    let device = device();
    let handle = Handle::new(&device);
    let config = RunConfig::default().with_tolerance(ToleranceMode::Relaxed);
    let mut validator = Validator::new(&handle, config, Collector::new());

    for (name, precision) in routines() {
        let mut args = Arguments::new().with("n", 5);
        let record = run_case(&mut validator, name, precision, &mut args).unwrap();
        assert!(record.passed(), "{name} ({precision}): {:?}", record.failures);
    }
    assert_eq!(validator.reporter().records().len(), 14);
}

#[test]
fn test_json_report_from_run_arguments() {
    let device = device();
    let handle = Handle::new(&device);

    let mut args = Arguments::from_json(r#"{"n": 8, "incx": -2, "timing": true, "iters": 2}"#).unwrap();
    let config = RunConfig::from_arguments(&mut args).unwrap();
    let mut validator = Validator::new(&handle, config, JsonLinesReporter::new(Vec::new()));
    run_case(&mut validator, "lacgv", 'z', &mut args).unwrap();

    let text = String::from_utf8(validator.into_reporter().into_inner()).unwrap();
    let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
    assert_eq!(value["routine"], "lacgv");
    assert_eq!(value["precision"], "z");
    assert_eq!(value["arguments"]["incx"], "-2");
    assert_eq!(value["outcome"]["status"], "measured");
    assert_eq!(value["outcome"]["error"], 0.0);
    assert!(value.get("failures").is_none());
}
