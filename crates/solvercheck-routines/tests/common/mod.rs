#![allow(dead_code)]

use solvercheck::device::{Device, DeviceConfig, Handle};
use solvercheck::{Collector, RunConfig, ToleranceMode, Validator};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn device() -> Device {
    Device::new(DeviceConfig::default().with_memory_limit(64 << 20)).unwrap()
}

pub fn validator(handle: &Handle) -> Validator<'_, Collector> {
    Validator::new(handle, RunConfig::default(), Collector::new())
}

/// Correctness checks with room for differently ordered sums.
pub fn relaxed(handle: &Handle) -> Validator<'_, Collector> {
    let config = RunConfig::default().with_tolerance(ToleranceMode::Relaxed);
    Validator::new(handle, config, Collector::new())
}
