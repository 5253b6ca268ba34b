//! The validation orchestrator.
//!
//! One call to [`Validator::run`] walks a case through its states in strict
//! order, stopping at the first one that terminates it:
//!
//! ```text
//! SizeValidation ─► MemoryQuery ─► QuickReturn ─► Correctness ─► Performance ─► Reported
//!       │                │              │
//!       └─ invalid size  └─ query only  └─ empty problem       (each early exit is reported too)
//! ```
//!
//! The argument-check sweep is a separate, one-shot entry point:
//! [`Validator::check_bad_args`].

use solvercheck_device::{Handle, ProfileMode, Status};

use crate::config::RunConfig;
use crate::element::Element;
use crate::error::CheckFailure;
use crate::executor::compute_error;
use crate::init::{DataInitializer, InitMode};
use crate::report::{CaseRecord, Outcome, Reporter};
use crate::routine::{Routine, StatusChecks};
use crate::timer::{DeviceInvoker, HostInvoker, PerfTimer};
use crate::{HarnessError, HarnessResult};

/// Drives test cases against one handle.
pub struct Validator<'h, P: Reporter> {
    handle: &'h Handle,
    config: RunConfig,
    reporter: P,
}

impl<'h, P: Reporter> Validator<'h, P> {
    /// Orchestrator with exclusive use of `handle` for its lifetime.
    pub fn new(handle: &'h Handle, config: RunConfig, reporter: P) -> Self {
        Self {
            handle,
            config,
            reporter,
        }
    }

    /// The run configuration.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// The reporting sink.
    pub fn reporter(&self) -> &P {
        &self.reporter
    }

    /// Recover the reporting sink.
    pub fn into_reporter(self) -> P {
        self.reporter
    }

    /// Argument-check sweep for routine `R`. Returns the mismatched statuses;
    /// an empty vector means every malformed call was classified correctly.
    pub fn check_bad_args<R: Routine>(&self) -> HarnessResult<Vec<CheckFailure>> {
        let mut checks = StatusChecks::new();
        R::check_bad_args(self.handle, &mut checks)?;
        self.handle.synchronize()?;

        log::debug!(
            "bad-argument sweep: {} checks, {} failed",
            checks.checked(),
            checks.failures().len()
        );
        Ok(checks.into_failures())
    }

    /// Run one case through every state and report it.
    ///
    /// Wrong statuses and discrepancies above tolerance are recorded in the
    /// returned record. Infrastructure failures abort the case with `Err`.
    pub fn run<R: Routine>(&mut self, routine: &R) -> HarnessResult<CaseRecord> {
        let name = routine.name();
        let mut record = CaseRecord::new(name, R::Elem::PRECISION, routine.arguments());
        log::debug!("{name}: starting case {:?}", record.arguments);

        if routine.has_invalid_size() {
            let status = routine.call_unallocated(self.handle);
            self.expect(&mut record, "invalid size", status, Status::InvalidSize);
            record.outcome = Outcome::InvalidSize;
            return self.finish(record);
        }

        if self.config.mem_query || !self.handle.allocates_on_demand() {
            let bytes = self.query_memory_size(routine)?;
            if self.config.mem_query {
                record.outcome = Outcome::MemoryQuery { bytes };
                return self.finish(record);
            }
            self.handle.set_device_memory_size(bytes)?;
        }

        let mut buffers = routine.allocate(self.handle.device(), self.config.correctness())?;

        if routine.is_quick_return() {
            let status = routine.call_device(self.handle, &buffers);
            self.handle.synchronize()?;
            self.expect(&mut record, "quick return", status, Status::Success);
            record.outcome = Outcome::QuickReturn;
            return self.finish(record);
        }

        let init = DataInitializer::for_case(self.config.seed, routine);

        let error = if self.config.correctness() {
            let norm = self.config.norm_for(routine.norm());
            Some(compute_error(routine, self.handle, &init, &mut buffers, norm)?)
        } else {
            None
        };

        let (mut cpu_time_us, mut gpu_time_us) = (None, None);
        if self.config.timing {
            let timer = PerfTimer::new(self.config.hot_calls)
                .with_warmup(self.config.cold_calls)
                .with_profile(ProfileMode {
                    max_levels: self.config.profile,
                    kernels: self.config.profile_kernels,
                });

            if !self.config.perf {
                let mut host = HostInvoker::new(routine, &init, &mut buffers);
                cpu_time_us = Some(timer.measure(&mut host)?);
            }

            init.initialize(routine, &mut buffers, InitMode::GENERATE)?;
            let mut device = DeviceInvoker::new(routine, self.handle, &init, &mut buffers);
            gpu_time_us = Some(timer.measure(&mut device)?);

            if self.config.profile > 0 {
                for (entry, calls) in self.handle.profile_summary() {
                    log::debug!("profile: {entry} called {calls} times");
                }
                self.handle.clear_profile();
            }
        }

        if self.config.unit_check {
            if let Some(error) = error {
                let tolerance = self
                    .config
                    .tolerance
                    .tolerance::<R::Elem>(routine.tolerance_scale());
                if error.is_nan() || error > tolerance {
                    log::warn!("{name}: error {error:e} exceeds tolerance {tolerance:e}");
                    record
                        .failures
                        .push(CheckFailure::ToleranceExceeded { error, tolerance });
                }
            }
        }

        record.outcome = Outcome::Measured {
            error,
            cpu_time_us,
            gpu_time_us,
        };
        self.finish(record)
    }

    fn query_memory_size<R: Routine>(&self, routine: &R) -> HarnessResult<usize> {
        let unexpected = |call: &'static str, got: Status| HarnessError::UnexpectedStatus {
            routine: routine.name().to_string(),
            call,
            expected: Status::Success,
            got,
        };

        self.handle
            .start_device_memory_size_query()
            .map_err(|got| unexpected("start memory size query", got))?;
        let status = routine.call_unallocated(self.handle);
        let bytes = self
            .handle
            .stop_device_memory_size_query()
            .map_err(|got| unexpected("stop memory size query", got))?;

        if !status.is_query_status() {
            return Err(unexpected("memory size query", status));
        }
        log::debug!("{}: requires {bytes} bytes of scratch memory", routine.name());
        Ok(bytes)
    }

    fn expect(&self, record: &mut CaseRecord, context: &str, got: Status, expected: Status) {
        if got != expected {
            log::warn!("{}: {context}: expected {expected}, got {got}", record.routine);
            record
                .failures
                .push(CheckFailure::status(context, expected, got));
        }
    }

    fn finish(&mut self, record: CaseRecord) -> HarnessResult<CaseRecord> {
        log::info!(
            "{} ({}): {:?}{}",
            record.routine,
            record.precision,
            record.outcome,
            if record.passed() { "" } else { " FAILED" }
        );
        self.reporter.report(&record, &self.config)?;
        Ok(record)
    }
}
