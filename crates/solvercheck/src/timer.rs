//! Warm-up plus hot-loop timing.
//!
//! Most routines overwrite their inputs, so every invocation, warm-up and timed
//! alike, is preceded by a reset to the known input. The reset is never timed.
//! For the device path the clock stops only after a full synchronization,
//! because a launch returns as soon as the kernel is queued.

use core::num::NonZeroUsize;
use std::time::{Duration, Instant};

use solvercheck_device::{Handle, ProfileMode, Status};

use crate::init::{DataInitializer, InitMode};
use crate::routine::{expect_status, Routine};
use crate::HarnessResult;

/// Something the timer can invoke repeatedly.
pub trait Invoker {
    /// Restore the inputs of the next invocation.
    fn reset(&mut self) -> HarnessResult<()>;

    /// Dispatch one invocation.
    fn invoke(&mut self) -> HarnessResult<()>;

    /// Wait until every dispatched invocation finished.
    fn synchronize(&mut self) -> HarnessResult<()> {
        Ok(())
    }

    /// Switch profiling on or off.
    fn set_profiling(&mut self, _mode: ProfileMode) {}
}

/// Mean-latency timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerfTimer {
    warmup: usize,
    hot_calls: NonZeroUsize,
    profile: ProfileMode,
}

impl PerfTimer {
    /// Timer with two warm-up calls and no profiling.
    pub fn new(hot_calls: NonZeroUsize) -> Self {
        Self {
            warmup: 2,
            hot_calls,
            profile: ProfileMode::OFF,
        }
    }

    /// Set the number of warm-up calls.
    #[must_use]
    pub fn with_warmup(mut self, warmup: usize) -> Self {
        self.warmup = warmup;
        self
    }

    /// Profiling mode enabled for the hot loop only.
    #[must_use]
    pub fn with_profile(mut self, profile: ProfileMode) -> Self {
        self.profile = profile;
        self
    }

    /// Mean time per hot call, in microseconds.
    pub fn measure<I: Invoker>(&self, invoker: &mut I) -> HarnessResult<f64> {
        for _ in 0..self.warmup {
            invoker.reset()?;
            invoker.invoke()?;
        }
        invoker.synchronize()?;

        if self.profile.is_enabled() {
            invoker.set_profiling(self.profile);
        }

        let mut total = Duration::ZERO;
        for _ in 0..self.hot_calls.get() {
            invoker.reset()?;
            invoker.synchronize()?;

            let start = Instant::now();
            invoker.invoke()?;
            invoker.synchronize()?;
            total += start.elapsed();
        }

        if self.profile.is_enabled() {
            invoker.set_profiling(ProfileMode::OFF);
        }

        Ok(total.as_secs_f64() * 1e6 / self.hot_calls.get() as f64)
    }
}

/// Times the device routine. Resets re-mirror the host inputs without drawing
/// new values.
pub struct DeviceInvoker<'a, R: Routine> {
    routine: &'a R,
    handle: &'a Handle,
    init: &'a DataInitializer,
    buffers: &'a mut R::Buffers,
}

impl<'a, R: Routine> DeviceInvoker<'a, R> {
    /// Invoker over buffers whose host side already holds the inputs.
    pub fn new(
        routine: &'a R,
        handle: &'a Handle,
        init: &'a DataInitializer,
        buffers: &'a mut R::Buffers,
    ) -> Self {
        Self {
            routine,
            handle,
            init,
            buffers,
        }
    }
}

impl<R: Routine> Invoker for DeviceInvoker<'_, R> {
    fn reset(&mut self) -> HarnessResult<()> {
        self.init
            .initialize(self.routine, self.buffers, InitMode::MIRROR)
    }

    fn invoke(&mut self) -> HarnessResult<()> {
        let status = self.routine.call_device(self.handle, self.buffers);
        expect_status(self.routine.name(), "device routine", Status::Success, status)
    }

    fn synchronize(&mut self) -> HarnessResult<()> {
        self.handle.synchronize()?;
        Ok(())
    }

    fn set_profiling(&mut self, mode: ProfileMode) {
        self.handle.set_profile(mode);
    }
}

/// Times the host reference. The host mutates its inputs in place, so resets
/// regenerate them from the case seed.
pub struct HostInvoker<'a, R: Routine> {
    routine: &'a R,
    init: &'a DataInitializer,
    buffers: &'a mut R::Buffers,
}

impl<'a, R: Routine> HostInvoker<'a, R> {
    /// Invoker over the host side of `buffers`.
    pub fn new(routine: &'a R, init: &'a DataInitializer, buffers: &'a mut R::Buffers) -> Self {
        Self {
            routine,
            init,
            buffers,
        }
    }
}

impl<R: Routine> Invoker for HostInvoker<'_, R> {
    fn reset(&mut self) -> HarnessResult<()> {
        self.init
            .initialize(self.routine, self.buffers, InitMode::GENERATE)
    }

    fn invoke(&mut self) -> HarnessResult<()> {
        self.routine.call_host(self.buffers)
    }
}
