//! The interface every routine under test implements.
//!
//! A [`Routine`] value is one test case: a routine identity plus its parsed
//! dimensions. It knows how to call the device implementation and the host
//! reference on the same logical inputs, and how to compare their outputs. The
//! orchestrator only ever talks to this trait.

use solvercheck_device::{Device, Handle, Status};

use crate::arguments::Arguments;
use crate::element::Element;
use crate::error::CheckFailure;
use crate::init::InputGenerator;
use crate::metric::NormSpec;
use crate::{HarnessError, HarnessResult};

/// One test case of one routine.
pub trait Routine {
    /// Element type the routine is instantiated for.
    type Elem: Element;

    /// Host/device buffers the routine works on.
    type Buffers;

    /// Routine name, e.g. `larfg`.
    fn name(&self) -> &'static str;

    /// Parse the case from named parameters.
    fn from_arguments(args: &mut Arguments) -> HarnessResult<Self>
    where
        Self: Sized;

    /// The case's parameters, in report order.
    fn arguments(&self) -> Vec<(&'static str, String)>;

    /// True when the declared dimensions must be rejected with
    /// [`Status::InvalidSize`].
    fn has_invalid_size(&self) -> bool;

    /// True when the problem is logically empty.
    fn is_quick_return(&self) -> bool;

    /// Problem-size factor of the accepted tolerance.
    fn tolerance_scale(&self) -> usize;

    /// Norms used by [`Routine::discrepancy`] unless the run overrides them.
    fn norm(&self) -> NormSpec {
        NormSpec::default()
    }

    /// Argument-check sweep on a fixed small configuration: make one argument
    /// invalid at a time and record each status in `checks`.
    fn check_bad_args(handle: &Handle, checks: &mut StatusChecks) -> HarnessResult<()>
    where
        Self: Sized,
    {
        let _ = (handle, checks);
        Ok(())
    }

    /// Call the device routine with null buffers. Used for invalid-size checks
    /// and memory-size queries, neither of which may touch data.
    fn call_unallocated(&self, handle: &Handle) -> Status;

    /// Allocate inputs, and result buffers when `with_results` is set.
    fn allocate(&self, device: &Device, with_results: bool) -> HarnessResult<Self::Buffers>;

    /// Fill the host inputs.
    fn generate(&self, buffers: &mut Self::Buffers, gen: &mut InputGenerator);

    /// Copy the host inputs to the device.
    fn mirror(&self, buffers: &mut Self::Buffers) -> HarnessResult<()>;

    /// Enqueue the device routine on the device buffers.
    fn call_device(&self, handle: &Handle, buffers: &Self::Buffers) -> Status;

    /// Copy device outputs into the result buffers.
    fn read_back(&self, buffers: &mut Self::Buffers) -> HarnessResult<()>;

    /// Run the host reference in place on the host inputs.
    fn call_host(&self, buffers: &mut Self::Buffers) -> HarnessResult<()>;

    /// Distance between the host results and the read-back device results.
    fn discrepancy(&self, buffers: &Self::Buffers, norm: NormSpec) -> HarnessResult<f64>;
}

/// Fail with [`HarnessError::UnexpectedStatus`] unless `got == expected`.
pub fn expect_status(
    routine: &str,
    call: &'static str,
    expected: Status,
    got: Status,
) -> HarnessResult<()> {
    if got == expected {
        return Ok(());
    }
    Err(HarnessError::UnexpectedStatus {
        routine: routine.to_string(),
        call,
        expected,
        got,
    })
}

/// Recorded outcome of status assertions that do not abort the case.
#[derive(Debug, Default)]
pub struct StatusChecks {
    checked: usize,
    failures: Vec<CheckFailure>,
}

impl StatusChecks {
    /// Empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record whether `got` matches the documented status.
    pub fn expect(&mut self, context: &str, got: Status, expected: Status) -> bool {
        self.checked += 1;
        if got == expected {
            return true;
        }
        log::warn!("{context}: expected {expected}, got {got}");
        self.failures.push(CheckFailure::status(context, expected, got));
        false
    }

    /// Number of assertions made.
    pub fn checked(&self) -> usize {
        self.checked
    }

    /// Assertions that failed.
    pub fn failures(&self) -> &[CheckFailure] {
        &self.failures
    }

    /// True when every assertion held.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Consume into the failed assertions.
    pub fn into_failures(self) -> Vec<CheckFailure> {
        self.failures
    }
}
