//! Error types for the validation protocol.
//!
//! [`HarnessError`] is an infrastructure failure: it aborts the current case and
//! is returned through `?`. [`CheckFailure`] is a recorded failure (wrong status
//! for a malformed call, discrepancy above tolerance): it is data attached to
//! the case report and the suite carries on.

use core::fmt;

use serde::Serialize;
use solvercheck_device::{DeviceError, Status};
use thiserror::Error;

/// Errors that abort a test case.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HarnessError {
    /// Allocation, transfer or kernel fault on the device.
    #[error("Device failure: {0}")]
    Device(#[from] DeviceError),

    /// Buffer capacity does not fit in the address space.
    #[error("Buffer capacity overflow: {reason}")]
    CapacityOverflow {
        /// Which dimension overflowed
        reason: String,
    },

    /// A validly-shaped call returned an error status.
    #[error("{routine}: {call} returned {got}, expected {expected}")]
    UnexpectedStatus {
        /// Routine under test
        routine: String,
        /// Which call (device routine, memory query, ...)
        call: &'static str,
        /// Status the protocol requires
        expected: Status,
        /// Status actually returned
        got: Status,
    },

    /// A required named parameter is absent.
    #[error("Missing argument: {0}")]
    MissingArgument(String),

    /// A named parameter could not be parsed or is out of range.
    #[error("Invalid argument {name}={value}: {reason}")]
    InvalidArgument {
        /// Parameter name
        name: String,
        /// Raw value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// Parameters were supplied that no component consumed.
    #[error("Unused arguments: {0:?}")]
    UnconsumedArguments(Vec<String>),

    /// Two buffers compared by the discrepancy metric differ in shape.
    #[error("Shape mismatch: {reason}")]
    ShapeMismatch {
        /// Description of the mismatch
        reason: String,
    },

    /// The host reference rejected a validly-shaped problem.
    #[error("Host reference {routine} failed: {reason}")]
    HostReference {
        /// Reference routine
        routine: String,
        /// Failure description
        reason: String,
    },

    /// No routine is registered under this name and precision.
    #[error("Unknown routine {name} for precision {precision}")]
    UnknownRoutine {
        /// Routine name
        name: String,
        /// Precision character
        precision: char,
    },

    /// Writing a report failed.
    #[error("Report output failed: {0}")]
    Report(String),
}

impl From<std::io::Error> for HarnessError {
    fn from(err: std::io::Error) -> Self {
        HarnessError::Report(err.to_string())
    }
}

impl From<serde_json::Error> for HarnessError {
    fn from(err: serde_json::Error) -> Self {
        HarnessError::Report(err.to_string())
    }
}

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// A check that failed without aborting the case.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckFailure {
    /// A malformed call returned the wrong classification.
    StatusMismatch {
        /// Which argument was made invalid
        context: String,
        /// Documented status
        expected: String,
        /// Returned status
        got: String,
    },
    /// The discrepancy exceeded the tolerance.
    ToleranceExceeded {
        /// Measured discrepancy
        error: f64,
        /// Accepted tolerance
        tolerance: f64,
    },
}

impl CheckFailure {
    /// Failure for a status that differs from the documented one.
    pub fn status(context: impl Into<String>, expected: Status, got: Status) -> Self {
        CheckFailure::StatusMismatch {
            context: context.into(),
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckFailure::StatusMismatch {
                context,
                expected,
                got,
            } => write!(f, "{context}: expected {expected}, got {got}"),
            CheckFailure::ToleranceExceeded { error, tolerance } => {
                write!(f, "error {error:e} exceeds tolerance {tolerance:e}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_error_converts() {
        let err: HarnessError = DeviceError::Unavailable.into();
        assert!(matches!(err, HarnessError::Device(DeviceError::Unavailable)));
        assert!(err.to_string().contains("unavailable"));
    }

    #[test]
    fn test_check_failure_display() {
        let failure = CheckFailure::status("null x", Status::InvalidPointer, Status::Success);
        assert_eq!(failure.to_string(), "null x: expected invalid_pointer, got success");

        let failure = CheckFailure::ToleranceExceeded {
            error: 1.0,
            tolerance: 0.5,
        };
        assert!(failure.to_string().contains("exceeds tolerance"));
    }
}
