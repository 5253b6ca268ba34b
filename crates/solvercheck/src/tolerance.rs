//! Accepted error bound for the correctness check.

use core::fmt;
use core::str::FromStr;

use serde::Serialize;

use crate::element::{epsilon, Element};

/// How much slack the correctness check allows.
///
/// The tolerance is `multiplier x scale x epsilon`, where `scale` is the
/// routine's problem-size factor (usually `n`) and `epsilon` belongs to the
/// working real type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToleranceMode {
    /// Multiplier 1.
    #[default]
    Strict,
    /// Multiplier 10.
    Relaxed,
    /// Explicit multiplier.
    Multiplier(f64),
}

impl ToleranceMode {
    /// Numeric multiplier.
    pub fn multiplier(&self) -> f64 {
        match self {
            ToleranceMode::Strict => 1.0,
            ToleranceMode::Relaxed => 10.0,
            ToleranceMode::Multiplier(m) => *m,
        }
    }

    /// Tolerance for problem-size factor `scale` in the precision of `T`.
    pub fn tolerance<T: Element>(&self, scale: usize) -> f64 {
        self.multiplier() * scale.max(1) as f64 * epsilon::<T>()
    }
}

impl FromStr for ToleranceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(ToleranceMode::Strict),
            "relaxed" => Ok(ToleranceMode::Relaxed),
            other => match other.parse::<f64>() {
                Ok(m) if m.is_finite() && m > 0.0 => Ok(ToleranceMode::Multiplier(m)),
                _ => Err(format!(
                    "expected strict, relaxed or a positive multiplier, got {other:?}"
                )),
            },
        }
    }
}

impl fmt::Display for ToleranceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToleranceMode::Strict => write!(f, "strict"),
            ToleranceMode::Relaxed => write!(f, "relaxed"),
            ToleranceMode::Multiplier(m) => write!(f, "{m}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;
    use proptest::prelude::*;

    #[test]
    fn test_parse_modes() {
        assert_eq!("strict".parse(), Ok(ToleranceMode::Strict));
        assert_eq!("relaxed".parse(), Ok(ToleranceMode::Relaxed));
        assert_eq!("2.5".parse(), Ok(ToleranceMode::Multiplier(2.5)));
        assert!("0".parse::<ToleranceMode>().is_err());
        assert!("loose".parse::<ToleranceMode>().is_err());
    }

    #[test]
    fn test_tolerance_scales_with_epsilon() {
        let strict = ToleranceMode::Strict;
        assert_eq!(strict.tolerance::<f32>(2), 2.0 * f32::EPSILON as f64);
        assert_eq!(strict.tolerance::<Complex64>(3), 3.0 * f64::EPSILON);
        assert_eq!(ToleranceMode::Relaxed.tolerance::<f64>(1), 10.0 * f64::EPSILON);
    }

    proptest! {
        #[test]
        fn prop_tolerance_is_monotone_in_size(
            a in 0usize..100_000,
            b in 0usize..100_000,
            m in 0.1f64..100.0,
        ) {
            let mode = ToleranceMode::Multiplier(m);
            let (small, large) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(mode.tolerance::<f32>(small) <= mode.tolerance::<f32>(large));
            prop_assert!(mode.tolerance::<f64>(small) <= mode.tolerance::<f64>(large));
        }
    }
}
