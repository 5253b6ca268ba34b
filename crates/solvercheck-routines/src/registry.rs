//! Lookup of case drivers by routine name and precision character.

use num_complex::{Complex32, Complex64};
use solvercheck::{
    Arguments, CaseRecord, CheckFailure, HarnessError, HarnessResult, Reporter, Routine, Validator,
};

use crate::cases::{Lacgv, Larfg, Laswp, Potf2StridedBatched};

/// Every registered routine with the precisions it is instantiated for.
pub const ROUTINES: &[(&str, &str)] = &[
    ("larfg", "sdcz"),
    ("lacgv", "cz"),
    ("laswp", "sdcz"),
    ("potf2_strided_batched", "sdcz"),
];

/// Every registered `(routine, precision)` pair.
pub fn routines() -> impl Iterator<Item = (&'static str, char)> {
    ROUTINES
        .iter()
        .flat_map(|&(name, precisions)| precisions.chars().map(move |p| (name, p)))
}

/// Operation performed on the case driver a name resolves to.
pub trait CaseVisitor {
    /// Value produced for the driver.
    type Output;

    /// Run on driver `R`.
    fn visit<R: Routine>(self) -> HarnessResult<Self::Output>;
}

macro_rules! by_precision {
    ($visitor:expr, $precision:expr, $unknown:expr, $case:ident, complex) => {
        match $precision {
            'c' => $visitor.visit::<$case<Complex32>>(),
            'z' => $visitor.visit::<$case<Complex64>>(),
            _ => Err($unknown),
        }
    };
    ($visitor:expr, $precision:expr, $unknown:expr, $case:ident) => {
        match $precision {
            's' => $visitor.visit::<$case<f32>>(),
            'd' => $visitor.visit::<$case<f64>>(),
            'c' => $visitor.visit::<$case<Complex32>>(),
            'z' => $visitor.visit::<$case<Complex64>>(),
            _ => Err($unknown),
        }
    };
}

/// Resolve `name` and `precision` to a driver and hand it to `visitor`.
pub fn dispatch<V: CaseVisitor>(
    name: &str,
    precision: char,
    visitor: V,
) -> HarnessResult<V::Output> {
    let unknown = HarnessError::UnknownRoutine {
        name: name.to_string(),
        precision,
    };

    match name {
        "larfg" => by_precision!(visitor, precision, unknown, Larfg),
        "lacgv" => by_precision!(visitor, precision, unknown, Lacgv, complex),
        "laswp" => by_precision!(visitor, precision, unknown, Laswp),
        "potf2_strided_batched" => {
            by_precision!(visitor, precision, unknown, Potf2StridedBatched)
        }
        _ => Err(unknown),
    }
}

struct RunCase<'a, 'v, 'h, P: Reporter> {
    validator: &'v mut Validator<'h, P>,
    args: &'a mut Arguments,
}

impl<P: Reporter> CaseVisitor for RunCase<'_, '_, '_, P> {
    type Output = CaseRecord;

    fn visit<R: Routine>(self) -> HarnessResult<CaseRecord> {
        let case = R::from_arguments(self.args)?;
        self.args.validate_consumed()?;
        self.validator.run(&case)
    }
}

struct BadArgs<'v, 'h, P: Reporter> {
    validator: &'v Validator<'h, P>,
}

impl<P: Reporter> CaseVisitor for BadArgs<'_, '_, P> {
    type Output = Vec<CheckFailure>;

    fn visit<R: Routine>(self) -> HarnessResult<Vec<CheckFailure>> {
        self.validator.check_bad_args::<R>()
    }
}

/// Parse one case of `name` in `precision` from `args` and run it.
///
/// Every parameter in `args` must be consumed, by the run configuration
/// beforehand or by the case here.
pub fn run_case<P: Reporter>(
    validator: &mut Validator<'_, P>,
    name: &str,
    precision: char,
    args: &mut Arguments,
) -> HarnessResult<CaseRecord> {
    log::debug!("dispatching {name} ({precision})");
    dispatch(name, precision, RunCase { validator, args })
}

/// Argument-check sweep of `name` in `precision`.
pub fn check_bad_args<P: Reporter>(
    validator: &Validator<'_, P>,
    name: &str,
    precision: char,
) -> HarnessResult<Vec<CheckFailure>> {
    dispatch(name, precision, BadArgs { validator })
}

#[cfg(test)]
mod tests {
    use super::*;
    use solvercheck::Element;

    struct Resolve;

    impl CaseVisitor for Resolve {
        type Output = (&'static str, char);

        fn visit<R: Routine>(self) -> HarnessResult<Self::Output> {
            let mut args = Arguments::new().with("n", 1);
            let case = R::from_arguments(&mut args)?;
            Ok((case.name(), R::Elem::PRECISION))
        }
    }

    #[test]
    fn test_every_listed_pair_resolves() {
        for (name, precision) in routines() {
            assert_eq!(dispatch(name, precision, Resolve).unwrap(), (name, precision));
        }
        assert_eq!(routines().count(), 14);
    }

    #[test]
    fn test_unknown_pairs_rejected() {
        for (name, precision) in [("lacgv", 's'), ("lacgv", 'd'), ("larfg", 'x'), ("getrf", 's')] {
            assert!(matches!(
                dispatch(name, precision, Resolve),
                Err(HarnessError::UnknownRoutine { .. })
            ));
        }
    }
}
