//! Run configuration.
//!
//! A [`RunConfig`] is built once, before the orchestrator starts, and is never
//! mutated afterwards. Every mode flag a case consults lives here.

use core::num::NonZeroUsize;

use crate::arguments::Arguments;
use crate::init::DEFAULT_SEED;
use crate::metric::{MatrixNorm, NormSpec, VectorNorm};
use crate::tolerance::ToleranceMode;
use crate::{HarnessError, HarnessResult};

/// Mode flags and iteration counts for one orchestrator run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Compare the error against the tolerance.
    pub unit_check: bool,
    /// Compute the error and report it.
    pub norm_check: bool,
    /// Measure and report timings.
    pub timing: bool,
    /// Performance-only mode: skip the host timing and print a compact line.
    pub perf: bool,
    /// Report the scratch memory size and stop.
    pub mem_query: bool,
    /// Timed device invocations.
    pub hot_calls: NonZeroUsize,
    /// Untimed warm-up invocations before the hot loop.
    pub cold_calls: usize,
    /// Profiling depth during the hot loop; 0 disables profiling.
    pub profile: u32,
    /// Also profile individual kernels.
    pub profile_kernels: bool,
    /// Tolerance multiplier.
    pub tolerance: ToleranceMode,
    /// Base seed mixed with each case identity.
    pub seed: u64,
    /// Vector norm override.
    pub vector_norm: Option<VectorNorm>,
    /// Matrix norm override.
    pub matrix_norm: Option<MatrixNorm>,
}

const DEFAULT_HOT_CALLS: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(n) => n,
    None => unreachable!(),
};

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            unit_check: true,
            norm_check: false,
            timing: false,
            perf: false,
            mem_query: false,
            hot_calls: DEFAULT_HOT_CALLS,
            cold_calls: 2,
            profile: 0,
            profile_kernels: false,
            tolerance: ToleranceMode::Strict,
            seed: DEFAULT_SEED,
            vector_norm: None,
            matrix_norm: None,
        }
    }
}

impl RunConfig {
    /// Configuration for benchmarking: errors and timings reported, no
    /// pass/fail check.
    pub fn bench() -> Self {
        Self {
            unit_check: false,
            norm_check: true,
            timing: true,
            ..Self::default()
        }
    }

    /// Read the run flags from named parameters, consuming them.
    ///
    /// Recognized keys: `unit_check`, `norm_check`, `timing`, `perf`,
    /// `mem_query`, `iters`, `cold_calls`, `profile`, `profile_kernels`,
    /// `tolerance`, `seed`, `vector_norm`, `matrix_norm`.
    pub fn from_arguments(args: &mut Arguments) -> HarnessResult<Self> {
        let defaults = Self::default();
        let iters: usize = args.get_or("iters", defaults.hot_calls.get())?;
        let hot_calls = NonZeroUsize::new(iters).ok_or_else(|| HarnessError::InvalidArgument {
            name: "iters".to_string(),
            value: iters.to_string(),
            reason: "at least one hot call is required".to_string(),
        })?;

        Ok(Self {
            unit_check: args.flag("unit_check", defaults.unit_check)?,
            norm_check: args.flag("norm_check", defaults.norm_check)?,
            timing: args.flag("timing", defaults.timing)?,
            perf: args.flag("perf", defaults.perf)?,
            mem_query: args.flag("mem_query", defaults.mem_query)?,
            hot_calls,
            cold_calls: args.get_or("cold_calls", defaults.cold_calls)?,
            profile: args.get_or("profile", defaults.profile)?,
            profile_kernels: args.flag("profile_kernels", defaults.profile_kernels)?,
            tolerance: args.get_or("tolerance", defaults.tolerance)?,
            seed: args.get_or("seed", defaults.seed)?,
            vector_norm: args.try_get("vector_norm")?,
            matrix_norm: args.try_get("matrix_norm")?,
        })
    }

    /// True when the dual executor has to run.
    pub fn correctness(&self) -> bool {
        self.unit_check || self.norm_check
    }

    /// A routine's default norms with this run's overrides applied.
    pub fn norm_for(&self, default: NormSpec) -> NormSpec {
        NormSpec {
            vector: self.vector_norm.unwrap_or(default.vector),
            matrix: self.matrix_norm.unwrap_or(default.matrix),
        }
    }

    /// Set timing.
    #[must_use]
    pub fn with_timing(mut self, timing: bool) -> Self {
        self.timing = timing;
        self
    }

    /// Set performance-only mode.
    #[must_use]
    pub fn with_perf(mut self, perf: bool) -> Self {
        self.perf = perf;
        self
    }

    /// Set query-only mode.
    #[must_use]
    pub fn with_mem_query(mut self, mem_query: bool) -> Self {
        self.mem_query = mem_query;
        self
    }

    /// Set the number of hot calls.
    #[must_use]
    pub fn with_hot_calls(mut self, hot_calls: NonZeroUsize) -> Self {
        self.hot_calls = hot_calls;
        self
    }

    /// Set profiling depth and kernel profiling.
    #[must_use]
    pub fn with_profile(mut self, levels: u32, kernels: bool) -> Self {
        self.profile = levels;
        self.profile_kernels = kernels;
        self
    }

    /// Set the tolerance mode.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: ToleranceMode) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the base seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
