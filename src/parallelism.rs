//! Parallel execution hint for the feature dispatcher.

/// How the per-feature work of a histogram build may be scheduled.
///
/// The builder derives a hint from its `n_threads` parameter once, then
/// corrects it per call against the actual workload: a node with few
/// samples runs sequentially even when threads are available, because the
/// scatter loops finish faster than the fork.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    /// Strictly sequential execution, no task spawning.
    Sequential,
    /// Feature-parallel execution over up to `n` threads.
    Parallel(usize),
}

impl Parallelism {
    /// Minimum samples at a node before forking pays for itself.
    const MIN_SAMPLES_PARALLEL: usize = 1024;

    /// Minimum features to spread across threads.
    const MIN_FEATURES_PARALLEL: usize = 4;

    /// Build a hint from a thread count.
    ///
    /// `0` resolves to rayon's current pool size, `1` is sequential.
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        match n_threads {
            0 => Self::Parallel(rayon::current_num_threads()),
            1 => Self::Sequential,
            n => Self::Parallel(n),
        }
    }

    /// Whether parallel dispatch is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Self::Parallel(n) if n > 1)
    }

    /// Downgrade to sequential when the workload is too small to amortize
    /// the fork: few samples at the node, few features to spread, or a
    /// single-thread hint.
    #[inline]
    pub fn for_workload(self, n_samples: usize, n_features: usize) -> Self {
        if !self.is_parallel()
            || n_samples < Self::MIN_SAMPLES_PARALLEL
            || n_features < Self::MIN_FEATURES_PARALLEL
        {
            Self::Sequential
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_threads_resolves_zero_and_one() {
        assert_eq!(Parallelism::from_threads(1), Parallelism::Sequential);
        assert_eq!(Parallelism::from_threads(8), Parallelism::Parallel(8));
        assert!(matches!(
            Parallelism::from_threads(0),
            Parallelism::Parallel(_)
        ));
    }

    #[test]
    fn small_workloads_run_sequentially() {
        let par = Parallelism::Parallel(8);
        assert_eq!(par.for_workload(100, 50), Parallelism::Sequential);
        assert_eq!(par.for_workload(100_000, 2), Parallelism::Sequential);
        assert_eq!(par.for_workload(100_000, 50), Parallelism::Parallel(8));
        assert_eq!(
            Parallelism::Sequential.for_workload(100_000, 50),
            Parallelism::Sequential
        );
    }
}
