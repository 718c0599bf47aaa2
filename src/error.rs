//! Shared error types for histogram construction.

/// Errors reported by the builder before any kernel dispatch.
///
/// Every variant is detected up front; a failed call never surfaces a
/// partially filled histogram.
#[derive(Debug, thiserror::Error)]
pub enum HistogramError {
    #[error("n_bins must be in 1..=256, got {n_bins}")]
    InvalidBinCount { n_bins: usize },

    #[error("gradient slice has length {len}, expected {n_samples}")]
    GradientLengthMismatch { len: usize, n_samples: usize },

    #[error("hessian slice has length {len}, expected {n_samples}")]
    HessianLengthMismatch { len: usize, n_samples: usize },

    #[error("bin buffer has length {len}, expected {n_samples} samples x {n_features} features")]
    BinBufferLengthMismatch {
        len: usize,
        n_samples: usize,
        n_features: usize,
    },

    #[error("sample index {index} out of range for {n_samples} samples")]
    SampleIndexOutOfRange { index: u32, n_samples: usize },

    #[error("feature index {index} out of range for {n_features} features")]
    FeatureIndexOutOfRange { index: u32, n_features: usize },

    #[error("feature index {index} appears more than once in allowed features")]
    DuplicateAllowedFeature { index: u32 },

    #[error(
        "histogram shape mismatch: expected ({expected_features}, {expected_bins}), \
         got ({actual_features}, {actual_bins})"
    )]
    ShapeMismatch {
        expected_features: usize,
        expected_bins: usize,
        actual_features: usize,
        actual_bins: usize,
    },

    #[error("parent split info and parent histograms must be supplied together")]
    IncompleteParentContext,

    #[error("failed to allocate histogram of {n_features} x {n_bins} bins")]
    AllocationFailed { n_features: usize, n_bins: usize },
}
