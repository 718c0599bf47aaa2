//! Column-major binned feature matrix.

use crate::error::HistogramError;

/// Read-only matrix of bin indices, shape `(n_samples, n_features)`.
///
/// Storage is column-major: each feature's bins form one contiguous `u8`
/// run, `[f0_s0, f0_s1, ..., f0_sN, f1_s0, ...]`. The accumulation kernels
/// rely on this: a row-major layout would turn every column scan into a
/// strided walk and roughly halve throughput, so the layout is part of the
/// constructor contract rather than an internal detail.
#[derive(Clone, Debug)]
pub struct BinnedMatrix {
    bins: Box<[u8]>,
    n_samples: usize,
    n_features: usize,
}

impl BinnedMatrix {
    /// Wrap a column-major bin buffer.
    ///
    /// `bins` must hold `n_samples * n_features` entries with each feature
    /// column contiguous.
    pub fn from_column_major(
        bins: Vec<u8>,
        n_samples: usize,
        n_features: usize,
    ) -> Result<Self, HistogramError> {
        let expected = n_samples
            .checked_mul(n_features)
            .ok_or(HistogramError::BinBufferLengthMismatch {
                len: bins.len(),
                n_samples,
                n_features,
            })?;
        if bins.len() != expected {
            return Err(HistogramError::BinBufferLengthMismatch {
                len: bins.len(),
                n_samples,
                n_features,
            });
        }
        Ok(Self {
            bins: bins.into_boxed_slice(),
            n_samples,
            n_features,
        })
    }

    /// Build from per-feature columns, all of equal length.
    pub fn from_columns(columns: &[Vec<u8>]) -> Result<Self, HistogramError> {
        let n_features = columns.len();
        let n_samples = columns.first().map_or(0, Vec::len);
        // Shape validation, overflow of `n_samples * n_features`
        // included, happens in `from_column_major`.
        let mut bins = Vec::new();
        for column in columns {
            if column.len() != n_samples {
                return Err(HistogramError::BinBufferLengthMismatch {
                    len: column.len(),
                    n_samples,
                    n_features,
                });
            }
            bins.extend_from_slice(column);
        }
        Self::from_column_major(bins, n_samples, n_features)
    }

    /// Number of samples (rows).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Number of features (columns).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Contiguous bin column for one feature.
    #[inline]
    pub fn column(&self, feature: usize) -> &[u8] {
        debug_assert!(feature < self.n_features);
        let start = feature * self.n_samples;
        &self.bins[start..start + self.n_samples]
    }

    /// Bin index of one sample for one feature.
    #[inline]
    pub fn get(&self, sample: usize, feature: usize) -> u8 {
        self.bins[feature * self.n_samples + sample]
    }
}
