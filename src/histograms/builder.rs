//! Histogram builder façade: validation, gradient gathering, dispatch.

use rayon::prelude::*;

use crate::data::BinnedMatrix;
use crate::error::HistogramError;
use crate::parallelism::Parallelism;
use crate::split::SplitInfo;

use super::{kernels, ops, BinRecord, Histogram};

/// Builds per-feature histograms for tree nodes.
///
/// Owns borrowed views of the binned matrix and the gradient/Hessian
/// vectors for the current boosting iteration, plus the ordered-gradient
/// scratch buffers reused across nodes. Shape parameters (`n_bins`,
/// feature count, precision) and the thread hint are fixed for the
/// builder's lifetime.
///
/// All argument validation happens here, before dispatch; once a kernel
/// runs, the call can no longer fail, so a returned error never comes with
/// a partially filled histogram.
pub struct HistogramBuilder<'a> {
    x_binned: &'a BinnedMatrix,
    n_bins: usize,
    gradients: &'a [f32],
    hessians: &'a [f32],
    hessians_are_constant: bool,
    parallelism: Parallelism,
    /// Gradients of the node's samples, gathered into partition order so
    /// the kernels read them sequentially.
    ordered_gradients: Vec<f32>,
    /// Same for Hessians; stays empty in constant-Hessian mode.
    ordered_hessians: Vec<f32>,
}

impl<'a> HistogramBuilder<'a> {
    /// Create a builder for one boosting iteration.
    ///
    /// `hessians` must have one entry per sample, or exactly one entry
    /// when `hessians_are_constant` (the caller supplies the constant to
    /// downstream consumers itself; the kernels never read it).
    /// `n_threads` of `0` means "use rayon's pool size", `1` forces
    /// sequential execution.
    pub fn new(
        x_binned: &'a BinnedMatrix,
        n_bins: usize,
        gradients: &'a [f32],
        hessians: &'a [f32],
        hessians_are_constant: bool,
        n_threads: usize,
    ) -> Result<Self, HistogramError> {
        let n_samples = x_binned.n_samples();
        if n_bins == 0 || n_bins > 256 {
            return Err(HistogramError::InvalidBinCount { n_bins });
        }
        if gradients.len() != n_samples {
            return Err(HistogramError::GradientLengthMismatch {
                len: gradients.len(),
                n_samples,
            });
        }
        let expected_hessians = if hessians_are_constant { 1 } else { n_samples };
        if hessians.len() != expected_hessians {
            return Err(HistogramError::HessianLengthMismatch {
                len: hessians.len(),
                n_samples: expected_hessians,
            });
        }

        // Bin values out of range are a binning bug, not caller input;
        // checked once here in debug builds, elided on the hot path.
        #[cfg(debug_assertions)]
        for feature in 0..x_binned.n_features() {
            for &bin in x_binned.column(feature) {
                assert!(
                    (bin as usize) < n_bins,
                    "bin {bin} out of range for {n_bins} bins in feature {feature}"
                );
            }
        }

        let ordered_hessians = if hessians_are_constant {
            Vec::new()
        } else {
            Vec::with_capacity(n_samples)
        };

        Ok(Self {
            x_binned,
            n_bins,
            gradients,
            hessians,
            hessians_are_constant,
            parallelism: Parallelism::from_threads(n_threads),
            ordered_gradients: Vec::with_capacity(n_samples),
            ordered_hessians,
        })
    }

    /// Number of bins per feature row.
    #[inline]
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Whether the loss has a constant Hessian this iteration.
    #[inline]
    pub fn hessians_are_constant(&self) -> bool {
        self.hessians_are_constant
    }

    /// Build histograms by scanning the node's samples.
    ///
    /// `sample_indices` lists the samples at the node; an empty slice (or
    /// the identity permutation) selects the root path, which scans every
    /// sample without indirection and without gathering. Any other index
    /// list first gathers gradients into partition order.
    ///
    /// `allowed_features`, when present, selects which feature rows get
    /// built; the remaining rows of the result stay zero.
    ///
    /// `parent_split` and `parent_histograms` must be passed together.
    /// When present, the feature the parent split on is rebuilt from the
    /// parent's row ([`ops::inherit_split_row`]) instead of rescanning
    /// samples; `is_left_child` says which side of that split this node
    /// is.
    pub fn compute_brute(
        &mut self,
        sample_indices: &[u32],
        allowed_features: Option<&[u32]>,
        parent_split: Option<&SplitInfo>,
        parent_histograms: Option<&Histogram>,
        is_left_child: bool,
    ) -> Result<Histogram, HistogramError> {
        let n_samples = self.x_binned.n_samples();
        let n_features = self.x_binned.n_features();

        let parent = match (parent_split, parent_histograms) {
            (Some(split), Some(histograms)) => {
                self.check_shape(histograms)?;
                if split.feature as usize >= n_features {
                    return Err(HistogramError::FeatureIndexOutOfRange {
                        index: split.feature,
                        n_features,
                    });
                }
                Some((split, histograms))
            }
            (None, None) => None,
            _ => return Err(HistogramError::IncompleteParentContext),
        };

        self.validate_allowed_features(allowed_features)?;

        // Sample indices come from the node partitioner and are in range
        // by construction; validated here once in debug builds only.
        if cfg!(debug_assertions) {
            for &index in sample_indices {
                if index as usize >= n_samples {
                    return Err(HistogramError::SampleIndexOutOfRange { index, n_samples });
                }
            }
        }

        // A permutation of all samples that is not the identity still has
        // to go through the gather; only true natural order may skip it.
        let at_root = sample_indices.is_empty() || is_identity(sample_indices, n_samples);
        if !at_root {
            self.gather_ordered(sample_indices);
        }

        let mut histogram = Histogram::zeroed(n_features, self.n_bins)?;

        let k = if at_root { n_samples } else { sample_indices.len() };
        let (ordered_grad, ordered_hess): (&[f32], &[f32]) = if at_root {
            (self.gradients, self.hessians)
        } else if self.hessians_are_constant {
            (&self.ordered_gradients[..k], &[])
        } else {
            (&self.ordered_gradients[..k], &self.ordered_hessians[..k])
        };

        let x_binned = self.x_binned;
        let hessians_are_constant = self.hessians_are_constant;

        let build_row = |feature: u32, row: &mut [BinRecord]| {
            if let Some((split, parent_histograms)) = parent {
                if split.feature == feature {
                    ops::inherit_split_row(
                        row,
                        parent_histograms.row(feature as usize),
                        &split.split_type,
                        is_left_child,
                    );
                    return;
                }
            }
            let col = x_binned.column(feature as usize);
            match (at_root, hessians_are_constant) {
                (true, false) => kernels::accumulate_root(col, ordered_grad, ordered_hess, row),
                (true, true) => kernels::accumulate_root_const_hess(col, ordered_grad, row),
                (false, false) => {
                    kernels::accumulate_indexed(col, sample_indices, ordered_grad, ordered_hess, row)
                }
                (false, true) => {
                    kernels::accumulate_indexed_const_hess(col, sample_indices, ordered_grad, row)
                }
            }
        };

        let n_allowed = allowed_features.map_or(n_features, <[u32]>::len);
        let parallelism = self.parallelism.for_workload(k, n_allowed);
        dispatch_rows(&mut histogram, allowed_features, parallelism, build_row);
        Ok(histogram)
    }

    /// Build histograms as `parent - sibling`, per allowed feature and
    /// bin.
    ///
    /// O(`n_bins`) per feature and never touches the binned matrix. The
    /// caller is expected to brute-build the smaller sibling and derive
    /// the larger one here.
    pub fn compute_subtraction(
        &self,
        parent_histograms: &Histogram,
        sibling_histograms: &Histogram,
        allowed_features: Option<&[u32]>,
    ) -> Result<Histogram, HistogramError> {
        self.check_shape(parent_histograms)?;
        self.check_shape(sibling_histograms)?;
        self.validate_allowed_features(allowed_features)?;

        let n_features = self.x_binned.n_features();
        let mut histogram = Histogram::zeroed(n_features, self.n_bins)?;

        // Workload per feature is n_bins, not the node's sample count, so
        // this nearly always runs sequentially.
        let n_allowed = allowed_features.map_or(n_features, <[u32]>::len);
        let parallelism = self.parallelism.for_workload(self.n_bins, n_allowed);
        dispatch_rows(&mut histogram, allowed_features, parallelism, |feature, row| {
            ops::subtract_row(
                row,
                parent_histograms.row(feature as usize),
                sibling_histograms.row(feature as usize),
            );
        });
        Ok(histogram)
    }

    fn check_shape(&self, histogram: &Histogram) -> Result<(), HistogramError> {
        let expected = (self.x_binned.n_features(), self.n_bins);
        if histogram.shape() != expected {
            return Err(HistogramError::ShapeMismatch {
                expected_features: expected.0,
                expected_bins: expected.1,
                actual_features: histogram.n_features(),
                actual_bins: histogram.n_bins(),
            });
        }
        Ok(())
    }

    /// Range- and duplicate-check the allowed list. The duplicate check
    /// is what makes the parallel dispatch's disjoint-row carve-out
    /// sound.
    fn validate_allowed_features(
        &self,
        allowed_features: Option<&[u32]>,
    ) -> Result<(), HistogramError> {
        let Some(features) = allowed_features else {
            return Ok(());
        };
        let n_features = self.x_binned.n_features();
        let mut seen = vec![false; n_features];
        for &index in features {
            if index as usize >= n_features {
                return Err(HistogramError::FeatureIndexOutOfRange { index, n_features });
            }
            if seen[index as usize] {
                return Err(HistogramError::DuplicateAllowedFeature { index });
            }
            seen[index as usize] = true;
        }
        Ok(())
    }

    /// Fill the ordered buffers with the node's gradients (and Hessians,
    /// unless constant) in partition order.
    fn gather_ordered(&mut self, sample_indices: &[u32]) {
        let k = sample_indices.len();
        let gradients = self.gradients;

        self.ordered_gradients.clear();
        self.ordered_gradients.reserve(k);
        // SAFETY: capacity >= k was just ensured, and sample indices are
        // in range (partitioner invariant, checked in debug builds).
        unsafe {
            self.ordered_gradients.set_len(k);
            let out = self.ordered_gradients.as_mut_ptr();
            for i in 0..k {
                let sample = *sample_indices.get_unchecked(i) as usize;
                *out.add(i) = *gradients.get_unchecked(sample);
            }
        }

        if !self.hessians_are_constant {
            let hessians = self.hessians;
            self.ordered_hessians.clear();
            self.ordered_hessians.reserve(k);
            // SAFETY: as above.
            unsafe {
                self.ordered_hessians.set_len(k);
                let out = self.ordered_hessians.as_mut_ptr();
                for i in 0..k {
                    let sample = *sample_indices.get_unchecked(i) as usize;
                    *out.add(i) = *hessians.get_unchecked(sample);
                }
            }
        }
    }
}

/// Whether `indices` is exactly `0, 1, ..., n_samples - 1`.
///
/// One linear compare, cheaper than the gather it makes redundant.
fn is_identity(indices: &[u32], n_samples: usize) -> bool {
    indices.len() == n_samples
        && indices
            .iter()
            .enumerate()
            .all(|(i, &sample)| sample as usize == i)
}

/// Wrapper making the histogram base pointer Send + Sync for the
/// disjoint-row dispatch.
#[derive(Clone, Copy)]
struct RowsPtr(*mut BinRecord);

// SAFETY: every task dereferences a distinct feature row; the allowed-list
// validation rejects duplicates before dispatch.
unsafe impl Send for RowsPtr {}
unsafe impl Sync for RowsPtr {}

/// Run `build_row` over every selected feature row, sequentially or
/// feature-parallel.
///
/// Each task receives a non-overlapping sub-slice of the output, so
/// parallel mode needs no synchronization on writes. Rows not selected by
/// `allowed` keep their allocation-time zeros.
fn dispatch_rows<F>(
    histogram: &mut Histogram,
    allowed: Option<&[u32]>,
    parallelism: Parallelism,
    build_row: F,
) where
    F: Fn(u32, &mut [BinRecord]) + Sync,
{
    let n_bins = histogram.n_bins();
    match allowed {
        None => {
            if parallelism.is_parallel() {
                histogram
                    .bins
                    .par_chunks_mut(n_bins)
                    .enumerate()
                    .for_each(|(feature, row)| build_row(feature as u32, row));
            } else {
                for (feature, row) in histogram.bins.chunks_mut(n_bins).enumerate() {
                    build_row(feature as u32, row);
                }
            }
        }
        Some(features) => {
            if parallelism.is_parallel() {
                let base = RowsPtr(histogram.bins.as_mut_ptr());
                features.par_iter().for_each(|&feature| {
                    // Force capture of the whole `RowsPtr` (not just its
                    // `.0` field) so the Send/Sync impls on the wrapper
                    // apply; edition-2021 disjoint closure capture would
                    // otherwise capture the raw pointer field directly.
                    let base = base;
                    // SAFETY: feature indices are validated in range and
                    // duplicate-free, so rows are disjoint across tasks.
                    let row = unsafe {
                        std::slice::from_raw_parts_mut(
                            base.0.add(feature as usize * n_bins),
                            n_bins,
                        )
                    };
                    build_row(feature, row);
                });
            } else {
                for &feature in features {
                    build_row(feature, histogram.row_mut(feature as usize));
                }
            }
        }
    }
}
