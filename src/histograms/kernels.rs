//! Bin-accumulation kernels.
//!
//! Four variants of the same scatter-add over one contiguous feature
//! column: `{root, indexed} x {tracked Hessians, constant Hessians}`. The
//! root variants visit samples `0..k` directly; the indexed variants look
//! the sample up through `sample_indices` while reading gradients
//! sequentially from the pre-gathered ordered buffers.
//!
//! Each body processes four samples per iteration, loading the four bin
//! indices into separate scalars before issuing the accumulations. The
//! independent scatter targets are what lets the compiler overlap the
//! read-modify-writes; a scalar tail picks up the remaining `k % 4`
//! samples. The accumulation order is the plain index order, so every
//! variant matches [`accumulate_reference`] bit for bit.
//!
//! Callers validate bin and sample indices before dispatch; the loops
//! themselves only `debug_assert` and use unchecked indexing.

use super::BinRecord;

/// Root scan with tracked Hessians: sample `i` reads `grad[i]`/`hess[i]`.
pub fn accumulate_root(col: &[u8], grad: &[f32], hess: &[f32], row: &mut [BinRecord]) {
    debug_assert_eq!(col.len(), grad.len());
    debug_assert_eq!(col.len(), hess.len());

    let n = col.len();
    let unrolled = n - n % 4;
    let mut i = 0;
    while i < unrolled {
        // SAFETY: i + 3 < n and every bin index is < row.len() by the
        // builder's pre-dispatch validation.
        unsafe {
            let b0 = *col.get_unchecked(i) as usize;
            let b1 = *col.get_unchecked(i + 1) as usize;
            let b2 = *col.get_unchecked(i + 2) as usize;
            let b3 = *col.get_unchecked(i + 3) as usize;
            debug_assert!(b0 < row.len() && b1 < row.len() && b2 < row.len() && b3 < row.len());

            let slot = row.get_unchecked_mut(b0);
            slot.sum_gradients += *grad.get_unchecked(i);
            slot.sum_hessians += *hess.get_unchecked(i);
            slot.count += 1;

            let slot = row.get_unchecked_mut(b1);
            slot.sum_gradients += *grad.get_unchecked(i + 1);
            slot.sum_hessians += *hess.get_unchecked(i + 1);
            slot.count += 1;

            let slot = row.get_unchecked_mut(b2);
            slot.sum_gradients += *grad.get_unchecked(i + 2);
            slot.sum_hessians += *hess.get_unchecked(i + 2);
            slot.count += 1;

            let slot = row.get_unchecked_mut(b3);
            slot.sum_gradients += *grad.get_unchecked(i + 3);
            slot.sum_hessians += *hess.get_unchecked(i + 3);
            slot.count += 1;
        }
        i += 4;
    }
    for i in unrolled..n {
        // SAFETY: as above.
        unsafe {
            let bin = *col.get_unchecked(i) as usize;
            debug_assert!(bin < row.len());
            let slot = row.get_unchecked_mut(bin);
            slot.sum_gradients += *grad.get_unchecked(i);
            slot.sum_hessians += *hess.get_unchecked(i);
            slot.count += 1;
        }
    }
}

/// Root scan with constant Hessians: `sum_hessians` is never written.
pub fn accumulate_root_const_hess(col: &[u8], grad: &[f32], row: &mut [BinRecord]) {
    debug_assert_eq!(col.len(), grad.len());

    let n = col.len();
    let unrolled = n - n % 4;
    let mut i = 0;
    while i < unrolled {
        // SAFETY: i + 3 < n and bin indices are pre-validated.
        unsafe {
            let b0 = *col.get_unchecked(i) as usize;
            let b1 = *col.get_unchecked(i + 1) as usize;
            let b2 = *col.get_unchecked(i + 2) as usize;
            let b3 = *col.get_unchecked(i + 3) as usize;
            debug_assert!(b0 < row.len() && b1 < row.len() && b2 < row.len() && b3 < row.len());

            let slot = row.get_unchecked_mut(b0);
            slot.sum_gradients += *grad.get_unchecked(i);
            slot.count += 1;

            let slot = row.get_unchecked_mut(b1);
            slot.sum_gradients += *grad.get_unchecked(i + 1);
            slot.count += 1;

            let slot = row.get_unchecked_mut(b2);
            slot.sum_gradients += *grad.get_unchecked(i + 2);
            slot.count += 1;

            let slot = row.get_unchecked_mut(b3);
            slot.sum_gradients += *grad.get_unchecked(i + 3);
            slot.count += 1;
        }
        i += 4;
    }
    for i in unrolled..n {
        // SAFETY: as above.
        unsafe {
            let bin = *col.get_unchecked(i) as usize;
            debug_assert!(bin < row.len());
            let slot = row.get_unchecked_mut(bin);
            slot.sum_gradients += *grad.get_unchecked(i);
            slot.count += 1;
        }
    }
}

/// Indexed scan with tracked Hessians.
///
/// Sample `indices[i]` supplies the bin; `ordered_grad[i]` and
/// `ordered_hess[i]` supply the derivatives, already gathered into
/// partition order so both reads are sequential.
pub fn accumulate_indexed(
    col: &[u8],
    indices: &[u32],
    ordered_grad: &[f32],
    ordered_hess: &[f32],
    row: &mut [BinRecord],
) {
    debug_assert_eq!(indices.len(), ordered_grad.len());
    debug_assert_eq!(indices.len(), ordered_hess.len());

    let k = indices.len();
    let unrolled = k - k % 4;
    let mut i = 0;
    while i < unrolled {
        // SAFETY: i + 3 < k; sample indices are < col.len() and bin
        // indices < row.len() by the builder's pre-dispatch validation.
        unsafe {
            let b0 = *col.get_unchecked(*indices.get_unchecked(i) as usize) as usize;
            let b1 = *col.get_unchecked(*indices.get_unchecked(i + 1) as usize) as usize;
            let b2 = *col.get_unchecked(*indices.get_unchecked(i + 2) as usize) as usize;
            let b3 = *col.get_unchecked(*indices.get_unchecked(i + 3) as usize) as usize;
            debug_assert!(b0 < row.len() && b1 < row.len() && b2 < row.len() && b3 < row.len());

            let slot = row.get_unchecked_mut(b0);
            slot.sum_gradients += *ordered_grad.get_unchecked(i);
            slot.sum_hessians += *ordered_hess.get_unchecked(i);
            slot.count += 1;

            let slot = row.get_unchecked_mut(b1);
            slot.sum_gradients += *ordered_grad.get_unchecked(i + 1);
            slot.sum_hessians += *ordered_hess.get_unchecked(i + 1);
            slot.count += 1;

            let slot = row.get_unchecked_mut(b2);
            slot.sum_gradients += *ordered_grad.get_unchecked(i + 2);
            slot.sum_hessians += *ordered_hess.get_unchecked(i + 2);
            slot.count += 1;

            let slot = row.get_unchecked_mut(b3);
            slot.sum_gradients += *ordered_grad.get_unchecked(i + 3);
            slot.sum_hessians += *ordered_hess.get_unchecked(i + 3);
            slot.count += 1;
        }
        i += 4;
    }
    for i in unrolled..k {
        // SAFETY: as above.
        unsafe {
            let bin = *col.get_unchecked(*indices.get_unchecked(i) as usize) as usize;
            debug_assert!(bin < row.len());
            let slot = row.get_unchecked_mut(bin);
            slot.sum_gradients += *ordered_grad.get_unchecked(i);
            slot.sum_hessians += *ordered_hess.get_unchecked(i);
            slot.count += 1;
        }
    }
}

/// Indexed scan with constant Hessians.
pub fn accumulate_indexed_const_hess(
    col: &[u8],
    indices: &[u32],
    ordered_grad: &[f32],
    row: &mut [BinRecord],
) {
    debug_assert_eq!(indices.len(), ordered_grad.len());

    let k = indices.len();
    let unrolled = k - k % 4;
    let mut i = 0;
    while i < unrolled {
        // SAFETY: i + 3 < k; sample and bin indices are pre-validated.
        unsafe {
            let b0 = *col.get_unchecked(*indices.get_unchecked(i) as usize) as usize;
            let b1 = *col.get_unchecked(*indices.get_unchecked(i + 1) as usize) as usize;
            let b2 = *col.get_unchecked(*indices.get_unchecked(i + 2) as usize) as usize;
            let b3 = *col.get_unchecked(*indices.get_unchecked(i + 3) as usize) as usize;
            debug_assert!(b0 < row.len() && b1 < row.len() && b2 < row.len() && b3 < row.len());

            let slot = row.get_unchecked_mut(b0);
            slot.sum_gradients += *ordered_grad.get_unchecked(i);
            slot.count += 1;

            let slot = row.get_unchecked_mut(b1);
            slot.sum_gradients += *ordered_grad.get_unchecked(i + 1);
            slot.count += 1;

            let slot = row.get_unchecked_mut(b2);
            slot.sum_gradients += *ordered_grad.get_unchecked(i + 2);
            slot.count += 1;

            let slot = row.get_unchecked_mut(b3);
            slot.sum_gradients += *ordered_grad.get_unchecked(i + 3);
            slot.count += 1;
        }
        i += 4;
    }
    for i in unrolled..k {
        // SAFETY: as above.
        unsafe {
            let bin = *col.get_unchecked(*indices.get_unchecked(i) as usize) as usize;
            debug_assert!(bin < row.len());
            let slot = row.get_unchecked_mut(bin);
            slot.sum_gradients += *ordered_grad.get_unchecked(i);
            slot.count += 1;
        }
    }
}

/// Naive single-accumulator reference.
///
/// Retained for tests: it sums in the same index order as the unrolled
/// kernels, which therefore must match it bit for bit. `indices` of `None`
/// is the root scan; `hess` of `None` is constant-Hessian mode.
pub fn accumulate_reference(
    col: &[u8],
    indices: Option<&[u32]>,
    grad: &[f32],
    hess: Option<&[f32]>,
    row: &mut [BinRecord],
) {
    let k = indices.map_or(col.len(), <[u32]>::len);
    for i in 0..k {
        let sample = indices.map_or(i, |idx| idx[i] as usize);
        let bin = col[sample] as usize;
        row[bin].sum_gradients += grad[i];
        if let Some(hess) = hess {
            row[bin].sum_hessians += hess[i];
        }
        row[bin].count += 1;
    }
}
