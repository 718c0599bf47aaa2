//! O(bins) histogram row operations.
//!
//! Both operations here replace a full sample scan for one feature row:
//! [`subtract_row`] derives a sibling from its parent and the other
//! sibling, and [`inherit_split_row`] rebuilds the one feature the parent
//! split on by masking the parent's bins.

use crate::split::SplitType;

use super::BinRecord;

/// Per-bin `parent - sibling` into `out`.
///
/// This is the only place histogram values can go negative: gradient and
/// Hessian sums may cancel to a tiny negative instead of exactly zero, and
/// consumers must tolerate that. Counts subtract exactly; the sibling
/// invariant guarantees no underflow.
pub fn subtract_row(out: &mut [BinRecord], parent: &[BinRecord], sibling: &[BinRecord]) {
    debug_assert_eq!(out.len(), parent.len());
    debug_assert_eq!(out.len(), sibling.len());

    for ((out, parent), sibling) in out.iter_mut().zip(parent).zip(sibling) {
        debug_assert!(parent.count >= sibling.count);
        out.sum_gradients = parent.sum_gradients - sibling.sum_gradients;
        out.sum_hessians = parent.sum_hessians - sibling.sum_hessians;
        out.count = parent.count - sibling.count;
    }
}

/// Rebuild the split feature's row of a child from the parent's row.
///
/// Every sample of this child fell, on the split feature, into exactly the
/// bins the split rule routed to this side, so those bins copy over
/// verbatim and all the others are zero. Numeric splits keep the
/// contiguous range `[0, bin]` (left) or `[bin + 1, n_bins)` (right);
/// categorical splits keep the bins whose bitset membership matches the
/// side.
pub fn inherit_split_row(
    out: &mut [BinRecord],
    parent: &[BinRecord],
    split_type: &SplitType,
    is_left_child: bool,
) {
    debug_assert_eq!(out.len(), parent.len());

    out.fill(BinRecord::default());
    match split_type {
        SplitType::Numerical { bin } => {
            let boundary = (*bin as usize + 1).min(out.len());
            let (start, end) = if is_left_child {
                (0, boundary)
            } else {
                (boundary, out.len())
            };
            out[start..end].copy_from_slice(&parent[start..end]);
        }
        SplitType::Categorical { left_bins } => {
            for (bin, (out, parent)) in out.iter_mut().zip(parent).enumerate() {
                if left_bins.contains(bin as u8) == is_left_child {
                    *out = *parent;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorical::CatBitset;

    fn record(grad: f32, hess: f32, count: u32) -> BinRecord {
        BinRecord {
            sum_gradients: grad,
            sum_hessians: hess,
            count,
        }
    }

    #[test]
    fn subtract_all_three_fields() {
        let parent = vec![record(10.0, 5.0, 8), record(4.0, 2.0, 3)];
        let sibling = vec![record(3.0, 2.5, 5), record(4.0, 2.0, 3)];
        let mut out = vec![BinRecord::default(); 2];

        subtract_row(&mut out, &parent, &sibling);

        assert_eq!(out[0], record(7.0, 2.5, 3));
        assert_eq!(out[1], record(0.0, 0.0, 0));
    }

    #[test]
    fn numeric_inherit_keeps_left_range() {
        let parent: Vec<BinRecord> = (0..5).map(|b| record(b as f32, 1.0, b + 1)).collect();
        let split = SplitType::Numerical { bin: 1 };

        let mut left = vec![record(9.0, 9.0, 9); 5];
        inherit_split_row(&mut left, &parent, &split, true);
        assert_eq!(&left[..2], &parent[..2]);
        assert!(left[2..].iter().all(|b| *b == BinRecord::default()));

        let mut right = vec![record(9.0, 9.0, 9); 5];
        inherit_split_row(&mut right, &parent, &split, false);
        assert!(right[..2].iter().all(|b| *b == BinRecord::default()));
        assert_eq!(&right[2..], &parent[2..]);
    }

    #[test]
    fn numeric_inherit_with_boundary_at_last_bin() {
        let parent: Vec<BinRecord> = (0..3).map(|b| record(b as f32, 0.0, 1)).collect();
        let split = SplitType::Numerical { bin: 2 };

        let mut left = vec![BinRecord::default(); 3];
        inherit_split_row(&mut left, &parent, &split, true);
        assert_eq!(left, parent);

        let mut right = vec![record(1.0, 1.0, 1); 3];
        inherit_split_row(&mut right, &parent, &split, false);
        assert!(right.iter().all(|b| *b == BinRecord::default()));
    }

    #[test]
    fn categorical_inherit_masks_by_membership() {
        let parent: Vec<BinRecord> = (0..4).map(|b| record(b as f32 + 1.0, 0.5, 2)).collect();
        let split = SplitType::Categorical {
            left_bins: CatBitset::from_bins([0u8, 2]),
        };

        let mut left = vec![BinRecord::default(); 4];
        inherit_split_row(&mut left, &parent, &split, true);
        assert_eq!(left[0], parent[0]);
        assert_eq!(left[1], BinRecord::default());
        assert_eq!(left[2], parent[2]);
        assert_eq!(left[3], BinRecord::default());

        let mut right = vec![BinRecord::default(); 4];
        inherit_split_row(&mut right, &parent, &split, false);
        assert_eq!(right[0], BinRecord::default());
        assert_eq!(right[1], parent[1]);
        assert_eq!(right[2], BinRecord::default());
        assert_eq!(right[3], parent[3]);
    }
}
