//! Split descriptions consumed when reusing a parent histogram.
//!
//! The split finder and partitioner live outside this crate; the builder
//! only needs to know, for the feature the parent split on, which of the
//! parent's bins ended up in each child.

use crate::categorical::CatBitset;

/// Routing rule of a split, in bin space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SplitType {
    /// Numeric threshold split: bins `<= bin` go to the left child.
    Numerical { bin: u8 },
    /// Categorical membership split: bins in `left_bins` go to the left
    /// child.
    Categorical { left_bins: CatBitset },
}

/// The split that produced the node currently being built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitInfo {
    /// Feature the parent split on.
    pub feature: u32,
    /// Routing rule for that feature's bins.
    pub split_type: SplitType,
}

impl SplitInfo {
    /// Numeric split on `feature` with `bin` as the last bin going left.
    pub fn numerical(feature: u32, bin: u8) -> Self {
        Self {
            feature,
            split_type: SplitType::Numerical { bin },
        }
    }

    /// Categorical split on `feature` sending `left_bins` left.
    pub fn categorical(feature: u32, left_bins: CatBitset) -> Self {
        Self {
            feature,
            split_type: SplitType::Categorical { left_bins },
        }
    }
}
