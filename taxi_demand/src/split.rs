//! Chronological train/test split of a count series

use crate::aggregation::CountSeries;
use crate::error::{DemandError, Result};

/// A series cut in two at one position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit<T> {
    /// Earlier points
    pub train: CountSeries<T>,
    /// The last `test_size` points
    pub test: CountSeries<T>,
}

/// Split a sorted series into the first `len - test_size` points and the
/// last `test_size` points.
///
/// The cut is positional; dates are never compared or computed. Both parts
/// must be non-empty.
pub fn train_test_split<T: Ord + Copy>(
    series: &CountSeries<T>,
    test_size: usize,
) -> Result<TrainTestSplit<T>> {
    let len = series.len();
    if test_size == 0 || test_size >= len {
        return Err(DemandError::InvalidSplitSize { test_size, len });
    }

    let cut = len - test_size;
    Ok(TrainTestSplit {
        train: series.slice(0, cut),
        test: series.slice(cut, len),
    })
}
