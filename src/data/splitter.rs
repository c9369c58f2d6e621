// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Splits one entity's series into a training prefix and a
// validation suffix:
//   - Training set:   used to update model weights
//   - Validation set: used to measure performance on later,
//                     unseen data
//
// Why no shuffle?
//   This is a time series. Shuffling before splitting would let
//   the model train on days that come *after* the validation
//   days, which leaks the future into training. The cut is
//   therefore purely positional:
//
//     cutoff = floor(split_fraction * len)
//     train  = series[..cutoff]
//     val    = series[cutoff..]
//
// Windows are generated separately inside each half, so no
// window can straddle the cutoff.

use crate::domain::error::PipelineError;

/// Index at which the validation part starts
pub fn split_index(len: usize, split_fraction: f64) -> Result<usize, PipelineError> {
    if !(0.0..=1.0).contains(&split_fraction) {
        return Err(PipelineError::InvalidSplitFraction(split_fraction));
    }
    let cutoff = (split_fraction * len as f64).floor() as usize;
    Ok(cutoff.min(len))
}

/// Split `series` chronologically into (train, validation).
pub fn split_train_val<T>(series: &[T], split_fraction: f64) -> Result<(&[T], &[T]), PipelineError> {
    let cutoff = split_index(series.len(), split_fraction)?;
    Ok(series.split_at(cutoff))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val)      = split_train_val(&items, 0.8).unwrap();
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(),   20);
    }

    #[test]
    fn test_cutoff_is_floored() {
        // 0.8 * 7 = 5.6 → 5
        assert_eq!(split_index(7, 0.8).unwrap(), 5);
        assert_eq!(split_index(499, 0.8).unwrap(), 399);
    }

    #[test]
    fn test_order_is_preserved() {
        let items: Vec<usize> = (0..10).collect();
        let (train, val)      = split_train_val(&items, 0.5).unwrap();
        assert_eq!(train, &[0, 1, 2, 3, 4]);
        assert_eq!(val,   &[5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_empty_series() {
        let items: Vec<usize> = Vec::new();
        let (train, val)      = split_train_val(&items, 0.8).unwrap();
        assert!(train.is_empty());
        assert!(val.is_empty());
    }

    #[test]
    fn test_full_training_split() {
        let items: Vec<usize> = (0..10).collect();
        let (train, val)      = split_train_val(&items, 1.0).unwrap();
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }

    #[test]
    fn test_rejects_out_of_range_fraction() {
        assert_eq!(split_index(10, 1.5), Err(PipelineError::InvalidSplitFraction(1.5)));
        assert!(split_index(10, -0.1).is_err());
        assert!(split_index(10, f64::NAN).is_err());
    }
}
