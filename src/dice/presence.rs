use burn::prelude::*;

use crate::error::DiceError;

/// Folds per-sample scores into one batch scalar, ignoring samples without a mask.
///
/// Computes `sum(scores * has_mask) / (sum(has_mask) + smoothing)`, so the
/// result is the mean over the samples that actually carry a ground truth.
pub fn weight_and_reduce<B: Backend>(
    scores: Tensor<B, 1>,
    has_mask: Tensor<B, 1>,
    smoothing: f64,
) -> Result<f64, DiceError> {
    let [batch] = scores.dims();
    let [flags] = has_mask.dims();

    if batch != flags {
        return Err(DiceError::PresenceLengthMismatch { flags, batch });
    }

    let weighted = (scores * has_mask.clone()).sum();
    let present = has_mask.sum().add_scalar(smoothing);

    Ok((weighted / present).into_scalar().elem::<f64>())
}

/// Whether at least one sample of the batch carries a mask.
pub fn any_present<B: Backend>(has_mask: Tensor<B, 1>) -> bool {
    has_mask.sum().into_scalar().elem::<f64>() > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::TestBackend;

    #[test]
    fn absent_samples_do_not_dilute() {
        let device = Default::default();
        let scores = Tensor::<TestBackend, 1>::from_floats([0.8, 0.0, 0.4], &device);
        let has_mask = Tensor::<TestBackend, 1>::from_floats([1.0, 0.0, 1.0], &device);

        let value = weight_and_reduce(scores, has_mask, 1e-6).unwrap();

        assert!((value - 0.6).abs() < 1e-5);
    }

    #[test]
    fn batch_without_masks_reduces_to_zero() {
        let device = Default::default();
        let scores = Tensor::<TestBackend, 1>::from_floats([0.8, 0.3], &device);
        let has_mask = Tensor::<TestBackend, 1>::zeros([2], &device);

        let value = weight_and_reduce(scores, has_mask.clone(), 1e-6).unwrap();

        assert_eq!(value, 0.0);
        assert!(!any_present(has_mask));
    }

    #[test]
    fn flag_count_must_match_batch() {
        let device = Default::default();
        let scores = Tensor::<TestBackend, 1>::from_floats([0.8, 0.3], &device);
        let has_mask = Tensor::<TestBackend, 1>::ones([3], &device);

        let err = weight_and_reduce(scores, has_mask, 1e-6).unwrap_err();

        assert_eq!(err, DiceError::PresenceLengthMismatch { flags: 3, batch: 2 });
    }
}
