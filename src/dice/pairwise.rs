use burn::prelude::*;
use derive_new::new;

use crate::error::DiceError;

/// Hard-thresholded Dice coefficient between two batches of masks.
///
/// Both inputs are binarized with the same strict `value > threshold` rule,
/// every non-batch dimension is flattened, and each sample gets
///
/// ```text
/// dice = 2 * |P ∩ T| / (sum(P^p) + sum(T^p) + smoothing)
/// ```
///
/// An empty prediction paired with an empty target scores `0`, not `1`:
/// the smoothing term only keeps the denominator away from zero.
#[derive(new, Debug, Clone, PartialEq)]
pub struct PairwiseDice {
    pub threshold: f64,
    pub p: u32,
    pub smoothing: f64,
}

impl Default for PairwiseDice {
    fn default() -> Self {
        Self::new(0.5, 1, 1e-6)
    }
}

impl PairwiseDice {
    /// Per-sample Dice scores with shape `[batch_size]`.
    ///
    /// # Shapes
    ///
    /// - predictions: `[batch_size, ...]` raw scores
    /// - targets: `[batch_size, ...]` with the same number of elements per sample
    pub fn score<B: Backend, const D: usize>(
        &self,
        predictions: Tensor<B, D>,
        targets: Tensor<B, D>,
    ) -> Result<Tensor<B, 1>, DiceError> {
        check_batch(&predictions.dims(), &targets.dims())?;

        let predictions = self.binarize(flatten(predictions));
        let targets = self.binarize(flatten(targets));

        self.score_binary(predictions, targets)
    }

    /// Per-sample Dice scores for already flattened and binarized `[batch_size, n]` inputs.
    pub(crate) fn score_binary<B: Backend>(
        &self,
        predictions: Tensor<B, 2>,
        targets: Tensor<B, 2>,
    ) -> Result<Tensor<B, 1>, DiceError> {
        let [batch_size, pred_elems] = predictions.dims();
        let [_, target_elems] = targets.dims();

        if pred_elems != target_elems {
            return Err(DiceError::SampleSizeMismatch {
                predictions: pred_elems,
                targets: target_elems,
            });
        }

        let intersection = (predictions.clone() * targets.clone())
            .sum_dim(1)
            .reshape([batch_size]);

        let denominator = predictions.powf_scalar(self.p as f32).sum_dim(1)
            + targets.powf_scalar(self.p as f32).sum_dim(1);
        let denominator = denominator.reshape([batch_size]);

        Ok(intersection.mul_scalar(2.0) / denominator.add_scalar(self.smoothing))
    }

    /// `1.0` where `value > threshold`, `0.0` elsewhere (the boundary is excluded).
    pub(crate) fn binarize<B: Backend>(&self, tensor: Tensor<B, 2>) -> Tensor<B, 2> {
        tensor.greater_elem(self.threshold).float()
    }
}

/// Collapses every non-batch dimension: `[batch_size, ...] -> [batch_size, n]`.
pub(crate) fn flatten<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Tensor<B, 2> {
    let dims = tensor.dims();
    let per_sample: usize = dims[1..].iter().product();

    tensor.reshape([dims[0], per_sample])
}

pub(crate) fn check_batch(predictions: &[usize], targets: &[usize]) -> Result<(), DiceError> {
    if predictions[0] != targets[0] {
        return Err(DiceError::BatchSizeMismatch {
            predictions: predictions[0],
            targets: targets[0],
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::TestBackend;

    fn scores(tensor: Tensor<TestBackend, 1>) -> Vec<f32> {
        tensor.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn perfect_overlap_scores_one() {
        let device = Default::default();
        let preds = Tensor::<TestBackend, 2>::from_floats([[0.9, 0.2, 0.7, 0.1]], &device);
        let target = Tensor::<TestBackend, 2>::from_floats([[1.0, 0.0, 1.0, 0.0]], &device);

        let dice = scores(PairwiseDice::default().score(preds, target).unwrap());

        assert!((dice[0] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn disjoint_masks_score_zero() {
        let device = Default::default();
        let preds = Tensor::<TestBackend, 2>::from_floats([[0.9, 0.8, 0.1, 0.1]], &device);
        let target = Tensor::<TestBackend, 2>::from_floats([[0.0, 0.0, 1.0, 1.0]], &device);

        let dice = scores(PairwiseDice::default().score(preds, target).unwrap());

        assert!(dice[0].abs() < 1e-6);
    }

    #[test]
    fn partial_overlap_per_sample() {
        let device = Default::default();
        let preds = Tensor::<TestBackend, 3>::from_floats(
            [[[1.0, 1.0], [0.0, 0.0]], [[1.0, 1.0], [1.0, 1.0]]],
            &device,
        );
        let target = Tensor::<TestBackend, 3>::from_floats(
            [[[1.0, 0.0], [1.0, 0.0]], [[1.0, 1.0], [1.0, 1.0]]],
            &device,
        );

        let dice = scores(PairwiseDice::default().score(preds, target).unwrap());

        // intersection = 1, |P| + |T| = 4
        assert!((dice[0] - 0.5).abs() < 1e-5);
        assert!((dice[1] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn threshold_boundary_is_negative() {
        let device = Default::default();
        let target = Tensor::<TestBackend, 2>::from_floats([[1.0, 1.0]], &device);

        let at_threshold = Tensor::<TestBackend, 2>::from_floats([[0.5, 0.5]], &device);
        let above = Tensor::<TestBackend, 2>::from_floats([[0.51, 0.51]], &device);

        let dice = PairwiseDice::default();
        let at = scores(dice.score(at_threshold, target.clone()).unwrap());
        let over = scores(dice.score(above, target).unwrap());

        assert!(at[0].abs() < 1e-6);
        assert!((over[0] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn targets_use_the_same_threshold() {
        let device = Default::default();
        let preds = Tensor::<TestBackend, 2>::from_floats([[0.9, 0.9]], &device);
        let target = Tensor::<TestBackend, 2>::from_floats([[0.5, 0.3]], &device);

        let dice = scores(PairwiseDice::default().score(preds, target).unwrap());

        assert!(dice[0].abs() < 1e-6);
    }

    #[test]
    fn empty_pair_scores_zero() {
        let device = Default::default();
        let preds = Tensor::<TestBackend, 2>::zeros([1, 4], &device);
        let target = Tensor::<TestBackend, 2>::zeros([1, 4], &device);

        let dice = scores(PairwiseDice::default().score(preds, target).unwrap());

        assert!(dice[0].is_finite());
        assert!(dice[0].abs() < 1e-6);
    }

    #[test]
    fn batch_mismatch_is_rejected() {
        let device = Default::default();
        let preds = Tensor::<TestBackend, 2>::zeros([2, 4], &device);
        let target = Tensor::<TestBackend, 2>::zeros([3, 4], &device);

        let err = PairwiseDice::default().score(preds, target).unwrap_err();

        assert_eq!(
            err,
            DiceError::BatchSizeMismatch {
                predictions: 2,
                targets: 3
            }
        );
    }

    #[test]
    fn sample_size_mismatch_is_rejected() {
        let device = Default::default();
        let preds = Tensor::<TestBackend, 2>::zeros([2, 4], &device);
        let target = Tensor::<TestBackend, 2>::zeros([2, 6], &device);

        let err = PairwiseDice::default().score(preds, target).unwrap_err();

        assert_eq!(
            err,
            DiceError::SampleSizeMismatch {
                predictions: 4,
                targets: 6
            }
        );
    }
}
