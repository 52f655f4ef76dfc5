use burn::{
    backend::NdArray,
    prelude::*,
    tensor::Transaction,
    train::metric::{Adaptor, ItemLazy, LossInput},
};
use derive_new::new;

use super::metrics::DiceInput;

/// Model output for one batch, carrying what the Dice metric needs.
#[derive(new)]
pub struct SegmentationOutput<B: Backend> {
    pub loss: Tensor<B, 1>,
    /// Prediction scores `[batch_size, 1, height, width]`.
    pub output: Tensor<B, 4>,
    /// Target masks `[batch_size, channels, height, width]`.
    pub targets: Tensor<B, 4>,
    /// Has-mask flags `[batch_size]`.
    pub has_mask: Tensor<B, 1>,
}

impl<B: Backend> ItemLazy for SegmentationOutput<B> {
    type ItemSync = SegmentationOutput<NdArray>;

    fn sync(self) -> Self::ItemSync {
        let [output, loss, targets, has_mask] = Transaction::default()
            .register(self.output)
            .register(self.loss)
            .register(self.targets)
            .register(self.has_mask)
            .execute()
            .try_into()
            .expect("Correct amount of tensor data");

        let device = &Default::default();

        SegmentationOutput {
            output: Tensor::from_data(output, device),
            loss: Tensor::from_data(loss, device),
            targets: Tensor::from_data(targets, device),
            has_mask: Tensor::from_data(has_mask, device),
        }
    }
}

impl<B: Backend> Adaptor<LossInput<B>> for SegmentationOutput<B> {
    fn adapt(&self) -> LossInput<B> {
        LossInput::new(self.loss.clone())
    }
}

impl<B: Backend> Adaptor<DiceInput<B>> for SegmentationOutput<B> {
    fn adapt(&self) -> DiceInput<B> {
        DiceInput::new(
            self.output.clone(),
            self.targets.clone(),
            self.has_mask.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::construct_metric;
    use crate::tests::TestBackend;

    #[test]
    fn dice_input_carries_the_batch() {
        let device = Default::default();
        let output = SegmentationOutput::<TestBackend>::new(
            Tensor::from_floats([0.3], &device),
            Tensor::from_floats([[[[0.9, 0.1], [0.9, 0.1]]]], &device),
            Tensor::from_floats([[[[1.0, 0.0], [1.0, 0.0]]]], &device),
            Tensor::from_floats([1.0], &device),
        );

        let input: DiceInput<TestBackend> = output.adapt();
        let mut metric = construct_metric::<TestBackend>("single").unwrap();
        metric
            .update(input.predictions, input.targets, input.has_mask)
            .unwrap();

        assert!((metric.compute().unwrap() - 1.0).abs() < 1e-5);
    }
}
