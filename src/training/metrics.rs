use burn::prelude::*;
use burn::train::metric::{Metric, MetricEntry, MetricMetadata, Numeric};
use derive_new::new;

use crate::dice::any_present;
use crate::metric::{Aggregation, DiceMetric, DiceMetricConfig};

/// Dice metric plugged into burn's learner.
///
/// Each `update` scores one batch through the wrapped [DiceMetric];
/// the learner's `clear` at epoch end resets its accumulator.
///
/// Entries are serialized as `score,count` so that the learner's
/// count-weighted epoch aggregate equals [DiceMetric::compute]: every batch
/// counts once for [Aggregation::Mean], and only batches carrying a mask
/// count for [Aggregation::PresenceWeighted].
pub struct SegmentationDiceMetric<B: Backend> {
    metric: DiceMetric<B>,
}

#[derive(new, Debug, Clone)]
pub struct DiceInput<B: Backend> {
    /// Prediction scores with shape `[batch_size, 1, height, width]`.
    pub predictions: Tensor<B, 4>,
    /// Ground truth with shape `[batch_size, channels, height, width]`.
    pub targets: Tensor<B, 4>,
    /// Has-mask flags with shape `[batch_size]`.
    pub has_mask: Tensor<B, 1>,
}

impl<B: Backend> SegmentationDiceMetric<B> {
    pub fn new(metric: DiceMetric<B>) -> Self {
        Self { metric }
    }

    pub fn metric(&self) -> &DiceMetric<B> {
        &self.metric
    }

    fn entry(&self, score: f64, count: usize) -> MetricEntry {
        let formatted = match self.metric.compute() {
            Ok(epoch) => format!("epoch {epoch:.4} - batch {score:.4}"),
            Err(_) => format!("epoch - - batch {score:.4}"),
        };

        MetricEntry::new(
            Self::NAME.to_string(),
            format!("{}: {formatted}", Self::NAME),
            format!("{score},{count}"),
        )
    }
}

impl<B: Backend> Default for SegmentationDiceMetric<B> {
    fn default() -> Self {
        Self::new(DiceMetricConfig::new().init())
    }
}

impl<B: Backend> Metric for SegmentationDiceMetric<B> {
    type Input = DiceInput<B>;
    const NAME: &'static str = "Dice";

    fn update(&mut self, input: &DiceInput<B>, _metadata: &MetricMetadata) -> MetricEntry {
        let score = self
            .metric
            .update(
                input.predictions.clone(),
                input.targets.clone(),
                input.has_mask.clone(),
            )
            .unwrap_or_else(|err| panic!("{err}"));

        let count = match self.metric.accumulator().aggregation() {
            Aggregation::Mean => 1,
            Aggregation::PresenceWeighted => any_present(input.has_mask.clone()) as usize,
        };

        self.entry(score, count)
    }

    fn clear(&mut self) {
        self.metric.reset();
    }
}

impl<B: Backend> Numeric for SegmentationDiceMetric<B> {
    fn value(&self) -> f64 {
        match self.metric.compute() {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%err, "dice aggregate is undefined");
                f64::NAN
            }
        }
    }
}
