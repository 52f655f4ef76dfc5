use std::marker::PhantomData;

use burn::prelude::*;

use super::accumulator::{Aggregation, DiceAccumulator};
use crate::dice::{MultiMaskReducer, PairwiseDice, any_present, weight_and_reduce};
use crate::error::DiceError;

/// Single mask per sample, or one mask per target channel.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskMode {
    Single,
    Multi(MultiMaskReducer),
}

/// Streaming Dice metric: `update` once per batch, `compute` at the end of
/// the epoch, `reset` before the next one.
///
/// Should be created using [DiceMetricConfig](super::DiceMetricConfig) or
/// [construct_metric](super::construct_metric).
#[derive(Debug, Clone)]
pub struct DiceMetric<B: Backend> {
    dice: PairwiseDice,
    mode: MaskMode,
    accumulator: DiceAccumulator,
    _b: PhantomData<B>,
}

impl<B: Backend> DiceMetric<B> {
    pub fn new(dice: PairwiseDice, mode: MaskMode, aggregation: Aggregation) -> Self {
        Self {
            dice,
            mode,
            accumulator: DiceAccumulator::new(aggregation),
            _b: PhantomData,
        }
    }

    /// Scores one batch, appends the batch scalar to the accumulator and
    /// returns it.
    ///
    /// # Shapes
    ///
    /// - predictions: `[batch_size, ...]`
    /// - targets: `[batch_size, ...]` (single) or `[batch_size, channels, ...]` (multi)
    /// - has_mask: `[batch_size]` with values in `{0, 1}`
    pub fn update<const D: usize>(
        &mut self,
        predictions: Tensor<B, D>,
        targets: Tensor<B, D>,
        has_mask: Tensor<B, 1>,
    ) -> Result<f64, DiceError> {
        let score = self.compute_single(predictions, targets, has_mask.clone())?;
        let any_mask = any_present(has_mask);

        self.accumulator.push(score, any_mask)?;
        tracing::debug!(
            score,
            any_mask,
            batches = self.accumulator.scores().len(),
            "dice batch accumulated"
        );

        Ok(score)
    }

    /// Epoch score from everything accumulated since the last reset.
    pub fn compute(&self) -> Result<f64, DiceError> {
        self.accumulator.compute()
    }

    /// Batch score for the given inputs, leaving the accumulator untouched.
    pub fn compute_single<const D: usize>(
        &self,
        predictions: Tensor<B, D>,
        targets: Tensor<B, D>,
        has_mask: Tensor<B, 1>,
    ) -> Result<f64, DiceError> {
        match &self.mode {
            MaskMode::Single => {
                let per_sample = self.dice.score(predictions, targets)?;
                weight_and_reduce(per_sample, has_mask, self.dice.smoothing)
            }
            MaskMode::Multi(reducer) => reducer.reduce(&self.dice, predictions, targets, has_mask),
        }
    }

    pub fn reset(&mut self) {
        tracing::trace!(
            batches = self.accumulator.scores().len(),
            "dice accumulator reset"
        );
        self.accumulator.reset();
    }

    pub fn accumulator(&self) -> &DiceAccumulator {
        &self.accumulator
    }

    pub fn dice(&self) -> &PairwiseDice {
        &self.dice
    }

    pub fn mode(&self) -> &MaskMode {
        &self.mode
    }
}
