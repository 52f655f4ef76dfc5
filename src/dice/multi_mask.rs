use burn::prelude::*;

use super::pairwise::{PairwiseDice, check_batch, flatten};
use super::presence::weight_and_reduce;
use crate::error::DiceError;

/// How per-channel scores are combined into one batch score.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum ChannelWeighting {
    /// Every channel weighs `1 / C`.
    Uniform,
    /// Channel `i` weighs `(i + 1) / (C * (C + 1) / 2)`, so later channels count more.
    IndexWeighted,
}

impl ChannelWeighting {
    /// Contribution of `score` coming from channel `index` out of `channels`.
    pub fn apply(&self, score: f64, index: usize, channels: usize) -> f64 {
        match self {
            ChannelWeighting::Uniform => score / channels as f64,
            ChannelWeighting::IndexWeighted => {
                let total: usize = (1..=channels).sum();
                score * (index + 1) as f64 / total as f64
            }
        }
    }
}

/// Scores one prediction map against every channel of a multi-mask target.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiMaskReducer {
    pub weighting: ChannelWeighting,
}

impl MultiMaskReducer {
    pub fn new(weighting: ChannelWeighting) -> Self {
        Self { weighting }
    }

    /// Combined, presence-weighted batch score.
    ///
    /// # Shapes
    ///
    /// - predictions: `[batch_size, ...]`, flattened whole per sample
    /// - targets: `[batch_size, channels, ...]`, one mask per channel
    /// - has_mask: `[batch_size]`
    pub fn reduce<B: Backend, const D: usize>(
        &self,
        dice: &PairwiseDice,
        predictions: Tensor<B, D>,
        targets: Tensor<B, D>,
        has_mask: Tensor<B, 1>,
    ) -> Result<f64, DiceError> {
        let target_dims = targets.dims();
        check_batch(&predictions.dims(), &target_dims)?;

        if D < 2 || target_dims[1] == 0 {
            return Err(DiceError::MissingChannels);
        }
        let channels = target_dims[1];

        let predictions = dice.binarize(flatten(predictions));
        let mut score = 0.0;

        for index in 0..channels {
            let target = dice.binarize(flatten(targets.clone().narrow(1, index, 1)));

            let per_sample = dice.score_binary(predictions.clone(), target)?;
            let channel_score = weight_and_reduce(per_sample, has_mask.clone(), dice.smoothing)?;

            score += self.weighting.apply(channel_score, index, channels);
        }

        Ok(score)
    }
}
