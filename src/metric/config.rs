use std::str::FromStr;

use burn::prelude::*;

use super::accumulator::Aggregation;
use super::dice_metric::{DiceMetric, MaskMode};
use crate::dice::{ChannelWeighting, MultiMaskReducer, PairwiseDice};
use crate::error::DiceError;

/// The family of Dice metric to assemble.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum MetricKind {
    /// One target mask per sample.
    Single,
    /// One score per target channel, averaged uniformly.
    MultiUniform,
    /// One score per target channel, later channels weighted more.
    MultiWeighted,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Single => "single",
            MetricKind::MultiUniform => "multi-uniform",
            MetricKind::MultiWeighted => "multi-weighted",
        }
    }

    fn mask_mode(&self) -> MaskMode {
        match self {
            MetricKind::Single => MaskMode::Single,
            MetricKind::MultiUniform => {
                MaskMode::Multi(MultiMaskReducer::new(ChannelWeighting::Uniform))
            }
            MetricKind::MultiWeighted => {
                MaskMode::Multi(MultiMaskReducer::new(ChannelWeighting::IndexWeighted))
            }
        }
    }
}

impl FromStr for MetricKind {
    type Err = DiceError;

    /// Accepts both the descriptive names and the `Dice`, `MultiMaskDice`,
    /// `MultiMaskDiceW` names used by existing training configurations.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "single" | "Dice" => Ok(MetricKind::Single),
            "multi-uniform" | "MultiMaskDice" => Ok(MetricKind::MultiUniform),
            "multi-weighted" | "MultiMaskDiceW" => Ok(MetricKind::MultiWeighted),
            other => Err(DiceError::UnknownMetricKind(other.to_string())),
        }
    }
}

/// Configuration to create a [DiceMetric] using the [init function](DiceMetricConfig::init).
#[derive(Config, Debug)]
pub struct DiceMetricConfig {
    /// Single-mask or multi-mask scoring.
    #[config(default = "MetricKind::Single")]
    pub kind: MetricKind,

    /// Plain batch mean (training) or presence-weighted mean (evaluation).
    #[config(default = "Aggregation::Mean")]
    pub aggregation: Aggregation,

    /// Values strictly greater than the threshold are positive, in both
    /// predictions and targets.
    #[config(default = 0.5)]
    pub threshold: f64,

    /// Exponent applied to the binarized masks in the denominator.
    #[config(default = 1)]
    pub p: u32,

    /// Added to every denominator to keep divisions finite.
    #[config(default = 1e-6)]
    pub smoothing: f64,
}

impl DiceMetricConfig {
    pub fn init<B: Backend>(&self) -> DiceMetric<B> {
        self.assertions();
        DiceMetric::new(
            PairwiseDice::new(self.threshold, self.p, self.smoothing),
            self.kind.mask_mode(),
            self.aggregation.clone(),
        )
    }

    fn assertions(&self) {
        assert!(
            self.threshold.is_finite(),
            "Threshold of the Dice metric must be finite. Got {}",
            self.threshold
        );
        assert!(
            self.smoothing > 0. && self.smoothing.is_finite(),
            "Smoothing of the Dice metric must be strictly positive. Got {}",
            self.smoothing
        );
        assert!(self.p >= 1, "Exponent p must be at least 1. Got {}", self.p);
    }
}

/// Training metric for `name`: threshold 0.5, p = 1, smoothing 1e-6, plain mean.
pub fn construct_metric<B: Backend>(name: &str) -> Result<DiceMetric<B>, DiceError> {
    let kind = name.parse::<MetricKind>()?;
    tracing::info!(kind = kind.as_str(), "constructing dice metric");

    Ok(DiceMetricConfig::new().with_kind(kind).init())
}

/// Evaluation metric for `name`: same constants, presence-weighted mean.
pub fn construct_eval_metric<B: Backend>(name: &str) -> Result<DiceMetric<B>, DiceError> {
    let kind = name.parse::<MetricKind>()?;
    tracing::info!(kind = kind.as_str(), "constructing evaluation dice metric");

    Ok(DiceMetricConfig::new()
        .with_kind(kind)
        .with_aggregation(Aggregation::PresenceWeighted)
        .init())
}
