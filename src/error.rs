use thiserror::Error;

/// Errors raised while scoring or aggregating Dice coefficients.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiceError {
    /// Predictions and targets disagree on the batch dimension.
    #[error("pred & target shape don't match: batch size {predictions} vs {targets}")]
    BatchSizeMismatch { predictions: usize, targets: usize },

    /// The has-mask vector does not have one flag per sample.
    #[error("has_mask holds {flags} flags but the batch has {batch} samples")]
    PresenceLengthMismatch { flags: usize, batch: usize },

    /// Flattened samples (or target channels) have different element counts.
    #[error("prediction samples have {predictions} elements but target masks have {targets}")]
    SampleSizeMismatch { predictions: usize, targets: usize },

    /// A multi-mask target was given without any mask channel.
    #[error("multi-mask targets need at least one channel")]
    MissingChannels,

    /// The factory received a metric name it does not know.
    #[error("Unexpected metric {0}")]
    UnknownMetricKind(String),

    /// The plain mean was requested before any batch was accumulated.
    #[error("no batch has been accumulated")]
    EmptyAccumulator,

    /// The presence-weighted mean was requested but no batch contained a mask.
    #[error("no accumulated batch contained a ground-truth mask")]
    NoMaskPresent,

    /// A batch score was NaN or infinite.
    #[error("batch dice score is not finite: {0}")]
    NonFiniteScore(f64),
}
