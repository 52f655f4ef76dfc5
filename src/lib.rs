pub mod dice;
pub mod error;
pub mod metric;

#[cfg(feature = "training")]
pub mod training;

pub use dice::{ChannelWeighting, MultiMaskReducer, PairwiseDice, any_present, weight_and_reduce};
pub use error::DiceError;
pub use metric::{
    Aggregation, DiceAccumulator, DiceMetric, DiceMetricConfig, MaskMode, MetricKind,
    construct_eval_metric, construct_metric,
};

#[cfg(feature = "training")]
pub use training::{DiceInput, SegmentationDiceMetric, SegmentationOutput};
