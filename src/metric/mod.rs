pub mod accumulator;
pub mod config;
mod dice_metric;

pub use accumulator::{Aggregation, DiceAccumulator};
pub use config::{DiceMetricConfig, MetricKind, construct_eval_metric, construct_metric};
pub use dice_metric::{DiceMetric, MaskMode};
