mod aggregator;
mod max;
mod report;
mod weighted;

pub use aggregator::MetricAggregator;
pub use max::MaxAggregator;
pub use report::{ClientReport, EvaluateReport, Metrics};
pub use weighted::{MissingMetricPolicy, WeightedAverage, weighted_loss, weighted_mean};
