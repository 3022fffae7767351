pub mod aggregation;
pub mod configs;
pub mod coordinator;
pub mod error;
pub mod evaluation;
pub mod records;
pub mod report;
pub mod schedule;
pub mod sweep;

pub use aggregation::{ClientReport, MetricAggregator, WeightedAverage};
pub use coordinator::{Coordinator, Federation, History};
pub use error::{FedAvgError, Result};
pub use schedule::{RoundConfig, RoundConfigProvider};
