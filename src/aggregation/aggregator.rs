use super::{ClientReport, Metrics};
use crate::error::Result;

/// Combines the reports of one round into round level metrics.
pub trait MetricAggregator {
    /// Reduces `reports` into a single metric set.
    ///
    /// # Arguments
    /// * `reports` - Every report received in the round, in any order.
    ///
    /// # Returns
    /// The aggregated metrics, or an error if they cannot be computed. No
    /// fallback value is ever produced.
    fn aggregate(&self, reports: &[ClientReport]) -> Result<Metrics>;
}

impl<A: MetricAggregator + ?Sized> MetricAggregator for Box<A> {
    fn aggregate(&self, reports: &[ClientReport]) -> Result<Metrics> {
        (**self).aggregate(reports)
    }
}
