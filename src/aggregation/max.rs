use super::{ClientReport, MetricAggregator, Metrics};
use crate::error::{FedAvgError, Result};

/// Reports the largest value of one metric across clients as `max_<metric>`.
///
/// Used on fit results, where a per-client extreme matters more than a mean.
#[derive(Debug, Clone)]
pub struct MaxAggregator {
    metric: String,
}

impl MaxAggregator {
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
        }
    }
}

impl MetricAggregator for MaxAggregator {
    fn aggregate(&self, reports: &[ClientReport]) -> Result<Metrics> {
        if reports.is_empty() {
            return Err(FedAvgError::invalid("cannot aggregate an empty report set"));
        }

        let mut max = f64::NEG_INFINITY;
        for (client, report) in reports.iter().enumerate() {
            let value = *report
                .metrics
                .get(&self.metric)
                .ok_or_else(|| FedAvgError::MissingMetric {
                    metric: self.metric.clone(),
                    client,
                })?;

            if !value.is_finite() {
                return Err(FedAvgError::invalid(format!(
                    "{} has a non-finite value ({value})",
                    self.metric
                )));
            }
            max = max.max(value);
        }

        Ok(Metrics::from([(format!("max_{}", self.metric), max)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_largest_value() {
        let agg = MaxAggregator::new("b");
        let reports = [
            ClientReport::new(10, [("b", 0.3)]),
            ClientReport::new(1, [("b", 2.5)]),
            ClientReport::new(0, [("b", -1.0)]),
        ];
        assert_eq!(agg.aggregate(&reports).unwrap()["max_b"], 2.5);
    }

    #[test]
    fn missing_metric_fails() {
        let agg = MaxAggregator::new("b");
        let reports = [ClientReport::new(10, [("b", 0.3)]), ClientReport::new(1, [("a", 1.0)])];
        assert!(matches!(
            agg.aggregate(&reports),
            Err(FedAvgError::MissingMetric { client: 1, .. })
        ));
    }
}
