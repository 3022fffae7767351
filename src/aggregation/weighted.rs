use std::collections::BTreeSet;

use super::{ClientReport, EvaluateReport, MetricAggregator, Metrics};
use crate::error::{FedAvgError, Result};

/// Decides which metric names take part in an aggregation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MissingMetricPolicy {
    /// Only metrics present in every report are aggregated.
    #[default]
    Intersection,
    /// The listed metrics must be present in every report; the rest follow
    /// `Intersection`.
    Require(Vec<String>),
    /// Every metric seen in any report is aggregated, absent values count as 0.
    ZeroFill,
}

/// Sample count weighted mean of every metric, the FedAvg metric reduction.
#[derive(Debug, Clone, Default)]
pub struct WeightedAverage {
    policy: MissingMetricPolicy,
}

impl WeightedAverage {
    pub fn new(policy: MissingMetricPolicy) -> Self {
        Self { policy }
    }

    /// Shorthand for a `Require` policy over `metrics`.
    pub fn require<I, S>(metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(MissingMetricPolicy::Require(
            metrics.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn policy(&self) -> &MissingMetricPolicy {
        &self.policy
    }

    fn metric_names<'a>(&self, reports: &'a [ClientReport]) -> Result<BTreeSet<&'a str>> {
        let intersection = || -> BTreeSet<&'a str> {
            reports[0]
                .metrics
                .keys()
                .map(String::as_str)
                .filter(|name| reports[1..].iter().all(|r| r.metrics.contains_key(*name)))
                .collect()
        };

        match &self.policy {
            MissingMetricPolicy::Intersection => Ok(intersection()),
            MissingMetricPolicy::Require(required) => {
                for metric in required {
                    let missing = reports.iter().position(|r| !r.metrics.contains_key(metric));
                    if let Some(client) = missing {
                        return Err(FedAvgError::MissingMetric {
                            metric: metric.clone(),
                            client,
                        });
                    }
                }
                Ok(intersection())
            }
            MissingMetricPolicy::ZeroFill => Ok(reports
                .iter()
                .flat_map(|r| r.metrics.keys().map(String::as_str))
                .collect()),
        }
    }
}

impl MetricAggregator for WeightedAverage {
    fn aggregate(&self, reports: &[ClientReport]) -> Result<Metrics> {
        if reports.is_empty() {
            return Err(FedAvgError::invalid("cannot aggregate an empty report set"));
        }

        // a zero total fails even when no metric is shared
        let total = reports
            .iter()
            .try_fold(0u64, |total, r| total.checked_add(r.sample_count))
            .ok_or_else(|| FedAvgError::invalid("sample count overflow"))?;
        if total == 0 {
            return Err(FedAvgError::DivisionByZero {
                what: "sample count".to_string(),
            });
        }

        self.metric_names(reports)?
            .into_iter()
            .map(|name| -> Result<(String, f64)> {
                let pairs = reports
                    .iter()
                    .map(|r| (r.sample_count, r.metrics.get(name).copied().unwrap_or(0.0)));
                Ok((name.to_string(), weighted_mean(pairs, name)?))
            })
            .collect()
    }
}

/// Sample count weighted mean of the clients' evaluation losses.
///
/// # Errors
/// The same as [`weighted_mean`], plus `InvalidArgument` for no reports.
pub fn weighted_loss(reports: &[EvaluateReport]) -> Result<f64> {
    if reports.is_empty() {
        return Err(FedAvgError::invalid("cannot aggregate an empty report set"));
    }

    let pairs = reports.iter().map(|r| (r.report.sample_count, r.loss));
    weighted_mean(pairs, "loss")
}

/// Computes `Σ count·value / Σ count` over `(count, value)` pairs.
///
/// Counts are summed as integers and the weighted terms are summed in a
/// fixed total order, so the result is bit-identical for any permutation of
/// the input.
///
/// # Arguments
/// * `pairs` - Sample counts and values.
/// * `what` - Name of the quantity, used in error messages.
///
/// # Errors
/// `InvalidArgument` for a non-finite value or an overflowing count,
/// `DivisionByZero` when the counts sum to 0.
pub fn weighted_mean<I>(pairs: I, what: &str) -> Result<f64>
where
    I: IntoIterator<Item = (u64, f64)>,
{
    let mut total: u64 = 0;
    let mut terms = Vec::new();

    for (count, value) in pairs {
        if !value.is_finite() {
            return Err(FedAvgError::invalid(format!(
                "{what} has a non-finite value ({value})"
            )));
        }

        total = total
            .checked_add(count)
            .ok_or_else(|| FedAvgError::invalid(format!("sample count overflow for {what}")))?;
        terms.push(count as f64 * value);
    }

    if total == 0 {
        return Err(FedAvgError::DivisionByZero {
            what: what.to_string(),
        });
    }

    terms.sort_by(f64::total_cmp);
    let sum: f64 = terms.iter().sum();

    Ok(sum / total as f64)
}
