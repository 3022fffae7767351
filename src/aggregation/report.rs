use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metric name to value, ordered by name.
pub type Metrics = BTreeMap<String, f64>;

/// The metrics a client computed locally and the number of samples behind them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientReport {
    pub sample_count: u64,
    #[serde(default)]
    pub metrics: Metrics,
}

impl ClientReport {
    pub fn new<I, K>(sample_count: u64, metrics: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            sample_count,
            metrics: metrics.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A client's evaluation of the global model on its local split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluateReport {
    pub loss: f64,
    #[serde(flatten)]
    pub report: ClientReport,
}

impl EvaluateReport {
    pub fn new(loss: f64, report: ClientReport) -> Self {
        Self { loss, report }
    }
}
