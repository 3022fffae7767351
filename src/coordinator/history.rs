use std::{collections::BTreeMap, num::NonZeroU32};

use crate::{
    aggregation::Metrics,
    records::{Phase, RoundRecord},
};

/// `(round, value)` pairs in the order they were recorded.
pub type Series = Vec<(u32, f64)>;

/// Everything a run produced, round by round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    pub losses_distributed: Series,
    pub losses_centralized: Series,
    pub metrics_distributed_fit: BTreeMap<String, Series>,
    pub metrics_distributed: BTreeMap<String, Series>,
    pub metrics_centralized: BTreeMap<String, Series>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a history from records, e.g. ones read back from a log.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a RoundRecord>,
    {
        let mut history = Self::new();
        for record in records {
            history.add_record(record);
        }
        history
    }

    /// Adds the loss and metrics of `record` to the matching series.
    pub fn add_record(&mut self, record: &RoundRecord) {
        let round = record.round.get();
        let (losses, metrics) = match record.phase {
            Phase::Fit => (None, &mut self.metrics_distributed_fit),
            Phase::Evaluate => (Some(&mut self.losses_distributed), &mut self.metrics_distributed),
            Phase::Centralized => (
                Some(&mut self.losses_centralized),
                &mut self.metrics_centralized,
            ),
        };

        if let (Some(losses), Some(loss)) = (losses, record.loss) {
            losses.push((round, loss));
        }

        for (name, &value) in &record.metrics {
            metrics.entry(name.clone()).or_default().push((round, value));
        }
    }

    /// Returns the records this history was built from, grouped by round.
    pub fn to_records(&self) -> Vec<RoundRecord> {
        let mut by_key: BTreeMap<(u32, Phase), (Option<f64>, Metrics)> = BTreeMap::new();

        for (phase, losses) in [
            (Phase::Evaluate, &self.losses_distributed),
            (Phase::Centralized, &self.losses_centralized),
        ] {
            for &(round, loss) in losses {
                by_key.entry((round, phase)).or_default().0 = Some(loss);
            }
        }

        for (phase, metrics) in [
            (Phase::Fit, &self.metrics_distributed_fit),
            (Phase::Evaluate, &self.metrics_distributed),
            (Phase::Centralized, &self.metrics_centralized),
        ] {
            for (name, series) in metrics {
                for &(round, value) in series {
                    by_key
                        .entry((round, phase))
                        .or_default()
                        .1
                        .insert(name.clone(), value);
                }
            }
        }

        by_key
            .into_iter()
            .filter_map(|((round, phase), (loss, metrics))| {
                NonZeroU32::new(round).map(|round| RoundRecord::new(round, phase, loss, metrics))
            })
            .collect()
    }

    /// Number of rounds with a distributed loss.
    pub fn rounds(&self) -> usize {
        self.losses_distributed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.losses_distributed.is_empty()
            && self.losses_centralized.is_empty()
            && self.metrics_distributed_fit.is_empty()
            && self.metrics_distributed.is_empty()
            && self.metrics_centralized.is_empty()
    }
}
