use std::{io::Write, num::NonZeroU32};

use log::{debug, info};

use super::{Federation, History};
use crate::{
    aggregation::{MetricAggregator, WeightedAverage, weighted_loss},
    error::Result,
    evaluation::Evaluator,
    records::{Phase, RecordWriter, RoundRecord},
    schedule::RoundConfigProvider,
};

/// Drives a fixed number of FedAvg rounds over a [`Federation`].
///
/// Each round: configure, fit, evaluate on the clients, evaluate centrally,
/// then record. A round either completes entirely or leaves no trace: its
/// records are written, the history extended and the global parameters
/// replaced only once every step succeeded.
pub struct Coordinator<F, P> {
    federation: F,
    provider: P,
    num_rounds: NonZeroU32,
    parameters: Vec<f32>,
    evaluate_aggregator: Box<dyn MetricAggregator>,
    fit_aggregator: Option<Box<dyn MetricAggregator>>,
    evaluator: Option<Box<dyn Evaluator>>,
}

impl<F: Federation, P: RoundConfigProvider> Coordinator<F, P> {
    /// Creates a new `Coordinator`.
    ///
    /// Client evaluation metrics are reduced with a default [`WeightedAverage`];
    /// fit metrics are not aggregated and no centralized evaluation runs until
    /// configured otherwise.
    ///
    /// # Arguments
    /// * `federation` - The clients.
    /// * `provider` - Supplies each round's training config.
    /// * `num_rounds` - How many rounds `run` drives.
    /// * `initial_parameters` - The global parameters before round 1.
    pub fn new(
        federation: F,
        provider: P,
        num_rounds: NonZeroU32,
        initial_parameters: Vec<f32>,
    ) -> Self {
        Self {
            federation,
            provider,
            num_rounds,
            parameters: initial_parameters,
            evaluate_aggregator: Box::new(WeightedAverage::default()),
            fit_aggregator: None,
            evaluator: None,
        }
    }

    pub fn with_evaluate_aggregator<A: MetricAggregator + 'static>(
        mut self,
        aggregator: A,
    ) -> Self {
        self.evaluate_aggregator = Box::new(aggregator);
        self
    }

    pub fn with_fit_aggregator<A: MetricAggregator + 'static>(mut self, aggregator: A) -> Self {
        self.fit_aggregator = Some(Box::new(aggregator));
        self
    }

    pub fn with_evaluator<E: Evaluator + 'static>(mut self, evaluator: E) -> Self {
        self.evaluator = Some(Box::new(evaluator));
        self
    }

    /// The current global parameters.
    pub fn parameters(&self) -> &[f32] {
        &self.parameters
    }

    pub fn federation(&self) -> &F {
        &self.federation
    }

    /// Runs every round, writing each completed round's records to `records`.
    ///
    /// # Errors
    /// The first error of any round, unchanged. Rounds before it are kept in
    /// `records`; the failing round and the ones after it don't run.
    pub fn run<W: Write>(&mut self, records: &mut RecordWriter<W>) -> Result<History> {
        let mut history = History::new();

        for round in (1..=self.num_rounds.get()).filter_map(NonZeroU32::new) {
            let (parameters, round_records) = self.play_round(round)?;
            records.write_all(&round_records)?;
            self.parameters = parameters;
            for record in &round_records {
                history.add_record(record);
            }
        }

        records.flush()?;
        Ok(history)
    }

    /// Runs a single round, commits its parameters and returns its records.
    ///
    /// # Errors
    /// Any failure from the federation, the aggregators or the evaluator.
    pub fn run_round(&mut self, round: NonZeroU32) -> Result<Vec<RoundRecord>> {
        let (parameters, records) = self.play_round(round)?;
        self.parameters = parameters;
        Ok(records)
    }

    /// Plays `round` against the current parameters without committing.
    fn play_round(&mut self, round: NonZeroU32) -> Result<(Vec<f32>, Vec<RoundRecord>)> {
        let config = self.provider.configure(round);
        debug!(round = round.get(), lr = config.lr().unwrap_or_default(); "round configured");

        let fit = self.federation.fit(&config, &self.parameters)?;
        let mut records = Vec::with_capacity(3);

        if let Some(aggregator) = &self.fit_aggregator {
            let metrics = aggregator.aggregate(&fit.reports)?;
            records.push(RoundRecord::new(round, Phase::Fit, None, metrics));
        }

        let evaluated = self.federation.evaluate(&config, &fit.parameters)?;
        let loss = weighted_loss(&evaluated)?;
        let reports: Vec<_> = evaluated.into_iter().map(|e| e.report).collect();
        let metrics = self.evaluate_aggregator.aggregate(&reports)?;
        records.push(RoundRecord::new(round, Phase::Evaluate, Some(loss), metrics));

        if let Some(evaluator) = &self.evaluator {
            let evaluation = evaluator.evaluate(&fit.parameters, round)?;
            records.push(RoundRecord::new(
                round,
                Phase::Centralized,
                Some(evaluation.loss),
                evaluation.metrics,
            ));
        }

        for record in &records {
            record.to_line()?;
        }

        info!(
            round = round.get(),
            clients = fit.reports.len(),
            loss = loss;
            "round complete"
        );

        Ok((fit.parameters, records))
    }
}
