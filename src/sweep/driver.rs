use std::{
    fs,
    path::{Path, PathBuf},
};

use log::info;
use rand::{SeedableRng, rngs::StdRng};

use super::{SearchSpace, TrialParams, TrialRunner};
use crate::{
    configs::BaseConfig,
    coordinator::History,
    error::Result,
    report::{RunSummary, SummaryRow, append_summary_row},
};

const LOG_FILE: &str = "simulation_log.txt";
const SUMMARY_FILE: &str = "results_summary.csv";

/// The outcome of one completed trial.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialResult {
    pub trial: usize,
    pub params: TrialParams,
    pub summary: RunSummary,
    pub log_path: PathBuf,
}

/// Random search over a [`SearchSpace`].
///
/// Every trial gets its own directory under `out_dir`, named after its
/// parameters, and one row in `out_dir/results_summary.csv`.
pub struct Sweep<R> {
    runner: R,
    space: SearchSpace,
    base: BaseConfig,
    out_dir: PathBuf,
    rng: StdRng,
    accuracy_metric: String,
}

impl<R: TrialRunner> Sweep<R> {
    /// Creates a new `Sweep`.
    ///
    /// # Arguments
    /// * `runner` - Runs each trial.
    /// * `space` - Candidate hyperparameter values.
    /// * `base` - Config the sampled values are applied on.
    /// * `out_dir` - Root of every output file.
    /// * `seed` - An optional seed for reproducible sampling.
    pub fn new<P: Into<PathBuf>>(
        runner: R,
        space: SearchSpace,
        base: BaseConfig,
        out_dir: P,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            runner,
            space,
            base,
            out_dir: out_dir.into(),
            rng,
            accuracy_metric: "accuracy".into(),
        }
    }

    /// Sets the distributed metric summarized as accuracy.
    pub fn with_accuracy_metric<S: Into<String>>(mut self, metric: S) -> Self {
        self.accuracy_metric = metric.into();
        self
    }

    pub fn summary_path(&self) -> PathBuf {
        self.out_dir.join(SUMMARY_FILE)
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Runs `trials` trials one after another.
    ///
    /// # Errors
    /// The first failing trial stops the sweep; rows of earlier trials stay
    /// in the summary file.
    pub fn run(&mut self, trials: usize) -> Result<Vec<TrialResult>> {
        let mut results = Vec::with_capacity(trials);

        for trial in 0..trials {
            let params = self.space.sample(&mut self.rng)?;
            results.push(self.run_trial(trial, params)?);
        }

        Ok(results)
    }

    /// Runs a single trial with `params` and records its summary row.
    pub fn run_trial(&mut self, trial: usize, params: TrialParams) -> Result<TrialResult> {
        let config = params.apply(self.base.clone())?;

        let dir = self.out_dir.join(params.dir_name());
        fs::create_dir_all(&dir)?;
        let log_path = dir.join(LOG_FILE);

        info!(trial = trial; "starting trial with {}", params.run_config());

        let records = self.runner.run_trial(trial, &params, &log_path)?;
        let history = History::from_records(&records);
        let summary = RunSummary::from_history(&history, &self.accuracy_metric)?;

        append_summary_row(self.summary_path(), &SummaryRow::from_config(&config, summary))?;

        info!(
            trial = trial,
            best_loss = summary.best_loss,
            best_acc = summary.best_acc;
            "trial finished"
        );

        Ok(TrialResult {
            trial,
            params,
            summary,
            log_path,
        })
    }
}
