use rand::{Rng, seq::IndexedRandom};

use crate::{
    configs::BaseConfig,
    error::{FedAvgError, Result},
};

/// The candidate values of every swept hyperparameter.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSpace {
    pub fraction_fit: Vec<f64>,
    pub local_epochs: Vec<u32>,
    pub learning_rate: Vec<f64>,
    pub batch_size: Vec<usize>,
}

impl Default for SearchSpace {
    /// fraction-fit 0.1..=0.9, local-epochs 1..=20, learning-rate
    /// 0.010 down to 0.001 and batch-size 10..=50.
    fn default() -> Self {
        Self {
            fraction_fit: (1..=9).map(|i| f64::from(i) / 10.0).collect(),
            local_epochs: (1..=20).collect(),
            learning_rate: (1..=10).rev().map(|i| f64::from(i) / 1000.0).collect(),
            batch_size: (10..=50).collect(),
        }
    }
}

impl SearchSpace {
    /// Draws one value per hyperparameter, independently and uniformly.
    ///
    /// # Errors
    /// `InvalidArgument` if any candidate list is empty.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<TrialParams> {
        fn pick<'a, T, R: Rng + ?Sized>(values: &'a [T], name: &str, rng: &mut R) -> Result<&'a T> {
            values
                .choose(rng)
                .ok_or_else(|| FedAvgError::invalid(format!("search space for {name} is empty")))
        }

        Ok(TrialParams::new(
            *pick(&self.fraction_fit, "fraction-fit", rng)?,
            *pick(&self.local_epochs, "local-epochs", rng)?,
            *pick(&self.learning_rate, "learning-rate", rng)?,
            *pick(&self.batch_size, "batch-size", rng)?,
        ))
    }
}

/// The hyperparameters of one sweep trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialParams {
    pub fraction_fit: f64,
    pub local_epochs: u32,
    pub learning_rate: f64,
    pub batch_size: usize,
}

impl TrialParams {
    /// Creates a new `TrialParams`, rounding the fraction to one decimal and
    /// the learning rate to three so they print cleanly.
    pub fn new(
        fraction_fit: f64,
        local_epochs: u32,
        learning_rate: f64,
        batch_size: usize,
    ) -> Self {
        Self {
            fraction_fit: (fraction_fit * 10.0).round() / 10.0,
            local_epochs,
            learning_rate: (learning_rate * 1000.0).round() / 1000.0,
            batch_size,
        }
    }

    /// Renders these parameters as `key=value` run-config overrides.
    pub fn run_config(&self) -> String {
        format!(
            "fraction-fit={} local-epochs={} learning-rate={} batch-size={}",
            self.fraction_fit, self.local_epochs, self.learning_rate, self.batch_size
        )
    }

    /// Name of the directory holding this trial's output.
    pub fn dir_name(&self) -> String {
        format!(
            "CF{}_E{}_BS{}_LR{}",
            self.fraction_fit, self.local_epochs, self.batch_size, self.learning_rate
        )
    }

    /// Returns `base` with these parameters applied.
    pub fn apply(&self, base: BaseConfig) -> Result<BaseConfig> {
        base.with_overrides(&self.run_config())
    }
}
