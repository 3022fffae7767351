use std::num::{NonZeroU32, NonZeroUsize};

use super::{RoundConfig, RoundConfigProvider};
use crate::configs::BaseConfig;

/// Hands out the same learning rate every round.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantSchedule {
    lr: f64,
    local_epochs: NonZeroU32,
    batch_size: NonZeroUsize,
}

impl ConstantSchedule {
    /// Creates a new `ConstantSchedule`.
    ///
    /// # Arguments
    /// * `lr` - The learning rate used by every round.
    /// * `local_epochs` - Passes over the local partition per round.
    /// * `batch_size` - Client side batch size.
    ///
    /// # Returns
    /// A new `ConstantSchedule` instance.
    pub fn new(lr: f64, local_epochs: NonZeroU32, batch_size: NonZeroUsize) -> Self {
        Self {
            lr,
            local_epochs,
            batch_size,
        }
    }

    pub fn from_config(config: &BaseConfig) -> Self {
        Self::new(config.learning_rate, config.local_epochs, config.batch_size)
    }
}

impl RoundConfigProvider for ConstantSchedule {
    fn configure(&self, round: NonZeroU32) -> RoundConfig {
        let mut config = RoundConfig::new(round);
        config.set("lr", self.lr);
        config.set("local-epochs", i64::from(self.local_epochs.get()));
        config.set("batch-size", self.batch_size.get() as i64);
        config
    }
}
