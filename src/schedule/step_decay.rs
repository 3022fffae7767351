use std::num::NonZeroU32;

use super::{ConstantSchedule, RoundConfig, RoundConfigProvider};
use crate::configs::Milestone;

/// Drops the learning rate at fixed rounds.
///
/// The active rate is the one of the last milestone whose `after_round` is
/// strictly below the current round; before the first milestone the base
/// schedule's rate applies.
#[derive(Debug, Clone, PartialEq)]
pub struct StepDecay {
    base: ConstantSchedule,
    milestones: Vec<Milestone>,
}

impl StepDecay {
    /// Creates a new `StepDecay`.
    ///
    /// # Arguments
    /// * `base` - Schedule providing every parameter but the decayed rate.
    /// * `milestones` - Rate changes, in any order.
    pub fn new(base: ConstantSchedule, mut milestones: Vec<Milestone>) -> Self {
        milestones.sort_by_key(|m| m.after_round);
        Self { base, milestones }
    }
}

impl RoundConfigProvider for StepDecay {
    fn configure(&self, round: NonZeroU32) -> RoundConfig {
        let mut config = self.base.configure(round);

        let passed = self.milestones.partition_point(|m| m.after_round < round.get());
        if let Some(milestone) = passed.checked_sub(1).map(|i| self.milestones[i]) {
            config.set("lr", milestone.lr);
        }

        config
    }
}
