mod constant;
mod provider;
mod step_decay;

pub use constant::ConstantSchedule;
pub use provider::{RoundConfig, RoundConfigProvider};
pub use step_decay::StepDecay;

use crate::configs::{BaseConfig, ScheduleConfig};

/// Builds the provider selected by the `lr-schedule` key of `config`.
pub fn from_config(config: &BaseConfig) -> Box<dyn RoundConfigProvider> {
    let base = ConstantSchedule::from_config(config);
    match &config.lr_schedule {
        ScheduleConfig::Constant => Box::new(base),
        ScheduleConfig::Step { milestones } => Box::new(StepDecay::new(base, milestones.clone())),
    }
}
