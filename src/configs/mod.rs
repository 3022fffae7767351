mod base;
mod value;

pub use base::{BaseConfig, Milestone, ScheduleConfig};
pub use value::ConfigValue;
