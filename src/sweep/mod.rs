mod driver;
mod runner;
mod space;

pub use driver::{Sweep, TrialResult};
pub use runner::{CommandRunner, TrialRunner};
pub use space::{SearchSpace, TrialParams};
