mod coordinator;
mod federation;
mod history;

pub use coordinator::Coordinator;
pub use federation::{Federation, FitOutcome};
pub use history::{History, Series};
