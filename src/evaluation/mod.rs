mod centralized;
mod dataset;
mod evaluator;
mod model;

pub use centralized::CentralizedEvaluator;
pub use dataset::HeldOutSet;
pub use evaluator::{Evaluation, Evaluator};
pub use model::{LinearClassifier, Model};
