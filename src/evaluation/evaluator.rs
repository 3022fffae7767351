use std::num::NonZeroU32;

use crate::{aggregation::Metrics, error::Result};

/// Loss and metrics of the global model on the held out set.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub loss: f64,
    pub metrics: Metrics,
}

/// Evaluates global parameters independently of what the clients report.
pub trait Evaluator {
    /// Evaluates `parameters` as they stand after `round`.
    ///
    /// # Arguments
    /// * `parameters` - Flat global model parameters, never mutated.
    /// * `round` - The round that produced them.
    ///
    /// # Returns
    /// The evaluation, or the underlying error unchanged.
    fn evaluate(&self, parameters: &[f32], round: NonZeroU32) -> Result<Evaluation>;
}

impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    fn evaluate(&self, parameters: &[f32], round: NonZeroU32) -> Result<Evaluation> {
        (**self).evaluate(parameters, round)
    }
}
