use std::{num::NonZeroU32, sync::Arc};

use log::debug;

use super::{Evaluation, Evaluator, HeldOutSet, Model};
use crate::{
    aggregation::Metrics,
    error::{FedAvgError, Result},
};

const EPS: f64 = 1e-12;

/// Evaluates the global model against a fixed held out set.
///
/// Reports the mean cross entropy as loss and the fraction of correctly
/// classified samples as `cen_accuracy`.
pub struct CentralizedEvaluator<M> {
    model: M,
    data: Arc<HeldOutSet>,
}

impl<M: Model> CentralizedEvaluator<M> {
    /// Creates a new `CentralizedEvaluator`.
    ///
    /// # Arguments
    /// * `model` - The forward pass used to score the parameters.
    /// * `data` - The held out set, shared and never modified.
    pub fn new(model: M, data: Arc<HeldOutSet>) -> Self {
        Self { model, data }
    }
}

impl<M: Model> Evaluator for CentralizedEvaluator<M> {
    fn evaluate(&self, parameters: &[f32], round: NonZeroU32) -> Result<Evaluation> {
        let probs = self.model.predict(parameters, self.data.features())?;
        let labels = self.data.labels();

        if probs.nrows() != labels.len() {
            return Err(FedAvgError::invalid(format!(
                "model produced {} predictions for {} samples",
                probs.nrows(),
                labels.len()
            )));
        }

        let mut loss = 0.0;
        let mut correct = 0usize;

        for (row, &label) in probs.rows().into_iter().zip(labels) {
            let p = *row.get(label).ok_or_else(|| {
                FedAvgError::invalid(format!(
                    "label {label} out of range for {} classes",
                    row.len()
                ))
            })?;

            loss -= f64::from(p).max(EPS).ln();

            let predicted = row
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i);
            if predicted == Some(label) {
                correct += 1;
            }
        }

        let n = labels.len() as f64;
        let evaluation = Evaluation {
            loss: loss / n,
            metrics: Metrics::from([("cen_accuracy".to_string(), correct as f64 / n)]),
        };

        debug!(
            round = round.get(),
            loss = evaluation.loss;
            "centralized evaluation done"
        );

        Ok(evaluation)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::evaluation::LinearClassifier;

    fn data() -> Arc<HeldOutSet> {
        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 0.0], [0.0, 1.0]];
        Arc::new(HeldOutSet::new(x, vec![0, 1, 0, 0]).unwrap())
    }

    fn round() -> NonZeroU32 {
        NonZeroU32::new(1).unwrap()
    }

    #[test]
    fn identity_weights_get_three_of_four_right() {
        let evaluator = CentralizedEvaluator::new(LinearClassifier::new(2, 2), data());
        // w = [[5, 0], [0, 5]], b = [0, 0]
        let params = [5.0, 0.0, 0.0, 5.0, 0.0, 0.0];
        let eval = evaluator.evaluate(&params, round()).unwrap();

        assert_eq!(eval.metrics["cen_accuracy"], 0.75);
        assert!(eval.loss > 0.0);
    }

    #[test]
    fn uniform_prediction_has_ln2_loss() {
        let evaluator = CentralizedEvaluator::new(LinearClassifier::new(2, 2), data());
        let eval = evaluator.evaluate(&[0.0; 6], round()).unwrap();
        assert!((eval.loss - std::f64::consts::LN_2).abs() < 1e-6);
    }

    #[test]
    fn parameters_are_left_untouched_and_errors_surface() {
        let evaluator = CentralizedEvaluator::new(LinearClassifier::new(2, 2), data());
        let params = vec![0.0; 5];
        assert!(matches!(
            evaluator.evaluate(&params, round()),
            Err(FedAvgError::InvalidArgument(_))
        ));
        assert_eq!(params, vec![0.0; 5]);
    }

    #[test]
    fn out_of_range_labels_are_reported() {
        let x = array![[1.0, 0.0]];
        let set = Arc::new(HeldOutSet::new(x, vec![7]).unwrap());
        let evaluator = CentralizedEvaluator::new(LinearClassifier::new(2, 2), set);
        assert!(evaluator.evaluate(&[0.0; 6], round()).is_err());
    }
}
