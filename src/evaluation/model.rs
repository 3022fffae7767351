use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{FedAvgError, Result};

/// The forward pass of the global model over flat parameters.
pub trait Model {
    /// Returns the amount of parameters this model expects.
    fn num_params(&self) -> usize;

    /// Computes class probabilities for every row of `x`.
    ///
    /// # Arguments
    /// * `params` - Flat model parameters.
    /// * `x` - One sample per row.
    ///
    /// # Returns
    /// A `(samples, classes)` matrix whose rows sum to 1.
    fn predict(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>>;
}

/// A single dense layer followed by a softmax.
///
/// Parameters are laid out as the `(inputs, classes)` weight matrix in row
/// major order followed by `classes` biases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearClassifier {
    inputs: usize,
    classes: usize,
}

impl LinearClassifier {
    pub fn new(inputs: usize, classes: usize) -> Self {
        Self { inputs, classes }
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    fn view_params<'a>(
        &self,
        params: &'a [f32],
    ) -> Result<(ArrayView2<'a, f32>, ArrayView1<'a, f32>)> {
        if params.len() != self.num_params() {
            return Err(FedAvgError::invalid(format!(
                "expected {} parameters, got {}",
                self.num_params(),
                params.len()
            )));
        }

        let w_size = self.inputs * self.classes;
        let weights = ArrayView2::from_shape((self.inputs, self.classes), &params[..w_size])
            .map_err(|e| FedAvgError::invalid(format!("weights shape: {e}")))?;
        let biases = ArrayView1::from_shape(self.classes, &params[w_size..])
            .map_err(|e| FedAvgError::invalid(format!("biases shape: {e}")))?;

        Ok((weights, biases))
    }
}

impl Model for LinearClassifier {
    fn num_params(&self) -> usize {
        (self.inputs + 1) * self.classes
    }

    fn predict(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.inputs {
            return Err(FedAvgError::invalid(format!(
                "expected {} features per sample, got {}",
                self.inputs,
                x.ncols()
            )));
        }

        let (w, b) = self.view_params(params)?;
        let mut z = x.dot(&w) + &b;

        for mut row in z.axis_iter_mut(Axis(0)) {
            let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            row.mapv_inplace(|v| v / sum);
        }

        Ok(z)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn rows_are_probability_distributions() {
        let model = LinearClassifier::new(2, 3);
        let params = [0.1, -0.2, 0.3, 0.4, 0.0, -0.1, 0.05, 0.0, -0.05];
        let probs = model.predict(&params, array![[1.0, 2.0], [-1.0, 0.5]].view()).unwrap();

        assert_eq!(probs.dim(), (2, 3));
        for row in probs.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn zero_parameters_give_a_uniform_prediction() {
        let model = LinearClassifier::new(1, 4);
        let probs = model.predict(&[0.0; 8], array![[3.0]].view()).unwrap();
        for &p in probs.iter() {
            assert!((p - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn wrong_parameter_count_is_rejected() {
        let model = LinearClassifier::new(2, 2);
        assert!(model.predict(&[0.0; 5], array![[1.0, 1.0]].view()).is_err());
        assert!(model.predict(&[0.0; 6], array![[1.0]].view()).is_err());
    }
}
