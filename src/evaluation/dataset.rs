use std::{fs, path::Path};

use ndarray::{Array2, ArrayView2};

use crate::error::{FedAvgError, Result};

/// The centralized test split: one row of features and one label per sample.
#[derive(Debug, Clone, PartialEq)]
pub struct HeldOutSet {
    x: Array2<f32>,
    labels: Vec<usize>,
}

impl HeldOutSet {
    /// Creates a new `HeldOutSet`.
    ///
    /// # Errors
    /// `InvalidArgument` if the set is empty or the row count doesn't match
    /// the number of labels.
    pub fn new(x: Array2<f32>, labels: Vec<usize>) -> Result<Self> {
        if labels.is_empty() {
            return Err(FedAvgError::invalid("held out set is empty"));
        }

        if x.nrows() != labels.len() {
            return Err(FedAvgError::invalid(format!(
                "held out set has {} rows but {} labels",
                x.nrows(),
                labels.len()
            )));
        }

        Ok(Self { x, labels })
    }

    /// Loads a set from a CSV file where every line is `label,x1,...,xn`.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    ///
    /// # Errors
    /// `Io` if the file cannot be read, `InvalidArgument` on a malformed line.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_csv_str(&content)
    }

    pub fn from_csv_str(content: &str) -> Result<Self> {
        let mut width = None;
        let mut labels = Vec::new();
        let mut data = Vec::new();

        for (line_no, line) in (1usize..).zip(content.lines()) {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split(',').map(str::trim);
            let label = fields
                .next()
                .and_then(|v| v.parse::<usize>().ok())
                .ok_or_else(|| {
                    FedAvgError::invalid(format!("line {line_no}: missing or bad label"))
                })?;

            let features = fields
                .map(|v| {
                    v.parse::<f32>().map_err(|_| {
                        FedAvgError::invalid(format!("line {line_no}: cannot parse '{v}' as f32"))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let expected = *width.get_or_insert(features.len());
            if features.len() != expected || expected == 0 {
                return Err(FedAvgError::invalid(format!(
                    "line {line_no}: expected {expected} features, got {}",
                    features.len()
                )));
            }

            labels.push(label);
            data.extend(features);
        }

        let width = width.unwrap_or(0);
        let x = Array2::from_shape_vec((labels.len(), width), data)
            .map_err(|e| FedAvgError::invalid(format!("held out set shape: {e}")))?;

        Self::new(x, labels)
    }

    pub fn features(&self) -> ArrayView2<'_, f32> {
        self.x.view()
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of features per sample.
    pub fn width(&self) -> usize {
        self.x.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_and_features() {
        let set = HeldOutSet::from_csv_str("# label,x0,x1\n1, 0.5, 1.0\n\n0,2,3\n").unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.width(), 2);
        assert_eq!(set.labels(), &[1, 0]);
        assert_eq!(set.features()[[1, 1]], 3.0);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(HeldOutSet::from_csv_str("1,0.5,1.0\n0,2\n").is_err());
    }

    #[test]
    fn errors_name_the_line_as_counted_from_one() {
        match HeldOutSet::from_csv_str("# header\n1,0.5\nx,0.2\n") {
            Err(FedAvgError::InvalidArgument(msg)) => assert!(msg.starts_with("line 3:"), "{msg}"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            HeldOutSet::from_csv_str("# nothing\n"),
            Err(FedAvgError::InvalidArgument(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            HeldOutSet::from_csv_path("/definitely/not/here.csv"),
            Err(FedAvgError::Io(_))
        ));
    }
}
