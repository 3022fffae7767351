use crate::{
    coordinator::History,
    error::{FedAvgError, Result},
};

/// Best and final loss and accuracy of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub rounds: usize,
    pub best_loss: f64,
    pub best_loss_round: u32,
    pub final_loss: f64,
    pub best_acc: f64,
    pub best_acc_round: u32,
    pub final_acc: f64,
}

impl RunSummary {
    /// Summarizes the distributed loss and the `accuracy_metric` series.
    ///
    /// The two series are aligned on the shorter one for best and final
    /// values; `rounds` counts every recorded loss round. Ties keep the
    /// earliest round.
    ///
    /// # Errors
    /// `InvalidArgument` if either series is missing or empty.
    pub fn from_history(history: &History, accuracy_metric: &str) -> Result<Self> {
        let accuracies = history
            .metrics_distributed
            .get(accuracy_metric)
            .ok_or_else(|| {
                FedAvgError::invalid(format!("history has no '{accuracy_metric}' series"))
            })?;

        let n = history.losses_distributed.len().min(accuracies.len());
        if n == 0 {
            return Err(FedAvgError::invalid("history holds no loss and accuracy rounds"));
        }

        let losses = &history.losses_distributed[..n];
        let accuracies = &accuracies[..n];

        let best_loss = losses
            .iter()
            .copied()
            .reduce(|best, cur| if cur.1 < best.1 { cur } else { best })
            .ok_or_else(|| FedAvgError::invalid("empty loss series"))?;
        let best_acc = accuracies
            .iter()
            .copied()
            .reduce(|best, cur| if cur.1 > best.1 { cur } else { best })
            .ok_or_else(|| FedAvgError::invalid("empty accuracy series"))?;

        Ok(Self {
            rounds: history.losses_distributed.len(),
            best_loss: best_loss.1,
            best_loss_round: best_loss.0,
            final_loss: losses[n - 1].1,
            best_acc: best_acc.1,
            best_acc_round: best_acc.0,
            final_acc: accuracies[n - 1].1,
        })
    }
}
