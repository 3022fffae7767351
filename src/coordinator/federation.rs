use crate::{
    aggregation::{ClientReport, EvaluateReport},
    error::Result,
    schedule::RoundConfig,
};

/// What the clients hand back after a round of local training.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    /// The averaged global parameters.
    pub parameters: Vec<f32>,
    /// One report per client that took part.
    pub reports: Vec<ClientReport>,
}

/// The clients and the transport to reach them.
///
/// Client selection, local training and parameter averaging all happen
/// behind this trait; the coordinator only sees configs going out and
/// reports coming back.
pub trait Federation {
    /// Runs one round of local training on the selected clients.
    ///
    /// # Arguments
    /// * `config` - The config every client must train with.
    /// * `parameters` - The current global parameters.
    fn fit(&mut self, config: &RoundConfig, parameters: &[f32]) -> Result<FitOutcome>;

    /// Has the selected clients evaluate `parameters` on their local splits.
    fn evaluate(&mut self, config: &RoundConfig, parameters: &[f32]) -> Result<Vec<EvaluateReport>>;
}
