use std::{
    fs::File,
    path::Path,
    process::{Command, Stdio},
};

use log::info;

use super::TrialParams;
use crate::{
    error::{FedAvgError, Result},
    records::{RoundRecord, read_records_from_path},
};

/// Runs one training run with the given hyperparameters.
pub trait TrialRunner {
    /// Trains with `params`, keeping the full output at `log_path`.
    ///
    /// # Arguments
    /// * `trial` - Index of the trial within the sweep.
    /// * `params` - The hyperparameters to train with.
    /// * `log_path` - Where the run's output is kept.
    ///
    /// # Returns
    /// The round records the run produced.
    fn run_trial(
        &mut self,
        trial: usize,
        params: &TrialParams,
        log_path: &Path,
    ) -> Result<Vec<RoundRecord>>;
}

/// Runs an external training command per trial.
///
/// The command gets `--run-config=<overrides>` appended, its stdout and
/// stderr go to the trial log, and the records it printed are read back from
/// that log once it exits.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: String,
    args: Vec<String>,
}

impl CommandRunner {
    /// Creates a new `CommandRunner`.
    ///
    /// # Arguments
    /// * `program` - The executable to run.
    /// * `args` - Arguments placed before the run-config override.
    pub fn new<S: Into<String>>(program: S, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Builds a runner from a full command line, program first.
    ///
    /// # Errors
    /// `InvalidArgument` if `command` is empty.
    pub fn from_command_line(mut command: Vec<String>) -> Result<Self> {
        if command.is_empty() {
            return Err(FedAvgError::invalid("trial command is empty"));
        }
        let program = command.remove(0);
        Ok(Self::new(program, command))
    }
}

impl TrialRunner for CommandRunner {
    fn run_trial(
        &mut self,
        trial: usize,
        params: &TrialParams,
        log_path: &Path,
    ) -> Result<Vec<RoundRecord>> {
        let log = File::create(log_path)?;
        let run_config = format!("--run-config={}", params.run_config());

        info!("trial {trial}: running {} ({run_config})", self.program);

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&run_config)
            .stdout(Stdio::from(log.try_clone()?))
            .stderr(Stdio::from(log))
            .status()?;

        if !status.success() {
            return Err(FedAvgError::TrialFailed { trial, status });
        }

        info!("trial {trial}: output saved to {}", log_path.display());
        read_records_from_path(log_path)
    }
}
