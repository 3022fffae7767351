use std::{error::Error, fmt, io, process::ExitStatus};

/// The crate's result type.
pub type Result<T> = std::result::Result<T, FedAvgError>;

/// All errors that can occur while configuring, aggregating or reporting a run.
#[derive(Debug)]
pub enum FedAvgError {
    /// An input is invalid: empty report set, malformed base config, bad shape.
    InvalidArgument(String),
    /// A weighted mean was requested over a total sample count of zero.
    DivisionByZero { what: String },
    /// A required metric is absent from one of the reports.
    MissingMetric { metric: String, client: usize },
    /// A file could not be read or written.
    Io(io::Error),
    /// A JSON document could not be parsed.
    Json(serde_json::Error),
    /// A round record line could not be parsed.
    MalformedRecord { line: usize, msg: String },
    /// The federation failed to collect the reports of a round.
    ClientFailure { round: u32, msg: String },
    /// An external training command exited unsuccessfully.
    TrialFailed { trial: usize, status: ExitStatus },
}

impl FedAvgError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl fmt::Display for FedAvgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::DivisionByZero { what } => {
                write!(f, "division by zero: total sample count is 0 for {what}")
            }
            Self::MissingMetric { metric, client } => {
                write!(f, "metric '{metric}' missing from report {client}")
            }
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Json(e) => write!(f, "json error: {e}"),
            Self::MalformedRecord { line, msg } => {
                write!(f, "malformed record at line {line}: {msg}")
            }
            Self::ClientFailure { round, msg } => {
                write!(f, "client failure in round {round}: {msg}")
            }
            Self::TrialFailed { trial, status } => {
                write!(f, "trial {trial} failed: {status}")
            }
        }
    }
}

impl Error for FedAvgError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FedAvgError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for FedAvgError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
