use std::{collections::btree_map::Entry, fmt, num::NonZeroU32, str::FromStr};

use crate::{
    aggregation::Metrics,
    error::{FedAvgError, Result},
};

/// Version written in, and required from, every record line.
pub const RECORD_VERSION: u32 = 1;

const METRIC_PREFIX: &str = "metric.";

/// Where the numbers of a record come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Aggregated client training metrics.
    Fit,
    /// Aggregated client evaluation loss and metrics.
    Evaluate,
    /// Coordinator side evaluation on the held out set.
    Centralized,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fit => "fit",
            Self::Evaluate => "evaluate",
            Self::Centralized => "centralized",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "fit" => Ok(Self::Fit),
            "evaluate" => Ok(Self::Evaluate),
            "centralized" => Ok(Self::Centralized),
            other => Err(format!("unknown phase '{other}'")),
        }
    }
}

/// One round's results for one phase.
///
/// Serialized as a single line of space separated `key=value` pairs:
///
/// ```text
/// v=1 round=3 phase=evaluate loss=0.4213 metric.accuracy=0.8125
/// ```
///
/// Floats use the shortest representation that parses back to the same
/// value, so a write/parse cycle is lossless.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundRecord {
    pub round: NonZeroU32,
    pub phase: Phase,
    pub loss: Option<f64>,
    pub metrics: Metrics,
}

impl RoundRecord {
    pub fn new(round: NonZeroU32, phase: Phase, loss: Option<f64>, metrics: Metrics) -> Self {
        Self {
            round,
            phase,
            loss,
            metrics,
        }
    }

    /// Renders this record as a single line, without the trailing newline.
    ///
    /// # Errors
    /// `InvalidArgument` if a metric name is empty or holds whitespace or `=`.
    pub fn to_line(&self) -> Result<String> {
        let mut line = format!(
            "v={RECORD_VERSION} round={} phase={}",
            self.round, self.phase
        );

        if let Some(loss) = self.loss {
            line.push_str(&format!(" loss={loss}"));
        }

        for (name, value) in &self.metrics {
            if !is_valid_name(name) {
                return Err(FedAvgError::invalid(format!(
                    "metric name '{name}' cannot be written to a record"
                )));
            }
            line.push_str(&format!(" {METRIC_PREFIX}{name}={value}"));
        }

        Ok(line)
    }

    /// Parses a line produced by [`RoundRecord::to_line`].
    ///
    /// # Arguments
    /// * `line` - The record text.
    /// * `line_no` - Position of the line in its source, for error messages.
    ///
    /// # Errors
    /// `MalformedRecord` on an unsupported version, a missing, duplicate or
    /// unknown key, or a value that doesn't parse.
    pub fn parse(line: &str, line_no: usize) -> Result<Self> {
        let malformed = |msg: String| FedAvgError::MalformedRecord { line: line_no, msg };

        let mut version = None;
        let mut round = None;
        let mut phase = None;
        let mut loss = None;
        let mut metrics = Metrics::new();

        for token in line.split_whitespace() {
            let (key, value) = token
                .split_once('=')
                .ok_or_else(|| malformed(format!("token '{token}' has no '='")))?;

            let duplicate = || malformed(format!("duplicate key '{key}'"));
            let float = || {
                value
                    .parse::<f64>()
                    .map_err(|e| malformed(format!("{key}: {e}")))
            };

            match key {
                "v" => {
                    let v = value
                        .parse::<u32>()
                        .map_err(|e| malformed(format!("v: {e}")))?;
                    if version.replace(v).is_some() {
                        return Err(duplicate());
                    }
                }
                "round" => {
                    let r = value
                        .parse::<NonZeroU32>()
                        .map_err(|e| malformed(format!("round: {e}")))?;
                    if round.replace(r).is_some() {
                        return Err(duplicate());
                    }
                }
                "phase" => {
                    let p = value.parse::<Phase>().map_err(malformed)?;
                    if phase.replace(p).is_some() {
                        return Err(duplicate());
                    }
                }
                "loss" => {
                    if loss.replace(float()?).is_some() {
                        return Err(duplicate());
                    }
                }
                _ => {
                    let name = key
                        .strip_prefix(METRIC_PREFIX)
                        .filter(|name| !name.is_empty())
                        .ok_or_else(|| malformed(format!("unknown key '{key}'")))?;

                    match metrics.entry(name.to_string()) {
                        Entry::Vacant(slot) => {
                            slot.insert(float()?);
                        }
                        Entry::Occupied(_) => return Err(duplicate()),
                    }
                }
            }
        }

        match version {
            Some(RECORD_VERSION) => {}
            Some(other) => return Err(malformed(format!("unsupported version {other}"))),
            None => return Err(malformed("missing version".into())),
        }

        Ok(Self {
            round: round.ok_or_else(|| malformed("missing round".into()))?,
            phase: phase.ok_or_else(|| malformed("missing phase".into()))?,
            loss,
            metrics,
        })
    }

    /// Returns true if `line` looks like a record rather than free log text.
    pub fn is_record_line(line: &str) -> bool {
        line.trim_start().starts_with("v=")
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(|c: char| c.is_whitespace() || c == '=')
}
