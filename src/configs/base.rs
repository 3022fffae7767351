use std::{
    fs,
    num::{NonZeroU32, NonZeroUsize},
    path::Path,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FedAvgError, Result};

/// A learning rate that takes effect once `after_round` has passed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Milestone {
    pub after_round: u32,
    pub lr: f64,
}

/// Selects how the learning rate evolves across rounds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ScheduleConfig {
    #[default]
    Constant,
    Step {
        milestones: Vec<Milestone>,
    },
}

/// The run configuration read once at process start.
///
/// Keys are kebab-case, the same names accepted by `--run-config` overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BaseConfig {
    pub num_server_rounds: NonZeroU32,
    pub fraction_fit: f64,
    #[serde(default = "default_fraction_evaluate")]
    pub fraction_evaluate: f64,
    #[serde(default = "default_min_available_clients")]
    pub min_available_clients: usize,
    #[serde(default = "default_num_clients")]
    pub num_clients: usize,
    pub local_epochs: NonZeroU32,
    pub batch_size: NonZeroUsize,
    pub learning_rate: f64,
    #[serde(default)]
    pub lr_schedule: ScheduleConfig,
}

fn default_fraction_evaluate() -> f64 {
    1.0
}

fn default_min_available_clients() -> usize {
    10
}

fn default_num_clients() -> usize {
    100
}

impl BaseConfig {
    /// Loads and validates a `BaseConfig` from a JSON file.
    ///
    /// # Errors
    /// `Io` if the file cannot be read, `Json` if it cannot be parsed and
    /// `InvalidArgument` if any value is out of range.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parses and validates a `BaseConfig` from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies space separated `key=value` overrides on top of this config.
    ///
    /// Values are read as JSON when possible and as plain strings otherwise,
    /// so `fraction-fit=0.3 local-epochs=5` behaves as expected.
    ///
    /// # Errors
    /// `InvalidArgument` for a token without `=` or an unknown key, and for any
    /// value that leaves the config invalid.
    pub fn with_overrides(self, overrides: &str) -> Result<Self> {
        let mut doc = serde_json::to_value(&self)?;
        let Value::Object(fields) = &mut doc else {
            return Err(FedAvgError::invalid("base config is not an object"));
        };

        for token in overrides.split_whitespace() {
            let (key, raw) = token
                .split_once('=')
                .ok_or_else(|| FedAvgError::invalid(format!("override '{token}' has no '='")))?;

            if !fields.contains_key(key) {
                return Err(FedAvgError::invalid(format!("unknown config key '{key}'")));
            }

            let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.into()));
            fields.insert(key.to_string(), value);
        }

        let config: Self = serde_json::from_value(doc)
            .map_err(|e| FedAvgError::invalid(format!("override rejected: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value is within its domain.
    ///
    /// # Errors
    /// `InvalidArgument` describing the first offending key.
    pub fn validate(&self) -> Result<()> {
        if !(self.fraction_fit > 0.0 && self.fraction_fit <= 1.0) {
            return Err(FedAvgError::invalid(format!(
                "fraction-fit ({}) must be in (0, 1]",
                self.fraction_fit
            )));
        }

        if !(0.0..=1.0).contains(&self.fraction_evaluate) {
            return Err(FedAvgError::invalid(format!(
                "fraction-evaluate ({}) must be in [0, 1]",
                self.fraction_evaluate
            )));
        }

        if self.num_clients == 0 {
            return Err(FedAvgError::invalid("num-clients must be greater than 0"));
        }

        if self.min_available_clients > self.num_clients {
            return Err(FedAvgError::invalid(format!(
                "min-available-clients ({}) cannot exceed num-clients ({})",
                self.min_available_clients, self.num_clients
            )));
        }

        check_lr("learning-rate", self.learning_rate)?;

        if let ScheduleConfig::Step { milestones } = &self.lr_schedule {
            for (i, m) in milestones.iter().enumerate() {
                check_lr("lr-schedule milestone lr", m.lr)?;
                if i > 0 && milestones[i - 1].after_round >= m.after_round {
                    return Err(FedAvgError::invalid(format!(
                        "lr-schedule milestone {i}: after-round ({}) must be strictly increasing",
                        m.after_round
                    )));
                }
            }
        }

        Ok(())
    }
}

fn check_lr(key: &str, lr: f64) -> Result<()> {
    if !lr.is_finite() || lr <= 0.0 {
        return Err(FedAvgError::invalid(format!(
            "{key} ({lr}) must be a finite positive number"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "num-server-rounds": 40,
        "fraction-fit": 0.5,
        "local-epochs": 2,
        "batch-size": 32,
        "learning-rate": 0.01
    }"#;

    #[test]
    fn defaults_fill_optional_keys() {
        let config = BaseConfig::from_json_str(MINIMAL).unwrap();
        assert_eq!(config.num_server_rounds.get(), 40);
        assert_eq!(config.fraction_evaluate, 1.0);
        assert_eq!(config.min_available_clients, 10);
        assert_eq!(config.num_clients, 100);
        assert_eq!(config.lr_schedule, ScheduleConfig::Constant);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let doc = MINIMAL.replace("\"batch-size\"", "\"batchsize\"");
        assert!(matches!(
            BaseConfig::from_json_str(&doc),
            Err(FedAvgError::Json(_))
        ));
    }

    #[test]
    fn out_of_range_fraction_is_invalid() {
        let doc = MINIMAL.replace("0.5", "1.5");
        assert!(matches!(
            BaseConfig::from_json_str(&doc),
            Err(FedAvgError::InvalidArgument(_))
        ));
    }

    #[test]
    fn overrides_replace_values() {
        let config = BaseConfig::from_json_str(MINIMAL)
            .unwrap()
            .with_overrides("fraction-fit=0.3 local-epochs=5 learning-rate=0.004 batch-size=20 ")
            .unwrap();

        assert_eq!(config.fraction_fit, 0.3);
        assert_eq!(config.local_epochs.get(), 5);
        assert_eq!(config.learning_rate, 0.004);
        assert_eq!(config.batch_size.get(), 20);
    }

    #[test]
    fn overrides_reject_unknown_or_invalid_values() {
        let config = BaseConfig::from_json_str(MINIMAL).unwrap();
        assert!(config.clone().with_overrides("momentum=0.9").is_err());
        assert!(config.clone().with_overrides("fraction-fit").is_err());
        assert!(config.with_overrides("local-epochs=0").is_err());
    }

    #[test]
    fn step_schedule_parses_and_requires_increasing_rounds() {
        let doc = MINIMAL.replace(
            "\"learning-rate\": 0.01",
            r#""learning-rate": 0.01,
               "lr-schedule": {"kind": "step", "milestones": [{"after-round": 30, "lr": 0.005}]}"#,
        );
        let config = BaseConfig::from_json_str(&doc).unwrap();
        assert_eq!(
            config.lr_schedule,
            ScheduleConfig::Step {
                milestones: vec![Milestone { after_round: 30, lr: 0.005 }]
            }
        );

        let bad = doc.replace(
            r#"[{"after-round": 30, "lr": 0.005}]"#,
            r#"[{"after-round": 30, "lr": 0.005}, {"after-round": 30, "lr": 0.001}]"#,
        );
        assert!(BaseConfig::from_json_str(&bad).is_err());
    }
}
