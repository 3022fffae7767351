use std::{collections::BTreeMap, num::NonZeroU32};

use serde::{Deserialize, Serialize};

use crate::configs::ConfigValue;

/// The training configuration every client must use in one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundConfig {
    pub round: NonZeroU32,
    pub parameters: BTreeMap<String, ConfigValue>,
}

impl RoundConfig {
    pub fn new(round: NonZeroU32) -> Self {
        Self {
            round,
            parameters: BTreeMap::new(),
        }
    }

    /// Sets `name` to `value`, replacing any previous value.
    pub fn set<V: Into<ConfigValue>>(&mut self, name: &str, value: V) {
        self.parameters.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.parameters.get(name)
    }

    /// Returns the learning rate of this round, if any.
    pub fn lr(&self) -> Option<f64> {
        self.get("lr").and_then(ConfigValue::as_f64)
    }
}

/// Produces the per-round training configuration.
///
/// Implementations must be pure: the same round always yields the same config.
pub trait RoundConfigProvider {
    /// Returns the configuration clients must train with in `round`.
    ///
    /// # Arguments
    /// * `round` - The 1-based index of the round about to start.
    fn configure(&self, round: NonZeroU32) -> RoundConfig;
}

impl<P: RoundConfigProvider + ?Sized> RoundConfigProvider for Box<P> {
    fn configure(&self, round: NonZeroU32) -> RoundConfig {
        (**self).configure(round)
    }
}

impl<P: RoundConfigProvider + ?Sized> RoundConfigProvider for &P {
    fn configure(&self, round: NonZeroU32) -> RoundConfig {
        (**self).configure(round)
    }
}
