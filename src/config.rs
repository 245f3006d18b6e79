use std::env;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Default value for `max_attestation_size` in [`Config`] (100 KiB).
pub const DEFAULT_MAX_ATTESTATION_SIZE: usize = 100 * 1024;

/// Environment variable read by [`Config::from_env`].
pub const MAX_ATTESTATION_SIZE_ENV: &str = "MAX_ATTESTATION_SIZE";

/// Process-wide settings for entry handling.
///
/// Built once by the host at startup and only ever read afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Largest payload, in bytes, kept as an attestation alongside the entry.
    #[serde(default = "default_max_attestation_size")]
    pub max_attestation_size: usize,
}

fn default_max_attestation_size() -> usize {
    DEFAULT_MAX_ATTESTATION_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_attestation_size: DEFAULT_MAX_ATTESTATION_SIZE,
        }
    }
}

impl Config {
    /// Defaults, overridden by `MAX_ATTESTATION_SIZE` when it is set.
    pub fn from_env() -> Result<Self> {
        match env::var(MAX_ATTESTATION_SIZE_ENV) {
            Ok(value) => Self::default().with_max_attestation_size_str(&value),
            Err(env::VarError::NotPresent) => Ok(Self::default()),
            Err(e) => Err(anyhow!("{MAX_ATTESTATION_SIZE_ENV}: {e}")),
        }
    }

    /// Parses a JSON config document; missing fields take their defaults.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config = serde_json::from_str(s)?;
        Ok(config)
    }

    fn with_max_attestation_size_str(mut self, value: &str) -> Result<Self> {
        self.max_attestation_size = value
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {MAX_ATTESTATION_SIZE_ENV} '{value}': {e}"))?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        assert_eq!(Config::default().max_attestation_size, 102_400);
    }

    #[test]
    fn json_fills_missing_fields() {
        assert_eq!(Config::from_json_str("{}").unwrap(), Config::default());
        assert_eq!(
            Config::from_json_str(r#"{"maxAttestationSize": 16}"#)
                .unwrap()
                .max_attestation_size,
            16
        );
    }

    #[test]
    fn parses_size_override() {
        let config = Config::default()
            .with_max_attestation_size_str(" 2048 ")
            .unwrap();
        assert_eq!(config.max_attestation_size, 2048);

        assert!(Config::default()
            .with_max_attestation_size_str("lots")
            .is_err());
    }
}
