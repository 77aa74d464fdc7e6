//! Connection configuration
//!
//! Settings come from an optional JSON file and are overridden by
//! command-line arguments or environment variables:
//!
//! ```json
//! { "protocol": "https", "host": "misp.example", "api-key": "..." }
//! ```

use std::path::Path;

use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::client::{Scheme, DEFAULT_REQUEST_TIMEOUT};
use crate::error::{MispError, Result};

/// Resolved settings needed to open a [`Connection`](crate::Connection)
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct MispConfig {
    #[validate(custom = "validate_protocol")]
    pub protocol: String,
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(length(min = 1))]
    pub api_key: String,
    pub insecure: bool,
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

/// Values taking precedence over the configuration file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub protocol: Option<String>,
    pub host: Option<String>,
    pub api_key: Option<String>,
    /// Only ever switches verification off
    pub insecure: bool,
}

/// Configuration file as written; every key may be absent
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    protocol: Option<String>,
    host: Option<String>,
    api_key: Option<String>,
    insecure: Option<bool>,
    timeout_secs: Option<u64>,
}

fn validate_protocol(protocol: &str) -> std::result::Result<(), ValidationError> {
    protocol
        .parse::<Scheme>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("unknown_protocol"))
}

fn required(value: Option<String>, key: &str) -> Result<String> {
    value.ok_or_else(|| MispError::Config(format!("configuration parameter {key} is mandatory")))
}

impl MispConfig {
    /// Load a configuration file with no overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::resolve(Some(path.as_ref()), ConfigOverrides::default())
    }

    /// Parse configuration from a JSON document
    pub fn from_json(data: &str) -> Result<Self> {
        Self::merge(parse_raw(data)?, ConfigOverrides::default())
    }

    /// Combine the optional file at `path` with `overrides` and validate the result
    pub fn resolve(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let raw = match path {
            Some(path) => {
                let data = std::fs::read_to_string(path).map_err(|source| MispError::ConfigIo {
                    path: path.to_path_buf(),
                    source,
                })?;
                tracing::debug!(path = %path.display(), "Loaded MISP configuration file");
                parse_raw(&data)?
            }
            None => RawConfig::default(),
        };

        Self::merge(raw, overrides)
    }

    fn merge(raw: RawConfig, overrides: ConfigOverrides) -> Result<Self> {
        let config = Self {
            protocol: required(overrides.protocol.or(raw.protocol), "protocol")?,
            host: required(overrides.host.or(raw.host), "host")?,
            api_key: required(overrides.api_key.or(raw.api_key), "api-key")?,
            insecure: overrides.insecure || raw.insecure.unwrap_or(false),
            timeout_secs: raw
                .timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT.as_secs()),
        };

        config
            .validate()
            .map_err(|e| MispError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn parse_raw(data: &str) -> Result<RawConfig> {
    serde_json::from_str(data).map_err(|e| MispError::Config(format!("invalid configuration: {e}")))
}
