//! Module: config
//! Responsibility: validator tuning knobs loaded from TOML.
//! Does not own: schema definitions or per-request state.

use serde::Deserialize;
use std::{fs, path::Path};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config value for '{key}': {message}")]
    Invalid { key: &'static str, message: String },
}

///
/// ValidatorConfig
///
/// Process-wide limits applied by every validation call.
/// Read-only once the registry is built.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Maximum nesting depth of any input tree.
    pub max_depth: usize,
    /// Maximum length of list-valued operands (`in`, `createMany`, batch `connect`).
    pub max_list_len: usize,
    pub datetime: DateTimeConfig,
    pub decimal: DecimalConfig,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_list_len: 10_000,
            datetime: DateTimeConfig::default(),
            decimal: DecimalConfig::default(),
        }
    }
}

impl ValidatorConfig {
    /// Parse a config document; absent keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.check()?;

        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&source)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid {
                key: "max_depth",
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_list_len == 0 {
            return Err(ConfigError::Invalid {
                key: "max_list_len",
                message: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

///
/// DateTimeConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DateTimeConfig {
    /// Accept numeric epoch milliseconds as datetimes.
    pub epoch_millis: bool,
}

impl Default for DateTimeConfig {
    fn default() -> Self {
        Self { epoch_millis: true }
    }
}

///
/// DecimalConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DecimalConfig {
    /// Accept `0x`/`0o`/`0b` literal forms in decimal strings.
    pub radix_literals: bool,
}

impl Default for DecimalConfig {
    fn default() -> Self {
        Self {
            radix_literals: true,
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = ValidatorConfig::from_toml_str("").expect("empty config parses");

        assert_eq!(config, ValidatorConfig::default());
    }

    #[test]
    fn partial_document_overrides_only_named_keys() {
        let config = ValidatorConfig::from_toml_str(
            "max_depth = 8\n[decimal]\nradix_literals = false\n",
        )
        .expect("partial config parses");

        assert_eq!(config.max_depth, 8);
        assert_eq!(config.max_list_len, 10_000);
        assert!(config.datetime.epoch_millis);
        assert!(!config.decimal.radix_literals);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ValidatorConfig::from_toml_str("max_dpeth = 3").expect_err("typo rejected");

        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn zero_depth_is_rejected() {
        let err = ValidatorConfig::from_toml_str("max_depth = 0").expect_err("zero rejected");

        assert!(matches!(err, ConfigError::Invalid { key: "max_depth", .. }));
    }

    #[test]
    fn files_are_read_from_disk() {
        let path =
            std::env::temp_dir().join(format!("rowguard-config-{}.toml", std::process::id()));
        fs::write(&path, "max_list_len = 50\n").expect("write config");

        let config = ValidatorConfig::from_path(&path).expect("config file parses");
        let _ = fs::remove_file(&path);
        assert_eq!(config.max_list_len, 50);

        let err = ValidatorConfig::from_path(path.with_extension("missing")).expect_err("no file");
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
