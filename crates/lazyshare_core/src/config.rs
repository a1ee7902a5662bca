//! Runtime configuration for logging and cache behavior.
//!
//! # Responsibility
//! - Parse JSON configuration into typed settings.
//! - Supply defaults for every omitted field.
//!
//! # Invariants
//! - An empty JSON object yields `CoreConfig::default()`.
//! - Unknown fields are rejected so typos do not silently fall back to defaults.

use crate::cache::FillPolicy;
use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub logging: LoggingConfig,
    pub cache: CacheConfig,
}

/// File logging settings; logging stays off while `log_dir` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub fill_policy: FillPolicy,
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl CoreConfig {
    /// Parses a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Reads and parses a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::{CacheConfig, ConfigError, CoreConfig};
    use crate::cache::FillPolicy;
    use crate::logging::default_log_level;

    #[test]
    fn empty_document_yields_defaults() {
        let config = CoreConfig::from_json_str("{}").expect("empty object should parse");
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.logging.level, default_log_level());
        assert!(config.logging.log_dir.is_none());
        assert_eq!(config.cache.fill_policy, FillPolicy::Coalesced);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = CoreConfig::from_json_str(r#"{"cache": {"fill_policy": "relaxed"}}"#)
            .expect("partial config should parse");
        assert_eq!(
            config.cache,
            CacheConfig {
                fill_policy: FillPolicy::Relaxed
            }
        );
        assert_eq!(config.logging.level, default_log_level());
    }

    #[test]
    fn unknown_fields_and_policies_are_rejected() {
        let typo = CoreConfig::from_json_str(r#"{"cache": {"fill_polcy": "relaxed"}}"#)
            .expect_err("unknown field must be rejected");
        assert!(matches!(typo, ConfigError::Parse(_)));

        let policy = CoreConfig::from_json_str(r#"{"cache": {"fill_policy": "lru"}}"#)
            .expect_err("unknown policy must be rejected");
        assert!(policy.to_string().starts_with("invalid config"));
    }
}
