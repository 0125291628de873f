//! Configuration for scope managers.
//!
//! Values come from code, from environment variables, or (feature `config`)
//! from JSON / YAML documents.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::{ScopeError, ScopeResult};

/// Default prefix for environment variables read by [`ScopeConfig::from_env`].
pub const DEFAULT_ENV_PREFIX: &str = "SESSION_SCOPE";

/// Scope manager settings.
///
/// # Examples
///
/// ```
/// use ferrous_session::ScopeConfig;
///
/// let config = ScopeConfig::default()
///     .with_max_active_scopes(1024)
///     .with_log_events(true);
///
/// assert_eq!(config.max_active_scopes, Some(1024));
/// assert!(config.release_singleton_on_shutdown);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ScopeConfig {
    /// Upper bound on concurrently open scopes; `None` (or `Some(0)`) is unbounded
    pub max_active_scopes: Option<usize>,
    /// Run the release hook on the singleton session at shutdown
    pub release_singleton_on_shutdown: bool,
    /// Install the built-in [`LoggingObserver`](crate::LoggingObserver)
    pub log_events: bool,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            max_active_scopes: None,
            release_singleton_on_shutdown: true,
            log_events: false,
        }
    }
}

impl ScopeConfig {
    /// Sets the scope limit; `0` means unbounded.
    pub fn with_max_active_scopes(mut self, limit: usize) -> Self {
        self.max_active_scopes = Some(limit).filter(|&n| n > 0);
        self
    }

    pub fn with_release_singleton_on_shutdown(mut self, release: bool) -> Self {
        self.release_singleton_on_shutdown = release;
        self
    }

    pub fn with_log_events(mut self, enabled: bool) -> Self {
        self.log_events = enabled;
        self
    }

    /// The limit the registry enforces, with `Some(0)` read as unbounded.
    pub fn scope_limit(&self) -> Option<usize> {
        self.max_active_scopes.filter(|&n| n > 0)
    }

    #[cfg(feature = "config")]
    fn normalized(mut self) -> Self {
        self.max_active_scopes = self.scope_limit();
        self
    }

    /// Reads settings from `SESSION_SCOPE_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> ScopeResult<Self> {
        Self::from_env_with_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Reads `<PREFIX>_MAX_ACTIVE_SCOPES`, `<PREFIX>_RELEASE_SINGLETON_ON_SHUTDOWN`
    /// and `<PREFIX>_LOG_EVENTS`.
    pub fn from_env_with_prefix(prefix: &str) -> ScopeResult<Self> {
        let mut config = Self::default();
        let var = |name: &str| env::var(format!("{}_{}", prefix.to_uppercase(), name)).ok();

        if let Some(value) = var("MAX_ACTIVE_SCOPES") {
            config.max_active_scopes = parse_limit(&value)?;
        }
        if let Some(value) = var("RELEASE_SINGLETON_ON_SHUTDOWN") {
            config.release_singleton_on_shutdown = parse_flag("RELEASE_SINGLETON_ON_SHUTDOWN", &value)?;
        }
        if let Some(value) = var("LOG_EVENTS") {
            config.log_events = parse_flag("LOG_EVENTS", &value)?;
        }

        Ok(config)
    }

    /// Parses a JSON document; missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json_str(json: &str) -> ScopeResult<Self> {
        serde_json::from_str::<Self>(json)
            .map(Self::normalized)
            .map_err(|e| invalid_config(format!("invalid JSON configuration: {}", e)))
    }

    /// Parses a YAML document; missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_yaml_str(yaml: &str) -> ScopeResult<Self> {
        serde_yaml::from_str::<Self>(yaml)
            .map(Self::normalized)
            .map_err(|e| invalid_config(format!("invalid YAML configuration: {}", e)))
    }
}

fn invalid_config(message: String) -> ScopeError {
    ScopeError::InvalidConfig(message)
}

// "none", "unbounded" and "0" all mean no limit
fn parse_limit(value: &str) -> ScopeResult<Option<usize>> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("none") || value.eq_ignore_ascii_case("unbounded") {
        return Ok(None);
    }
    match value.parse::<usize>() {
        Ok(0) => Ok(None),
        Ok(limit) => Ok(Some(limit)),
        Err(_) => Err(invalid_config(format!(
            "MAX_ACTIVE_SCOPES must be a non-negative integer, got {:?}",
            value
        ))),
    }
}

fn parse_flag(name: &str, value: &str) -> ScopeResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(invalid_config(format!("{} must be a boolean, got {:?}", name, other))),
    }
}
