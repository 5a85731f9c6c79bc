//! Runtime configuration.
//!
//! Defaults match the permissive behaviour: no digest bound, evaluation
//! failures logged at `trace`. With the `config` feature a config can be
//! loaded from TOML or JSON text; [`RuntimeConfig::from_env`] reads
//! `NGL_DIGEST_LIMIT` and `NGL_EVAL_DIAGNOSTICS`.

use std::env;

/// Environment variable holding the event-digest pass bound.
pub const DIGEST_LIMIT_VAR: &str = "NGL_DIGEST_LIMIT";
/// Environment variable that promotes evaluation failures to `warn`.
pub const EVAL_DIAGNOSTICS_VAR: &str = "NGL_EVAL_DIAGNOSTICS";

/// Settings shared by every scope of a tree and by the container that owns
/// the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default, deny_unknown_fields))]
pub struct RuntimeConfig {
    /// Maximum digest passes per scope for event-driven digests. `None`
    /// keeps digests unbounded.
    pub digest_limit: Option<u32>,
    /// Log expression failures at `warn` instead of `trace`.
    pub eval_diagnostics: bool,
}

impl RuntimeConfig {
    #[must_use]
    pub fn with_digest_limit(mut self, limit: u32) -> Self {
        self.digest_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_eval_diagnostics(mut self, enabled: bool) -> Self {
        self.eval_diagnostics = enabled;
        self
    }

    /// Read the configuration from the process environment. Unset
    /// variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a variable is set to a value
    /// that cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let digest_limit = env::var(DIGEST_LIMIT_VAR).ok();
        let eval_diagnostics = env::var(EVAL_DIAGNOSTICS_VAR).ok();
        Self::from_env_values(digest_limit.as_deref(), eval_diagnostics.as_deref())
    }

    fn from_env_values(
        digest_limit: Option<&str>,
        eval_diagnostics: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = digest_limit.map(str::trim).filter(|raw| !raw.is_empty()) {
            let limit = raw
                .parse::<u32>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or_else(|| ConfigError::InvalidEnv {
                    var: DIGEST_LIMIT_VAR,
                    value: raw.to_owned(),
                })?;
            config.digest_limit = Some(limit);
        }

        if let Some(raw) = eval_diagnostics {
            config.eval_diagnostics =
                parse_flag(raw).ok_or_else(|| ConfigError::InvalidEnv {
                    var: EVAL_DIAGNOSTICS_VAR,
                    value: raw.to_owned(),
                })?;
        }

        Ok(config)
    }

    /// Parse a TOML document such as `digest_limit = 10`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] for malformed input or unknown keys and
    /// [`ConfigError::ZeroDigestLimit`] for `digest_limit = 0`.
    #[cfg(feature = "config")]
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str::<Self>(text)
            .map_err(|err| ConfigError::Toml(err.to_string()))?
            .validated()
    }

    /// Parse a JSON document such as `{"eval_diagnostics": true}`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed input or unknown keys and
    /// [`ConfigError::ZeroDigestLimit`] for `"digest_limit": 0`.
    #[cfg(feature = "config")]
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(text)
            .map_err(|err| ConfigError::Json(err.to_string()))?
            .validated()
    }

    /// A digest limit, when present, must allow at least one pass.
    #[cfg(feature = "config")]
    fn validated(self) -> Result<Self, ConfigError> {
        match self.digest_limit {
            Some(0) => Err(ConfigError::ZeroDigestLimit),
            _ => Ok(self),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Some(false),
        "1" | "true" | "yes" | "on" => Some(true),
        _ => None,
    }
}

/// Error type for configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable holds an unparseable value.
    InvalidEnv { var: &'static str, value: String },
    /// The TOML document could not be deserialized.
    Toml(String),
    /// The JSON document could not be deserialized.
    Json(String),
    /// A config document set `digest_limit` to zero.
    ZeroDigestLimit,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEnv { var, value } => write!(f, "invalid value for {var}: {value:?}"),
            Self::Toml(message) => write!(f, "invalid TOML config: {message}"),
            Self::Json(message) => write!(f, "invalid JSON config: {message}"),
            Self::ZeroDigestLimit => write!(f, "digest_limit must be greater than zero"),
        }
    }
}

impl std::error::Error for ConfigError {}
