//! Loading, environment overrides, and validation.
//!
//! Resolution order for each value: TOML file, then environment override,
//! then validation. The API key is resolved separately and on demand so a
//! config can be loaded and inspected without credentials present.

use std::path::Path;

use tracing::{debug, warn};

use medcompanion_contracts::error::{CompanionError, CompanionResult};

use crate::settings::{CompanionConfig, GenerationSettings};

/// Overrides `provider.endpoint`.
pub const ENDPOINT_ENV: &str = "MEDCOMPANION_ENDPOINT";
/// Overrides `provider.model`.
pub const MODEL_ENV: &str = "MEDCOMPANION_MODEL";

impl CompanionConfig {
    /// Parse `s` as TOML and validate it.
    ///
    /// Returns `CompanionError::Config` if the TOML is malformed, has unknown
    /// keys, or fails validation.
    pub fn from_toml_str(s: &str) -> CompanionResult<Self> {
        let config: CompanionConfig = toml::from_str(s).map_err(|e| CompanionError::Config {
            reason: format!("failed to parse config TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path` and parse it as TOML configuration.
    pub fn from_file(path: &Path) -> CompanionResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| CompanionError::Config {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&contents)
    }

    /// Apply `MEDCOMPANION_ENDPOINT` / `MEDCOMPANION_MODEL` from the process
    /// environment, then re-validate.
    pub fn with_env_overrides(self) -> CompanionResult<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. `with_env_overrides` uses
    /// the process environment; tests pass a closure.
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> CompanionResult<Self> {
        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.trim().is_empty()) {
            debug!(%endpoint, "endpoint overridden from environment");
            self.provider.endpoint = endpoint;
        }
        if let Some(model) = lookup(MODEL_ENV).filter(|v| !v.trim().is_empty()) {
            debug!(%model, "model overridden from environment");
            self.provider.model = model;
        }
        self.validate()?;
        Ok(self)
    }

    /// Resolve the API key from the process environment.
    pub fn resolve_api_key(&self) -> CompanionResult<String> {
        self.resolve_api_key_from(|key| std::env::var(key).ok())
    }

    /// Resolve the API key: inline `api_key` first, then `api_key_env`.
    ///
    /// The key itself is never logged.
    pub fn resolve_api_key_from(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> CompanionResult<String> {
        if let Some(key) = self.provider.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            warn!("using inline api_key from config; prefer api_key_env");
            return Ok(key.to_string());
        }

        let var = &self.provider.api_key_env;
        lookup(var)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CompanionError::Config {
                reason: format!(
                    "no API key: set provider.api_key or the '{var}' environment variable"
                ),
            })
    }

    /// Check every value for a usable range.
    pub fn validate(&self) -> CompanionResult<()> {
        let endpoint = self.provider.endpoint.trim();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(CompanionError::Config {
                reason: format!("provider.endpoint must be an http(s) URL, got '{endpoint}'"),
            });
        }
        if self.provider.model.trim().is_empty() {
            return Err(CompanionError::Config {
                reason: "provider.model must not be empty".to_string(),
            });
        }
        if self.provider.timeout_secs == 0 || self.provider.connect_timeout_secs == 0 {
            return Err(CompanionError::Config {
                reason: "provider timeouts must be greater than zero".to_string(),
            });
        }

        for (section, gen) in [
            ("consultation", &self.consultation),
            ("extraction", &self.extraction),
            ("streaming", &self.streaming),
        ] {
            validate_generation(section, gen)?;
        }
        Ok(())
    }
}

fn validate_generation(section: &str, gen: &GenerationSettings) -> CompanionResult<()> {
    if gen.max_tokens == 0 {
        return Err(CompanionError::Config {
            reason: format!("{section}.max_tokens must be greater than zero"),
        });
    }
    if let Some(t) = gen.temperature {
        if !(0.0..=2.0).contains(&t) {
            return Err(CompanionError::Config {
                reason: format!("{section}.temperature must be within 0.0..=2.0, got {t}"),
            });
        }
    }
    Ok(())
}
