//! Configuration schema.
//!
//! A `CompanionConfig` is deserialized from TOML. Every section and field is
//! optional; omitted values take the defaults documented on each field.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Provider connection settings.
///
/// Example in TOML:
/// ```toml
/// [provider]
/// endpoint = "https://api.openai.com/v1"
/// model = "gpt-4o"
/// api_key_env = "OPENAI_API_KEY"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderSettings {
    /// Base URL; `/chat/completions` is appended.
    pub endpoint: String,

    pub model: String,

    /// Inline key. Prefer `api_key_env` outside of local testing.
    pub api_key: Option<String>,

    /// Environment variable holding the key. Checked when `api_key` is unset.
    pub api_key_env: String,

    /// Default whole-request timeout.
    pub timeout_secs: u64,

    pub connect_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            connect_timeout_secs: 10,
        }
    }
}

impl ProviderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Sampling settings for one kind of call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationSettings {
    /// `None` leaves the provider default in place.
    #[serde(default)]
    pub temperature: Option<f32>,
    pub max_tokens: u32,
}

impl GenerationSettings {
    /// Consultation: varied but not erratic phrasing.
    pub fn consultation() -> Self {
        Self {
            temperature: Some(0.7),
            max_tokens: 2000,
        }
    }

    /// Extraction sends no temperature.
    pub fn extraction() -> Self {
        Self {
            temperature: None,
            max_tokens: 2000,
        }
    }

    pub fn streaming() -> Self {
        Self {
            temperature: Some(0.7),
            max_tokens: 1500,
        }
    }
}

/// The top-level structure deserialized from a TOML config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanionConfig {
    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default = "GenerationSettings::consultation")]
    pub consultation: GenerationSettings,

    #[serde(default = "GenerationSettings::extraction")]
    pub extraction: GenerationSettings,

    #[serde(default = "GenerationSettings::streaming")]
    pub streaming: GenerationSettings,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            provider: ProviderSettings::default(),
            consultation: GenerationSettings::consultation(),
            extraction: GenerationSettings::extraction(),
            streaming: GenerationSettings::streaming(),
        }
    }
}
