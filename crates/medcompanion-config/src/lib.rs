//! # medcompanion-config
//!
//! TOML-driven configuration for the MedCompanion integration layer.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use medcompanion_config::CompanionConfig;
//!
//! let config = CompanionConfig::from_file(Path::new("config/companion.toml"))?
//!     .with_env_overrides()?;
//! let api_key = config.resolve_api_key()?;
//! ```
//!
//! Every section is optional. A generation section that is present must set
//! `max_tokens`; a missing `temperature` means none is sent.

pub mod loader;
pub mod settings;

pub use loader::{ENDPOINT_ENV, MODEL_ENV};
pub use settings::{CompanionConfig, GenerationSettings, ProviderSettings};

// ── Tests ─────────────────────────────────────────────────────────────────────
