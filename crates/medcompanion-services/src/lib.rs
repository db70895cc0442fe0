//! # medcompanion-services
//!
//! The three operations of the MedCompanion integration layer:
//!
//! | Operation | Service | Fallback |
//! |---|---|---|
//! | `consult(text)` | [`ConsultationService`] | one "Technical Issue" card |
//! | `extract(image)` | [`ExtractionService`] | one "Unable to Extract" line |
//! | `consult_streaming(text, on_chunk)` | [`StreamingService`] | apology fragment |
//!
//! None of them return an error. Each has a `try_*` or `*_with` form for
//! callers that want the failure or need a deadline / cancellation flag.
//!
//! ## Wiring
//!
//! ```rust,ignore
//! let config = CompanionConfig::from_file(path)?.with_env_overrides()?;
//! let companion = Companion::from_config(&config)?;
//! let reply = companion.consultation.consult("I have a headache and feel tired");
//! ```
//!
//! The transport is built once and shared by all three services.

use std::sync::Arc;

use tracing::info;

use medcompanion_config::CompanionConfig;
use medcompanion_contracts::error::CompanionResult;
use medcompanion_core::{
    traits::{ChatTransport, ImagePicker},
    StructuredExecutor,
};
use medcompanion_transport::HttpChatTransport;

pub mod consultation;
pub mod encoding;
pub mod fallback;
pub mod imagery;
pub mod mock_data;
pub mod prescription;
pub mod prompts;
pub mod schemas;
pub mod streaming;

pub use consultation::ConsultationService;
pub use prescription::{check_upload, ExtractionService};
pub use streaming::StreamingService;

/// All services over one shared transport.
#[derive(Clone)]
pub struct Companion {
    pub consultation: ConsultationService,
    pub extraction: ExtractionService,
    pub streaming: StreamingService,
}

impl Companion {
    /// Build the HTTP transport from `config` and wire every service to it.
    ///
    /// Fails only on configuration problems, such as a missing API key.
    pub fn from_config(config: &CompanionConfig) -> CompanionResult<Self> {
        let transport = HttpChatTransport::from_config(config)?;
        info!(
            url = transport.completions_url(),
            model = %config.provider.model,
            "companion services ready"
        );
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Wire every service to an existing transport.
    pub fn with_transport(config: &CompanionConfig, transport: Arc<dyn ChatTransport>) -> Self {
        let executor = StructuredExecutor::new(transport, Arc::new(schemas::companion_verifier()));
        let model = config.provider.model.clone();

        Self {
            consultation: ConsultationService::new(
                executor.clone(),
                model.clone(),
                config.consultation.clone(),
            ),
            extraction: ExtractionService::new(
                executor.clone(),
                model.clone(),
                config.extraction.clone(),
            ),
            streaming: StreamingService::new(executor, model, config.streaming.clone()),
        }
    }

    /// Replace the picker that attaches images to extracted medication lines.
    pub fn with_image_picker(mut self, picker: Arc<dyn ImagePicker>) -> Self {
        self.extraction = self.extraction.with_picker(picker);
        self
    }
}
