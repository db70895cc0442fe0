//! Structured symptom consultation.

use tracing::{info, warn};

use medcompanion_config::GenerationSettings;
use medcompanion_contracts::{
    call::CallOptions,
    chat::{ChatMessage, ChatRequest},
    error::{CompanionError, CompanionResult},
    model::MedicalConsultationResult,
    verify::OutputSchema,
};
use medcompanion_core::StructuredExecutor;

use crate::{fallback, prompts, schemas};

/// Turns a free-text symptom description into a reply plus condition cards.
///
/// `consult` never fails: any problem yields [`fallback::consultation`].
#[derive(Clone)]
pub struct ConsultationService {
    executor: StructuredExecutor,
    model: String,
    settings: GenerationSettings,
    schema: OutputSchema,
}

impl ConsultationService {
    pub fn new(
        executor: StructuredExecutor,
        model: impl Into<String>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            executor,
            model: model.into(),
            settings,
            schema: schemas::consultation_schema(),
        }
    }

    pub fn build_request(&self, text: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(prompts::CONSULTATION_SYSTEM),
                ChatMessage::user(text),
            ],
            response_format: Some(schemas::response_format(&self.schema)),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            stream: false,
        }
    }

    /// The consultation pipeline with errors left visible.
    ///
    /// Text that is empty after trimming whitespace is rejected as
    /// `InvalidInput` without a provider call.
    pub fn try_consult(
        &self,
        text: &str,
        options: &CallOptions,
    ) -> CompanionResult<MedicalConsultationResult> {
        if text.trim().is_empty() {
            return Err(CompanionError::InvalidInput {
                reason: "symptom description is empty".to_string(),
            });
        }
        let result: MedicalConsultationResult =
            self.executor.execute(&self.build_request(text), &self.schema, options)?;
        info!(
            operation = "consult",
            cards = result.condition_cards.len(),
            "consultation answered"
        );
        Ok(result)
    }

    pub fn consult_with(&self, text: &str, options: &CallOptions) -> MedicalConsultationResult {
        self.try_consult(text, options).unwrap_or_else(|err| {
            warn!(
                operation = "consult",
                failure_kind = %err.kind(),
                error = %err,
                "consultation failed; returning fallback"
            );
            fallback::consultation()
        })
    }

    pub fn consult(&self, text: &str) -> MedicalConsultationResult {
        self.consult_with(text, &CallOptions::default())
    }
}
