//! Prescription image extraction.

use std::sync::Arc;

use tracing::{debug, info, warn};

use medcompanion_config::GenerationSettings;
use medcompanion_contracts::{
    call::CallOptions,
    chat::{ChatMessage, ChatRequest, ContentPart, ImageUrl},
    error::{CompanionError, CompanionResult},
    model::{MedicationEntry, PrescriptionExtractionResult},
    verify::OutputSchema,
};
use medcompanion_core::{traits::ImagePicker, StructuredExecutor};

use crate::{encoding, fallback, imagery::RandomImagePicker, prompts, schemas};

/// Largest upload the scanner accepts.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Formats the scanner accepts.
pub const ACCEPTED_UPLOAD_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];

/// Pre-flight check for scanner uploads: size ceiling and accepted formats.
///
/// Returns the sniffed MIME type. `extract` does not call this; it is for
/// front ends that want to reject a file before spending a provider call.
pub fn check_upload(bytes: &[u8]) -> CompanionResult<&'static str> {
    if bytes.is_empty() {
        return Err(CompanionError::InvalidInput {
            reason: "upload is empty".to_string(),
        });
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(CompanionError::InvalidInput {
            reason: format!(
                "upload is {} bytes; the limit is {} bytes (10 MB)",
                bytes.len(),
                MAX_UPLOAD_BYTES
            ),
        });
    }
    let mime = encoding::sniff_mime(bytes);
    if !ACCEPTED_UPLOAD_TYPES.contains(&mime) {
        return Err(CompanionError::InvalidInput {
            reason: format!("unsupported file type '{mime}'; use PDF, JPEG, or PNG"),
        });
    }
    Ok(mime)
}

/// Reads medication lines off a prescription image.
#[derive(Clone)]
pub struct ExtractionService {
    executor: StructuredExecutor,
    model: String,
    settings: GenerationSettings,
    schema: OutputSchema,
    picker: Arc<dyn ImagePicker>,
}

impl ExtractionService {
    /// Uses [`RandomImagePicker`] for display images.
    pub fn new(
        executor: StructuredExecutor,
        model: impl Into<String>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            executor,
            model: model.into(),
            settings,
            schema: schemas::extraction_schema(),
            picker: Arc::new(RandomImagePicker),
        }
    }

    pub fn with_picker(mut self, picker: Arc<dyn ImagePicker>) -> Self {
        self.picker = picker;
        self
    }

    pub fn build_request(&self, image_bytes: &[u8]) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(prompts::EXTRACTION_SYSTEM),
                ChatMessage::user_parts(vec![
                    ContentPart::Text {
                        text: prompts::EXTRACTION_USER.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: encoding::data_url(image_bytes),
                        },
                    },
                ]),
            ],
            response_format: Some(schemas::response_format(&self.schema)),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            stream: false,
        }
    }

    /// The extraction pipeline with errors left visible.
    ///
    /// On success ids are renumbered 1..n in list order and every line gets a
    /// display image from the picker.
    pub fn try_extract(
        &self,
        image_bytes: &[u8],
        options: &CallOptions,
    ) -> CompanionResult<PrescriptionExtractionResult> {
        if image_bytes.is_empty() {
            return Err(CompanionError::InvalidInput {
                reason: "prescription image is empty".to_string(),
            });
        }
        debug!(
            bytes = image_bytes.len(),
            mime = encoding::sniff_mime(image_bytes),
            "encoding prescription image"
        );

        let mut result: PrescriptionExtractionResult =
            self.executor
                .execute(&self.build_request(image_bytes), &self.schema, options)?;

        for (index, entry) in result.medications.iter_mut().enumerate() {
            entry.id = index as u32 + 1;
            entry.image = Some(self.picker.pick(entry));
        }

        info!(
            operation = "extract",
            medications = result.medications.len(),
            "prescription extracted"
        );
        Ok(result)
    }

    pub fn extract_result_with(
        &self,
        image_bytes: &[u8],
        options: &CallOptions,
    ) -> PrescriptionExtractionResult {
        self.try_extract(image_bytes, options).unwrap_or_else(|err| {
            warn!(
                operation = "extract",
                failure_kind = %err.kind(),
                error = %err,
                "extraction failed; returning fallback"
            );
            fallback::extraction()
        })
    }

    /// Medications plus the model's extraction notes.
    pub fn extract_result(&self, image_bytes: &[u8]) -> PrescriptionExtractionResult {
        self.extract_result_with(image_bytes, &CallOptions::default())
    }

    pub fn extract_with(&self, image_bytes: &[u8], options: &CallOptions) -> Vec<MedicationEntry> {
        self.extract_result_with(image_bytes, options).medications
    }

    /// Never empty: a failed extraction yields the single
    /// "Unable to Extract" entry.
    pub fn extract(&self, image_bytes: &[u8]) -> Vec<MedicationEntry> {
        self.extract_with(image_bytes, &CallOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use medcompanion_config::GenerationSettings;
    use medcompanion_contracts::{call::CallOptions, error::FailureKind};
    use medcompanion_core::StructuredExecutor;

    use super::{check_upload, ExtractionService, MAX_UPLOAD_BYTES};
    use crate::{
        fallback,
        imagery::FixedImagePicker,
        mock_data::{prescription_analysis, ScriptedReply, ScriptedTransport},
        schemas,
    };

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn service(transport: ScriptedTransport) -> (ExtractionService, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let executor =
            StructuredExecutor::new(transport.clone(), Arc::new(schemas::companion_verifier()));
        let svc = ExtractionService::new(executor, "gpt-4o", GenerationSettings::extraction())
            .with_picker(Arc::new(FixedImagePicker("https://img.test/pill.png".to_string())));
        (svc, transport)
    }

    #[test]
    fn request_embeds_image_as_data_url() {
        let (svc, _) = service(ScriptedTransport::new());
        let wire = serde_json::to_value(svc.build_request(PNG)).unwrap();

        let parts = &wire["messages"][1]["content"];
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        assert!(parts[1]["image_url"]["url"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
        assert_eq!(wire["response_format"]["json_schema"]["name"], "prescription_analysis");
        assert!(wire.get("temperature").is_none());
        assert_eq!(wire["max_tokens"], 2000);
    }

    #[test]
    fn ids_are_renumbered_and_images_attached() {
        let (svc, _) = service(
            ScriptedTransport::new()
                .then(ScriptedReply::Content(prescription_analysis().to_string())),
        );
        let result = svc.extract_result(PNG);

        let ids: Vec<u32> = result.medications.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(result.medications[0].name, "Amoxicillin");
        assert!(result
            .medications
            .iter()
            .all(|m| m.image.as_deref() == Some("https://img.test/pill.png")));
        assert_eq!(result.extraction_notes, "Duration for the third item is illegible.");
    }

    #[test]
    fn empty_medication_list_yields_fallback() {
        let payload = json!({ "medications": [], "extractionNotes": "nothing legible" });
        let (svc, _) =
            service(ScriptedTransport::new().then(ScriptedReply::Content(payload.to_string())));
        assert_eq!(svc.extract(PNG), vec![fallback::medication_entry()]);
    }

    #[test]
    fn empty_image_is_rejected_locally() {
        let (svc, transport) = service(ScriptedTransport::new());
        let err = svc.try_extract(&[], &CallOptions::default()).unwrap_err();
        assert_eq!(err.kind(), FailureKind::InputRejected);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn fallback_ignores_picker() {
        let (svc, _) = service(ScriptedTransport::new());
        let entries = svc.extract(PNG);
        assert_eq!(entries, vec![fallback::medication_entry()]);
        assert_ne!(entries[0].image.as_deref(), Some("https://img.test/pill.png"));
    }

    #[test]
    fn upload_check_accepts_scanner_formats() {
        assert_eq!(check_upload(PNG).unwrap(), "image/png");
        assert_eq!(check_upload(b"%PDF-1.4\n").unwrap(), "application/pdf");
        assert_eq!(check_upload(&[0xFF, 0xD8, 0xFF, 0xE1]).unwrap(), "image/jpeg");
    }

    #[test]
    fn upload_check_rejects_other_types_and_oversize() {
        assert!(check_upload(b"GIF89a......").is_err());
        assert!(check_upload(&[]).is_err());

        let mut big = PNG.to_vec();
        big.resize(MAX_UPLOAD_BYTES + 1, 0);
        let err = check_upload(&big).unwrap_err();
        assert!(err.to_string().contains("10 MB"));
    }
}
