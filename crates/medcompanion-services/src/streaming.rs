//! Streamed free-text consultation.

use tracing::{info, warn};

use medcompanion_config::GenerationSettings;
use medcompanion_contracts::{
    call::CallOptions,
    chat::{ChatMessage, ChatRequest},
    error::CompanionError,
};
use medcompanion_core::StructuredExecutor;

use crate::{fallback::STREAMING_APOLOGY, prompts};

/// Streams an unstructured reply fragment by fragment.
#[derive(Clone)]
pub struct StreamingService {
    executor: StructuredExecutor,
    model: String,
    settings: GenerationSettings,
}

impl StreamingService {
    pub fn new(
        executor: StructuredExecutor,
        model: impl Into<String>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            executor,
            model: model.into(),
            settings,
        }
    }

    pub fn build_request(&self, text: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(prompts::STREAMING_SYSTEM),
                ChatMessage::user(text),
            ],
            response_format: None,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            stream: true,
        }
    }

    /// Pass each non-empty fragment to `on_chunk` as it arrives and return
    /// their concatenation.
    ///
    /// On failure `on_chunk` receives [`STREAMING_APOLOGY`] exactly once and
    /// the return value is every fragment already delivered followed by the
    /// apology, so the return value always equals what `on_chunk` saw.
    /// Whitespace-only text counts as a failure and never reaches the provider.
    pub fn consult_streaming_with(
        &self,
        text: &str,
        options: &CallOptions,
        on_chunk: &mut dyn FnMut(&str),
    ) -> String {
        let mut full = String::new();

        let outcome = if text.trim().is_empty() {
            Err(CompanionError::InvalidInput {
                reason: "symptom description is empty".to_string(),
            })
        } else {
            self.executor
                .stream(&self.build_request(text), options, &mut |fragment: &str| {
                    full.push_str(fragment);
                    on_chunk(fragment);
                })
        };

        match outcome {
            Ok(fragments) => {
                info!(operation = "consult_streaming", fragments, "stream finished");
            }
            Err(err) => {
                warn!(
                    operation = "consult_streaming",
                    failure_kind = %err.kind(),
                    error = %err,
                    delivered_chars = full.len(),
                    "stream failed; sending apology"
                );
                on_chunk(STREAMING_APOLOGY);
                full.push_str(STREAMING_APOLOGY);
            }
        }
        full
    }

    pub fn consult_streaming(&self, text: &str, on_chunk: &mut dyn FnMut(&str)) -> String {
        self.consult_streaming_with(text, &CallOptions::default(), on_chunk)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use medcompanion_config::GenerationSettings;
    use medcompanion_contracts::error::CompanionError;
    use medcompanion_core::StructuredExecutor;

    use super::StreamingService;
    use crate::{
        fallback::STREAMING_APOLOGY,
        mock_data::{ScriptedReply, ScriptedTransport},
        schemas,
    };

    fn service(transport: ScriptedTransport) -> (StreamingService, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let executor =
            StructuredExecutor::new(transport.clone(), Arc::new(schemas::companion_verifier()));
        (
            StreamingService::new(executor, "gpt-4o", GenerationSettings::streaming()),
            transport,
        )
    }

    fn deltas(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn request_is_streaming_without_schema() {
        let (svc, _) = service(ScriptedTransport::new());
        let wire = serde_json::to_value(svc.build_request("fever")).unwrap();

        assert_eq!(wire["stream"], true);
        assert_eq!(wire["max_tokens"], 1500);
        assert!(wire.get("response_format").is_none());
        assert!(wire["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("Always include medical disclaimers"));
    }

    #[test]
    fn fragments_arrive_in_order_and_skip_empties() {
        let (svc, _) = service(
            ScriptedTransport::new()
                .then(ScriptedReply::Deltas(deltas(&["Rest ", "", "and fluids."]))),
        );
        let mut seen = Vec::new();
        let full = svc.consult_streaming("cold", &mut |c| seen.push(c.to_string()));

        assert_eq!(seen, vec!["Rest ", "and fluids."]);
        assert_eq!(full, "Rest and fluids.");
    }

    #[test]
    fn failure_before_first_fragment_sends_only_apology() {
        let (svc, _) = service(ScriptedTransport::new().then(ScriptedReply::Error(
            CompanionError::Transport {
                reason: "connection refused".to_string(),
            },
        )));
        let mut seen = Vec::new();
        let full = svc.consult_streaming("cold", &mut |c| seen.push(c.to_string()));

        assert_eq!(seen, vec![STREAMING_APOLOGY]);
        assert_eq!(full, STREAMING_APOLOGY);
    }

    #[test]
    fn failure_mid_stream_appends_apology() {
        let (svc, _) = service(ScriptedTransport::new().then(ScriptedReply::DeltasThenError(
            deltas(&["Partial "]),
            CompanionError::Stream {
                reason: "connection reset".to_string(),
            },
        )));
        let mut seen = Vec::new();
        let full = svc.consult_streaming("cold", &mut |c| seen.push(c.to_string()));

        assert_eq!(seen, vec!["Partial ".to_string(), STREAMING_APOLOGY.to_string()]);
        assert_eq!(full, seen.concat());
    }

    #[test]
    fn blank_input_apologises_without_calling_provider() {
        let (svc, transport) = service(ScriptedTransport::new());
        let mut seen = Vec::new();
        let full = svc.consult_streaming(" ", &mut |c| seen.push(c.to_string()));

        assert_eq!(full, STREAMING_APOLOGY);
        assert_eq!(seen.len(), 1);
        assert!(transport.requests().is_empty());
    }
}
