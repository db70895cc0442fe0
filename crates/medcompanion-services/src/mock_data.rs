//! Scripted provider for tests and offline demos.
//!
//! Nothing in this module touches the network. `ScriptedTransport` pops one
//! queued reply per call and records every request it receives. In offline
//! mode an empty queue answers with the canned payloads below instead of an
//! error, keyed on the request's schema name.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::{json, Value};
use tracing::debug;

use medcompanion_contracts::{
    call::CallOptions,
    chat::{ChatCompletion, ChatRequest, ResponseFormat},
    error::{CompanionError, CompanionResult},
};
use medcompanion_core::traits::ChatTransport;

use crate::schemas::{CONSULTATION_SCHEMA_ID, EXTRACTION_SCHEMA_ID};

// ── Canned payloads ───────────────────────────────────────────────────────────

/// A single-card consultation for a tension headache.
pub fn headache_consultation() -> Value {
    json!({
        "response": "Based on what you describe, a tension-type headache is the most likely cause. Rest, fluids, and regular meals often help. This is general information only; please see a healthcare professional if symptoms persist or worsen.",
        "conditionCards": [{
            "name": "Tension Headache",
            "description": "The most common headache type, often linked to stress, poor sleep, or dehydration.",
            "severity": "Low",
            "matchPercentage": 70,
            "onset": "Gradual",
            "symptoms": ["headache", "fatigue"],
            "recommendations": ["rest", "hydrate"]
        }]
    })
}

/// Two legible lines and one uncertain line, ids deliberately not 1..n.
pub fn prescription_analysis() -> Value {
    json!({
        "medications": [
            {
                "id": 3,
                "name": "Amoxicillin",
                "dosage": "500mg",
                "frequency": "Three times daily",
                "duration": "7 days",
                "instructions": "Take with food. Complete the full course.",
                "confidence": "High"
            },
            {
                "id": 7,
                "name": "Ibuprofen",
                "dosage": "400mg",
                "frequency": "Every 6 hours as needed",
                "duration": "5 days",
                "instructions": "Do not exceed 4 doses in 24 hours.",
                "confidence": "Medium"
            },
            {
                "id": 9,
                "name": "Omeprazole",
                "dosage": "20mg",
                "frequency": "Once daily",
                "duration": "N/A",
                "instructions": "N/A",
                "confidence": "Low"
            }
        ],
        "extractionNotes": "Duration for the third item is illegible."
    })
}

/// Fragments of a canned streamed reply.
pub fn streaming_fragments() -> Vec<String> {
    [
        "Headaches with tiredness ",
        "are often linked to stress, ",
        "poor sleep, or dehydration. ",
        "This is general information only; ",
        "please consult a healthcare professional.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

// ── ScriptedTransport ─────────────────────────────────────────────────────────

/// One queued reply.
#[derive(Debug)]
pub enum ScriptedReply {
    /// A completion whose first choice carries this content.
    Content(String),
    /// A fully specified completion (refusals, empty choices).
    Completion(ChatCompletion),
    /// Fail the call.
    Error(CompanionError),
    /// Stream these deltas, then end normally.
    Deltas(Vec<String>),
    /// Stream these deltas, then fail.
    DeltasThenError(Vec<String>, CompanionError),
}

pub struct ScriptedTransport {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<ChatRequest>>,
    offline: bool,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    /// An empty script. Calls beyond the queue fail with `Transport`.
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            offline: false,
        }
    }

    /// Calls beyond the queue get the canned payloads.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::new()
        }
    }

    /// Queue a reply (builder style).
    pub fn then(self, reply: ScriptedReply) -> Self {
        self.push(reply);
        self
    }

    pub fn push(&self, reply: ScriptedReply) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
    }

    /// Every request received so far, in call order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn next(&self, request: &ChatRequest) -> CompanionResult<ScriptedReply> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let queued = self
            .replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match queued {
            Some(reply) => Ok(reply),
            None if self.offline => Ok(Self::canned(request)),
            None => Err(CompanionError::Transport {
                reason: "scripted transport has no reply queued".to_string(),
            }),
        }
    }

    fn canned(request: &ChatRequest) -> ScriptedReply {
        if request.stream {
            return ScriptedReply::Deltas(streaming_fragments());
        }
        let schema_name = request.response_format.as_ref().map(|format| match format {
            ResponseFormat::JsonSchema { json_schema } => json_schema.name.as_str(),
        });
        debug!(?schema_name, "answering from canned payloads");
        match schema_name {
            Some(EXTRACTION_SCHEMA_ID) => {
                ScriptedReply::Content(prescription_analysis().to_string())
            }
            Some(CONSULTATION_SCHEMA_ID) => {
                ScriptedReply::Content(headache_consultation().to_string())
            }
            _ => ScriptedReply::Error(CompanionError::Transport {
                reason: "no canned payload for this request".to_string(),
            }),
        }
    }
}

impl ChatTransport for ScriptedTransport {
    fn complete(
        &self,
        request: &ChatRequest,
        options: &CallOptions,
    ) -> CompanionResult<ChatCompletion> {
        options.start().check()?;
        match self.next(request)? {
            ScriptedReply::Content(content) => Ok(ChatCompletion::from_content(content)),
            ScriptedReply::Completion(completion) => Ok(completion),
            ScriptedReply::Error(err) => Err(err),
            ScriptedReply::Deltas(_) | ScriptedReply::DeltasThenError(..) => {
                Err(CompanionError::Transport {
                    reason: "streamed reply scripted for a non-streaming call".to_string(),
                })
            }
        }
    }

    fn stream(
        &self,
        request: &ChatRequest,
        options: &CallOptions,
        on_delta: &mut dyn FnMut(&str) -> CompanionResult<()>,
    ) -> CompanionResult<()> {
        options.start().check()?;
        let (deltas, failure) = match self.next(request)? {
            ScriptedReply::Deltas(deltas) => (deltas, None),
            ScriptedReply::DeltasThenError(deltas, err) => (deltas, Some(err)),
            ScriptedReply::Error(err) => return Err(err),
            ScriptedReply::Content(_) | ScriptedReply::Completion(_) => {
                return Err(CompanionError::Transport {
                    reason: "completion scripted for a streaming call".to_string(),
                })
            }
        };

        for delta in &deltas {
            on_delta(delta)?;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
