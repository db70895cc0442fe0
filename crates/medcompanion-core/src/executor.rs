//! The structured-output executor.
//!
//! Every schema-constrained call follows the same pipeline:
//!
//!   Request → Transport → Content → JSON parse → Verify → Deserialize
//!
//! Each stage returns `CompanionResult`, so a failure anywhere short-circuits
//! with a typed error. The executor never substitutes fallbacks itself; that
//! decision belongs to the service that owns the operation's contract.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use medcompanion_contracts::{
    call::CallOptions,
    chat::{ChatCompletion, ChatRequest},
    error::{CompanionError, CompanionResult},
    verify::OutputSchema,
};

use crate::traits::{ChatTransport, Verifier};

/// Drives schema-constrained and streaming calls through a shared transport.
///
/// Cheap to clone; clones share the same transport and verifier.
#[derive(Clone)]
pub struct StructuredExecutor {
    transport: Arc<dyn ChatTransport>,
    verifier: Arc<dyn Verifier>,
}

impl StructuredExecutor {
    pub fn new(transport: Arc<dyn ChatTransport>, verifier: Arc<dyn Verifier>) -> Self {
        Self { transport, verifier }
    }

    /// Run one structured call and deserialize the verified payload into `T`.
    ///
    /// # Pipeline
    ///
    /// 1. Check cancellation / deadline
    /// 2. `transport.complete()`
    /// 3. Pull the first choice's content; a refusal or missing content fails
    /// 4. Parse the content string as JSON (`MalformedJson` on failure)
    /// 5. `verifier.verify()` against `schema` (`SchemaViolation` on failure)
    /// 6. Deserialize into `T` (`SchemaViolation` on failure)
    pub fn execute<T: DeserializeOwned>(
        &self,
        request: &ChatRequest,
        schema: &OutputSchema,
        options: &CallOptions,
    ) -> CompanionResult<T> {
        let guard = options.start();
        guard.check()?;

        debug!(
            schema_id = %schema.schema_id,
            model = %request.model,
            messages = request.messages.len(),
            "sending structured request"
        );

        let completion = self.transport.complete(request, options)?;
        let content = Self::content_of(&completion)?;

        // ── JSON parse ───────────────────────────────────────────────────────
        let payload: Value =
            serde_json::from_str(content).map_err(|e| CompanionError::MalformedJson {
                reason: e.to_string(),
            })?;

        // ── Verification ─────────────────────────────────────────────────────
        let report = self.verifier.verify(&payload, schema)?;
        if !report.passed {
            let summary = report.summary();
            warn!(
                schema_id = %schema.schema_id,
                failures = %summary,
                "provider output failed verification"
            );
            return Err(CompanionError::SchemaViolation { reason: summary });
        }

        // ── Typed decode ─────────────────────────────────────────────────────
        let result = serde_json::from_value::<T>(payload).map_err(|e| {
            CompanionError::SchemaViolation {
                reason: format!("payload passed verification but did not decode: {e}"),
            }
        })?;

        info!(
            schema_id = %schema.schema_id,
            elapsed_ms = guard.elapsed().as_millis() as u64,
            "structured call complete"
        );
        Ok(result)
    }

    /// Run one streaming call, passing every non-empty fragment to
    /// `on_fragment` in arrival order.
    ///
    /// Cancellation and the deadline are re-checked before each fragment is
    /// delivered. Returns the number of fragments delivered.
    pub fn stream(
        &self,
        request: &ChatRequest,
        options: &CallOptions,
        on_fragment: &mut dyn FnMut(&str),
    ) -> CompanionResult<usize> {
        let guard = options.start();
        guard.check()?;

        debug!(model = %request.model, "sending streaming request");

        let mut delivered = 0usize;
        self.transport.stream(request, options, &mut |delta: &str| {
            guard.check()?;
            if !delta.is_empty() {
                on_fragment(delta);
                delivered += 1;
            }
            Ok(())
        })?;

        info!(
            fragments = delivered,
            elapsed_ms = guard.elapsed().as_millis() as u64,
            "streaming call complete"
        );
        Ok(delivered)
    }

    fn content_of(completion: &ChatCompletion) -> CompanionResult<&str> {
        let choice = completion
            .first_choice()
            .ok_or(CompanionError::EmptyCompletion)?;

        if let Some(refusal) = choice.message.refusal.as_deref() {
            return Err(CompanionError::Refused {
                reason: refusal.to_string(),
            });
        }

        if choice.finish_reason.as_deref() == Some("length") {
            warn!("completion truncated at max_tokens; JSON is likely incomplete");
        }

        match choice.message.content.as_deref() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(CompanionError::EmptyCompletion),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
