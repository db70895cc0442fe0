//! Core trait definitions for the MedCompanion integration layer.
//!
//! These traits are the seams the services are built against:
//!
//! - `ChatTransport`: untrusted network edge (the chat-completion provider)
//! - `Verifier`: trusted checker (validates provider JSON before use)
//! - `ImagePicker`: cosmetic placeholder selection for extracted lines
//!
//! Production wiring injects the HTTP transport and the schema verifier;
//! tests substitute scripted implementations.

use serde_json::Value;

use medcompanion_contracts::{
    call::CallOptions,
    chat::{ChatCompletion, ChatRequest},
    error::CompanionResult,
    model::MedicationEntry,
    verify::{OutputSchema, VerificationReport},
};

/// A chat-completion provider.
///
/// Implementations hold only read-only state (credentials, base URL, a
/// pooled client) so one instance can be shared across threads and calls.
pub trait ChatTransport: Send + Sync {
    /// Send a non-streaming request and return the decoded response body.
    ///
    /// Non-success statuses surface as `CompanionError::HttpStatus`; the
    /// body is not interpreted beyond JSON decoding.
    fn complete(
        &self,
        request: &ChatRequest,
        options: &CallOptions,
    ) -> CompanionResult<ChatCompletion>;

    /// Send a streaming request and pass each text delta to `on_delta` in
    /// arrival order.
    ///
    /// The next delta is not read until `on_delta` returns. An `Err` from
    /// `on_delta` aborts the stream and is returned unchanged.
    fn stream(
        &self,
        request: &ChatRequest,
        options: &CallOptions,
        on_delta: &mut dyn FnMut(&str) -> CompanionResult<()>,
    ) -> CompanionResult<()>;
}

/// The output verifier: the gate between raw provider JSON and typed results.
///
/// Implementations must not call the transport. They inspect the payload
/// against a declarative `OutputSchema` and return a report.
pub trait Verifier: Send + Sync {
    /// Verify `payload` against `schema`.
    ///
    /// Return a `VerificationReport` with `passed = true` if all rules pass,
    /// or `passed = false` with populated `failures` if any rule fails.
    fn verify(&self, payload: &Value, schema: &OutputSchema) -> CompanionResult<VerificationReport>;
}

/// Chooses a display image for an extracted medication line.
pub trait ImagePicker: Send + Sync {
    /// Return the image URL to attach to `entry`.
    fn pick(&self, entry: &MedicationEntry) -> String;
}
