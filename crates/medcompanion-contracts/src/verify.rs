//! Output verification schema and report types.
//!
//! Before a completion's JSON is deserialized into a result type, the
//! verifier runs it against an `OutputSchema`. Only a passing
//! `VerificationReport` lets the value through.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What the verifier checks provider output against.
///
/// The same `json_schema` document is sent to the provider as the
/// structured-output constraint, so the client re-checks exactly what the
/// provider was asked to enforce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSchema {
    /// Schema name as sent to the provider (e.g. "prescription_analysis").
    pub schema_id: String,
    /// Structural constraint, as a JSON Schema document.
    pub json_schema: Value,
    /// Additional rules evaluated after structural validation.
    pub rules: Vec<VerificationRule>,
}

/// A single verification rule applied to a payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRule {
    /// Stable id; appears in `VerificationFailure::rule_id`.
    pub rule_id: String,
    /// Human-readable description for logs.
    pub description: String,
    pub rule_type: VerificationRuleType,
}

/// The kinds of semantic checks the verifier supports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VerificationRuleType {
    /// The string at `field_path` must be present and contain a
    /// non-whitespace character.
    NonEmptyString {
        /// Dotted path, e.g. "response".
        field_path: String,
    },

    /// The array at `field_path` must be present and hold at least one item.
    NonEmptyArray {
        /// Dotted path, e.g. "medications".
        field_path: String,
    },

    /// Delegate to a named custom function registered by the hosting service.
    Custom {
        /// Key passed to `SchemaVerifier::register_rule`.
        function_name: String,
    },
}

/// The result of running an `OutputSchema` against a payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    /// `failures.is_empty()`.
    pub passed: bool,
    /// All failures collected during this run. Empty on pass.
    pub failures: Vec<VerificationFailure>,
}

impl VerificationReport {
    /// Render all failures as one `[rule] message; ...` line.
    pub fn summary(&self) -> String {
        self.failures
            .iter()
            .map(|f| format!("[{}] {}", f.rule_id, f.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// One failed check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationFailure {
    pub rule_id: String,
    pub message: String,
}
