//! Structured results returned to callers.
//!
//! Field names follow the provider schema (camelCase on the wire). Every
//! struct denies unknown fields so a response carrying extra keys fails to
//! deserialize instead of being silently trimmed.

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Severity level attached to a surfaced condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// The exact strings the schema enum accepts.
    pub const ALL: [&'static str; 3] = ["Low", "Medium", "High"];
}

/// A candidate diagnosis attached to a consultation reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConditionCard {
    /// Short label, never empty.
    pub name: String,
    pub description: String,
    pub severity: Severity,
    /// Conventionally 0 to 100. Not range-checked. Kept as the provider's
    /// number so an integer stays an integer when re-serialized.
    pub match_percentage: Number,
    /// Free-text timing, e.g. "Gradual".
    pub onset: String,
    /// In the order the model emitted them.
    pub symptoms: Vec<String>,
    pub recommendations: Vec<String>,
}

/// The structured consultation reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MedicalConsultationResult {
    /// Text shown as the assistant's chat message.
    pub response: String,
    /// Zero or more candidate conditions, in provider order.
    pub condition_cards: Vec<ConditionCard>,
}

/// Per-line extraction certainty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub const ALL: [&'static str; 3] = ["High", "Medium", "Low"];
}

/// One medication line read from a prescription image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MedicationEntry {
    /// 1-based position in the extracted list.
    pub id: u32,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub instructions: String,
    pub confidence: Confidence,
    /// Display-only placeholder URL, attached after parsing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// The structured extraction reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PrescriptionExtractionResult {
    /// In the order the lines appear on the document.
    pub medications: Vec<MedicationEntry>,
    /// Caveats such as "dosage for item 2 illegible".
    pub extraction_notes: String,
}
