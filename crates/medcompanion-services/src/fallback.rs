//! Fixed values returned in place of a failed call.
//!
//! Each constructor builds the same value every time; callers compare them
//! for equality to detect a degraded reply.

use serde_json::Number;

use medcompanion_contracts::model::{
    ConditionCard, Confidence, MedicalConsultationResult, MedicationEntry,
    PrescriptionExtractionResult, Severity,
};

use crate::imagery::placeholder_url;

pub const CONSULTATION_APOLOGY: &str = "I apologize, but I'm currently unable to process your request. Please try again later or consult with a healthcare professional for immediate concerns.";

pub const TECHNICAL_ISSUE: &str = "Technical Issue";

/// Emitted once through the chunk callback when a streaming call fails.
pub const STREAMING_APOLOGY: &str = "I apologize, but I'm currently unable to process your request. Please try again later or consult with a healthcare professional.";

pub const UNABLE_TO_EXTRACT: &str = "Unable to Extract";

pub const EXTRACTION_RETRY_GUIDANCE: &str =
    "Image analysis failed. Please ensure the prescription is clear and well-lit, then try again.";

pub const EXTRACTION_FAILURE_NOTES: &str =
    "No medication information could be read from the image.";

/// Placeholder id used by the extraction fallback entry.
const FALLBACK_IMAGE_ID: &str = "1584308666744-24d5c474f2ae";

pub fn consultation() -> MedicalConsultationResult {
    MedicalConsultationResult {
        response: CONSULTATION_APOLOGY.to_string(),
        condition_cards: vec![ConditionCard {
            name: TECHNICAL_ISSUE.to_string(),
            description: "Unable to analyze symptoms at this time. Please consult a healthcare provider."
                .to_string(),
            severity: Severity::Medium,
            match_percentage: Number::from(0),
            onset: "Immediate".to_string(),
            symptoms: vec!["System temporarily unavailable".to_string()],
            recommendations: vec![
                "Contact healthcare provider".to_string(),
                "Try again later".to_string(),
                "Seek immediate care if urgent".to_string(),
            ],
        }],
    }
}

pub fn medication_entry() -> MedicationEntry {
    MedicationEntry {
        id: 1,
        name: UNABLE_TO_EXTRACT.to_string(),
        dosage: "N/A".to_string(),
        frequency: "N/A".to_string(),
        duration: "N/A".to_string(),
        instructions: EXTRACTION_RETRY_GUIDANCE.to_string(),
        confidence: Confidence::Low,
        image: Some(placeholder_url(FALLBACK_IMAGE_ID)),
    }
}

pub fn extraction() -> PrescriptionExtractionResult {
    PrescriptionExtractionResult {
        medications: vec![medication_entry()],
        extraction_notes: EXTRACTION_FAILURE_NOTES.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consultation_fallback_wire_shape() {
        let value = serde_json::to_value(consultation()).unwrap();
        let card = &value["conditionCards"][0];

        assert_eq!(value["conditionCards"].as_array().unwrap().len(), 1);
        assert_eq!(card["name"], "Technical Issue");
        assert_eq!(card["severity"], "Medium");
        assert_eq!(card["matchPercentage"], serde_json::json!(0));
        assert_eq!(card["onset"], "Immediate");
    }

    #[test]
    fn extraction_fallback_uses_fixed_image() {
        let entry = medication_entry();
        assert_eq!(
            entry.image.as_deref(),
            Some("https://images.unsplash.com/photo-1584308666744-24d5c474f2ae?w=100&h=100&fit=crop")
        );
        assert_eq!(extraction().medications, vec![entry]);
    }
}
