//! The two structured-output schemas and their semantic rules.
//!
//! The `json_schema` documents here are sent verbatim to the provider as the
//! `response_format` and re-checked locally by the `SchemaVerifier`. Every
//! object level is closed and lists all of its properties as required, which
//! is what the provider's strict mode demands.

use serde_json::{json, Value};

use medcompanion_contracts::{
    chat::{JsonSchemaFormat, ResponseFormat},
    model::{Confidence, Severity},
    verify::{OutputSchema, VerificationRule, VerificationRuleType},
};
use medcompanion_verify::{engine::CustomVerifierFn, SchemaVerifier};

pub const CONSULTATION_SCHEMA_ID: &str = "medical_consultation_response";
pub const EXTRACTION_SCHEMA_ID: &str = "prescription_analysis";

/// Name of the custom rule that rejects blank condition-card names.
pub const CARD_NAMES_RULE: &str = "condition-card-names";

// ── Consultation ──────────────────────────────────────────────────────────────

fn condition_card_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": { "type": "string" },
            "description": { "type": "string" },
            "severity": { "type": "string", "enum": Severity::ALL },
            "matchPercentage": { "type": "number" },
            "onset": { "type": "string" },
            "symptoms": { "type": "array", "items": { "type": "string" } },
            "recommendations": { "type": "array", "items": { "type": "string" } }
        },
        "required": [
            "name", "description", "severity", "matchPercentage",
            "onset", "symptoms", "recommendations"
        ],
        "additionalProperties": false
    })
}

/// `medical_consultation_response`.
pub fn consultation_schema() -> OutputSchema {
    OutputSchema {
        schema_id: CONSULTATION_SCHEMA_ID.to_string(),
        json_schema: json!({
            "type": "object",
            "properties": {
                "response": { "type": "string" },
                "conditionCards": { "type": "array", "items": condition_card_schema() }
            },
            "required": ["response", "conditionCards"],
            "additionalProperties": false
        }),
        rules: vec![
            VerificationRule {
                rule_id: "response-present".to_string(),
                description: "The conversational reply must not be blank".to_string(),
                rule_type: VerificationRuleType::NonEmptyString {
                    field_path: "response".to_string(),
                },
            },
            VerificationRule {
                rule_id: "card-names-present".to_string(),
                description: "Every condition card must carry a name".to_string(),
                rule_type: VerificationRuleType::Custom {
                    function_name: CARD_NAMES_RULE.to_string(),
                },
            },
        ],
    }
}

// ── Extraction ────────────────────────────────────────────────────────────────

/// `prescription_analysis`.
///
/// `image` is deliberately absent: placeholder images are attached after
/// parsing, and a provider that echoes one back fails the closed schema.
pub fn extraction_schema() -> OutputSchema {
    OutputSchema {
        schema_id: EXTRACTION_SCHEMA_ID.to_string(),
        json_schema: json!({
            "type": "object",
            "properties": {
                "medications": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "name": { "type": "string" },
                            "dosage": { "type": "string" },
                            "frequency": { "type": "string" },
                            "duration": { "type": "string" },
                            "instructions": { "type": "string" },
                            "confidence": { "type": "string", "enum": Confidence::ALL }
                        },
                        "required": [
                            "id", "name", "dosage", "frequency",
                            "duration", "instructions", "confidence"
                        ],
                        "additionalProperties": false
                    }
                },
                "extractionNotes": { "type": "string" }
            },
            "required": ["medications", "extractionNotes"],
            "additionalProperties": false
        }),
        rules: vec![VerificationRule {
            rule_id: "medications-present".to_string(),
            description: "At least one medication line must be extracted".to_string(),
            rule_type: VerificationRuleType::NonEmptyArray {
                field_path: "medications".to_string(),
            },
        }],
    }
}

// ── Wiring ────────────────────────────────────────────────────────────────────

/// Wrap `schema` as a strict `response_format`.
pub fn response_format(schema: &OutputSchema) -> ResponseFormat {
    ResponseFormat::JsonSchema {
        json_schema: JsonSchemaFormat {
            name: schema.schema_id.clone(),
            schema: schema.json_schema.clone(),
            strict: true,
        },
    }
}

fn card_names_rule() -> CustomVerifierFn {
    Box::new(|payload: &Value| {
        let cards = payload.get("conditionCards")?.as_array()?;
        let blank: Vec<String> = cards
            .iter()
            .enumerate()
            .filter(|(_, card)| {
                card.get("name")
                    .and_then(Value::as_str)
                    .map_or(true, |name| name.trim().is_empty())
            })
            .map(|(i, _)| i.to_string())
            .collect();

        if blank.is_empty() {
            None
        } else {
            Some(format!("condition card(s) {} have a blank name", blank.join(", ")))
        }
    })
}

/// A `SchemaVerifier` with every custom rule the schemas above reference.
pub fn companion_verifier() -> SchemaVerifier {
    SchemaVerifier::new().with_rule(CARD_NAMES_RULE, card_names_rule())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use medcompanion_contracts::chat::ResponseFormat;
    use medcompanion_core::traits::Verifier;

    use super::*;

    fn headache() -> serde_json::Value {
        json!({
            "response": "You may have a tension headache.",
            "conditionCards": [{
                "name": "Tension Headache",
                "description": "Common headache",
                "severity": "Low",
                "matchPercentage": 75,
                "onset": "Gradual",
                "symptoms": ["Dull ache"],
                "recommendations": ["Rest"]
            }]
        })
    }

    #[test]
    fn consultation_payload_passes() {
        let report = companion_verifier()
            .verify(&headache(), &consultation_schema())
            .unwrap();
        assert!(report.passed, "{}", report.summary());
    }

    #[test]
    fn empty_card_list_is_allowed() {
        let payload = json!({ "response": "Drink water.", "conditionCards": [] });
        let report = companion_verifier()
            .verify(&payload, &consultation_schema())
            .unwrap();
        assert!(report.passed);
    }

    #[test]
    fn card_missing_severity_fails_structurally() {
        let mut payload = headache();
        payload["conditionCards"][0]
            .as_object_mut()
            .unwrap()
            .remove("severity");

        let report = companion_verifier()
            .verify(&payload, &consultation_schema())
            .unwrap();
        assert!(!report.passed);
        assert!(report.failures.iter().any(|f| f.rule_id == "json-schema"));
    }

    #[test]
    fn severity_outside_enum_fails() {
        let mut payload = headache();
        payload["conditionCards"][0]["severity"] = json!("Critical");
        let report = companion_verifier()
            .verify(&payload, &consultation_schema())
            .unwrap();
        assert!(!report.passed);
    }

    #[test]
    fn blank_response_and_card_name_fail_semantic_rules() {
        let mut payload = headache();
        payload["response"] = json!("   ");
        payload["conditionCards"][0]["name"] = json!("");

        let report = companion_verifier()
            .verify(&payload, &consultation_schema())
            .unwrap();
        let ids: Vec<&str> = report.failures.iter().map(|f| f.rule_id.as_str()).collect();
        assert!(ids.contains(&"response-present"));
        assert!(ids.contains(&"card-names-present"));
    }

    #[test]
    fn extraction_requires_at_least_one_medication() {
        let payload = json!({ "medications": [], "extractionNotes": "blank page" });
        let report = companion_verifier()
            .verify(&payload, &extraction_schema())
            .unwrap();
        assert!(!report.passed);
        assert_eq!(report.failures[0].rule_id, "medications-present");
    }

    #[test]
    fn extraction_rejects_fractional_id_and_echoed_image() {
        let line = json!({
            "id": 1.5, "name": "Amoxicillin", "dosage": "500mg", "frequency": "TID",
            "duration": "7 days", "instructions": "With food", "confidence": "High"
        });
        let payload = json!({ "medications": [line], "extractionNotes": "" });
        assert!(!companion_verifier().verify(&payload, &extraction_schema()).unwrap().passed);

        let mut line = payload["medications"][0].clone();
        line["id"] = json!(1);
        line["image"] = json!("https://example.com/x.png");
        let payload = json!({ "medications": [line], "extractionNotes": "" });
        assert!(!companion_verifier().verify(&payload, &extraction_schema()).unwrap().passed);
    }

    #[test]
    fn response_format_is_strict_and_named() {
        let schema = extraction_schema();
        let ResponseFormat::JsonSchema { json_schema } = response_format(&schema);
        assert_eq!(json_schema.name, "prescription_analysis");
        assert!(json_schema.strict);
        assert_eq!(json_schema.schema, schema.json_schema);

        let wire = serde_json::to_value(response_format(&schema)).unwrap();
        assert_eq!(wire["type"], "json_schema");
        assert_eq!(wire["json_schema"]["strict"], true);
    }
}
