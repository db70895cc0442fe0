//! Schema-based output verifier for MedCompanion.
//!
//! `SchemaVerifier` implements the `Verifier` trait from `medcompanion-core`.
//! Verification runs in two phases:
//!
//! 1. **Structural**: the payload is validated against
//!    `OutputSchema::json_schema` using the `jsonschema` crate. This is the
//!    same closed schema the provider was asked to enforce.
//! 2. **Semantic**: each `VerificationRule` in `OutputSchema::rules` is
//!    evaluated in order. All failures are collected before returning.
//!
//! Custom rules delegate to named functions registered via `register_rule`.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use medcompanion_contracts::{
    error::CompanionResult,
    verify::{OutputSchema, VerificationFailure, VerificationReport, VerificationRuleType},
};
use medcompanion_core::traits::Verifier;

/// A caller-supplied verification function.
///
/// Receives the full payload. Returns `Some(message)` when the check fails,
/// or `None` on success.
pub type CustomVerifierFn = Box<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// The MedCompanion output verifier.
pub struct SchemaVerifier {
    custom_rules: HashMap<String, CustomVerifierFn>,
}

impl SchemaVerifier {
    /// Create a verifier with no custom rules registered.
    pub fn new() -> Self {
        Self {
            custom_rules: HashMap::new(),
        }
    }

    /// Register a custom verification function under `name`.
    ///
    /// The name must match the `function_name` used in
    /// `VerificationRuleType::Custom` rules. Registering the same name twice
    /// replaces the previous function.
    pub fn register_rule(&mut self, name: impl Into<String>, f: CustomVerifierFn) {
        self.custom_rules.insert(name.into(), f);
    }

    /// Builder-style `register_rule`.
    pub fn with_rule(mut self, name: impl Into<String>, f: CustomVerifierFn) -> Self {
        self.register_rule(name, f);
        self
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    /// Resolve a dot-notation path against a JSON value. Returns `None` when
    /// any segment is missing or the value is JSON `null`.
    fn resolve_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
        let mut current = value;
        for segment in path.split('.') {
            match current.get(segment) {
                Some(v) if !v.is_null() => current = v,
                _ => return None,
            }
        }
        Some(current)
    }

    fn structural_failures(payload: &Value, schema: &OutputSchema) -> Vec<VerificationFailure> {
        // A null json_schema means "no structural constraint".
        if schema.json_schema.is_null() {
            return Vec::new();
        }

        match jsonschema::validator_for(&schema.json_schema) {
            Ok(validator) => validator
                .iter_errors(payload)
                .map(|error| {
                    let message = format!(
                        "JSON Schema violation at {}: {}",
                        error.instance_path, error
                    );
                    warn!(schema_id = %schema.schema_id, %message, "structural validation failure");
                    VerificationFailure {
                        rule_id: "json-schema".to_string(),
                        message,
                    }
                })
                .collect(),
            Err(e) => {
                let message = format!("invalid JSON Schema document: {e}");
                warn!(schema_id = %schema.schema_id, %message, "schema compilation failure");
                vec![VerificationFailure {
                    rule_id: "json-schema".to_string(),
                    message,
                }]
            }
        }
    }
}

impl Default for SchemaVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Verifier for SchemaVerifier {
    /// Verify `payload` against `schema`.
    ///
    /// Structural validation runs first, then every semantic rule. All
    /// failures are accumulated into one report.
    fn verify(
        &self,
        payload: &Value,
        schema: &OutputSchema,
    ) -> CompanionResult<VerificationReport> {
        let mut failures = Self::structural_failures(payload, schema);

        for rule in &schema.rules {
            debug!(
                rule_id = %rule.rule_id,
                description = %rule.description,
                "evaluating verification rule"
            );

            let failure_msg: Option<String> = match &rule.rule_type {
                VerificationRuleType::NonEmptyString { field_path } => {
                    match Self::resolve_path(payload, field_path).and_then(Value::as_str) {
                        Some(s) if !s.trim().is_empty() => None,
                        Some(_) => Some(format!("field '{field_path}' is blank")),
                        None => Some(format!("field '{field_path}' is missing or not a string")),
                    }
                }

                VerificationRuleType::NonEmptyArray { field_path } => {
                    match Self::resolve_path(payload, field_path).and_then(Value::as_array) {
                        Some(items) if !items.is_empty() => None,
                        Some(_) => Some(format!("array '{field_path}' is empty")),
                        None => Some(format!("field '{field_path}' is missing or not an array")),
                    }
                }

                // An unregistered name is itself a failure so misconfigured
                // schemas surface immediately.
                VerificationRuleType::Custom { function_name } => {
                    match self.custom_rules.get(function_name.as_str()) {
                        Some(f) => f(payload),
                        None => Some(format!(
                            "no custom rule registered for function name '{function_name}'"
                        )),
                    }
                }
            };

            if let Some(message) = failure_msg {
                warn!(rule_id = %rule.rule_id, %message, "semantic rule failed");
                failures.push(VerificationFailure {
                    rule_id: rule.rule_id.clone(),
                    message,
                });
            }
        }

        let passed = failures.is_empty();
        debug!(
            schema_id = %schema.schema_id,
            passed,
            failure_count = failures.len(),
            "verification complete"
        );

        Ok(VerificationReport { passed, failures })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use medcompanion_contracts::verify::{OutputSchema, VerificationRule, VerificationRuleType};
    use medcompanion_core::traits::Verifier;

    use super::SchemaVerifier;

    // ── Builder helpers ───────────────────────────────────────────────────────

    fn make_schema(json_schema: Value, rules: Vec<VerificationRule>) -> OutputSchema {
        OutputSchema {
            schema_id: "test-schema".to_string(),
            json_schema,
            rules,
        }
    }

    fn rule(id: &str, rule_type: VerificationRuleType) -> VerificationRule {
        VerificationRule {
            rule_id: id.to_string(),
            description: format!("test rule {id}"),
            rule_type,
        }
    }

    fn closed_card_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "severity": { "type": "string", "enum": ["Low", "Medium", "High"] }
            },
            "required": ["name", "severity"],
            "additionalProperties": false
        })
    }

    // ── JSON Schema tests ─────────────────────────────────────────────────────

    #[test]
    fn test_schema_pass() {
        let verifier = SchemaVerifier::new();
        let schema = make_schema(closed_card_schema(), vec![]);

        let report = verifier
            .verify(&json!({ "name": "Migraine", "severity": "High" }), &schema)
            .unwrap();

        assert!(report.passed, "expected pass, failures: {:?}", report.failures);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_schema_missing_required_field() {
        let verifier = SchemaVerifier::new();
        let schema = make_schema(closed_card_schema(), vec![]);

        let report = verifier.verify(&json!({ "name": "Migraine" }), &schema).unwrap();

        assert!(!report.passed);
        assert_eq!(report.failures[0].rule_id, "json-schema");
        assert!(report.failures[0].message.contains("severity"));
    }

    #[test]
    fn test_schema_rejects_additional_properties() {
        let verifier = SchemaVerifier::new();
        let schema = make_schema(closed_card_schema(), vec![]);

        let report = verifier
            .verify(
                &json!({ "name": "Migraine", "severity": "Low", "icd10": "G43" }),
                &schema,
            )
            .unwrap();

        assert!(!report.passed);
    }

    #[test]
    fn test_schema_rejects_value_outside_enum() {
        let verifier = SchemaVerifier::new();
        let schema = make_schema(closed_card_schema(), vec![]);

        let report = verifier
            .verify(&json!({ "name": "Migraine", "severity": "Critical" }), &schema)
            .unwrap();

        assert!(!report.passed);
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn test_invalid_schema_document_is_a_failure() {
        let verifier = SchemaVerifier::new();
        let schema = make_schema(json!({ "type": 12 }), vec![]);

        let report = verifier.verify(&json!({}), &schema).unwrap();

        assert!(!report.passed);
        assert!(report.failures[0].message.contains("invalid JSON Schema"));
    }

    // ── NonEmptyString tests ──────────────────────────────────────────────────

    #[test]
    fn test_non_empty_string() {
        let verifier = SchemaVerifier::new();
        let schema = make_schema(
            Value::Null,
            vec![rule(
                "response-present",
                VerificationRuleType::NonEmptyString {
                    field_path: "response".to_string(),
                },
            )],
        );

        assert!(verifier.verify(&json!({ "response": "Rest well." }), &schema).unwrap().passed);

        let blank = verifier.verify(&json!({ "response": "   " }), &schema).unwrap();
        assert!(!blank.passed);
        assert_eq!(blank.failures[0].rule_id, "response-present");
        assert!(blank.failures[0].message.contains("blank"));

        let missing = verifier.verify(&json!({}), &schema).unwrap();
        assert!(!missing.passed);
        assert!(missing.failures[0].message.contains("missing"));
    }

    // ── NonEmptyArray tests ───────────────────────────────────────────────────

    #[test]
    fn test_non_empty_array() {
        let verifier = SchemaVerifier::new();
        let schema = make_schema(
            Value::Null,
            vec![rule(
                "medications-present",
                VerificationRuleType::NonEmptyArray {
                    field_path: "medications".to_string(),
                },
            )],
        );

        assert!(verifier.verify(&json!({ "medications": [{}] }), &schema).unwrap().passed);

        let empty = verifier.verify(&json!({ "medications": [] }), &schema).unwrap();
        assert!(!empty.passed);
        assert!(empty.failures[0].message.contains("empty"));

        let wrong_type = verifier.verify(&json!({ "medications": "none" }), &schema).unwrap();
        assert!(!wrong_type.passed);
    }

    // ── Custom rule tests ─────────────────────────────────────────────────────

    #[test]
    fn test_custom_rule_pass_and_fail() {
        let verifier = SchemaVerifier::new().with_rule(
            "names-present",
            Box::new(|payload| {
                let cards = payload["conditionCards"].as_array()?;
                cards
                    .iter()
                    .position(|c| c["name"].as_str().unwrap_or("").trim().is_empty())
                    .map(|i| format!("conditionCards[{i}] has a blank name"))
            }),
        );
        let schema = make_schema(
            Value::Null,
            vec![rule(
                "card-names",
                VerificationRuleType::Custom {
                    function_name: "names-present".to_string(),
                },
            )],
        );

        let ok = verifier
            .verify(&json!({ "conditionCards": [{ "name": "Flu" }] }), &schema)
            .unwrap();
        assert!(ok.passed);

        let bad = verifier
            .verify(&json!({ "conditionCards": [{ "name": "Flu" }, { "name": "" }] }), &schema)
            .unwrap();
        assert!(!bad.passed);
        assert_eq!(bad.failures[0].rule_id, "card-names");
        assert!(bad.failures[0].message.contains("conditionCards[1]"));
    }

    #[test]
    fn test_unregistered_custom_rule() {
        let verifier = SchemaVerifier::new();
        let schema = make_schema(
            Value::Null,
            vec![rule(
                "phantom-check",
                VerificationRuleType::Custom {
                    function_name: "does-not-exist".to_string(),
                },
            )],
        );

        let report = verifier.verify(&json!({}), &schema).unwrap();

        assert!(!report.passed);
        assert!(report.failures[0].message.contains("does-not-exist"));
    }

    /// Structural and semantic failures are reported together.
    #[test]
    fn test_failures_accumulate_across_phases() {
        let verifier = SchemaVerifier::new();
        let schema = make_schema(
            closed_card_schema(),
            vec![rule(
                "name-present",
                VerificationRuleType::NonEmptyString {
                    field_path: "name".to_string(),
                },
            )],
        );

        let report = verifier.verify(&json!({ "name": "" }), &schema).unwrap();

        assert!(!report.passed);
        let ids: Vec<&str> = report.failures.iter().map(|f| f.rule_id.as_str()).collect();
        assert!(ids.contains(&"json-schema"));
        assert!(ids.contains(&"name-present"));
        assert!(report.summary().contains("[name-present]"));
    }
}
