use serde_json::Value;
use std::sync::Arc;

use super::completeness::missing_fields;
use crate::normalize::RepairRegistry;
use crate::path::flatten;
use crate::schema::{
    SchemaError, SchemaIssue, SchemaValidator, StructuralValidator, field_partition,
};
use crate::types::{ResourceType, ValidationResult};

/// Whether repair rules run before schema validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    #[default]
    Apply,
    Skip,
}

/// Validates single records: normalization, schema check, missing fields.
#[derive(Clone)]
pub struct ResourceValidator {
    schema_validator: Arc<dyn SchemaValidator>,
    registry: Arc<RepairRegistry>,
}

impl Default for ResourceValidator {
    fn default() -> Self {
        Self::new(
            Arc::new(StructuralValidator::default()),
            Arc::new(RepairRegistry::with_defaults()),
        )
    }
}

impl std::fmt::Debug for ResourceValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceValidator")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl ResourceValidator {
    pub fn new(schema_validator: Arc<dyn SchemaValidator>, registry: Arc<RepairRegistry>) -> Self {
        Self {
            schema_validator,
            registry,
        }
    }

    pub fn schema_validator(&self) -> &Arc<dyn SchemaValidator> {
        &self.schema_validator
    }

    pub fn registry(&self) -> &RepairRegistry {
        &self.registry
    }

    /// Normalize and validate one record.
    ///
    /// Returns the result and the normalized record; `raw` is never mutated.
    /// An unsupported type yields an error result and an unmodified copy.
    pub fn validate(&self, resource_type: &str, raw: &Value) -> (ValidationResult, Value) {
        self.validate_with(resource_type, raw, Normalization::Apply)
    }

    /// Validate one record as given, without repair rules
    pub fn validate_raw(&self, resource_type: &str, raw: &Value) -> ValidationResult {
        self.validate_with(resource_type, raw, Normalization::Skip).0
    }

    pub fn validate_with(
        &self,
        resource_type: &str,
        raw: &Value,
        normalization: Normalization,
    ) -> (ValidationResult, Value) {
        let rt = match resource_type.parse::<ResourceType>() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::warn!("{e}");
                return (ValidationResult::unsupported(resource_type), raw.clone());
            }
        };

        let repaired = match normalization {
            Normalization::Apply => self.registry.normalize(rt, raw),
            Normalization::Skip => raw.clone(),
        };

        if tracing::enabled!(tracing::Level::DEBUG) {
            let present = present_fields(&repaired);
            tracing::debug!("Present fields in {rt}: {present:?}");
        }

        let partition = field_partition(rt);
        let outcome = match repaired.as_object() {
            Some(map) => self.schema_validator.validate(rt.as_str(), map),
            None => Err(SchemaError::new(
                rt.as_str(),
                vec![SchemaIssue::new(
                    "type",
                    "",
                    "Input should be a valid object",
                )],
            )),
        };
        let missing = missing_fields(partition, &repaired);

        let id = repaired
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| rt.fallback_id());

        let result = match outcome {
            Ok(()) => {
                tracing::info!("{rt}/{id} is valid");
                if !missing.is_empty() {
                    tracing::info!("Missing required fields in {rt}/{id}: {missing:?}");
                }
                ValidationResult::success(rt, &id, missing)
            }
            Err(e) => {
                tracing::warn!("{rt}/{id} failed validation: {} issue(s)", e.issues.len());
                ValidationResult::schema_failure(rt, &id, &e, missing)
            }
        };
        (result, repaired)
    }
}

/// Every addressable path of a record, in document order
fn present_fields(resource: &Value) -> Vec<String> {
    flatten(resource, "").collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValidationStatus;
    use serde_json::{Map, json};

    #[test]
    fn patient_without_birth_date_reports_it_missing() {
        let validator = ResourceValidator::default();
        let raw = json!({"resourceType": "Patient", "id": "p1", "gender": "female"});
        let (result, _) = validator.validate("Patient", &raw);
        assert_eq!(result.status, ValidationStatus::Success);
        assert_eq!(result.message, "Resource Patient/p1 is valid.");
        assert!(result.missing_fields.unwrap().contains("birthDate"));
    }

    #[test]
    fn unsupported_type_is_rejected_before_schema_checks() {
        let validator = ResourceValidator::default();
        let raw = json!({"resourceType": "Practitioner"});
        let (result, copy) = validator.validate("Practitioner", &raw);
        assert_eq!(result.message, "Unsupported resource type: Practitioner");
        assert!(result.missing_fields.is_none());
        assert_eq!(copy, raw);
    }

    #[test]
    fn missing_id_uses_fallback() {
        let validator = ResourceValidator::default();
        let (result, _) = validator.validate("Condition", &json!({"resourceType": "Condition"}));
        assert_eq!(result.id.as_deref(), Some("unknown_condition"));
        assert_eq!(result.status, ValidationStatus::Error);
        assert!(result.message.starts_with("Resource Condition/unknown_condition validation failed. Error: "));
        assert!(result.missing_fields.is_some());
    }

    #[test]
    fn normalization_repairs_scalar_class() {
        let validator = ResourceValidator::default();
        let raw = json!({
            "resourceType": "Encounter",
            "id": "e1",
            "status": "completed",
            "class": {"coding": [{"system": "http://terminology.hl7.org/CodeSystem/v3-ActCode", "code": "AMB"}]},
            "subject": {"reference": "Patient/p1"}
        });
        assert!(!validator.validate_raw("Encounter", &raw).is_success());
        let (result, repaired) = validator.validate("Encounter", &raw);
        assert!(result.is_success(), "{}", result.message);
        assert!(repaired["class"].is_array());
        assert!(raw["class"].is_object());
    }

    struct RejectAll;

    impl SchemaValidator for RejectAll {
        fn validate(&self, type_name: &str, _: &Map<String, Value>) -> Result<(), SchemaError> {
            Err(SchemaError::new(
                type_name,
                vec![SchemaIssue::new("value", "", "rejected")],
            ))
        }
    }

    #[test]
    fn schema_validator_is_pluggable() {
        let validator = ResourceValidator::new(
            Arc::new(RejectAll),
            Arc::new(RepairRegistry::empty()),
        );
        let (result, _) = validator.validate("Patient", &json!({"resourceType": "Patient", "id": "p"}));
        assert!(!result.is_success());
        assert!(result.message.contains("rejected"));
    }

    #[test]
    fn present_fields_list_every_path_in_order() {
        let raw = json!({
            "resourceType": "Patient",
            "name": [{"given": ["Ada"]}],
            "birthDate": "1990-01-01"
        });
        assert_eq!(
            present_fields(&raw),
            [
                "resourceType",
                "name",
                "name[0]",
                "name[0].given",
                "name[0].given[0]",
                "birthDate"
            ]
        );
    }
}
