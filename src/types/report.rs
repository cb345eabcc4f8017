//! Validation report types.
//!
//! - [`ValidationResult`] - outcome for a single entry (or the bundle envelope)
//! - [`BundleReport`] - ordered results of one validation pass
//! - [`ValidationOutcome`] - initial report plus, when repair ran, the repair report

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use super::ResourceType;
use crate::schema::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Success,
    Error,
}

impl ValidationStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ValidationStatus::Success)
    }
}

/// Outcome of validating one record.
///
/// Immutable once built. `missing_fields` is `None` for structural errors, where no
/// schema was consulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub status: ValidationStatus,
    #[serde(rename = "resourceType", skip_serializing_if = "Option::is_none", default)]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,
    pub message: String,
    #[serde(rename = "missingFields", skip_serializing_if = "Option::is_none", default)]
    pub missing_fields: Option<BTreeSet<String>>,
}

impl ValidationResult {
    pub fn success(resource_type: ResourceType, id: &str, missing: BTreeSet<String>) -> Self {
        Self {
            status: ValidationStatus::Success,
            resource_type: Some(resource_type.to_string()),
            id: Some(id.to_string()),
            message: format!("Resource {resource_type}/{id} is valid."),
            missing_fields: Some(missing),
        }
    }

    pub fn schema_failure(
        resource_type: ResourceType,
        id: &str,
        error: &SchemaError,
        missing: BTreeSet<String>,
    ) -> Self {
        Self {
            status: ValidationStatus::Error,
            resource_type: Some(resource_type.to_string()),
            id: Some(id.to_string()),
            message: format!("Resource {resource_type}/{id} validation failed. Error: {error}"),
            missing_fields: Some(missing),
        }
    }

    pub fn unsupported(type_name: &str) -> Self {
        Self {
            status: ValidationStatus::Error,
            resource_type: Some(type_name.to_string()),
            id: None,
            message: format!("Unsupported resource type: {type_name}"),
            missing_fields: None,
        }
    }

    /// Entry without `resource`, or a resource without `resourceType`
    pub fn missing_resource_type(resource: Option<&Value>) -> Self {
        let shown = resource
            .map(Value::to_string)
            .unwrap_or_else(|| "null".to_string());
        Self {
            status: ValidationStatus::Error,
            resource_type: None,
            id: None,
            message: format!("Missing 'resourceType' in resource {shown}"),
            missing_fields: None,
        }
    }

    pub fn bundle_failure(prefix: &str, error: &SchemaError) -> Self {
        Self {
            status: ValidationStatus::Error,
            resource_type: Some("Bundle".to_string()),
            id: None,
            message: format!("{prefix}: {error}"),
            missing_fields: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Ordered results of one validation pass over a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleReport {
    pub status: ValidationStatus,
    pub message: String,
    /// Name of the object the validated payload came from, if any
    #[serde(rename = "source", skip_serializing_if = "Option::is_none", default)]
    pub source: Option<String>,
    #[serde(rename = "objectName", skip_serializing_if = "Option::is_none", default)]
    pub object_name: Option<String>,
    #[serde(rename = "objectUrl", skip_serializing_if = "Option::is_none", default)]
    pub object_url: Option<String>,
    pub results: Vec<ValidationResult>,
}

impl BundleReport {
    pub fn from_results(results: Vec<ValidationResult>, message: impl Into<String>) -> Self {
        let status = if results.iter().all(ValidationResult::is_success) {
            ValidationStatus::Success
        } else {
            ValidationStatus::Error
        };
        Self {
            status,
            message: message.into(),
            source: None,
            object_name: None,
            object_url: None,
            results,
        }
    }

    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    pub fn with_object(mut self, name: String, url: String) -> Self {
        self.object_name = Some(name);
        self.object_url = Some(url);
        self
    }

    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }
}

/// Composite report of the two-phase validate/repair run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub status: ValidationStatus,
    pub message: String,
    pub initial_validation: BundleReport,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub re_validation: Option<BundleReport>,
    /// The repaired bundle, when the repair pass ran
    #[serde(skip)]
    pub repaired_bundle: Option<Value>,
}

impl ValidationOutcome {
    pub fn accepted(initial: BundleReport) -> Self {
        Self {
            status: ValidationStatus::Success,
            message: "Validation of original bundle completed successfully.".to_string(),
            initial_validation: initial,
            re_validation: None,
            repaired_bundle: None,
        }
    }

    pub fn repaired(initial: BundleReport, repair: BundleReport, bundle: Value) -> Self {
        let message = if repair.status.is_success() {
            "Initial bundle contained errors; the repaired bundle is valid.".to_string()
        } else {
            format!(
                "Initial bundle contained errors; {} error(s) remain after repair.",
                repair.error_count()
            )
        };
        Self {
            status: repair.status,
            message,
            initial_validation: initial,
            re_validation: Some(repair),
            repaired_bundle: Some(bundle),
        }
    }

    pub fn was_repaired(&self) -> bool {
        self.re_validation.is_some()
    }
}
