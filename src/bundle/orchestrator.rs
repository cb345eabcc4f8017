use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use super::canonical::canonicalize;
use super::naming::{object_name, validated_object_id};
use crate::core::SynthBundleConfig;
use crate::error::{Result, SynthBundleError};
use crate::storage::ObjectStore;
use crate::types::{BundleReport, ValidationOutcome, ValidationResult};
use crate::validation::{Normalization, ResourceValidator};

const INITIAL_VALID: &str = "Original FHIR Bundle and resourceTypes are valid. No re-validation needed.";
const INITIAL_INVALID: &str = "Initial FHIR Bundle contains errors. Generating validated bundle.";
const REPAIR_VALID: &str = "FHIR Bundle and resourceTypes are valid after re-validation.";
const REPAIR_INVALID: &str = "FHIR Bundle still contains errors after re-validation.";

/// Which of the two validation passes is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Entries are checked exactly as received
    Initial,
    /// Entries are normalized and written back before the envelope check
    Repair,
}

impl Pass {
    fn normalization(self) -> Normalization {
        match self {
            Pass::Initial => Normalization::Skip,
            Pass::Repair => Normalization::Apply,
        }
    }

    fn envelope_prefix(self) -> &'static str {
        match self {
            Pass::Initial => "Bundle validation failed",
            Pass::Repair => "Re-validation of bundle failed",
        }
    }
}

/// Two-phase bundle validation: check as received, repair on failure, persist.
pub struct BundleOrchestrator {
    validator: ResourceValidator,
    store: Arc<dyn ObjectStore>,
    config: SynthBundleConfig,
}

impl BundleOrchestrator {
    pub fn new(store: Arc<dyn ObjectStore>, config: SynthBundleConfig) -> Self {
        Self {
            validator: ResourceValidator::default(),
            store,
            config,
        }
    }

    pub fn with_validator(mut self, validator: ResourceValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn validator(&self) -> &ResourceValidator {
        &self.validator
    }

    pub fn config(&self) -> &SynthBundleConfig {
        &self.config
    }

    /// Validate a serialized payload; empty or undecodable input is a request error
    pub async fn validate_bytes(
        &self,
        bytes: &[u8],
        source: Option<&str>,
    ) -> Result<ValidationOutcome> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(SynthBundleError::payload("JSON payload is empty"));
        }
        let payload: Value = serde_json::from_slice(bytes)
            .map_err(|e| SynthBundleError::payload(format!("Invalid JSON payload: {e}")))?;
        self.validate_payload(&payload, source).await
    }

    /// Validate an object already held in the configured container
    pub async fn validate_object(&self, name: &str) -> Result<ValidationOutcome> {
        let container = &self.config.storage.container;
        let bytes = self
            .store
            .get(container, name)
            .await?
            .ok_or_else(|| SynthBundleError::storage(format!("Object {container}/{name} not found")))?;
        tracing::info!("Read FHIR bundle from {container}/{name}");
        self.validate_bytes(&bytes, Some(name)).await
    }

    /// Run the initial pass and, when it reports errors, the repair pass.
    ///
    /// The accepted payload, or the repaired bundle, is persisted either way;
    /// the caller's `payload` is never modified.
    pub async fn validate_payload(
        &self,
        payload: &Value,
        source: Option<&str>,
    ) -> Result<ValidationOutcome> {
        tracing::info!("Validating FHIR bundle");
        let settings = &self.config.validation;

        let initial_bundle = canonicalize(payload, &settings.default_bundle_type);
        let initial = self
            .initial_pass(&initial_bundle)
            .with_source(source.map(str::to_string));

        let id = validated_object_id(
            &settings.source_prefix,
            source,
            payload,
            &settings.timestamp_format,
            Utc::now(),
        );
        let name = object_name(&settings.object_prefix, &id);

        if initial.status.is_success() {
            let url = self.persist(&name, payload).await?;
            return Ok(ValidationOutcome::accepted(initial.with_object(name, url)));
        }

        tracing::info!(
            "Initial validation found {} error(s), re-validating with repairs",
            initial.error_count()
        );
        let mut repaired = canonicalize(payload, &settings.default_bundle_type);
        let repair = self.repair_pass(&mut repaired);
        let url = self.persist(&name, &repaired).await?;
        tracing::info!("FHIR bundle validation process completed");
        Ok(ValidationOutcome::repaired(
            initial,
            repair.with_object(name, url),
            repaired,
        ))
    }

    /// Check every entry as received, then the envelope
    pub fn initial_pass(&self, bundle: &Value) -> BundleReport {
        let mut results: Vec<ValidationResult> = entries(bundle)
            .iter()
            .map(|entry| self.check_entry(entry, Pass::Initial).0)
            .collect();
        self.check_envelope(bundle, Pass::Initial, &mut results);
        let message = if results.iter().all(ValidationResult::is_success) {
            INITIAL_VALID
        } else {
            INITIAL_INVALID
        };
        BundleReport::from_results(results, message)
    }

    /// Normalize and check every entry, writing repaired resources back into `bundle`
    pub fn repair_pass(&self, bundle: &mut Value) -> BundleReport {
        let mut results = Vec::new();
        if let Some(entries) = bundle.get_mut("entry").and_then(Value::as_array_mut) {
            for entry in entries.iter_mut() {
                let (result, normalized) = self.check_entry(entry, Pass::Repair);
                results.push(result);
                if let (Some(normalized), Some(slot)) = (normalized, entry.as_object_mut()) {
                    slot.insert("resource".to_string(), normalized);
                }
            }
        }
        self.check_envelope(bundle, Pass::Repair, &mut results);
        let message = if results.iter().all(ValidationResult::is_success) {
            REPAIR_VALID
        } else {
            REPAIR_INVALID
        };
        BundleReport::from_results(results, message)
    }

    fn check_entry(&self, entry: &Value, pass: Pass) -> (ValidationResult, Option<Value>) {
        let raw = entry.get("resource");
        let resource = raw.filter(|r| !is_empty(r));
        let Some(type_value) = resource.and_then(|r| r.get("resourceType")) else {
            tracing::error!(
                "Missing 'resourceType' in resource: {}",
                raw.map(|v| v.to_string()).unwrap_or_else(|| "null".to_string())
            );
            return (ValidationResult::missing_resource_type(raw), None);
        };
        let type_name = match type_value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let resource = resource.unwrap_or(&Value::Null);
        let (result, normalized) =
            self.validator
                .validate_with(&type_name, resource, pass.normalization());
        match pass {
            Pass::Initial => (result, None),
            Pass::Repair => (result, Some(normalized)),
        }
    }

    fn check_envelope(&self, bundle: &Value, pass: Pass, results: &mut Vec<ValidationResult>) {
        tracing::info!("Validating the entire FHIR bundle");
        let Some(map) = bundle.as_object() else {
            return;
        };
        if let Err(e) = self.validator.schema_validator().validate("Bundle", map) {
            tracing::warn!("{}: {} issue(s)", pass.envelope_prefix(), e.issues.len());
            results.insert(0, ValidationResult::bundle_failure(pass.envelope_prefix(), &e));
        }
    }

    async fn persist(&self, name: &str, bundle: &Value) -> Result<String> {
        let container = &self.config.storage.container;
        let bytes = serde_json::to_vec_pretty(bundle)?;
        let url = self.store.put(container, name, bytes).await?;
        tracing::info!("Stored FHIR bundle {container}/{name}");
        Ok(url)
    }
}

fn entries(bundle: &Value) -> &[Value] {
    bundle
        .get("entry")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

// Absent, null and empty containers all count as "no resource"
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
