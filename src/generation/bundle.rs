use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::Arc;

use super::client::{GenerationParams, TextGenerator};
use super::extract::extract_json;
use super::prompt::{GenerationPrompt, PromptBuilder};
use super::request::GenerationRequest;
use crate::bundle::object_name;
use crate::core::SynthBundleConfig;
use crate::error::{Result, SynthBundleError};
use crate::storage::ObjectStore;
use crate::types::ResourceType;

/// What a generation run produced and where it was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub message: String,
    #[serde(rename = "objectName")]
    pub object_name: String,
    #[serde(rename = "objectUrl")]
    pub object_url: String,
    /// Per-kind outcome, keyed by snake_case kind; observations are a list
    pub success_data: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct GeneratedBundle {
    pub bundle: Value,
    pub summary: GenerationSummary,
}

/// Generates a linked set of records and persists them as one bundle.
pub struct BundleGenerator {
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn ObjectStore>,
    config: SynthBundleConfig,
    prompts: PromptBuilder,
}

impl BundleGenerator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn ObjectStore>,
        config: SynthBundleConfig,
    ) -> Self {
        Self {
            generator,
            store,
            config,
            prompts: PromptBuilder::new(),
        }
    }

    /// Generate the Patient, then each requested kind linked to it, and store the bundle.
    ///
    /// Any record that comes back empty or undecodable aborts the run.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedBundle> {
        request.validate()?;
        tracing::info!("Generating FHIR resources");
        let params = GenerationParams::from(&self.config.generation);

        let mut entries = Vec::new();
        let mut success_data = Map::new();

        let patient_prompt = self
            .prompts
            .prompts(ResourceType::Patient, "", request)
            .into_iter()
            .next()
            .ok_or_else(|| SynthBundleError::generation("No prompt for Patient"))?;
        let patient = self.generate_record(&patient_prompt, &params).await?;
        let patient_id = patient
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string);
        record_success(&mut success_data, request, ResourceType::Patient, &patient, None);
        entries.push(entry_for(patient));

        let others: Vec<ResourceType> = request
            .requested()
            .into_iter()
            .filter(|rt| *rt != ResourceType::Patient)
            .collect();
        if !others.is_empty() && patient_id.is_none() {
            tracing::error!("Patient ID not found in generated patient data");
            return Err(SynthBundleError::generation("Patient ID not found."));
        }
        let link_id = patient_id.as_deref().unwrap_or_default();

        for rt in others {
            for prompt in self.prompts.prompts(rt, link_id, request) {
                let record = self.generate_record(&prompt, &params).await?;
                record_success(&mut success_data, request, rt, &record, Some(&prompt));
                entries.push(entry_for(record));
            }
        }

        let bundle = json!({
            "resourceType": "Bundle",
            "type": "collection",
            "entry": entries,
        });

        let id = patient_id.unwrap_or_else(|| ResourceType::Patient.fallback_id());
        let name = object_name(&self.config.generation.object_prefix, &id);
        let container = &self.config.storage.container;
        let url = self
            .store
            .put(container, &name, serde_json::to_vec_pretty(&bundle)?)
            .await?;
        tracing::info!("FHIR bundle generation completed, stored as {container}/{name}");

        Ok(GeneratedBundle {
            bundle,
            summary: GenerationSummary {
                message: "FHIR data generated and stored successfully.".to_string(),
                object_name: name,
                object_url: url,
                success_data,
            },
        })
    }

    async fn generate_record(
        &self,
        prompt: &GenerationPrompt,
        params: &GenerationParams,
    ) -> Result<Value> {
        tracing::info!("Generating {} data", prompt.label);
        let text = self
            .generator
            .generate(&prompt.text, params)
            .await?
            .ok_or_else(|| {
                SynthBundleError::generation(format!("Failed to generate {} data.", prompt.label))
            })?;
        let record = extract_json(&text)
            .filter(Value::is_object)
            .ok_or_else(|| {
                tracing::error!("Generated {} data: {text}", prompt.label);
                SynthBundleError::generation(format!(
                    "Failed to decode generated {} data.",
                    prompt.label
                ))
            })?;
        tracing::info!("{} data generated successfully", prompt.label);
        Ok(record)
    }
}

fn entry_for(resource: Value) -> Value {
    let id = resource
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    json!({
        "fullUrl": format!("urn:uuid:{id}"),
        "resource": resource,
    })
}

fn record_success(
    success_data: &mut Map<String, Value>,
    request: &GenerationRequest,
    resource_type: ResourceType,
    record: &Value,
    prompt: Option<&GenerationPrompt>,
) {
    let key = resource_type.snake_name();
    let id = record
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| resource_type.fallback_id());
    let opts = request.options(resource_type);
    let mut summary = Map::new();
    summary.insert(
        "message".to_string(),
        json!(format!("{resource_type} data for {resource_type}/{id} generated successfully.")),
    );
    summary.insert(
        format!("{key}_data_elements"),
        opts.customization().0.cloned().unwrap_or(Value::Null),
    );

    if resource_type == ResourceType::Observation {
        if let Some(prompt) = prompt {
            summary.insert("observation_panel".to_string(), json!(prompt.label));
        }
        summary.insert(
            "observation_category".to_string(),
            json!(request.observation_category),
        );
        let list = success_data
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = list {
            items.push(Value::Object(summary));
        }
    } else {
        success_data.insert(key.to_string(), Value::Object(summary));
    }
}
