use serde_json::Value;

use super::request::{GenerationRequest, ObservationCategory};
use crate::types::ResourceType;

const CODES_HINT: &str = "Also, add appropriate SNOMED, LOINC, and RXNorm codes wherever necessary.";
const COMPLETE_HINT: &str = "Make sure none of the specified fields are missing.";
const FORMAT_HINT: &str = "Respond with a single JSON object for the resource.";

/// One prompt to send to the text generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPrompt {
    pub resource_type: ResourceType,
    /// What the prompt asks for, used in logs and error messages
    pub label: String,
    pub text: String,
}

/// Builds generation prompts from a request.
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Prompts for one resource kind.
    ///
    /// Non-patient prompts link the record to `patient_id`. Observations yield
    /// one prompt per panel of each requested category.
    pub fn prompts(
        &self,
        resource_type: ResourceType,
        patient_id: &str,
        request: &GenerationRequest,
    ) -> Vec<GenerationPrompt> {
        let opts = request.options(resource_type);
        let (data_elements, input_data) = opts.customization();

        if resource_type == ResourceType::Observation {
            return request
                .observation_category
                .iter()
                .flat_map(|category| observation_panels(*category).iter().map(move |p| (category, p)))
                .map(|(category, panel)| {
                    let mut text = template(
                        "an Observation resourceType",
                        Some(patient_id),
                        panel.focus,
                        panel.fields,
                    );
                    append_customization(
                        &mut text,
                        data_elements,
                        input_data.map(|data| category_input(data, *category)),
                    );
                    GenerationPrompt {
                        resource_type,
                        label: panel.label.to_string(),
                        text,
                    }
                })
                .collect();
        }

        let link = (resource_type != ResourceType::Patient).then_some(patient_id);
        let subject = format!("the {resource_type} resourceType");
        let mut text = template(&subject, link, "", fields_for(resource_type));
        append_customization(&mut text, data_elements, input_data);
        vec![GenerationPrompt {
            resource_type,
            label: resource_type.to_string(),
            text,
        }]
    }
}

struct ObservationPanel {
    label: &'static str,
    focus: &'static str,
    fields: &'static str,
}

fn observation_panels(category: ObservationCategory) -> &'static [ObservationPanel] {
    match category {
        ObservationCategory::VitalSigns => &[
            ObservationPanel {
                label: "heart rate",
                focus: " for heart rate",
                fields: "resourceType, id, meta (versionId and lastUpdated), identifiers, based on, status, category, code, subject, encounter, effective date/time, issued date, performer, and value quantity",
            },
            ObservationPanel {
                label: "blood pressure",
                focus: " for blood pressure, including components for systolic and diastolic blood pressure",
                fields: "resourceType, id, meta (versionId and lastUpdated), identifiers, based on, status, category, code, subject, encounter, effective date/time, issued date, performer, and components",
            },
        ],
        ObservationCategory::Laboratory => &[ObservationPanel {
            label: "laboratory",
            focus: " for a laboratory result",
            fields: "resourceType, id, meta (versionId and lastUpdated), identifiers, based on, status, category, code, subject, encounter, effective date/time, issued date, value string, value quantity, specimen, and reference range",
        }],
    }
}

fn fields_for(resource_type: ResourceType) -> &'static str {
    match resource_type {
        ResourceType::Patient => "resourceType, id, meta (versionId and lastUpdated), identifiers, names, telecoms, gender, birth date, addresses, marital status, link, contacts, communication, general practitioner, managing organization",
        ResourceType::Condition => "resourceType, id, meta (versionId and lastUpdated), identifiers, clinical status, verification status, categories, codes, severity, subject, onset period (start and end dates), recorded date, encounter",
        ResourceType::Encounter => "resourceType, id, meta (versionId and lastUpdated), identifiers, status, type, subject, location, diagnosis",
        ResourceType::Appointment => "resourceType, id, meta (versionId and lastUpdated), identifiers, status, service category, appointment type, start and end times, minutes duration, creation date, patient instruction",
        ResourceType::Observation => "resourceType, id, meta (versionId and lastUpdated), identifiers, status, category, code, subject, effective date/time, issued date",
        ResourceType::ServiceRequest => "resourceType, id, meta (versionId and lastUpdated), identifiers, based on, status, intent, category, subject, encounter, occurrence timing, authored on date, requester, specimen",
        ResourceType::MedicationRequest => "resourceType, id, meta (versionId and lastUpdated), identifiers, status, intent, category, medication, medication codeable concept, subject, encounter, authored on date, requester, recorder, course of therapy type, dosage instruction, dispense request, prior prescription",
        ResourceType::AllergyIntolerance => "resourceType, id, meta (versionId and lastUpdated), identifiers, clinical status, verification status, codes, patient, recorded date",
    }
}

fn template(subject: &str, patient_id: Option<&str>, focus: &str, fields: &str) -> String {
    let link = patient_id
        .map(|id| format!(" linked to Patient FHIR ID {id}"))
        .unwrap_or_default();
    format!(
        "Generate realistic healthcare data in the FHIR format containing {subject}{link}{focus} including details such as -\n  - {fields}\n{COMPLETE_HINT}\n{CODES_HINT}\n{FORMAT_HINT}"
    )
}

// Per-category input data when the caller keyed it by category
fn category_input(input: &Value, category: ObservationCategory) -> &Value {
    input
        .as_object()
        .and_then(|map| map.get(category.as_str()))
        .unwrap_or(input)
}

fn append_customization(text: &mut String, data_elements: Option<&Value>, input_data: Option<&Value>) {
    if let Some(elements) = data_elements {
        text.push_str(&format!(" with data elements: {}", render(elements)));
    }
    if let Some(input) = input_data {
        text.push_str(&format!(" with input data: {}", render(input)));
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> GenerationRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn patient_prompt_is_not_linked() {
        let prompts = PromptBuilder::new().prompts(ResourceType::Patient, "", &request(json!({})));
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].text.contains("containing the Patient resourceType including"));
        assert!(!prompts[0].text.contains("linked to"));
    }

    #[test]
    fn linked_prompt_with_update_suffixes() {
        let req = request(json!({
            "include_condition": true,
            "update_condition": true,
            "condition_data_elements": ["severity"],
            "condition_input_data": "severe asthma"
        }));
        let prompts = PromptBuilder::new().prompts(ResourceType::Condition, "pat-1", &req);
        let text = &prompts[0].text;
        assert!(text.contains("linked to Patient FHIR ID pat-1"));
        assert!(text.ends_with(" with data elements: [\"severity\"] with input data: severe asthma"));
    }

    #[test]
    fn vital_signs_yield_two_prompts() {
        let req = request(json!({
            "include_observation": true,
            "observation_category": ["vital-signs", "laboratory"],
            "update_observation": true,
            "observation_data_elements": ["valueQuantity"],
            "observation_input_data": {"laboratory": "HbA1c 6.1%"}
        }));
        let prompts = PromptBuilder::new().prompts(ResourceType::Observation, "p", &req);
        let labels: Vec<&str> = prompts.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["heart rate", "blood pressure", "laboratory"]);
        assert!(prompts[2].text.ends_with("with input data: HbA1c 6.1%"));
        assert!(prompts[0].text.contains("with input data: {\"laboratory\":\"HbA1c 6.1%\"}"));
    }
}
