//! Generation request parsing.
//!
//! Requests use flat snake_case flags per resource kind: `include_<kind>`,
//! `update_<kind>`, `<kind>_data_elements` and `<kind>_input_data`, plus
//! `observation_category`. The Patient record is always generated.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::SynthBundleError;
use crate::types::ResourceType;

/// Observation panels that can be requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObservationCategory {
    VitalSigns,
    Laboratory,
}

impl ObservationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservationCategory::VitalSigns => "vital-signs",
            ObservationCategory::Laboratory => "laboratory",
        }
    }
}

impl fmt::Display for ObservationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ObservationCategory {
    type Err = SynthBundleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vital-signs" => Ok(ObservationCategory::VitalSigns),
            "laboratory" => Ok(ObservationCategory::Laboratory),
            other => Err(SynthBundleError::invalid_request(format!(
                "Invalid observation category provided: {other}"
            ))),
        }
    }
}

/// Options for one resource kind
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceOptions {
    pub include: bool,
    pub update: bool,
    pub data_elements: Option<Value>,
    pub input_data: Option<Value>,
}

impl ResourceOptions {
    /// Data elements and input data, only when an update was requested
    pub fn customization(&self) -> (Option<&Value>, Option<&Value>) {
        if self.update {
            (self.data_elements.as_ref(), self.input_data.as_ref())
        } else {
            (None, None)
        }
    }
}

/// A validated bundle generation request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct GenerationRequest {
    options: BTreeMap<ResourceType, ResourceOptions>,
    pub observation_category: Vec<ObservationCategory>,
}

impl GenerationRequest {
    /// A request for the Patient record only
    pub fn patient_only() -> Self {
        let mut request = Self::default();
        request.options.insert(
            ResourceType::Patient,
            ResourceOptions {
                include: true,
                ..Default::default()
            },
        );
        request
    }

    pub fn include(mut self, resource_type: ResourceType) -> Self {
        self.options.entry(resource_type).or_default().include = true;
        self
    }

    pub fn with_observation_category(mut self, category: ObservationCategory) -> Self {
        if !self.observation_category.contains(&category) {
            self.observation_category.push(category);
        }
        self
    }

    pub fn with_update(
        mut self,
        resource_type: ResourceType,
        data_elements: Value,
        input_data: Value,
    ) -> Self {
        let opts = self.options.entry(resource_type).or_default();
        opts.update = true;
        opts.data_elements = Some(data_elements);
        opts.input_data = Some(input_data);
        self
    }

    pub fn options(&self, resource_type: ResourceType) -> ResourceOptions {
        let mut opts = self.options.get(&resource_type).cloned().unwrap_or_default();
        if resource_type == ResourceType::Patient {
            opts.include = true;
        }
        opts
    }

    pub fn includes(&self, resource_type: ResourceType) -> bool {
        self.options(resource_type).include
    }

    /// Requested kinds in generation order, Patient first
    pub fn requested(&self) -> Vec<ResourceType> {
        ResourceType::all()
            .iter()
            .copied()
            .filter(|rt| self.includes(*rt))
            .collect()
    }

    /// Reject updates without their data, and observations without a category
    pub fn validate(&self) -> crate::error::Result<()> {
        for rt in self.requested() {
            let opts = self.options(rt);
            if opts.update && (!has_content(&opts.data_elements) || !has_content(&opts.input_data))
            {
                return Err(SynthBundleError::invalid_request(format!(
                    "Data elements or input data not provided for {} updates.",
                    rt.snake_name().replace('_', " ")
                )));
            }
        }
        if self.includes(ResourceType::Observation) && self.observation_category.is_empty() {
            return Err(SynthBundleError::invalid_request(
                "Category not provided for observation data generation.",
            ));
        }
        Ok(())
    }
}

fn has_content(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Number(_)) | Some(Value::Bool(true)) => true,
    }
}

fn flag(map: &Map<String, Value>, key: &str) -> Result<bool, SynthBundleError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(SynthBundleError::invalid_request(format!(
            "'{key}' must be a boolean, got {other}"
        ))),
    }
}

impl TryFrom<Map<String, Value>> for GenerationRequest {
    type Error = SynthBundleError;

    fn try_from(mut map: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut request = Self::default();
        for rt in ResourceType::all() {
            let name = rt.snake_name();
            let opts = ResourceOptions {
                include: *rt == ResourceType::Patient || flag(&map, &format!("include_{name}"))?,
                update: flag(&map, &format!("update_{name}"))?,
                data_elements: map.remove(&format!("{name}_data_elements")),
                input_data: map.remove(&format!("{name}_input_data")),
            };
            request.options.insert(*rt, opts);
        }

        request.observation_category = match map.remove("observation_category") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(s)) => vec![s.parse()?],
            Some(Value::Array(items)) => {
                let mut categories = Vec::new();
                for item in items {
                    let category = item
                        .as_str()
                        .ok_or_else(|| {
                            SynthBundleError::invalid_request(format!(
                                "Invalid observation category provided: {item}"
                            ))
                        })?
                        .parse()?;
                    if !categories.contains(&category) {
                        categories.push(category);
                    }
                }
                categories
            }
            Some(other) => {
                return Err(SynthBundleError::invalid_request(format!(
                    "Invalid observation category provided: {other}"
                )));
            }
        };
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<GenerationRequest, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn patient_is_always_requested() {
        let request = parse(json!({})).unwrap();
        assert_eq!(request.requested(), vec![ResourceType::Patient]);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn flags_select_kinds_in_fixed_order() {
        let request = parse(json!({
            "include_allergy_intolerance": true,
            "include_condition": true,
            "include_observation": true,
            "observation_category": ["laboratory", "vital-signs"]
        }))
        .unwrap();
        assert_eq!(
            request.requested(),
            vec![
                ResourceType::Patient,
                ResourceType::Condition,
                ResourceType::Observation,
                ResourceType::AllergyIntolerance
            ]
        );
        assert_eq!(
            request.observation_category,
            vec![ObservationCategory::Laboratory, ObservationCategory::VitalSigns]
        );
    }

    #[test]
    fn update_without_data_is_rejected() {
        let request = parse(json!({
            "include_service_request": true,
            "update_service_request": true,
            "service_request_data_elements": ["priority"]
        }))
        .unwrap();
        let err = request.validate().unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(
            err.to_string(),
            "Invalid request: Data elements or input data not provided for service request updates."
        );
    }

    #[test]
    fn observation_needs_a_category() {
        let request = parse(json!({"include_observation": true})).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn unknown_category_fails_to_parse() {
        let err = parse(json!({"observation_category": ["imaging"]})).unwrap_err();
        assert!(err.to_string().contains("imaging"));
    }

    #[test]
    fn customization_only_applies_to_updates() {
        let request = parse(json!({
            "patient_data_elements": ["gender"],
            "patient_input_data": {"gender": "female"}
        }))
        .unwrap();
        assert_eq!(request.options(ResourceType::Patient).customization(), (None, None));

        let updated = GenerationRequest::patient_only().with_update(
            ResourceType::Patient,
            json!(["gender"]),
            json!({"gender": "female"}),
        );
        assert!(updated.validate().is_ok());
        assert!(updated.options(ResourceType::Patient).customization().0.is_some());
    }
}
