use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of clinical resource types this crate generates and validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    Patient,
    Condition,
    Encounter,
    Appointment,
    Observation,
    ServiceRequest,
    MedicationRequest,
    AllergyIntolerance,
}

impl ResourceType {
    pub const COUNT: usize = 8;

    /// Get all supported resource types, in bundle generation order
    pub fn all() -> &'static [ResourceType] {
        &[
            ResourceType::Patient,
            ResourceType::Condition,
            ResourceType::Encounter,
            ResourceType::Appointment,
            ResourceType::Observation,
            ResourceType::ServiceRequest,
            ResourceType::MedicationRequest,
            ResourceType::AllergyIntolerance,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Patient => "Patient",
            ResourceType::Condition => "Condition",
            ResourceType::Encounter => "Encounter",
            ResourceType::Appointment => "Appointment",
            ResourceType::Observation => "Observation",
            ResourceType::ServiceRequest => "ServiceRequest",
            ResourceType::MedicationRequest => "MedicationRequest",
            ResourceType::AllergyIntolerance => "AllergyIntolerance",
        }
    }

    /// Dense index, used for per-type lookup tables
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Identifier reported for a record that carries no `id`, e.g. `unknown_patient`
    pub fn fallback_id(&self) -> String {
        format!("unknown_{}", self.as_str().to_lowercase())
    }

    /// Snake-case key used in generation requests and summaries (`service_request`)
    pub fn snake_name(&self) -> &'static str {
        match self {
            ResourceType::Patient => "patient",
            ResourceType::Condition => "condition",
            ResourceType::Encounter => "encounter",
            ResourceType::Appointment => "appointment",
            ResourceType::Observation => "observation",
            ResourceType::ServiceRequest => "service_request",
            ResourceType::MedicationRequest => "medication_request",
            ResourceType::AllergyIntolerance => "allergy_intolerance",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedResourceType(pub String);

impl fmt::Display for UnsupportedResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unsupported resource type: {}", self.0)
    }
}

impl std::error::Error for UnsupportedResourceType {}

impl FromStr for ResourceType {
    type Err = UnsupportedResourceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::all()
            .iter()
            .copied()
            .find(|rt| rt.as_str() == s)
            .ok_or_else(|| UnsupportedResourceType(s.to_string()))
    }
}
