use serde_json::Value;
use std::collections::HashMap;

use super::rules::RepairRule;
use crate::types::ResourceType;

/// Timestamp fields normalized on every resource type
const GENERIC_TIMESTAMPS: &[&str] = &[
    "effectiveDateTime",
    "authoredOn",
    "recordedDate",
    "onsetDateTime",
    "issued",
    "validityPeriod.start",
];

/// Ordered repair rules per resource type.
///
/// Generic rules run first, then the rules registered for the resource's own
/// type, each in registration order.
#[derive(Debug, Clone, Default)]
pub struct RepairRegistry {
    generic: Vec<RepairRule>,
    by_type: HashMap<ResourceType, Vec<RepairRule>>,
}

impl RepairRegistry {
    /// A registry with no rules; normalization is the identity
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in repairs for the supported resource types
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for path in GENERIC_TIMESTAMPS {
            registry.register_generic(RepairRule::normalize_timestamp(*path));
        }

        registry
            .register(ResourceType::Encounter, RepairRule::wrap_in_list("class"))
            .register(ResourceType::Encounter, RepairRule::remove("period"))
            .register(ResourceType::Encounter, RepairRule::remove("participant"))
            .register(ResourceType::Encounter, RepairRule::remove("diagnosis"));

        registry
            .register(
                ResourceType::Appointment,
                RepairRule::wrap_in_list("patientInstruction"),
            )
            .register(
                ResourceType::Appointment,
                RepairRule::retain_embedded_json("patientInstruction"),
            )
            .register(ResourceType::Appointment, RepairRule::remove("comment"));

        registry
            .register(
                ResourceType::ServiceRequest,
                RepairRule::normalize_timestamp("occurrenceDateTime"),
            )
            .register(
                ResourceType::ServiceRequest,
                RepairRule::collapse_event_objects("occurrenceTiming.event", "effectiveDateTime"),
            )
            .register(
                ResourceType::ServiceRequest,
                RepairRule::normalize_timestamp("occurrenceTiming.repeat.boundsPeriod.start"),
            )
            .register(
                ResourceType::ServiceRequest,
                RepairRule::normalize_timestamp("occurrenceTiming.repeat.boundsPeriod.end"),
            )
            .register(ResourceType::ServiceRequest, RepairRule::remove("code"));

        registry
            .register(
                ResourceType::MedicationRequest,
                RepairRule::normalize_timestamp("dispenseRequest.validityPeriod.start"),
            )
            .register(
                ResourceType::MedicationRequest,
                RepairRule::nest_under("medicationCodeableConcept", "medication", "concept"),
            );

        registry
            .register(
                ResourceType::AllergyIntolerance,
                RepairRule::normalize_timestamp("note[].time"),
            )
            .register(ResourceType::AllergyIntolerance, RepairRule::remove("reaction"))
            .register(ResourceType::AllergyIntolerance, RepairRule::remove("type"));

        registry
    }

    pub fn register(&mut self, resource_type: ResourceType, rule: RepairRule) -> &mut Self {
        self.by_type.entry(resource_type).or_default().push(rule);
        self
    }

    pub fn register_generic(&mut self, rule: RepairRule) -> &mut Self {
        self.generic.push(rule);
        self
    }

    /// Rules applied to `resource_type`, in application order
    pub fn rules_for(&self, resource_type: ResourceType) -> impl Iterator<Item = &RepairRule> {
        self.generic.iter().chain(
            self.by_type
                .get(&resource_type)
                .into_iter()
                .flatten(),
        )
    }

    /// Normalize a copy of `resource`; the input is left untouched
    pub fn normalize(&self, resource_type: ResourceType, resource: &Value) -> Value {
        let mut repaired = resource.clone();
        self.normalize_in_place(resource_type, &mut repaired);
        repaired
    }

    /// Apply every rule for `resource_type`, returning how many changed something
    pub fn normalize_in_place(&self, resource_type: ResourceType, resource: &mut Value) -> usize {
        let mut applied = 0;
        for rule in self.rules_for(resource_type) {
            if rule.apply(resource) {
                tracing::debug!("Applied {rule:?} to {resource_type}");
                applied += 1;
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encounter_repairs() {
        let registry = RepairRegistry::with_defaults();
        let raw = json!({
            "resourceType": "Encounter",
            "class": {"coding": [{"code": "AMB"}]},
            "period": {"start": "2024-01-01"},
            "participant": [],
            "diagnosis": [],
            "status": "completed"
        });
        let repaired = registry.normalize(ResourceType::Encounter, &raw);
        assert_eq!(repaired["class"], json!([{"coding": [{"code": "AMB"}]}]));
        for dropped in ["period", "participant", "diagnosis"] {
            assert!(repaired.get(dropped).is_none(), "{dropped}");
        }
        assert_eq!(raw["class"]["coding"][0]["code"], "AMB");
    }

    #[test]
    fn generic_rules_apply_to_every_type() {
        let registry = RepairRegistry::with_defaults();
        let raw = json!({"resourceType": "Condition", "recordedDate": "2024-02-02T12:00:00"});
        let repaired = registry.normalize(ResourceType::Condition, &raw);
        assert_eq!(repaired["recordedDate"], "2024-02-02T12:00:00+00:00");
    }

    #[test]
    fn generic_rules_come_first() {
        let registry = RepairRegistry::with_defaults();
        let first = registry.rules_for(ResourceType::Patient).next();
        assert_eq!(first, Some(&RepairRule::normalize_timestamp("effectiveDateTime")));
        assert_eq!(
            registry.rules_for(ResourceType::Patient).count(),
            GENERIC_TIMESTAMPS.len()
        );
    }

    #[test]
    fn allergy_repairs() {
        let registry = RepairRegistry::with_defaults();
        let raw = json!({
            "resourceType": "AllergyIntolerance",
            "type": "allergy",
            "reaction": [{"manifestation": []}],
            "note": [{"text": "x", "time": "2024-01-01T08:00:00"}]
        });
        let repaired = registry.normalize(ResourceType::AllergyIntolerance, &raw);
        assert!(repaired.get("type").is_none());
        assert!(repaired.get("reaction").is_none());
        assert_eq!(repaired["note"][0]["time"], "2024-01-01T08:00:00+00:00");
    }

    #[test]
    fn normalization_is_idempotent() {
        let registry = RepairRegistry::with_defaults();
        let raw = json!({
            "resourceType": "ServiceRequest",
            "code": {"text": "CBC"},
            "authoredOn": "2024-04-01T09:00:00",
            "occurrenceTiming": {
                "event": [{"effectiveDateTime": "2024-04-02T09:00:00"}],
                "repeat": {"boundsPeriod": {"start": "2024-04-02T09:00:00", "end": "2024-04-03"}}
            }
        });
        let once = registry.normalize(ResourceType::ServiceRequest, &raw);
        let twice = registry.normalize(ResourceType::ServiceRequest, &once);
        assert_eq!(once, twice);
        assert_eq!(once["occurrenceTiming"]["repeat"]["boundsPeriod"]["end"], "2024-04-03");
    }

    #[test]
    fn custom_rules_extend_defaults() {
        let mut registry = RepairRegistry::with_defaults();
        registry.register(ResourceType::Patient, RepairRule::remove("photo"));
        let repaired = registry.normalize(
            ResourceType::Patient,
            &json!({"resourceType": "Patient", "photo": []}),
        );
        assert!(repaired.get("photo").is_none());
    }
}
