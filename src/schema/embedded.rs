use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::definition::{FhirSchema, SchemaElement, SchemaKind};

// Schema documents compiled into the binary
static RESOURCE_SCHEMAS: &[(&str, &[u8])] = &[
    ("Patient", include_bytes!("../../schemas/Patient.json")),
    ("Condition", include_bytes!("../../schemas/Condition.json")),
    ("Encounter", include_bytes!("../../schemas/Encounter.json")),
    ("Appointment", include_bytes!("../../schemas/Appointment.json")),
    ("Observation", include_bytes!("../../schemas/Observation.json")),
    ("ServiceRequest", include_bytes!("../../schemas/ServiceRequest.json")),
    ("MedicationRequest", include_bytes!("../../schemas/MedicationRequest.json")),
    ("AllergyIntolerance", include_bytes!("../../schemas/AllergyIntolerance.json")),
    ("Bundle", include_bytes!("../../schemas/Bundle.json")),
];

static DATATYPE_SCHEMAS: &[u8] = include_bytes!("../../schemas/datatypes.json");

static EMBEDDED: Lazy<Arc<SchemaSet>> = Lazy::new(|| Arc::new(SchemaSet::load_embedded()));

/// The schema set compiled into the crate
pub fn embedded_schemas() -> Arc<SchemaSet> {
    Arc::clone(&EMBEDDED)
}

/// Resource and datatype schemas, indexed by name.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    schemas: HashMap<String, FhirSchema>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn load_embedded() -> Self {
        let mut set = Self::new();

        match serde_json::from_slice::<HashMap<String, FhirSchema>>(DATATYPE_SCHEMAS) {
            Ok(datatypes) => set.schemas.extend(datatypes),
            Err(e) => tracing::error!("Failed to deserialize embedded datatype schemas: {e}"),
        }

        for (name, bytes) in RESOURCE_SCHEMAS {
            match serde_json::from_slice::<FhirSchema>(bytes) {
                Ok(schema) => set.insert(schema),
                Err(e) => tracing::error!("Failed to deserialize embedded {name} schema: {e}"),
            }
        }

        tracing::debug!("Loaded {} embedded schemas", set.len());
        set
    }

    pub fn insert(&mut self, schema: FhirSchema) {
        self.schemas.insert(schema.name.clone(), schema);
    }

    pub fn get(&self, name: &str) -> Option<&FhirSchema> {
        self.schemas.get(name)
    }

    /// Resource schema by type name; datatypes and base schemas are not returned
    pub fn resource(&self, name: &str) -> Option<&FhirSchema> {
        self.get(name).filter(|s| s.kind == SchemaKind::Resource)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Elements of `schema` merged over those of its base chain (own elements override)
    pub fn resolved_elements(&self, schema: &FhirSchema) -> BTreeMap<String, SchemaElement> {
        let mut chain = vec![schema];
        let mut current = schema;
        while let Some(base) = current.base.as_deref().and_then(|b| self.get(b)) {
            if chain.iter().any(|s| s.name == base.name) {
                break;
            }
            chain.push(base);
            current = base;
        }

        let mut merged = BTreeMap::new();
        for s in chain.iter().rev() {
            for (name, element) in &s.elements {
                merged.insert(name.clone(), element.clone());
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResourceType;

    #[test]
    fn every_supported_type_has_an_embedded_schema() {
        let set = embedded_schemas();
        for rt in ResourceType::all() {
            assert!(set.resource(rt.as_str()).is_some(), "missing schema for {rt}");
        }
        assert!(set.resource("Bundle").is_some());
    }

    #[test]
    fn datatypes_are_not_resources() {
        let set = embedded_schemas();
        assert!(set.get("CodeableConcept").is_some());
        assert!(set.resource("CodeableConcept").is_none());
        assert!(set.resource("DomainResource").is_none());
    }

    #[test]
    fn resolves_inherited_elements() {
        let set = embedded_schemas();
        let patient = set.resource("Patient").unwrap();
        let elements = set.resolved_elements(patient);
        for inherited in ["id", "meta", "text", "contained", "extension"] {
            assert!(elements.contains_key(inherited), "{inherited} not inherited");
        }
        assert!(elements.contains_key("birthDate"));
    }

    #[test]
    fn bundle_inherits_resource_but_not_domain_resource() {
        let set = embedded_schemas();
        let elements = set.resolved_elements(set.resource("Bundle").unwrap());
        assert!(elements.contains_key("meta"));
        assert!(!elements.contains_key("text"));
    }
}
