//! Required/optional field partition per resource type.

use once_cell::sync::OnceCell;
use serde::Serialize;
use std::collections::BTreeSet;

use super::definition::FhirSchema;
use super::embedded::{SchemaSet, embedded_schemas};
use crate::types::ResourceType;

/// Top-level fields of a resource type, split by whether a default exists.
///
/// `required` and `optional` are disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldPartition {
    pub required: BTreeSet<String>,
    pub optional: BTreeSet<String>,
}

impl FieldPartition {
    /// Partition the declared elements of `schema`, inherited ones included
    pub fn of(schemas: &SchemaSet, schema: &FhirSchema) -> Self {
        let mut partition = Self::default();
        for (name, element) in schemas.resolved_elements(schema) {
            if element.is_required() {
                partition.required.insert(name);
            } else {
                partition.optional.insert(name);
            }
        }
        partition
    }

    pub fn is_required(&self, field: &str) -> bool {
        self.required.contains(field) && !self.optional.contains(field)
    }
}

static PARTITIONS: [OnceCell<FieldPartition>; ResourceType::COUNT] =
    [const { OnceCell::new() }; ResourceType::COUNT];

/// Field partition of `resource_type` from the embedded schemas.
///
/// Computed on first access and shared for the rest of the process.
pub fn field_partition(resource_type: ResourceType) -> &'static FieldPartition {
    PARTITIONS[resource_type.index()].get_or_init(|| {
        let schemas = embedded_schemas();
        match schemas.resource(resource_type.as_str()) {
            Some(schema) => {
                let partition = FieldPartition::of(&schemas, schema);
                tracing::debug!(
                    "Field partition for {resource_type}: {} required, {} optional",
                    partition.required.len(),
                    partition.optional.len()
                );
                partition
            }
            None => {
                tracing::error!("No embedded schema for {resource_type}");
                FieldPartition::default()
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_is_disjoint_for_every_type() {
        for rt in ResourceType::all() {
            let p = field_partition(*rt);
            assert!(p.required.is_disjoint(&p.optional), "{rt}");
            assert!(!p.required.is_empty(), "{rt}");
        }
    }

    #[test]
    fn partition_is_stable_across_calls() {
        let first = field_partition(ResourceType::Encounter);
        let second = field_partition(ResourceType::Encounter);
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn patient_birth_date_is_required() {
        let p = field_partition(ResourceType::Patient);
        assert!(p.is_required("birthDate"));
        assert!(p.is_required("id"));
        assert!(p.optional.contains("meta"));
        assert!(p.optional.contains("contained"));
    }

    #[test]
    fn normalized_away_fields_are_optional() {
        let encounter = field_partition(ResourceType::Encounter);
        for field in ["participant", "diagnosis", "class"] {
            assert!(encounter.optional.contains(field), "Encounter.{field}");
        }
        let allergy = field_partition(ResourceType::AllergyIntolerance);
        assert!(allergy.optional.contains("type"));
    }
}
