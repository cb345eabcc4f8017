use serde_json::Value;
use std::collections::BTreeSet;

use crate::path::exists;
use crate::schema::FieldPartition;

/// Required fields of `partition` that `resource` does not carry.
///
/// Shared by the success and failure paths of resource validation.
pub fn missing_fields(partition: &FieldPartition, resource: &Value) -> BTreeSet<String> {
    partition
        .required
        .iter()
        .filter(|field| !partition.optional.contains(*field))
        .filter(|field| !exists(field, resource))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn partition(required: &[&str], optional: &[&str]) -> FieldPartition {
        FieldPartition {
            required: required.iter().map(|s| s.to_string()).collect(),
            optional: optional.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn reports_only_absent_required_fields() {
        let p = partition(&["id", "birthDate", "gender"], &["meta"]);
        let missing = missing_fields(&p, &json!({"id": "p1", "gender": "male"}));
        assert_eq!(missing, BTreeSet::from(["birthDate".to_string()]));
    }

    #[test]
    fn null_counts_as_present() {
        let p = partition(&["birthDate"], &[]);
        assert!(missing_fields(&p, &json!({"birthDate": null})).is_empty());
    }

    #[test]
    fn non_object_resource_misses_everything() {
        let p = partition(&["id", "status"], &[]);
        assert_eq!(missing_fields(&p, &json!("oops")).len(), 2);
    }
}
