use serde_json::{Map, Value, json};

/// Coerce an arbitrary payload into a bundle, returning a new value.
///
/// A payload that already carries an `entry` list keeps its entries. A single
/// non-bundle resource becomes the only entry. Any other object contributes
/// one entry per top-level value, with list values expanded element-wise; a
/// top-level list contributes one entry per element. In every case the result
/// has `resourceType: "Bundle"` and a `type` (defaulting to `default_type`).
pub fn canonicalize(payload: &Value, default_type: &str) -> Value {
    let mut bundle = match payload {
        Value::Object(map) if map.get("entry").is_some_and(Value::is_array) => map.clone(),
        Value::Object(map) if is_single_resource(map) => {
            tracing::info!("Wrapped single resource into a FHIR bundle");
            bundle_of(vec![payload.clone()])
        }
        Value::Object(map) => {
            tracing::info!("Converted JSON to FHIR bundle format");
            bundle_of(map.values().flat_map(expand).collect())
        }
        other => {
            tracing::info!("Converted JSON to FHIR bundle format");
            bundle_of(expand(other))
        }
    };

    bundle.insert("resourceType".to_string(), json!("Bundle"));
    if !bundle.get("type").is_some_and(|t| !t.is_null()) {
        bundle.insert("type".to_string(), json!(default_type));
    }
    Value::Object(bundle)
}

fn is_single_resource(map: &Map<String, Value>) -> bool {
    map.get("resourceType")
        .and_then(Value::as_str)
        .is_some_and(|rt| rt != "Bundle")
}

fn expand(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

fn bundle_of(resources: Vec<Value>) -> Map<String, Value> {
    let entries = resources
        .into_iter()
        .map(|resource| json!({ "resource": resource }))
        .collect();
    let mut bundle = Map::new();
    bundle.insert("resourceType".to_string(), json!("Bundle"));
    bundle.insert("entry".to_string(), Value::Array(entries));
    bundle
}
