use chrono::{DateTime, Utc};
use serde_json::Value;

/// `<prefix>_<id>.json`
pub fn object_name(prefix: &str, id: &str) -> String {
    format!("{prefix}_{}.json", sanitize(id))
}

/// Id of a validated bundle object.
///
/// Taken from a source object named `<source_prefix>_<id>.json`, else from the
/// payload's string `id`, else the current time rendered with `timestamp_format`.
pub fn validated_object_id(
    source_prefix: &str,
    source: Option<&str>,
    payload: &Value,
    timestamp_format: &str,
    now: DateTime<Utc>,
) -> String {
    source
        .and_then(|name| id_from_source(source_prefix, name))
        .or_else(|| {
            payload
                .get("id")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| now.format(timestamp_format).to_string())
}

fn id_from_source(source_prefix: &str, name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let stem = base.strip_suffix(".json").unwrap_or(base);
    stem.strip_prefix(source_prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

// Keep ids usable as a single path segment
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
