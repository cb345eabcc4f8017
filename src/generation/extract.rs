use serde_json::Value;

/// Decode the JSON object embedded in generated text.
///
/// Takes everything from the first `{` to the last `}`, which drops the prose
/// and code fences models tend to wrap around their answer.
pub fn extract_json(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!("Generated FHIR data could not be decoded: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_fences_and_prose() {
        let text = "Here is the resource:\n```json\n{\"resourceType\": \"Patient\", \"id\": \"p1\"}\n```\nLet me know!";
        assert_eq!(
            extract_json(text),
            Some(json!({"resourceType": "Patient", "id": "p1"}))
        );
    }

    #[test]
    fn rejects_text_without_object() {
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("} backwards {"), None);
        assert_eq!(extract_json("{\"unterminated\": "), None);
    }
}
