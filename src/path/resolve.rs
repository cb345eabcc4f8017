use serde_json::Value;

use super::segment::PathSegment;

/// Whether `path` addresses something inside `value`.
pub fn exists(path: &str, value: &Value) -> bool {
    resolve(path, value).is_some()
}

/// Resolve `path` against `value`.
///
/// At each step the longest run of `.`-separated tokens that names a literal
/// map key wins; otherwise the run is parsed with the shared segment grammar
/// and followed key-then-indices. Shorter runs are tried when a longer match
/// leads nowhere.
pub fn resolve<'v>(path: &str, value: &'v Value) -> Option<&'v Value> {
    let tokens: Vec<&str> = path.split('.').collect();
    walk(value, &tokens)
}

fn walk<'v>(current: &'v Value, tokens: &[&str]) -> Option<&'v Value> {
    if tokens.is_empty() {
        return Some(current);
    }
    (1..=tokens.len()).rev().find_map(|len| {
        let run = tokens[..len].join(".");
        let rest = &tokens[len..];
        literal(current, &run)
            .and_then(|next| walk(next, rest))
            .or_else(|| indexed(current, &run).and_then(|next| walk(next, rest)))
    })
}

fn literal<'v>(current: &'v Value, run: &str) -> Option<&'v Value> {
    current.as_object()?.get(run)
}

fn indexed<'v>(current: &'v Value, run: &str) -> Option<&'v Value> {
    let parsed = PathSegment::parse(run)?;
    if parsed.indices.is_empty() {
        // A plain key was already tried literally
        return None;
    }
    let mut node = match (parsed.key, current) {
        (Some(key), _) => current.as_object()?.get(key)?,
        // A bare index on a map reaches into its empty key
        (None, Value::Object(map)) => map.get("")?,
        (None, _) => current,
    };
    for index in parsed.indices {
        node = node.as_array()?.get(index)?;
    }
    Some(node)
}
