//! Structural repair rules.
//!
//! Rule paths are `.`-separated keys; a key suffixed with `[]` fans out over
//! every element of the list it names (`note[].time`). The last key names the
//! slot the rule inspects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::timestamp::ensure_timezone_aware;

/// One repair applied to a resource before schema validation.
///
/// Each variant checks its own precondition on the addressed slot and leaves
/// the resource alone when it does not hold. Applying a rule twice has the
/// same effect as applying it once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RepairRule {
    /// Give a naive timestamp an explicit UTC offset
    NormalizeTimestamp { path: String },
    /// Wrap a scalar value into a one-element list
    WrapInList { path: String },
    /// Drop the element entirely
    Remove { path: String },
    /// Drop string list items that are not JSON, decoding those that hold an object
    RetainEmbeddedJson { path: String },
    /// Replace object items carrying `key` with that key's (timestamp-normalized) value
    CollapseEventObjects { path: String, key: String },
    /// Move `from` to `parent.child` when `parent` is absent
    NestUnder {
        from: String,
        parent: String,
        child: String,
    },
}

impl RepairRule {
    pub fn normalize_timestamp(path: impl Into<String>) -> Self {
        Self::NormalizeTimestamp { path: path.into() }
    }

    pub fn wrap_in_list(path: impl Into<String>) -> Self {
        Self::WrapInList { path: path.into() }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self::Remove { path: path.into() }
    }

    pub fn retain_embedded_json(path: impl Into<String>) -> Self {
        Self::RetainEmbeddedJson { path: path.into() }
    }

    pub fn collapse_event_objects(path: impl Into<String>, key: impl Into<String>) -> Self {
        Self::CollapseEventObjects {
            path: path.into(),
            key: key.into(),
        }
    }

    pub fn nest_under(
        from: impl Into<String>,
        parent: impl Into<String>,
        child: impl Into<String>,
    ) -> Self {
        Self::NestUnder {
            from: from.into(),
            parent: parent.into(),
            child: child.into(),
        }
    }

    /// Apply the rule to `resource`, returning whether anything changed
    pub fn apply(&self, resource: &mut Value) -> bool {
        let mut changed = false;
        match self {
            RepairRule::NormalizeTimestamp { path } => {
                visit_slots(resource, path, &mut |parent, key| {
                    let rewritten = parent
                        .get(key)
                        .and_then(Value::as_str)
                        .and_then(ensure_timezone_aware);
                    if let Some(ts) = rewritten {
                        parent.insert(key.to_string(), Value::String(ts));
                        changed = true;
                    }
                });
            }
            RepairRule::WrapInList { path } => {
                visit_slots(resource, path, &mut |parent, key| {
                    if let Some(slot) = parent.get_mut(key) {
                        if !slot.is_array() && !slot.is_null() {
                            let scalar = slot.take();
                            *slot = Value::Array(vec![scalar]);
                            changed = true;
                        }
                    }
                });
            }
            RepairRule::Remove { path } => {
                visit_slots(resource, path, &mut |parent, key| {
                    changed |= parent.shift_remove(key).is_some();
                });
            }
            RepairRule::RetainEmbeddedJson { path } => {
                visit_slots(resource, path, &mut |parent, key| {
                    if let Some(Value::Array(items)) = parent.get_mut(key) {
                        let before = std::mem::take(items);
                        for item in before {
                            match embedded_json(item) {
                                Embedded::Kept(item) => items.push(item),
                                Embedded::Decoded(object) => {
                                    items.push(object);
                                    changed = true;
                                }
                                Embedded::Malformed => changed = true,
                            }
                        }
                    }
                });
            }
            RepairRule::CollapseEventObjects { path, key: field } => {
                visit_slots(resource, path, &mut |parent, key| {
                    if let Some(Value::Array(items)) = parent.get_mut(key) {
                        for item in items.iter_mut() {
                            let inner = item
                                .as_object()
                                .and_then(|obj| obj.get(field.as_str()))
                                .cloned();
                            // An object under `key` is not an event value; leave it
                            if let Some(inner) = inner.filter(|inner| !inner.is_object()) {
                                *item = match inner.as_str().and_then(ensure_timezone_aware) {
                                    Some(ts) => Value::String(ts),
                                    None => inner,
                                };
                                changed = true;
                            }
                        }
                    }
                });
            }
            RepairRule::NestUnder {
                from,
                parent: target,
                child,
            } => {
                if let Some(map) = resource.as_object_mut() {
                    if !map.contains_key(target.as_str()) {
                        if let Some(moved) = map.shift_remove(from.as_str()) {
                            let mut nested = Map::new();
                            nested.insert(child.clone(), moved);
                            map.insert(target.clone(), Value::Object(nested));
                            changed = true;
                        }
                    }
                }
            }
        }
        changed
    }
}

enum Embedded {
    Kept(Value),
    Decoded(Value),
    Malformed,
}

/// Classify one list item: strings must parse as JSON, non-strings pass through
fn embedded_json(item: Value) -> Embedded {
    let Value::String(text) = &item else {
        return Embedded::Kept(item);
    };
    match serde_json::from_str::<Value>(text) {
        Ok(object @ Value::Object(_)) => Embedded::Decoded(object),
        Ok(_) => Embedded::Kept(item),
        Err(_) => Embedded::Malformed,
    }
}

/// Call `f(parent, key)` for every object addressed by the leading keys of `path`
fn visit_slots<F>(value: &mut Value, path: &str, f: &mut F)
where
    F: FnMut(&mut Map<String, Value>, &str),
{
    let segments: Vec<&str> = path.split('.').collect();
    if let Some((last, init)) = segments.split_last() {
        walk(value, init, last, f);
    }
}

fn walk<F>(value: &mut Value, init: &[&str], last: &str, f: &mut F)
where
    F: FnMut(&mut Map<String, Value>, &str),
{
    let Some((head, rest)) = init.split_first() else {
        if let Value::Object(map) = value {
            f(map, last);
        }
        return;
    };

    let (key, fan_out) = match head.strip_suffix("[]") {
        Some(key) => (key, true),
        None => (*head, false),
    };
    let Some(child) = value.as_object_mut().and_then(|map| map.get_mut(key)) else {
        return;
    };
    if !fan_out {
        walk(child, rest, last, f);
    } else if let Value::Array(items) = child {
        for item in items {
            walk(item, rest, last, f);
        }
    }
}
