use serde_json::Value;

use super::segment::{join_child_key, join_index, join_key};

/// Enumerate every path reachable from `value`.
///
/// Maps contribute one path per key, lists one path per index, both in
/// document order (map keys keep insertion order, they are not sorted).
/// A scalar root yields `prefix` itself when it is non-empty.
pub fn flatten<'a>(value: &'a Value, prefix: &str) -> FlattenPaths<'a> {
    FlattenPaths::new(value, prefix)
}

/// Lazy pre-order walk produced by [`flatten`]. Cloning restarts from the
/// clone's current position.
#[derive(Debug, Clone)]
pub struct FlattenPaths<'a> {
    stack: Vec<(String, &'a Value)>,
    root_leaf: Option<String>,
}

impl<'a> FlattenPaths<'a> {
    fn new(value: &'a Value, prefix: &str) -> Self {
        let mut paths = Self {
            stack: Vec::new(),
            root_leaf: None,
        };
        match value {
            Value::Object(_) | Value::Array(_) => {
                paths.push_children(prefix, value, prefix.is_empty())
            }
            _ if !prefix.is_empty() => paths.root_leaf = Some(prefix.to_string()),
            _ => {}
        }
        paths
    }

    // `at_root` is false once `prefix` names a node, even the empty key
    fn push_children(&mut self, prefix: &str, value: &'a Value, at_root: bool) {
        match value {
            Value::Object(map) => {
                for (key, child) in map.iter().rev() {
                    let path = if at_root {
                        join_key(prefix, key)
                    } else {
                        join_child_key(prefix, key)
                    };
                    self.stack.push((path, child));
                }
            }
            Value::Array(items) => {
                for (index, child) in items.iter().enumerate().rev() {
                    self.stack.push((join_index(prefix, index), child));
                }
            }
            _ => {}
        }
    }
}

impl Iterator for FlattenPaths<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if let Some(leaf) = self.root_leaf.take() {
            return Some(leaf);
        }
        let (path, value) = self.stack.pop()?;
        self.push_children(&path, value, false);
        Some(path)
    }
}
