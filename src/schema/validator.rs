//! Structural validation of JSON resources against embedded schemas.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::definition::{FhirSchema, SchemaElement};
use super::embedded::{SchemaSet, embedded_schemas};
use super::primitive;
use crate::path::segment::{join_index, join_key};

/// Validates one resource map against the schema of a named type.
///
/// The core only observes whether validation failed and the error text.
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, type_name: &str, resource: &Map<String, Value>) -> Result<(), SchemaError>;
}

/// One problem found while validating a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaIssue {
    /// Issue code: `require`, `type`, `type/array`, `element/unknown`, `value`, `value/enum`
    #[serde(rename = "type")]
    pub error_type: String,
    pub path: String,
    pub message: String,
}

impl SchemaIssue {
    pub fn new(
        error_type: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error_type: error_type.into(),
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Schema validation failure for one resource, carrying every issue found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaError {
    pub type_name: String,
    pub issues: Vec<SchemaIssue>,
}

impl SchemaError {
    pub fn new(type_name: impl Into<String>, issues: Vec<SchemaIssue>) -> Self {
        Self {
            type_name: type_name.into(),
            issues,
        }
    }

    pub fn unknown_type(type_name: &str) -> Self {
        Self::new(
            type_name,
            vec![SchemaIssue::new(
                "type",
                "",
                format!("No schema registered for type '{type_name}'"),
            )],
        )
    }

    pub fn has_issue(&self, error_type: &str, path: &str) -> bool {
        self.issues
            .iter()
            .any(|i| i.error_type == error_type && i.path == path)
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.issues.len();
        write!(
            f,
            "{n} validation error{} for {}",
            if n == 1 { "" } else { "s" },
            self.type_name
        )?;
        for issue in &self.issues {
            let path = if issue.path.is_empty() {
                "__root__"
            } else {
                &issue.path
            };
            write!(f, "\n{path}\n  {} [type={}]", issue.message, issue.error_type)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

// Collects issues while walking a resource
struct ValidationContext {
    path_stack: Vec<String>,
    issues: Vec<SchemaIssue>,
}

impl ValidationContext {
    fn new() -> Self {
        Self {
            path_stack: vec![String::new()],
            issues: Vec::new(),
        }
    }

    fn current_path(&self) -> &str {
        self.path_stack.last().map(String::as_str).unwrap_or("")
    }

    fn push_key(&mut self, key: &str) {
        let next = join_key(self.current_path(), key);
        self.path_stack.push(next);
    }

    fn push_index(&mut self, index: usize) {
        let next = join_index(self.current_path(), index);
        self.path_stack.push(next);
    }

    fn pop_path(&mut self) {
        if self.path_stack.len() > 1 {
            self.path_stack.pop();
        }
    }

    fn add_issue(&mut self, code: &str, message: impl Into<String>) {
        let path = self.current_path().to_string();
        self.issues.push(SchemaIssue::new(code, path, message));
    }

    fn into_result(self, type_name: &str) -> Result<(), SchemaError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::new(type_name, self.issues))
        }
    }
}

/// Default [`SchemaValidator`] walking the embedded schema definitions.
///
/// Elements typed `Resource` (bundle entries, contained resources) are
/// validated against the schema named by their `resourceType` when one is
/// known; otherwise only their object shape is checked.
#[derive(Debug, Clone)]
pub struct StructuralValidator {
    schemas: Arc<SchemaSet>,
}

impl Default for StructuralValidator {
    fn default() -> Self {
        Self::new(embedded_schemas())
    }
}

impl StructuralValidator {
    pub fn new(schemas: Arc<SchemaSet>) -> Self {
        Self { schemas }
    }

    pub fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }

    fn validate_resource(
        &self,
        schema: &FhirSchema,
        resource: &Map<String, Value>,
        ctx: &mut ValidationContext,
    ) {
        if let Some(rt) = resource.get("resourceType") {
            if rt.as_str() != Some(schema.name.as_str()) {
                ctx.push_key("resourceType");
                ctx.add_issue(
                    "value",
                    format!("Expected resourceType '{}', got {rt}", schema.name),
                );
                ctx.pop_path();
            }
        }
        let elements = self.schemas.resolved_elements(schema);
        self.validate_elements(&elements, resource, ctx);
    }

    fn validate_elements(
        &self,
        elements: &BTreeMap<String, SchemaElement>,
        object: &Map<String, Value>,
        ctx: &mut ValidationContext,
    ) {
        for key in object.keys() {
            if key == "resourceType" {
                continue;
            }
            // `_field` carries extensions of a primitive `field`
            let declared = key.strip_prefix('_').unwrap_or(key);
            if !elements.contains_key(declared) {
                ctx.push_key(key);
                ctx.add_issue("element/unknown", "Extra inputs are not permitted");
                ctx.pop_path();
            }
        }

        for (name, element) in elements {
            ctx.push_key(name);
            match object.get(name) {
                None | Some(Value::Null) => {
                    if element.min > 0 {
                        ctx.add_issue("require", "Field required");
                    }
                }
                Some(Value::Array(items)) if element.array => {
                    if items.len() < element.min as usize {
                        ctx.add_issue(
                            "require",
                            format!("List should have at least {} item(s)", element.min),
                        );
                    }
                    for (i, item) in items.iter().enumerate() {
                        ctx.push_index(i);
                        if item.is_null() {
                            ctx.add_issue("type", "List items must not be null");
                        } else {
                            self.validate_value(element, item, ctx);
                        }
                        ctx.pop_path();
                    }
                }
                Some(value) if element.array => {
                    ctx.add_issue(
                        "type/array",
                        format!("Input should be a valid list, got {}", primitive::kind_of(value)),
                    );
                }
                Some(Value::Array(_)) => {
                    ctx.add_issue("type", "Input should be a single value, got array");
                }
                Some(value) => self.validate_value(element, value, ctx),
            }
            ctx.pop_path();
        }
    }

    fn validate_value(&self, element: &SchemaElement, value: &Value, ctx: &mut ValidationContext) {
        if let Some(backbone) = &element.elements {
            if let Some(object) = self.expect_object(value, ctx) {
                let mut merged = self.element_base();
                merged.extend(backbone.iter().map(|(k, v)| (k.clone(), v.clone())));
                self.validate_elements(&merged, object, ctx);
            }
            return;
        }

        let Some(type_name) = element.type_name.as_deref() else {
            return;
        };

        if type_name == "Resource" {
            self.validate_contained(value, ctx);
        } else if primitive::is_primitive(type_name) {
            if let Err(violation) = primitive::check(type_name, value) {
                ctx.add_issue(violation.code(), violation.message());
                return;
            }
            if let (Some(allowed), Some(code)) = (&element.enumeration, value.as_str()) {
                if !allowed.iter().any(|a| a == code) {
                    let quoted: Vec<String> = allowed.iter().map(|a| format!("'{a}'")).collect();
                    ctx.add_issue(
                        "value/enum",
                        format!("Input should be {}, got '{code}'", quoted.join(", ")),
                    );
                }
            }
        } else {
            match self.schemas.get(type_name) {
                Some(datatype) => {
                    if let Some(object) = self.expect_object(value, ctx) {
                        let mut merged = self.element_base();
                        merged.extend(self.schemas.resolved_elements(datatype));
                        self.validate_elements(&merged, object, ctx);
                    }
                }
                None => {
                    tracing::warn!("No schema for datatype {type_name}, skipping nested checks");
                    self.expect_object(value, ctx);
                }
            }
        }
    }

    fn validate_contained(&self, value: &Value, ctx: &mut ValidationContext) {
        let Some(object) = self.expect_object(value, ctx) else {
            return;
        };
        let schema = object
            .get("resourceType")
            .and_then(Value::as_str)
            .and_then(|rt| self.schemas.resource(rt));
        if let Some(schema) = schema {
            self.validate_resource(schema, object, ctx);
        }
    }

    fn expect_object<'v>(
        &self,
        value: &'v Value,
        ctx: &mut ValidationContext,
    ) -> Option<&'v Map<String, Value>> {
        let object = value.as_object();
        if object.is_none() {
            ctx.add_issue(
                "type",
                format!(
                    "Input should be a valid object, got {}",
                    primitive::kind_of(value)
                ),
            );
        }
        object
    }

    // Elements every datatype and backbone element inherits
    fn element_base(&self) -> BTreeMap<String, SchemaElement> {
        self.schemas
            .get("Element")
            .map(|e| e.elements.clone())
            .unwrap_or_default()
    }
}

impl SchemaValidator for StructuralValidator {
    fn validate(&self, type_name: &str, resource: &Map<String, Value>) -> Result<(), SchemaError> {
        let schema = self
            .schemas
            .resource(type_name)
            .ok_or_else(|| SchemaError::unknown_type(type_name))?;
        let mut ctx = ValidationContext::new();
        self.validate_resource(schema, resource, &mut ctx);
        ctx.into_result(type_name)
    }
}
