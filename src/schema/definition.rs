//! Schema definition types.
//!
//! A [`FhirSchema`] declares the elements of a resource or datatype. Elements
//! carry cardinality and type for structural validation, and an optional
//! default (value or generating rule) that decides the required/optional
//! field partition.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaKind {
    Resource,
    ComplexType,
    Base,
}

/// Schema for one resource type or complex datatype.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FhirSchema {
    pub name: String,
    pub kind: SchemaKind,
    /// Schema whose elements are inherited (e.g. `DomainResource`)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub base: Option<String>,
    #[serde(default)]
    pub elements: BTreeMap<String, SchemaElement>,
}

/// Rule producing a default value when a field is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultFactory {
    List,
    Object,
}

/// Element definition within a schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaElement {
    /// FHIR type of this element; absent for inline backbone elements
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub array: bool,
    #[serde(default)]
    pub min: u32,
    /// Permitted codes
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none", default)]
    pub enumeration: Option<Vec<String>>,
    /// Declared default value. `Some(Value::Null)` is a declared null default.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "deserialize_present"
    )]
    pub default: Option<Value>,
    #[serde(rename = "defaultFactory", skip_serializing_if = "Option::is_none", default)]
    pub default_factory: Option<DefaultFactory>,
    /// Inline backbone elements
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub elements: Option<BTreeMap<String, SchemaElement>>,
}

impl SchemaElement {
    /// Required iff the element has no default value and no default-generating rule
    pub fn is_required(&self) -> bool {
        self.default.is_none() && self.default_factory.is_none()
    }

    pub fn is_backbone(&self) -> bool {
        self.elements.is_some()
    }
}

// Keeps an explicit `"default": null` distinguishable from an absent key.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
