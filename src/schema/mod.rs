//! Resource schemas: embedded definitions, structural validation and the
//! required/optional field partition.

mod definition;
mod embedded;
mod introspect;
pub mod primitive;
mod validator;

pub use definition::{DefaultFactory, FhirSchema, SchemaElement, SchemaKind};
pub use embedded::{SchemaSet, embedded_schemas};
pub use introspect::{FieldPartition, field_partition};
pub use validator::{SchemaError, SchemaIssue, SchemaValidator, StructuralValidator};
